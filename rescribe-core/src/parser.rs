//! Entity parser — extracts structured sections and search queries from
//! unstructured generation-engine output.
//!
//! Best-effort against free-form natural-language text, not a strict
//! grammar: malformed or empty input yields an empty sequence, never an
//! error.

use crate::types::{SearchQuery, Section};
use regex::Regex;

/// Parses generation output into sections and queries.
pub struct EntityParser {
    section_marker: Regex,
    research_flag: Regex,
    list_item: Regex,
}

impl EntityParser {
    pub fn new() -> Self {
        Self {
            // A leading integer, a period, and whitespace at line start.
            section_marker: Regex::new(r"(?m)^\s*\d+\.\s+").unwrap(),
            // "research" together with a negative token on the same line.
            research_flag: Regex::new(r"(?i)research\b.*\b(false|no)\b").unwrap(),
            // Numbered or bulleted list item with the remainder captured.
            list_item: Regex::new(r"^(?:\d+\.\s+|\*\s+|-\s+)(.+)$").unwrap(),
        }
    }

    /// Parse a plan text into ordered sections.
    ///
    /// The text is split on numbered-list markers; each block's first
    /// non-blank line becomes the title and the remaining lines are
    /// space-joined into the description. A line flagging research as
    /// false/no is dropped from the description and marks the section as
    /// requiring no research (created already completed).
    pub fn parse_sections(&self, plan_text: &str) -> Vec<Section> {
        let mut sections = Vec::new();

        let mut block_starts: Vec<usize> = self
            .section_marker
            .find_iter(plan_text)
            .map(|m| m.start())
            .collect();
        block_starts.push(plan_text.len());

        for window in block_starts.windows(2) {
            let block = &plan_text[window[0]..window[1]];
            // Strip the numbered marker itself before reading lines.
            let block = self.section_marker.replacen(block, 1, "");

            let mut lines = block.lines().map(str::trim).filter(|l| !l.is_empty());
            let Some(title) = lines.next() else {
                continue;
            };

            let mut requires_research = true;
            let mut description_parts = Vec::new();
            for line in lines {
                if self.research_flag.is_match(line) {
                    requires_research = false;
                    continue;
                }
                description_parts.push(line);
            }

            let mut section = Section::new(title, description_parts.join(" "));
            if !requires_research {
                section.requires_research = false;
                section.completed = true;
            }
            sections.push(section);
        }

        sections
    }

    /// Parse query text into search queries for the given section.
    ///
    /// Scans line by line: blank lines, headings (`#`), and angle-bracket
    /// lines are skipped; list items yield their captured remainder; any
    /// other non-empty unquoted line is accepted verbatim as a fallback.
    pub fn parse_queries(&self, query_text: &str, section_index: usize) -> Vec<SearchQuery> {
        let mut queries = Vec::new();

        for line in query_text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('<') {
                continue;
            }

            if let Some(caps) = self.list_item.captures(line) {
                let text = strip_quotes(caps[1].trim());
                if !text.is_empty() {
                    queries.push(SearchQuery::new(text, Some(section_index)));
                }
                continue;
            }

            // Fallback heuristic: a bare line is taken as a query unless it
            // is wrapped in quotation marks.
            if !is_quoted(line) {
                queries.push(SearchQuery::new(line, Some(section_index)));
            }
        }

        queries
    }
}

impl Default for EntityParser {
    fn default() -> Self {
        Self::new()
    }
}

fn is_quoted(line: &str) -> bool {
    (line.starts_with('"') && line.ends_with('"') && line.len() >= 2)
        || (line.starts_with('\'') && line.ends_with('\'') && line.len() >= 2)
}

fn strip_quotes(text: &str) -> &str {
    if is_quoted(text) {
        &text[1..text.len() - 1]
    } else {
        text
    }
}
