//! Prompt templates for the research workflow.
//!
//! Each stage of the workflow formats one of these templates before invoking
//! the generation engine. Templates are plain consts; the `format_*` helpers
//! fill in the blanks.

use crate::types::{ResultMap, Section};

/// Default shape of the final report when no structure is configured.
pub const DEFAULT_REPORT_STRUCTURE: &str = "\
1. Introduction
   - Brief overview of the topic

2. Key Findings
   - Main insights from the research

3. Detailed Analysis
   - In-depth examination of subtopics

4. Conclusion
   - Summary of findings and implications
";

/// Substituted for search results when a section is written without any.
pub const NO_RESULTS_PLACEHOLDER: &str =
    "No search results are available. Write the section from general knowledge.";

const PLAN_PROMPT: &str = "\
You are a research planning expert creating a structured research plan.

<Research Topic>
{topic}
</Research Topic>

<Report Structure>
{report_structure}
</Report Structure>

<Task>
Create a research plan by dividing the topic into logical sections.

For each section:
1. Provide a clear, descriptive title
2. Write a brief description of what the section should cover
3. Indicate whether the section requires web research (research: true/false)

Format the plan as a numbered list, one section per number. Aim for 3-5
focused sections that collectively cover the topic.
</Task>
";

const QUERY_GENERATION_PROMPT: &str = "\
You are an expert researcher generating effective search queries.

<Research Topic>
{topic}
</Research Topic>

<Current Section>
{section_title}: {section_description}
</Current Section>

<Research Iteration>
{iteration} of {max_iterations}
</Research Iteration>

<Task>
Generate {num_queries} specific search queries that will help gather
information for the current section. Queries should be focused on the
section, use precise terminology, and cover different aspects of it.
List one query per line as a numbered list.
</Task>
";

const SECTION_WRITING_PROMPT: &str = "\
You are a professional research writer creating content for a report.

<Research Section>
Title: {section_title}
Description: {section_description}
</Research Section>

<Search Results>
{search_results}
</Search Results>

<Task>
Write comprehensive content for this section based on the search results.
Synthesize information from multiple sources, include specific facts and
insights, and keep the language professional and clear.
</Task>
";

const FINAL_REPORT_PROMPT: &str = "\
You are a professional report writer compiling a research report.

<Research Topic>
{topic}
</Research Topic>

<Report Structure>
{report_structure}
</Report Structure>

<Research Sections>
{sections_content}
</Research Sections>

<Task>
Compile a cohesive final report on the research topic. Follow the report
structure, integrate all section content into a unified document, add
transitions between sections, and end with a conclusion summarizing the
key findings.
</Task>
";

/// Format the planning prompt for a topic.
pub fn format_plan_prompt(topic: &str, report_structure: &str) -> String {
    PLAN_PROMPT
        .replace("{topic}", topic)
        .replace("{report_structure}", report_structure)
}

/// Format the query-generation prompt for the current section.
pub fn format_query_prompt(
    topic: &str,
    section: &Section,
    iteration: usize,
    max_iterations: usize,
    num_queries: usize,
) -> String {
    QUERY_GENERATION_PROMPT
        .replace("{topic}", topic)
        .replace("{section_title}", &section.title)
        .replace("{section_description}", &section.description)
        .replace("{iteration}", &(iteration + 1).to_string())
        .replace("{max_iterations}", &max_iterations.to_string())
        .replace("{num_queries}", &num_queries.to_string())
}

/// Format the section-writing prompt from accumulated search results.
///
/// With no results, substitutes the general-knowledge placeholder.
pub fn format_writing_prompt(section: &Section, results: &ResultMap) -> String {
    let rendered = if results.result_count() == 0 {
        NO_RESULTS_PLACEHOLDER.to_string()
    } else {
        render_search_results(results)
    };
    SECTION_WRITING_PROMPT
        .replace("{section_title}", &section.title)
        .replace("{section_description}", &section.description)
        .replace("{search_results}", &rendered)
}

/// Format the final compilation prompt from completed sections.
pub fn format_compile_prompt(topic: &str, report_structure: &str, sections: &[Section]) -> String {
    let mut blocks = String::new();
    for (i, section) in sections.iter().enumerate() {
        let body = if section.content.is_empty() {
            &section.description
        } else {
            &section.content
        };
        blocks.push_str(&format!("{}. {}\n{}\n\n", i + 1, section.title, body));
    }
    FINAL_REPORT_PROMPT
        .replace("{topic}", topic)
        .replace("{report_structure}", report_structure)
        .replace("{sections_content}", blocks.trim_end())
}

/// Render a result map as text for prompt inclusion.
fn render_search_results(results: &ResultMap) -> String {
    let mut out = String::new();
    for (query, items) in results.iter() {
        out.push_str(&format!("Query: {query}\n"));
        for item in items {
            out.push_str(&format!("- {} ({})\n  {}\n", item.title, item.url, item.content));
        }
        out.push('\n');
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SearchResult;

    #[test]
    fn test_plan_prompt_substitution() {
        let prompt = format_plan_prompt("Rust async runtimes", DEFAULT_REPORT_STRUCTURE);
        assert!(prompt.contains("Rust async runtimes"));
        assert!(prompt.contains("Introduction"));
        assert!(!prompt.contains("{topic}"));
    }

    #[test]
    fn test_writing_prompt_uses_placeholder_when_empty() {
        let section = Section::new("History", "Background of the topic");
        let prompt = format_writing_prompt(&section, &ResultMap::new());
        assert!(prompt.contains(NO_RESULTS_PLACEHOLDER));
    }

    #[test]
    fn test_writing_prompt_renders_results() {
        let section = Section::new("History", "Background");
        let mut results = ResultMap::new();
        results.insert(
            "origins",
            vec![SearchResult {
                title: "A Brief History".into(),
                url: "https://example.com".into(),
                content: "It began long ago.".into(),
                full_content: String::new(),
            }],
        );
        let prompt = format_writing_prompt(&section, &results);
        assert!(prompt.contains("Query: origins"));
        assert!(prompt.contains("A Brief History"));
    }

    #[test]
    fn test_compile_prompt_indexes_sections() {
        let mut first = Section::new("Intro", "Overview");
        first.content = "Written intro.".into();
        let second = Section::new("Details", "The specifics");
        let prompt = format_compile_prompt("Topic", DEFAULT_REPORT_STRUCTURE, &[first, second]);
        assert!(prompt.contains("1. Intro\nWritten intro."));
        // Unwritten section falls back to its description
        assert!(prompt.contains("2. Details\nThe specifics"));
    }
}
