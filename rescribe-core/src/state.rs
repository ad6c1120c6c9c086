//! Run state — the single mutable object threaded through every workflow
//! step.
//!
//! Created once at run start, mutated only by the active state's handler,
//! and dropped when the run terminates. No concurrent writers.

use crate::types::{ResultMap, SearchQuery, Section};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// The workflow's control states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    /// No section plan exists yet.
    Plan,
    /// Generating queries / gathering information for the current section.
    Research,
    /// Writing the current section from accumulated results.
    Write,
    /// Terminal: assembling the final report.
    Compile,
}

/// Mutable state for one research run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    /// The research topic supplied by the caller.
    pub topic: String,
    /// Ordered plan sections.
    pub sections: Vec<Section>,
    /// Index of the section currently under research, when any remains.
    pub current_section_index: Option<usize>,
    /// Queries awaiting dispatch; cleared after each search cycle.
    pub pending_queries: Vec<SearchQuery>,
    /// Results accumulated for the current section, keyed by query text.
    pub search_results: ResultMap,
    /// Search cycles executed for the current section.
    pub search_iterations: usize,
    /// Hard ceiling on search cycles per section.
    pub max_search_iterations: usize,
    /// Sections written so far, in completion order. Append-only.
    pub completed_sections: Vec<Section>,
    /// Human-readable step history.
    pub research_steps: Vec<String>,
    /// Sources consulted, one entry per attempted query.
    pub sources: Vec<String>,
    /// The compiled report, present once the run terminates.
    pub final_report: Option<String>,
}

impl RunState {
    /// Create a fresh run state for a topic.
    pub fn new(topic: impl Into<String>, max_search_iterations: usize) -> Self {
        Self {
            topic: topic.into(),
            sections: Vec::new(),
            current_section_index: None,
            pending_queries: Vec::new(),
            search_results: ResultMap::new(),
            search_iterations: 0,
            max_search_iterations,
            completed_sections: Vec::new(),
            research_steps: Vec::new(),
            sources: Vec::new(),
            final_report: None,
        }
    }

    /// Append a trace entry to the step history.
    pub fn trace(&mut self, entry: impl Into<String>) {
        self.research_steps.push(entry.into());
    }

    /// The section currently under research.
    ///
    /// An index pointing past the end of `sections` is a defensive guard:
    /// it is logged and treated as no current section.
    pub fn current_section(&self) -> Option<&Section> {
        let index = self.current_section_index?;
        match self.sections.get(index) {
            Some(section) => Some(section),
            None => {
                warn!(index, len = self.sections.len(), "Current section index out of bounds");
                None
            }
        }
    }

    /// Whether the per-section search iteration budget is exhausted.
    pub fn iteration_budget_exhausted(&self) -> bool {
        self.search_iterations >= self.max_search_iterations
    }

    /// Reset per-section search bookkeeping before moving to the next
    /// section.
    pub fn reset_section_research(&mut self) {
        self.pending_queries.clear();
        self.search_results.clear();
        self.search_iterations = 0;
    }
}
