//! Report compiler — assembles completed section content plus run metadata
//! into the final formatted report.
//!
//! This is the only component that reads the trace and source logs for
//! presentation.

use crate::engine::GenerationEngine;
use crate::error::Result;
use crate::prompts::format_compile_prompt;
use crate::state::RunState;
use crate::types::Message;
use std::sync::Arc;
use tracing::{debug, info};

/// Compiles the final report from a terminated run's state.
pub struct ReportCompiler {
    engine: Arc<dyn GenerationEngine>,
    report_structure: String,
}

impl ReportCompiler {
    pub fn new(engine: Arc<dyn GenerationEngine>, report_structure: impl Into<String>) -> Self {
        Self {
            engine,
            report_structure: report_structure.into(),
        }
    }

    /// Compile the final report and record it on the state.
    ///
    /// With no completed sections, falls back to compiling from the raw
    /// section plan.
    pub async fn compile(&self, state: &mut RunState) -> Result<String> {
        let sections = if state.completed_sections.is_empty() {
            debug!("No completed sections; compiling from the raw plan");
            &state.sections
        } else {
            &state.completed_sections
        };

        let prompt = format_compile_prompt(&state.topic, &self.report_structure, sections);
        let response = self.engine.generate(&[Message::user(prompt)]).await?;

        let report = render_report(response.text(), &state.research_steps, &state.sources);
        info!(chars = report.len(), "Final report compiled");

        state.trace("Compiled final report");
        state.final_report = Some(report.clone());
        Ok(report)
    }
}

/// Wrap the compiled body together with the research trace and source list.
fn render_report(body: &str, research_steps: &[String], sources: &[String]) -> String {
    let steps: String = research_steps
        .iter()
        .map(|s| format!("- {s}\n"))
        .collect();
    let sources: String = sources.iter().map(|s| format!("- {s}\n")).collect();

    format!(
        "RESEARCH REPORT\n\
         --------------\n\n\
         RESULTS:\n{body}\n\n\
         RESEARCH STEPS:\n{steps}\n\
         SOURCES:\n{sources}"
    )
}
