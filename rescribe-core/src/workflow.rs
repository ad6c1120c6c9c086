//! Workflow state machine — the control loop sequencing plan, research,
//! write, and compile.
//!
//! Exactly one state is active at a time; each step invokes one component,
//! mutates the shared `RunState`, and yields the next state. Termination is
//! guaranteed by the per-section search iteration ceiling: the `Research`
//! handler checks the budget before invoking the generation engine, so no
//! sequence of engine responses can loop past it.
//!
//! Failure split: generation failures at plan, write, and compile abort the
//! run; query-generation and search failures are contained and the run
//! proceeds to write with whatever results exist.

use crate::compiler::ReportCompiler;
use crate::config::ResearchConfig;
use crate::engine::{GenerationEngine, SEARCH_CAPABILITY};
use crate::error::{GenerationError, Result};
use crate::parser::EntityParser;
use crate::prompts::{format_plan_prompt, format_query_prompt, format_writing_prompt};
use crate::search::{SearchDispatcher, SearchProvider};
use crate::state::{RunState, WorkflowState};
use crate::tracker::SectionTracker;
use crate::types::{GenerationContent, Message};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The research workflow: caller-facing entry point over the state machine.
pub struct ResearchWorkflow {
    engine: Arc<dyn GenerationEngine>,
    dispatcher: SearchDispatcher,
    compiler: ReportCompiler,
    parser: EntityParser,
    config: ResearchConfig,
}

impl ResearchWorkflow {
    pub fn new(
        engine: Arc<dyn GenerationEngine>,
        search: Arc<dyn SearchProvider>,
        config: ResearchConfig,
    ) -> Self {
        let dispatcher = SearchDispatcher::new(search, config.max_results_per_query);
        let compiler = ReportCompiler::new(engine.clone(), config.report_structure.clone());
        Self {
            engine,
            dispatcher,
            compiler,
            parser: EntityParser::new(),
            config,
        }
    }

    /// Run the full workflow for a topic and return the compiled report.
    pub async fn run(&self, topic: &str) -> Result<String> {
        let mut state = RunState::new(topic, self.config.max_search_iterations);
        let report = self.run_with_state(&mut state).await?;
        Ok(report)
    }

    /// Run the workflow over an externally owned state.
    ///
    /// Exposed so callers (and tests) can inspect the terminal state.
    pub async fn run_with_state(&self, state: &mut RunState) -> Result<String> {
        info!(topic = %state.topic, "Starting research run");
        let mut current = WorkflowState::Plan;

        loop {
            debug!(state = ?current, "Entering workflow state");
            current = match current {
                WorkflowState::Plan => self.plan(state).await?,
                WorkflowState::Research => self.research(state).await?,
                WorkflowState::Write => self.write_section(state).await?,
                WorkflowState::Compile => break,
            };
        }

        let report = self.compiler.compile(state).await?;
        info!(sections = state.completed_sections.len(), "Research run finished");
        Ok(report)
    }

    /// Plan: generate and parse the section plan for the topic.
    ///
    /// Generation failure here is fatal to the run.
    async fn plan(&self, state: &mut RunState) -> Result<WorkflowState> {
        let prompt = format_plan_prompt(&state.topic, &self.config.report_structure);
        let response = self.engine.generate(&[Message::user(prompt)]).await?;

        let plan_text = response.text().to_string();
        state.trace(format!("Generated research plan:\n{plan_text}"));

        state.sections = self.parser.parse_sections(&plan_text);
        info!(sections = state.sections.len(), "Parsed section plan");

        // Sections flagged as requiring no research keep their description
        // as placeholder content and complete immediately.
        for section in state.sections.iter_mut().filter(|s| !s.requires_research) {
            section.content = section.description.clone();
            state.completed_sections.push(section.clone());
        }

        state.current_section_index = SectionTracker::next_researchable_section(&state.sections);

        match state.current_section_index {
            Some(index) => {
                debug!(index, "First researchable section selected");
                Ok(WorkflowState::Research)
            }
            None => {
                // Zero sections parsed, or none requiring research.
                info!("No researchable sections; compiling directly");
                Ok(WorkflowState::Compile)
            }
        }
    }

    /// Research: generate queries for the current section and route.
    ///
    /// Routing precedence: the iteration ceiling is checked before anything
    /// else; below it, an explicit capability call naming the search action
    /// wins over heuristically parsed queries, parsed queries trigger a
    /// search, and everything else proceeds to write.
    async fn research(&self, state: &mut RunState) -> Result<WorkflowState> {
        let Some(index) = state.current_section_index else {
            warn!("Research entered without a current section");
            return Ok(WorkflowState::Write);
        };
        let Some(section) = state.current_section().cloned() else {
            return Ok(WorkflowState::Write);
        };

        if state.iteration_budget_exhausted() {
            debug!(
                iterations = state.search_iterations,
                "Iteration budget exhausted; proceeding to write"
            );
            return Ok(WorkflowState::Write);
        }

        let prompt = format_query_prompt(
            &state.topic,
            &section,
            state.search_iterations,
            state.max_search_iterations,
            self.config.queries_per_iteration,
        );
        let response = match self.engine.generate(&[Message::user(prompt)]).await {
            Ok(response) => response,
            Err(e) => {
                // Query generation is not one of the fatal paths; write the
                // section with whatever results already exist.
                warn!(error = %e, "Query generation failed; proceeding to write");
                state.trace("Query generation failed; writing with existing results");
                return Ok(WorkflowState::Write);
            }
        };

        match response.content {
            GenerationContent::CapabilityCall { ref name, ref arguments }
                if name == SEARCH_CAPABILITY =>
            {
                let queries = queries_from_arguments(arguments);
                if queries.is_empty() {
                    warn!("Search capability call carried no query; proceeding to write");
                    return Ok(WorkflowState::Write);
                }
                debug!(count = queries.len(), "Routing on explicit capability call");
                self.execute_search(state, queries).await;
                Ok(WorkflowState::Research)
            }
            GenerationContent::CapabilityCall { ref name, .. } => {
                warn!(capability = %name, "Unrecognized capability call; proceeding to write");
                Ok(WorkflowState::Write)
            }
            GenerationContent::Text { ref text } => {
                state.pending_queries = self.parser.parse_queries(text, index);
                if !state.pending_queries.is_empty() {
                    let queries: Vec<String> = state
                        .pending_queries
                        .iter()
                        .map(|q| q.text.clone())
                        .collect();
                    self.execute_search(state, queries).await;
                    return Ok(WorkflowState::Research);
                }
                if !state.search_results.is_empty() {
                    debug!("No new queries but results exist; proceeding to write");
                    return Ok(WorkflowState::Write);
                }
                // No further research signal found.
                Ok(WorkflowState::Write)
            }
        }
    }

    /// Search execution: dispatch the query batch and merge the outcome.
    ///
    /// Results merge last-write-wins by query text; the iteration counter
    /// advances and pending queries are consumed. Never fails.
    async fn execute_search(&self, state: &mut RunState, queries: Vec<String>) {
        let outcome = self.dispatcher.dispatch(&queries).await;
        state.search_results.merge(outcome.results);
        state.research_steps.extend(outcome.trace_entries);
        state.sources.extend(outcome.source_entries);
        state.search_iterations += 1;
        state.pending_queries.clear();
        debug!(
            iteration = state.search_iterations,
            results = state.search_results.result_count(),
            "Search cycle complete"
        );
    }

    /// Write: synthesize the current section from accumulated results and
    /// advance to the next researchable section.
    ///
    /// Generation failure here is fatal to the run.
    async fn write_section(&self, state: &mut RunState) -> Result<WorkflowState> {
        if let (Some(index), Some(section)) =
            (state.current_section_index, state.current_section().cloned())
        {
            let prompt = format_writing_prompt(&section, &state.search_results);
            let response = self.engine.generate(&[Message::user(prompt)]).await?;

            let content = response.text().to_string();
            if content.is_empty() {
                return Err(GenerationError::EmptyResponse.into());
            }

            state.sections = SectionTracker::apply_written_content(&state.sections, index, content);
            state.completed_sections.push(state.sections[index].clone());
            state.trace(format!("Wrote section: {}", section.title));
            info!(section = %section.title, "Section written");
        }

        state.reset_section_research();
        state.current_section_index = SectionTracker::next_researchable_section(&state.sections);

        match state.current_section_index {
            Some(_) => Ok(WorkflowState::Research),
            None => Ok(WorkflowState::Compile),
        }
    }
}

/// Extract search queries from a capability call's arguments.
///
/// Accepts either a single `query` string or a `queries` array of strings.
fn queries_from_arguments(arguments: &serde_json::Value) -> Vec<String> {
    if let Some(query) = arguments.get("query").and_then(|q| q.as_str()) {
        if !query.is_empty() {
            return vec![query.to_string()];
        }
    }
    if let Some(queries) = arguments.get("queries").and_then(|q| q.as_array()) {
        return queries
            .iter()
            .filter_map(|q| q.as_str())
            .filter(|q| !q.is_empty())
            .map(String::from)
            .collect();
    }
    Vec::new()
}
