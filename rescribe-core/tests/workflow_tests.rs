//! End-to-end workflow scenarios driven by the mock generation engine.
//!
//! Each test scripts the engine's responses in order and inspects the
//! terminal run state.

use async_trait::async_trait;
use rescribe_core::{
    MockGenerationEngine, RawSearchResult, ResearchConfig, ResearchWorkflow, RunState,
    SearchError, SearchProvider,
};
use std::sync::{Arc, Mutex};

/// Provider whose every call fails.
struct FailingProvider;

#[async_trait]
impl SearchProvider for FailingProvider {
    async fn search(
        &self,
        query: &str,
        _max_results: usize,
    ) -> Result<Vec<RawSearchResult>, SearchError> {
        Err(SearchError::RequestFailed {
            query: query.to_string(),
            message: "provider down".to_string(),
        })
    }
}

/// Provider that records every query it receives.
#[derive(Default)]
struct RecordingProvider {
    queries: Mutex<Vec<String>>,
}

#[async_trait]
impl SearchProvider for RecordingProvider {
    async fn search(
        &self,
        query: &str,
        _max_results: usize,
    ) -> Result<Vec<RawSearchResult>, SearchError> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(vec![RawSearchResult {
            title: Some(format!("hit for {query}")),
            content: Some("some content".to_string()),
            ..Default::default()
        }])
    }
}

fn config(max_search_iterations: usize) -> ResearchConfig {
    ResearchConfig {
        max_search_iterations,
        ..Default::default()
    }
}

const TWO_SECTION_PLAN: &str = "\
1. Background
   Context for the topic.
   Research: false

2. Deep Dive
   The technical details.
";

/// Scenario A: a two-section plan, one research-required and one not.
#[tokio::test]
async fn two_section_plan_completes_both_sections() {
    let engine = Arc::new(MockGenerationEngine::with_responses([
        MockGenerationEngine::text_response(TWO_SECTION_PLAN),
        // Research iteration 1: two queries
        MockGenerationEngine::text_response("1. deep dive internals\n2. deep dive benchmarks"),
        // Research iteration 2: no further queries, results exist -> write
        MockGenerationEngine::text_response("<no further queries>"),
        // Write the researched section
        MockGenerationEngine::text_response("Deep dive content."),
        // Compile
        MockGenerationEngine::text_response("Final report body."),
    ]));
    let provider = Arc::new(RecordingProvider::default());
    let workflow = ResearchWorkflow::new(engine, provider.clone(), config(3));

    let mut state = RunState::new("Topic X", 3);
    let report = workflow.run_with_state(&mut state).await.unwrap();

    assert_eq!(state.completed_sections.len(), 2);
    // The non-research section keeps its description-derived placeholder
    let background = &state.completed_sections[0];
    assert_eq!(background.title, "Background");
    assert_eq!(background.content, "Context for the topic.");
    assert!(!background.requires_research);

    let deep_dive = &state.completed_sections[1];
    assert_eq!(deep_dive.title, "Deep Dive");
    assert_eq!(deep_dive.content, "Deep dive content.");

    // One search cycle ran, within the iteration ceiling
    let searches = state
        .research_steps
        .iter()
        .filter(|s| s.starts_with("Searched for:"))
        .count();
    assert!(searches <= 3 * 2);
    assert_eq!(provider.queries.lock().unwrap().len(), 2);
    assert!(report.contains("Final report body."));
}

/// Scenario B: an always-failing search capability still reaches compile.
#[tokio::test]
async fn failing_search_still_reaches_compile() {
    let engine = Arc::new(MockGenerationEngine::with_responses([
        MockGenerationEngine::text_response("1. Only Section\n   All the details.\n"),
        MockGenerationEngine::text_response("1. first query\n2. second query"),
        // No further queries after the failed cycle
        MockGenerationEngine::text_response("<no further queries>"),
        MockGenerationEngine::text_response("Section from general knowledge."),
        MockGenerationEngine::text_response("Compiled despite failures."),
    ]));
    let workflow = ResearchWorkflow::new(engine, Arc::new(FailingProvider), config(3));

    let mut state = RunState::new("Topic", 3);
    let report = workflow.run_with_state(&mut state).await.unwrap();

    assert!(report.contains("Compiled despite failures."));
    // One source entry per attempted query, even though all failed
    assert_eq!(
        state.sources,
        vec![
            "Search results for: first query".to_string(),
            "Search results for: second query".to_string(),
        ]
    );
    // Per-section results are reset after write; nothing lingers
    assert!(state.search_results.is_empty());
    assert_eq!(state.completed_sections.len(), 1);
}

/// Scenario C: a zero iteration budget never enters search execution.
#[tokio::test]
async fn zero_iteration_budget_never_searches() {
    let engine = Arc::new(MockGenerationEngine::with_responses([
        MockGenerationEngine::text_response("1. Only Section\n   All the details.\n"),
        // No query-generation response: the budget gate precedes it
        MockGenerationEngine::text_response("Placeholder-written section."),
        MockGenerationEngine::text_response("Report."),
    ]));
    let provider = Arc::new(RecordingProvider::default());
    let engine_handle = engine.clone();
    let workflow = ResearchWorkflow::new(engine, provider.clone(), config(0));

    let mut state = RunState::new("Topic", 0);
    workflow.run_with_state(&mut state).await.unwrap();

    assert!(provider.queries.lock().unwrap().is_empty());
    assert!(state.sources.is_empty());
    assert_eq!(state.completed_sections.len(), 1);
    assert_eq!(
        state.completed_sections[0].content,
        "Placeholder-written section."
    );
    // Exactly plan + write + compile were consumed
    assert_eq!(engine_handle.remaining(), 0);
}

/// Scenario D: an explicit capability call overrides parsed queries.
#[tokio::test]
async fn capability_call_routes_to_search_with_its_arguments() {
    let engine = Arc::new(MockGenerationEngine::with_responses([
        MockGenerationEngine::text_response("1. Only Section\n   All the details.\n"),
        MockGenerationEngine::capability_call_response(
            "web_search",
            serde_json::json!({"query": "abc"}),
        ),
        MockGenerationEngine::text_response("<no further queries>"),
        MockGenerationEngine::text_response("Section."),
        MockGenerationEngine::text_response("Report."),
    ]));
    let provider = Arc::new(RecordingProvider::default());
    let workflow = ResearchWorkflow::new(engine, provider.clone(), config(3));

    let mut state = RunState::new("Topic", 3);
    workflow.run_with_state(&mut state).await.unwrap();

    assert_eq!(*provider.queries.lock().unwrap(), vec!["abc".to_string()]);
    assert!(state
        .research_steps
        .iter()
        .any(|s| s == "Searched for: abc"));
}

/// The iteration ceiling terminates a section even when the engine keeps
/// emitting queries.
#[tokio::test]
async fn iteration_ceiling_bounds_the_research_loop() {
    let engine = Arc::new(MockGenerationEngine::with_responses([
        MockGenerationEngine::text_response("1. Only Section\n   All the details.\n"),
        MockGenerationEngine::text_response("1. query one"),
        MockGenerationEngine::text_response("1. query two"),
        MockGenerationEngine::text_response("1. query three"),
        // Budget now exhausted: the machine must go to write without
        // consuming another query-generation response.
        MockGenerationEngine::text_response("Section text."),
        MockGenerationEngine::text_response("Report."),
    ]));
    let provider = Arc::new(RecordingProvider::default());
    let workflow = ResearchWorkflow::new(engine, provider.clone(), config(3));

    let mut state = RunState::new("Topic", 3);
    workflow.run_with_state(&mut state).await.unwrap();

    assert_eq!(provider.queries.lock().unwrap().len(), 3);
    assert_eq!(state.completed_sections.len(), 1);
    assert_eq!(state.completed_sections[0].content, "Section text.");
}

/// A plan where no section requires research compiles directly.
#[tokio::test]
async fn all_prewritten_plan_skips_research_entirely() {
    let engine = Arc::new(MockGenerationEngine::with_responses([
        MockGenerationEngine::text_response(
            "1. Intro\n   Opening remarks.\n   Research: false\n\n\
             2. Outro\n   Closing remarks.\n   Research: no\n",
        ),
        MockGenerationEngine::text_response("Report from placeholders."),
    ]));
    let provider = Arc::new(RecordingProvider::default());
    let workflow = ResearchWorkflow::new(engine, provider.clone(), config(3));

    let mut state = RunState::new("Topic", 3);
    let report = workflow.run_with_state(&mut state).await.unwrap();

    assert!(provider.queries.lock().unwrap().is_empty());
    assert_eq!(state.completed_sections.len(), 2);
    assert!(report.contains("Report from placeholders."));
}
