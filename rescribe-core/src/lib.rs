//! # Rescribe Core
//!
//! Core library for the Rescribe automated research engine.
//! Provides the workflow state machine, entity parser, search dispatcher,
//! section tracker, report compiler, configuration, and fundamental types.
//!
//! The entry point is [`ResearchWorkflow::run`]: given a topic, the state
//! machine plans report sections, iteratively gathers information per
//! section, writes each section, and compiles the final report.

pub mod compiler;
pub mod config;
pub mod engine;
pub mod error;
pub mod parser;
pub mod prompts;
pub mod search;
pub mod state;
pub mod tracker;
pub mod types;
pub mod workflow;

// Re-export commonly used types at the crate root.
pub use compiler::ReportCompiler;
pub use config::{
    GenerationConfig, RescribeConfig, ResearchConfig, SearchConfig, SearchProviderKind,
    load_config,
};
pub use engine::{
    GenerationEngine, MockGenerationEngine, OpenAiCompatibleEngine, SEARCH_CAPABILITY,
};
pub use error::{ConfigError, GenerationError, RescribeError, Result, SearchError};
pub use parser::EntityParser;
pub use search::{
    PlaceholderSearchProvider, RawSearchResult, SearchDispatcher, SearchOutcome, SearchProvider,
    TavilySearchProvider, provider_from_config,
};
pub use state::{RunState, WorkflowState};
pub use tracker::SectionTracker;
pub use types::{
    GenerationContent, GenerationResponse, Message, ResultMap, Role, SearchQuery, SearchResult,
    Section,
};
pub use workflow::ResearchWorkflow;
