//! Error types for the Rescribe core.
//!
//! Uses `thiserror` for public API error types with structured variants
//! covering generation, search, and configuration domains. Only generation
//! failures are fatal to a run; search failures are contained inside the
//! dispatcher.

/// Convenience result type for Rescribe operations.
pub type Result<T> = std::result::Result<T, RescribeError>;

/// Top-level error type for the Rescribe core library.
#[derive(Debug, thiserror::Error)]
pub enum RescribeError {
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors from generation-engine interactions.
///
/// Any of these surfaced from the plan or write stage aborts the run.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("API request failed: {message}")]
    ApiRequest { message: String },

    #[error("API response parse error: {message}")]
    ResponseParse { message: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("Generation engine unavailable: {message}")]
    Unavailable { message: String },

    #[error("Generation engine returned no usable content")]
    EmptyResponse,
}

/// Errors from search-provider interactions.
///
/// Never propagated past the search dispatcher; a failed query degrades to
/// an empty result list.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Search request failed for '{query}': {message}")]
    RequestFailed { query: String, message: String },

    #[error("Search response parse error: {message}")]
    ResponseParse { message: String },

    #[error("Batch dispatch failed: {message}")]
    BatchFailed { message: String },

    #[error("Search provider authentication failed: env var '{var}' not set")]
    AuthFailed { var: String },
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Environment variable not set: {var}")]
    EnvVarMissing { var: String },

    #[error("Configuration parse error: {message}")]
    ParseError { message: String },
}
