//! Configuration system for Rescribe.
//!
//! Uses `figment` for layered configuration: defaults -> user config file ->
//! workspace config file -> environment variables -> explicit overrides.
//! Configuration is loaded from `~/.config/rescribe/config.toml` and/or
//! `.rescribe/config.toml` in the workspace directory.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::prompts::DEFAULT_REPORT_STRUCTURE;

/// Top-level configuration for the Rescribe engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RescribeConfig {
    pub research: ResearchConfig,
    pub generation: GenerationConfig,
    pub search: SearchConfig,
}

/// Settings governing the research workflow itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchConfig {
    /// Template describing the desired shape of the final report.
    pub report_structure: String,
    /// Maximum query-generation/search cycles per section.
    pub max_search_iterations: usize,
    /// How many queries to request from the engine per iteration.
    pub queries_per_iteration: usize,
    /// Maximum results to keep per query.
    pub max_results_per_query: usize,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            report_structure: DEFAULT_REPORT_STRUCTURE.to_string(),
            max_search_iterations: 3,
            queries_per_iteration: 2,
            max_results_per_query: 5,
        }
    }
}

/// Settings for the generation engine (OpenAI-compatible endpoint).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub model: String,
    /// Base URL of an OpenAI-compatible chat completions endpoint.
    pub base_url: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    pub temperature: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            temperature: 0.0,
        }
    }
}

/// Which search provider to dispatch queries against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchProviderKind {
    /// Offline canned results; useful for tests and keyless runs.
    Placeholder,
    /// Tavily search API.
    Tavily,
}

/// Settings for the search capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub provider: SearchProviderKind,
    /// Environment variable holding the search API key.
    pub api_key_env: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            provider: SearchProviderKind::Placeholder,
            api_key_env: "TAVILY_API_KEY".to_string(),
        }
    }
}

/// Load configuration with figment layering.
///
/// Precedence (lowest to highest): defaults, user config file, workspace
/// config file, `RESCRIBE_`-prefixed environment variables
/// (e.g. `RESCRIBE_RESEARCH__MAX_SEARCH_ITERATIONS`), explicit overrides.
pub fn load_config(
    workspace: Option<&Path>,
    overrides: Option<&RescribeConfig>,
) -> Result<RescribeConfig, Box<figment::Error>> {
    let mut figment = Figment::from(Serialized::defaults(RescribeConfig::default()));

    // User-level config
    if let Some(config_dir) = directories::ProjectDirs::from("dev", "rescribe", "rescribe") {
        let user_config = config_dir.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    // Workspace-level config
    if let Some(ws) = workspace {
        let ws_config = ws.join(".rescribe").join("config.toml");
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    figment = figment.merge(Env::prefixed("RESCRIBE_").split("__"));

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    figment.extract().map_err(Box::new)
}
