//! Search dispatch — concurrent query fan-out with graceful degradation.
//!
//! The dispatcher issues a batch of queries concurrently against the search
//! provider, normalizes the raw results, and falls back to sequential
//! per-query execution when the batch itself fails. Search failures never
//! propagate past this module: a failed query yields an empty result list.

use crate::config::{SearchConfig, SearchProviderKind};
use crate::error::SearchError;
use crate::types::{ResultMap, SearchResult};
use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// A raw, un-normalized result as returned by a provider.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSearchResult {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub raw_content: Option<String>,
}

/// Trait for search capability providers.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Execute a single query.
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<RawSearchResult>, SearchError>;

    /// Execute a batch of queries concurrently.
    ///
    /// The default implementation fans out via `join_all` and fails the
    /// whole batch on the first per-query error; callers that need partial
    /// results use the dispatcher's sequential fallback.
    async fn search_batch(
        &self,
        queries: &[String],
        max_results: usize,
    ) -> Result<Vec<(String, Vec<RawSearchResult>)>, SearchError> {
        let futures = queries.iter().map(|q| self.search(q, max_results));
        let outcomes = join_all(futures).await;

        let mut batched = Vec::with_capacity(queries.len());
        for (query, outcome) in queries.iter().zip(outcomes) {
            batched.push((query.clone(), outcome?));
        }
        Ok(batched)
    }
}

// ---------------------------------------------------------------------------
// Providers
// ---------------------------------------------------------------------------

/// Offline provider returning a canned result per query.
///
/// Used for tests and keyless runs; keeps the workflow's control paths
/// exercisable without network access.
#[derive(Default)]
pub struct PlaceholderSearchProvider;

impl PlaceholderSearchProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SearchProvider for PlaceholderSearchProvider {
    async fn search(
        &self,
        query: &str,
        _max_results: usize,
    ) -> Result<Vec<RawSearchResult>, SearchError> {
        Ok(vec![RawSearchResult {
            title: Some(format!("Results for '{query}'")),
            url: None,
            content: Some(format!(
                "Found some information about '{query}' on this topic."
            )),
            raw_content: None,
        }])
    }
}

/// Tavily search API provider.
pub struct TavilySearchProvider {
    client: Client,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<RawSearchResult>,
}

impl TavilySearchProvider {
    /// Create a provider, reading the API key from the configured env var.
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        let api_key =
            std::env::var(&config.api_key_env).map_err(|_| SearchError::AuthFailed {
                var: config.api_key_env.clone(),
            })?;
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(15))
                .build()
                .map_err(|e| SearchError::BatchFailed {
                    message: format!("Failed to create HTTP client: {e}"),
                })?,
            api_key,
        })
    }
}

#[async_trait]
impl SearchProvider for TavilySearchProvider {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<RawSearchResult>, SearchError> {
        let body = serde_json::json!({
            "api_key": self.api_key,
            "query": query,
            "max_results": max_results,
            "include_raw_content": true,
        });

        let response = self
            .client
            .post("https://api.tavily.com/search")
            .json(&body)
            .send()
            .await
            .map_err(|e| SearchError::RequestFailed {
                query: query.to_string(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(SearchError::RequestFailed {
                query: query.to_string(),
                message: format!("HTTP {}", response.status()),
            });
        }

        let parsed: TavilyResponse =
            response
                .json()
                .await
                .map_err(|e| SearchError::ResponseParse {
                    message: e.to_string(),
                })?;
        Ok(parsed.results)
    }
}

/// Build the configured provider.
pub fn provider_from_config(
    config: &SearchConfig,
) -> Result<Arc<dyn SearchProvider>, SearchError> {
    match config.provider {
        SearchProviderKind::Placeholder => Ok(Arc::new(PlaceholderSearchProvider::new())),
        SearchProviderKind::Tavily => Ok(Arc::new(TavilySearchProvider::new(config)?)),
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Outcome of one dispatch: normalized results plus the trace and source
/// entries to append to the run state. Produced here, merged into the state
/// by the single control thread.
#[derive(Debug, Default)]
pub struct SearchOutcome {
    pub results: ResultMap,
    pub trace_entries: Vec<String>,
    pub source_entries: Vec<String>,
}

/// Dispatches query batches against a provider and normalizes the results.
pub struct SearchDispatcher {
    provider: Arc<dyn SearchProvider>,
    max_results_per_query: usize,
}

impl SearchDispatcher {
    pub fn new(provider: Arc<dyn SearchProvider>, max_results_per_query: usize) -> Self {
        Self {
            provider,
            max_results_per_query,
        }
    }

    /// Dispatch all queries concurrently, degrading to sequential per-query
    /// execution on batch failure. Never returns an error; a failed query
    /// yields an empty result list.
    pub async fn dispatch(&self, queries: &[String]) -> SearchOutcome {
        info!(query_count = queries.len(), "Dispatching search batch");

        let batched = match self
            .provider
            .search_batch(queries, self.max_results_per_query)
            .await
        {
            Ok(batched) => batched,
            Err(e) => {
                warn!(error = %e, "Batch search failed; falling back to sequential queries");
                self.sequential_fallback(queries).await
            }
        };

        let mut outcome = SearchOutcome::default();
        for (query, raw) in batched {
            let normalized: Vec<SearchResult> = raw
                .into_iter()
                .take(self.max_results_per_query)
                .map(normalize_result)
                .collect();
            debug!(query = %query, results = normalized.len(), "Search results normalized");

            outcome
                .trace_entries
                .push(format!("Searched for: {query}"));
            outcome
                .source_entries
                .push(format!("Search results for: {query}"));
            outcome.results.insert(query, normalized);
        }
        outcome
    }

    /// Issue each query individually; a per-query failure yields an empty
    /// result list rather than aborting the batch.
    async fn sequential_fallback(&self, queries: &[String]) -> Vec<(String, Vec<RawSearchResult>)> {
        let mut batched = Vec::with_capacity(queries.len());
        for query in queries {
            let results = match self.provider.search(query, self.max_results_per_query).await {
                Ok(results) => results,
                Err(e) => {
                    warn!(query = %query, error = %e, "Query failed; recording empty results");
                    Vec::new()
                }
            };
            batched.push((query.clone(), results));
        }
        batched
    }
}

/// Normalize a raw result, defaulting absent fields.
fn normalize_result(raw: RawSearchResult) -> SearchResult {
    let content = raw.content.unwrap_or_default();
    let full_content = raw.raw_content.unwrap_or_else(|| content.clone());
    SearchResult {
        title: raw.title.unwrap_or_else(|| "Untitled".to_string()),
        url: raw.url.unwrap_or_default(),
        content,
        full_content,
    }
}
