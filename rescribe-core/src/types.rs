//! Core type definitions for the Rescribe research engine.
//!
//! Defines the fundamental data structures threaded through the workflow:
//! conversation messages, generation responses, report sections, search
//! queries, and search results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a participant role in a generation-engine conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single message in a generation-engine prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a system message.
    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, text)
    }

    /// Create a user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    /// Create an assistant message.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }
}

/// Content of a generation-engine response.
///
/// A tagged variant rather than an optional attribute: routing on the
/// response shape is exhaustive and statically checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GenerationContent {
    /// Free-form text output.
    Text { text: String },
    /// An explicit request to invoke an external capability.
    CapabilityCall {
        name: String,
        arguments: serde_json::Value,
    },
}

impl GenerationContent {
    pub fn text(text: impl Into<String>) -> Self {
        GenerationContent::Text { text: text.into() }
    }

    pub fn capability_call(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        GenerationContent::CapabilityCall {
            name: name.into(),
            arguments,
        }
    }

    /// Returns the text of this content, if it is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            GenerationContent::Text { text } => Some(text),
            GenerationContent::CapabilityCall { .. } => None,
        }
    }
}

/// Response from a single generation-engine invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub content: GenerationContent,
    pub model: String,
}

impl GenerationResponse {
    /// The response text, or empty string for a pure capability call.
    pub fn text(&self) -> &str {
        self.content.as_text().unwrap_or("")
    }
}

/// One topical subdivision of the final report, independently researched
/// and written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub description: String,
    /// Written content; empty until the write stage runs.
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default = "default_true")]
    pub requires_research: bool,
}

fn default_true() -> bool {
    true
}

impl Section {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            content: String::new(),
            completed: false,
            requires_research: true,
        }
    }
}

/// A search query derived for one research iteration.
///
/// Consumed and discarded after a single search cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub text: String,
    /// Back-reference to the section this query was generated for.
    pub section_index: Option<usize>,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>, section_index: Option<usize>) -> Self {
        Self {
            text: text.into(),
            section_index,
        }
    }
}

/// A single normalized result from the search capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub content: String,
    /// Raw content; may equal `content` when the provider returns no
    /// separate full-text field.
    pub full_content: String,
}

/// Insertion-ordered map from query text to its search results.
///
/// Re-inserting an existing key replaces the value in place
/// (last-write-wins) without changing its position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultMap {
    entries: Vec<(String, Vec<SearchResult>)>,
}

impl ResultMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, query: impl Into<String>, results: Vec<SearchResult>) {
        let query = query.into();
        if let Some(entry) = self.entries.iter_mut().find(|(q, _)| *q == query) {
            entry.1 = results;
        } else {
            self.entries.push((query, results));
        }
    }

    pub fn get(&self, query: &str) -> Option<&[SearchResult]> {
        self.entries
            .iter()
            .find(|(q, _)| q == query)
            .map(|(_, r)| r.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[SearchResult])> {
        self.entries.iter().map(|(q, r)| (q.as_str(), r.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of results across all queries.
    pub fn result_count(&self) -> usize {
        self.entries.iter().map(|(_, r)| r.len()).sum()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Merge another map into this one, last-write-wins per key.
    pub fn merge(&mut self, other: ResultMap) {
        for (query, results) in other.entries {
            self.insert(query, results);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn result(title: &str) -> SearchResult {
        SearchResult {
            title: title.to_string(),
            url: String::new(),
            content: String::new(),
            full_content: String::new(),
        }
    }

    #[test]
    fn test_message_constructors() {
        let msg = Message::user("hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "hello");
    }

    #[test]
    fn test_generation_content_as_text() {
        let text = GenerationContent::text("plan");
        assert_eq!(text.as_text(), Some("plan"));

        let call = GenerationContent::capability_call("web_search", serde_json::json!({}));
        assert_eq!(call.as_text(), None);
    }

    #[test]
    fn test_result_map_preserves_insertion_order() {
        let mut map = ResultMap::new();
        map.insert("b", vec![result("1")]);
        map.insert("a", vec![result("2")]);
        let keys: Vec<&str> = map.iter().map(|(q, _)| q).collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn test_result_map_last_write_wins() {
        let mut map = ResultMap::new();
        map.insert("q", vec![result("old")]);
        map.insert("q", vec![result("new"), result("newer")]);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("q").unwrap().len(), 2);
        assert_eq!(map.get("q").unwrap()[0].title, "new");
    }

    #[test]
    fn test_result_map_merge() {
        let mut base = ResultMap::new();
        base.insert("a", vec![result("1")]);
        let mut incoming = ResultMap::new();
        incoming.insert("a", vec![result("2")]);
        incoming.insert("b", vec![]);
        base.merge(incoming);
        assert_eq!(base.len(), 2);
        assert_eq!(base.get("a").unwrap()[0].title, "2");
    }
}
