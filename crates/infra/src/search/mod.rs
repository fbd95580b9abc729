//! Full-text search collaborator.
//!
//! The index is built by the store side when jobs carry `searchKeys`; the
//! facade only ever queries it. A single handle is constructed at startup and
//! shared for the life of the process.

mod in_memory;
#[cfg(feature = "redis")]
mod redis;

pub use in_memory::InMemorySearchIndex;
#[cfg(feature = "redis")]
pub use redis::RedisSearchIndex;

use jobdeck_core::JobId;

/// Search index error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    #[error("search backend error: {0}")]
    Backend(String),
}

/// Async search index abstraction.
#[async_trait::async_trait]
pub trait SearchIndex: Send + Sync {
    /// Ids of jobs whose indexed text contains every word of `text`.
    async fn query(&self, text: &str) -> Result<Vec<JobId>, SearchError>;
}

/// Split text into lowercase alphanumeric words, deduplicated, in first-seen order.
pub(crate) fn words(text: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
    {
        if !out.contains(&word) {
            out.push(word);
        }
    }
    out
}

/// Text to index for a job: the string form of each payload field named in
/// `search_keys`, joined by spaces.
pub(crate) fn indexable_text(data: &serde_json::Value, search_keys: &[String]) -> String {
    search_keys
        .iter()
        .filter_map(|key| data.get(key))
        .map(|value| match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn words_are_lowercased_and_deduplicated() {
        assert_eq!(words("Hello, hello WORLD-42"), vec!["hello", "world", "42"]);
        assert!(words("  ,;  ").is_empty());
    }

    #[test]
    fn indexable_text_only_reads_search_keys() {
        let data = json!({"title": "Welcome mail", "to": "tj@example.com", "n": 3});
        let keys = vec!["title".to_string(), "n".to_string(), "missing".to_string()];
        assert_eq!(indexable_text(&data, &keys), "Welcome mail 3");
    }
}
