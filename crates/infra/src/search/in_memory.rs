//! In-memory search index for tests/dev.

use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

use jobdeck_core::JobId;

use super::{SearchError, SearchIndex, words};

/// Word → job ids inverted index.
#[derive(Debug, Default)]
pub struct InMemorySearchIndex {
    inner: RwLock<HashMap<String, BTreeSet<JobId>>>,
}

impl InMemorySearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index `text` under `id`.
    pub fn index(&self, id: JobId, text: &str) {
        if let Ok(mut map) = self.inner.write() {
            for word in words(text) {
                map.entry(word).or_default().insert(id);
            }
        }
    }

    /// Drop every entry for `id`.
    pub fn remove(&self, id: JobId) {
        if let Ok(mut map) = self.inner.write() {
            map.retain(|_word, ids| {
                ids.remove(&id);
                !ids.is_empty()
            });
        }
    }
}

#[async_trait::async_trait]
impl SearchIndex for InMemorySearchIndex {
    async fn query(&self, text: &str) -> Result<Vec<JobId>, SearchError> {
        let terms = words(text);
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let map = self
            .inner
            .read()
            .map_err(|_| SearchError::Backend("search index lock poisoned".to_string()))?;

        let mut matches: Option<BTreeSet<JobId>> = None;
        for term in &terms {
            let ids = map.get(term).cloned().unwrap_or_default();
            matches = Some(match matches {
                None => ids,
                Some(acc) => acc.intersection(&ids).copied().collect(),
            });
        }

        Ok(matches.unwrap_or_default().into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn query_requires_every_word() {
        let index = InMemorySearchIndex::new();
        index.index(JobId::new(1), "welcome email for tj");
        index.index(JobId::new(2), "password reset email");

        assert_eq!(index.query("email").await.unwrap(), vec![JobId::new(1), JobId::new(2)]);
        assert_eq!(index.query("EMAIL reset").await.unwrap(), vec![JobId::new(2)]);
        assert!(index.query("email invoice").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_query_matches_nothing() {
        let index = InMemorySearchIndex::new();
        index.index(JobId::new(1), "anything");
        assert!(index.query("").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn removed_jobs_stop_matching() {
        let index = InMemorySearchIndex::new();
        index.index(JobId::new(1), "report");
        index.index(JobId::new(2), "report");
        index.remove(JobId::new(1));

        assert_eq!(index.query("report").await.unwrap(), vec![JobId::new(2)]);
    }
}
