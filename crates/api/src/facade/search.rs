//! Free-text search over indexed jobs.

use tracing::warn;

use jobdeck_core::JobId;
use jobdeck_infra::SearchIndex;

use super::FacadeError;

pub async fn search(index: &dyn SearchIndex, text: &str) -> Result<Vec<JobId>, FacadeError> {
    index.query(text).await.map_err(|e| {
        warn!(error = %e, "search query failed");
        FacadeError::from(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobdeck_infra::{InMemorySearchIndex, SearchError};

    struct Broken;

    #[async_trait::async_trait]
    impl SearchIndex for Broken {
        async fn query(&self, _text: &str) -> Result<Vec<JobId>, SearchError> {
            Err(SearchError::Backend("index offline".into()))
        }
    }

    #[tokio::test]
    async fn forwards_matches() {
        let index = InMemorySearchIndex::default();
        index.index(JobId::new(1), "Welcome email for Ada");
        index.index(JobId::new(2), "invoice email");

        assert_eq!(search(&index, "email").await.unwrap(), vec![JobId::new(1), JobId::new(2)]);
        assert_eq!(search(&index, "ada email").await.unwrap(), vec![JobId::new(1)]);
        assert!(search(&index, "").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn client_failure_is_surfaced() {
        let err = search(&Broken, "anything").await.unwrap_err();
        assert!(matches!(err, FacadeError::Store(_)));
    }
}
