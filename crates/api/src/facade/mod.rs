//! The job facade: every operation the HTTP layer exposes, written against the
//! [`JobStore`] and [`SearchIndex`] seams.
//!
//! Handlers pass raw path/query strings in; all coercion happens here so a
//! malformed value is rejected before the store is consulted.

pub mod aggregate;
pub mod error;
pub mod ingest;
pub mod mutation;
pub mod query;
pub mod search;

#[cfg(test)]
pub(crate) mod testing;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use jobdeck_core::{Job, JobId, JobState};
use jobdeck_infra::store::counters;
use jobdeck_infra::{JobStore, SearchIndex};

pub use error::FacadeError;
pub use ingest::Created;
pub use query::{JobsQuery, QueryOutcome};

/// `{"message": "..."}` confirmation body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The six named counters, keyed by name.
pub type Stats = BTreeMap<&'static str, u64>;

#[derive(Clone)]
pub struct JobFacade {
    store: Arc<dyn JobStore>,
    search: Arc<dyn SearchIndex>,
}

impl JobFacade {
    pub fn new(store: Arc<dyn JobStore>, search: Arc<dyn SearchIndex>) -> Self {
        Self { store, search }
    }

    pub fn store(&self) -> &dyn JobStore {
        self.store.as_ref()
    }

    /// All six counters, read concurrently.
    pub async fn stats(&self) -> Result<Stats, FacadeError> {
        let store = self.store();
        let lookups = counters::ALL.into_iter().map(|name| (name, store.counter(name)));
        aggregate::gather(lookups).await.map_err(|e| {
            warn!(error = %e, "stats lookup failed");
            FacadeError::from(e)
        })
    }

    pub async fn types(&self) -> Result<Vec<String>, FacadeError> {
        Ok(self.store.types().await?)
    }

    /// Serve a `/jobs/...` path tail.
    pub async fn query(&self, tail: &str) -> Result<QueryOutcome, FacadeError> {
        let query = JobsQuery::from_path(tail)?;
        debug!(?query, "jobs query");
        query::run(self.store(), query).await
    }

    pub async fn job(&self, id: &str) -> Result<Job, FacadeError> {
        let id = mutation::parse_id(id)?;
        Ok(self.store.get(id).await?)
    }

    pub async fn log(&self, id: &str) -> Result<Vec<String>, FacadeError> {
        let id = mutation::parse_id(id)?;
        Ok(self.store.log(id).await?)
    }

    /// Create every spec in `body`.
    pub async fn create(&self, body: Value) -> Result<Vec<Created>, FacadeError> {
        ingest::ingest(self.store(), ingest::normalize(body)).await
    }

    pub async fn remove(&self, id: &str) -> Result<Message, FacadeError> {
        let id = mutation::parse_id(id)?;
        self.store.remove(id).await.map_err(|e| {
            warn!(%id, error = %e, "remove failed");
            FacadeError::from(e)
        })?;
        Ok(Message::new(format!("job {id} removed")))
    }

    pub async fn update_state(&self, id: &str, state: &str) -> Result<Message, FacadeError> {
        let id = mutation::parse_id(id)?;
        let state: JobState = state.parse()?;
        mutation::update_state(self.store(), id, state).await?;
        Ok(Message::new("updated state"))
    }

    pub async fn update_priority(&self, id: &str, priority: &str) -> Result<Message, FacadeError> {
        let priority = mutation::parse_priority(priority)?;
        let id = mutation::parse_id(id)?;
        mutation::update_priority(self.store(), id, priority).await?;
        Ok(Message::new("updated priority"))
    }

    /// Put a job back in the `inactive` state.
    pub async fn inactive(&self, id: &str) -> Result<Message, FacadeError> {
        let id = mutation::parse_id(id)?;
        mutation::update_state(self.store(), id, JobState::Inactive).await?;
        Ok(Message::new(format!("job {id} inactive")))
    }

    pub async fn search(&self, text: &str) -> Result<Vec<JobId>, FacadeError> {
        search::search(self.search.as_ref(), text).await
    }
}
