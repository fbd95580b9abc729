//! Fetch, mutate in memory, persist.
//!
//! There is no version check between the fetch and the save: two concurrent
//! updates of the same job race and the last save wins.

use tracing::{debug, warn};

use jobdeck_core::{Job, JobId, JobState, Priority};
use jobdeck_infra::JobStore;

use super::FacadeError;

pub fn parse_id(raw: &str) -> Result<JobId, FacadeError> {
    Ok(raw.parse::<JobId>()?)
}

/// Strict integer parse. Named levels are only accepted at creation time.
pub fn parse_priority(raw: &str) -> Result<Priority, FacadeError> {
    raw.trim()
        .parse::<i64>()
        .map(Priority::new)
        .map_err(|_| FacadeError::validation(format!("invalid priority: {raw:?}")))
}

/// Load job `id`, apply `mutate`, save it back.
pub async fn fetch_mutate_persist<F>(store: &dyn JobStore, id: JobId, mutate: F) -> Result<Job, FacadeError>
where
    F: FnOnce(&mut Job),
{
    let mut job = store.get(id).await.map_err(|e| {
        warn!(%id, error = %e, "fetch before update failed");
        FacadeError::from(e)
    })?;

    mutate(&mut job);

    store.save(&job).await.map_err(|e| {
        warn!(%id, error = %e, "persisting update failed");
        FacadeError::from(e)
    })?;

    debug!(%id, state = %job.state, priority = job.priority.level(), "job updated");
    Ok(job)
}

pub async fn update_state(store: &dyn JobStore, id: JobId, state: JobState) -> Result<Job, FacadeError> {
    fetch_mutate_persist(store, id, |job| job.set_state(state)).await
}

pub async fn update_priority(store: &dyn JobStore, id: JobId, priority: Priority) -> Result<Job, FacadeError> {
    fetch_mutate_persist(store, id, |job| job.set_priority(priority)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facade::testing::ScriptedStore;
    use jobdeck_core::JobDraft;
    use serde_json::json;

    async fn seeded() -> ScriptedStore {
        let store = ScriptedStore::new();
        store.create(JobDraft::new("email", json!({}))).await.unwrap();
        store
    }

    #[test]
    fn priority_must_be_an_integer() {
        assert_eq!(parse_priority("-10").unwrap(), Priority::HIGH);
        assert_eq!(parse_priority(" 3 ").unwrap(), Priority::new(3));
        assert!(matches!(parse_priority("high"), Err(FacadeError::Validation(_))));
        assert!(matches!(parse_priority("1.5"), Err(FacadeError::Validation(_))));
    }

    #[test]
    fn ids_must_be_numeric() {
        assert_eq!(parse_id("12").unwrap(), JobId::new(12));
        assert!(matches!(parse_id("abc"), Err(FacadeError::Validation(_))));
    }

    #[tokio::test]
    async fn state_change_is_persisted() {
        let store = seeded().await;
        let job = update_state(&store, JobId::new(1), JobState::Failed).await.unwrap();

        assert_eq!(job.state, JobState::Failed);
        assert_eq!(store.get(JobId::new(1)).await.unwrap().state, JobState::Failed);
        assert_eq!(
            store.range_by_state(JobState::Failed, 0, -1, None).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn priority_change_fetches_then_saves() {
        let store = seeded().await;
        update_priority(&store, JobId::new(1), Priority::CRITICAL).await.unwrap();

        assert_eq!(&store.calls()[1..], &["get(1)", "save(1)"]);
        assert_eq!(store.get(JobId::new(1)).await.unwrap().priority, Priority::CRITICAL);
    }

    #[tokio::test]
    async fn missing_job_is_not_found_and_nothing_is_saved() {
        let store = ScriptedStore::new();
        let err = update_state(&store, JobId::new(99), JobState::Active).await.unwrap_err();

        assert!(matches!(err, FacadeError::NotFound(_)));
        assert_eq!(store.calls(), vec!["get(99)"]);
    }

    #[tokio::test]
    async fn save_failure_is_surfaced() {
        let store = ScriptedStore::new().failing_save();
        store.create(JobDraft::new("email", json!({}))).await.unwrap();

        let err = update_state(&store, JobId::new(1), JobState::Complete).await.unwrap_err();
        assert_eq!(err, FacadeError::store("storage error: write conflict"));
        assert_eq!(store.get(JobId::new(1)).await.unwrap().state, JobState::Inactive);
    }

    #[tokio::test]
    async fn concurrent_updates_last_save_wins() {
        let store = seeded().await;
        let id = JobId::new(1);

        let mut stale = store.get(id).await.unwrap();
        update_priority(&store, id, Priority::HIGH).await.unwrap();
        stale.set_state(JobState::Active);
        store.save(&stale).await.unwrap();

        let job = store.get(id).await.unwrap();
        assert_eq!(job.state, JobState::Active);
        assert_eq!(job.priority, Priority::NORMAL);
    }
}
