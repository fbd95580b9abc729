//! Job store collaborator.
//!
//! The store owns job persistence, id assignment, and the per-state/per-type
//! indexes that range queries walk. The facade talks to it only through
//! [`JobStore`], one async call per suspension point.

mod in_memory;
#[cfg(feature = "redis")]
mod redis;

pub use in_memory::InMemoryJobStore;
#[cfg(feature = "redis")]
pub use redis::RedisJobStore;

use jobdeck_core::{Job, JobDraft, JobId, JobState};

/// Named scalar counters the store exposes for statistics.
pub mod counters {
    pub const INACTIVE_COUNT: &str = "inactiveCount";
    pub const COMPLETE_COUNT: &str = "completeCount";
    pub const ACTIVE_COUNT: &str = "activeCount";
    pub const FAILED_COUNT: &str = "failedCount";
    pub const DELAYED_COUNT: &str = "delayedCount";
    /// Total milliseconds spent processing jobs.
    pub const WORK_TIME: &str = "workTime";

    /// Every counter, in the order the statistics endpoint reports them.
    pub const ALL: [&str; 6] = [
        INACTIVE_COUNT,
        COMPLETE_COUNT,
        ACTIVE_COUNT,
        FAILED_COUNT,
        DELAYED_COUNT,
        WORK_TIME,
    ];
}

/// Job store error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("job {0} not found")]
    NotFound(JobId),
    #[error("storage error: {0}")]
    Backend(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Async job store abstraction.
///
/// Ranges are inclusive index ranges over an ordered set, with negative
/// bounds counting from the end (`-1` is the last element). `order` is passed
/// through from the caller: `"desc"` walks the set backwards, anything else
/// (or `None`) walks it forwards.
#[async_trait::async_trait]
pub trait JobStore: Send + Sync {
    /// Assign an id to the draft and persist it.
    async fn create(&self, draft: JobDraft) -> Result<Job, StoreError>;

    /// Fetch a job by id.
    async fn get(&self, id: JobId) -> Result<Job, StoreError>;

    /// Persist changes to an existing job (state, priority).
    async fn save(&self, job: &Job) -> Result<(), StoreError>;

    /// Remove a job and its log.
    async fn remove(&self, id: JobId) -> Result<(), StoreError>;

    /// All jobs, in creation order.
    async fn range(&self, from: i64, to: i64, order: Option<&str>) -> Result<Vec<Job>, StoreError>;

    /// Jobs in `state`, by priority then creation order.
    async fn range_by_state(
        &self,
        state: JobState,
        from: i64,
        to: i64,
        order: Option<&str>,
    ) -> Result<Vec<Job>, StoreError>;

    /// Jobs of `job_type` in `state`, by priority then creation order.
    async fn range_by_type(
        &self,
        job_type: &str,
        state: JobState,
        from: i64,
        to: i64,
        order: Option<&str>,
    ) -> Result<Vec<Job>, StoreError>;

    /// Number of jobs of `job_type` in `state`.
    async fn card_by_type(&self, job_type: &str, state: JobState) -> Result<u64, StoreError>;

    /// Every job type the store has seen.
    async fn types(&self) -> Result<Vec<String>, StoreError>;

    /// Read one of the named [`counters`].
    async fn counter(&self, name: &str) -> Result<u64, StoreError>;

    /// Log lines recorded for a job.
    async fn log(&self, id: JobId) -> Result<Vec<String>, StoreError>;
}

/// Whether the caller asked for a reversed walk.
pub(crate) fn is_descending(order: Option<&str>) -> bool {
    matches!(order, Some(o) if o.eq_ignore_ascii_case("desc"))
}

/// Resolve inclusive, possibly negative `from..to` bounds against `len`
/// items the way Redis `ZRANGE` does. `None` means the range is empty.
pub(crate) fn resolve_range(len: usize, from: i64, to: i64) -> Option<(usize, usize)> {
    let len = len as i64;
    if len == 0 {
        return None;
    }
    let start = if from < 0 { (len + from).max(0) } else { from };
    let end = if to < 0 { len + to } else { to.min(len - 1) };
    if start > end || start >= len || end < 0 {
        return None;
    }
    Some((start as usize, end as usize))
}

/// Apply [`resolve_range`] and the order token to an already sorted list.
pub(crate) fn take_range<T>(mut items: Vec<T>, from: i64, to: i64, order: Option<&str>) -> Vec<T> {
    if is_descending(order) {
        items.reverse();
    }
    match resolve_range(items.len(), from, to) {
        Some((start, end)) => items.drain(start..=end).collect(),
        None => Vec::new(),
    }
}
