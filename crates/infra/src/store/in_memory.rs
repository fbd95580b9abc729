//! In-memory job store for tests/dev.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;

use jobdeck_core::{Job, JobDraft, JobId, JobState};

use super::{JobStore, StoreError, counters, take_range};
use crate::search::{InMemorySearchIndex, indexable_text};

#[derive(Debug, Default)]
struct Inner {
    last_id: u64,
    jobs: BTreeMap<JobId, Job>,
    types: BTreeSet<String>,
    logs: HashMap<JobId, Vec<String>>,
    work_time_ms: u64,
}

/// In-memory job store.
///
/// Mirrors the engine's observable behaviour closely enough for the facade:
/// sequential ids, state/type indexes ordered by priority, a types registry
/// that outlives the jobs, and optional feeding of a search index.
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    inner: RwLock<Inner>,
    search: Option<Arc<InMemorySearchIndex>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that indexes each job's `searchKeys` fields into `search`.
    pub fn with_search(search: Arc<InMemorySearchIndex>) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            search: Some(search),
        }
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Append a line to a job's log (engine side).
    pub fn append_log(&self, id: JobId, line: impl Into<String>) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        if !inner.jobs.contains_key(&id) {
            return Err(StoreError::NotFound(id));
        }
        inner.logs.entry(id).or_default().push(line.into());
        Ok(())
    }

    /// Account processing time (engine side).
    pub fn add_work_time(&self, ms: u64) -> Result<(), StoreError> {
        self.write()?.work_time_ms += ms;
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::Backend("job store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::Backend("job store lock poisoned".to_string()))
    }

    fn by_priority<'a>(jobs: impl Iterator<Item = &'a Job>) -> Vec<Job> {
        let mut result: Vec<Job> = jobs.cloned().collect();
        result.sort_by_key(|j| (j.priority, j.id));
        result
    }
}

#[async_trait::async_trait]
impl JobStore for InMemoryJobStore {
    async fn create(&self, draft: JobDraft) -> Result<Job, StoreError> {
        let job = {
            let mut inner = self.write()?;
            inner.last_id += 1;
            let job = draft.into_job(JobId::new(inner.last_id), Utc::now());
            inner.types.insert(job.job_type.clone());
            inner.jobs.insert(job.id, job.clone());
            job
        };

        if let Some(search) = &self.search {
            if !job.search_keys.is_empty() {
                search.index(job.id, &indexable_text(&job.data, &job.search_keys));
            }
        }

        Ok(job)
    }

    async fn get(&self, id: JobId) -> Result<Job, StoreError> {
        self.read()?
            .jobs
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn save(&self, job: &Job) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        match inner.jobs.get_mut(&job.id) {
            Some(existing) => {
                *existing = job.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(job.id)),
        }
    }

    async fn remove(&self, id: JobId) -> Result<(), StoreError> {
        {
            let mut inner = self.write()?;
            if inner.jobs.remove(&id).is_none() {
                return Err(StoreError::NotFound(id));
            }
            inner.logs.remove(&id);
        }

        if let Some(search) = &self.search {
            search.remove(id);
        }
        Ok(())
    }

    async fn range(&self, from: i64, to: i64, order: Option<&str>) -> Result<Vec<Job>, StoreError> {
        let jobs: Vec<Job> = self.read()?.jobs.values().cloned().collect();
        Ok(take_range(jobs, from, to, order))
    }

    async fn range_by_state(
        &self,
        state: JobState,
        from: i64,
        to: i64,
        order: Option<&str>,
    ) -> Result<Vec<Job>, StoreError> {
        let inner = self.read()?;
        let jobs = Self::by_priority(inner.jobs.values().filter(|j| j.state == state));
        Ok(take_range(jobs, from, to, order))
    }

    async fn range_by_type(
        &self,
        job_type: &str,
        state: JobState,
        from: i64,
        to: i64,
        order: Option<&str>,
    ) -> Result<Vec<Job>, StoreError> {
        let inner = self.read()?;
        let jobs = Self::by_priority(
            inner
                .jobs
                .values()
                .filter(|j| j.state == state && j.job_type == job_type),
        );
        Ok(take_range(jobs, from, to, order))
    }

    async fn card_by_type(&self, job_type: &str, state: JobState) -> Result<u64, StoreError> {
        let inner = self.read()?;
        let count = inner
            .jobs
            .values()
            .filter(|j| j.state == state && j.job_type == job_type)
            .count();
        Ok(count as u64)
    }

    async fn types(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.read()?.types.iter().cloned().collect())
    }

    async fn counter(&self, name: &str) -> Result<u64, StoreError> {
        let inner = self.read()?;
        let count_state = |state: JobState| inner.jobs.values().filter(|j| j.state == state).count() as u64;

        match name {
            counters::INACTIVE_COUNT => Ok(count_state(JobState::Inactive)),
            counters::COMPLETE_COUNT => Ok(count_state(JobState::Complete)),
            counters::ACTIVE_COUNT => Ok(count_state(JobState::Active)),
            counters::FAILED_COUNT => Ok(count_state(JobState::Failed)),
            counters::DELAYED_COUNT => Ok(count_state(JobState::Delayed)),
            counters::WORK_TIME => Ok(inner.work_time_ms),
            other => Err(StoreError::Backend(format!("unknown counter: {other}"))),
        }
    }

    async fn log(&self, id: JobId) -> Result<Vec<String>, StoreError> {
        let inner = self.read()?;
        if !inner.jobs.contains_key(&id) {
            return Err(StoreError::NotFound(id));
        }
        Ok(inner.logs.get(&id).cloned().unwrap_or_default())
    }
}
