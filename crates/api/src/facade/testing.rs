//! Store double that records calls and injects failures.

use std::sync::Mutex;

use jobdeck_core::{Job, JobDraft, JobId, JobState};
use jobdeck_infra::{InMemoryJobStore, JobStore, StoreError};

/// Wraps an [`InMemoryJobStore`], logging each trait call as a string and
/// failing the calls it was told to fail.
#[derive(Default)]
pub struct ScriptedStore {
    inner: InMemoryJobStore,
    calls: Mutex<Vec<String>>,
    /// 1-based index of the `create` call that fails.
    fail_create_at: Option<usize>,
    fail_counter: Option<&'static str>,
    fail_save: bool,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_create_at(mut self, nth: usize) -> Self {
        self.fail_create_at = Some(nth);
        self
    }

    pub fn failing_counter(mut self, name: &'static str) -> Self {
        self.fail_counter = Some(name);
        self
    }

    pub fn failing_save(mut self) -> Self {
        self.fail_save = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> usize {
        let mut calls = self.calls.lock().unwrap();
        calls.push(call);
        calls.len()
    }

    fn creates_so_far(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with("create("))
            .count()
    }
}

#[async_trait::async_trait]
impl JobStore for ScriptedStore {
    async fn create(&self, draft: JobDraft) -> Result<Job, StoreError> {
        self.record(format!("create({})", draft.job_type));
        if self.fail_create_at == Some(self.creates_so_far()) {
            return Err(StoreError::Backend("disk full".to_string()));
        }
        self.inner.create(draft).await
    }

    async fn get(&self, id: JobId) -> Result<Job, StoreError> {
        self.record(format!("get({id})"));
        self.inner.get(id).await
    }

    async fn save(&self, job: &Job) -> Result<(), StoreError> {
        self.record(format!("save({})", job.id));
        if self.fail_save {
            return Err(StoreError::Backend("write conflict".to_string()));
        }
        self.inner.save(job).await
    }

    async fn remove(&self, id: JobId) -> Result<(), StoreError> {
        self.record(format!("remove({id})"));
        self.inner.remove(id).await
    }

    async fn range(&self, from: i64, to: i64, order: Option<&str>) -> Result<Vec<Job>, StoreError> {
        self.record(format!("range({from}, {to}, {order:?})"));
        self.inner.range(from, to, order).await
    }

    async fn range_by_state(
        &self,
        state: JobState,
        from: i64,
        to: i64,
        order: Option<&str>,
    ) -> Result<Vec<Job>, StoreError> {
        self.record(format!("range_by_state({state}, {from}, {to}, {order:?})"));
        self.inner.range_by_state(state, from, to, order).await
    }

    async fn range_by_type(
        &self,
        job_type: &str,
        state: JobState,
        from: i64,
        to: i64,
        order: Option<&str>,
    ) -> Result<Vec<Job>, StoreError> {
        self.record(format!("range_by_type({job_type}, {state}, {from}, {to}, {order:?})"));
        self.inner.range_by_type(job_type, state, from, to, order).await
    }

    async fn card_by_type(&self, job_type: &str, state: JobState) -> Result<u64, StoreError> {
        self.record(format!("card_by_type({job_type}, {state})"));
        self.inner.card_by_type(job_type, state).await
    }

    async fn types(&self) -> Result<Vec<String>, StoreError> {
        self.record("types()".to_string());
        self.inner.types().await
    }

    async fn counter(&self, name: &str) -> Result<u64, StoreError> {
        self.record(format!("counter({name})"));
        if self.fail_counter == Some(name) {
            return Err(StoreError::Backend(format!("{name} unavailable")));
        }
        self.inner.counter(name).await
    }

    async fn log(&self, id: JobId) -> Result<Vec<String>, StoreError> {
        self.record(format!("log({id})"));
        self.inner.log(id).await
    }
}
