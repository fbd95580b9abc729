//! Bulk job creation.
//!
//! Items are handled strictly in input order and the first failure aborts the
//! batch. Jobs persisted before the failure stay persisted.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use jobdeck_core::{JobDraft, JobId, JobOptions, JobSpec};
use jobdeck_infra::JobStore;

use super::FacadeError;

pub const MISSING_TYPE: &str = "Must provide job type";

/// One entry of a successful creation response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Created {
    pub message: &'static str,
    pub id: JobId,
}

impl Created {
    fn new(id: JobId) -> Self {
        Self {
            message: "job created",
            id,
        }
    }
}

/// Flatten a request body into the list of raw specs it carries.
///
/// `null`, `{}` and `[]` carry nothing. An array is taken item by item;
/// anything else is a single spec.
pub fn normalize(body: Value) -> Vec<Value> {
    match body {
        Value::Null => Vec::new(),
        Value::Array(items) => items,
        Value::Object(map) if map.is_empty() => Vec::new(),
        other => vec![other],
    }
}

/// Validate one raw spec and build the draft it describes.
pub fn draft_from(raw: Value) -> Result<JobDraft, FacadeError> {
    let has_type = raw
        .get("type")
        .and_then(Value::as_str)
        .is_some_and(|t| !t.is_empty());
    if !has_type {
        return Err(FacadeError::validation(MISSING_TYPE));
    }

    let spec: JobSpec = serde_json::from_value(raw)
        .map_err(|e| FacadeError::validation(format!("invalid job spec: {e}")))?;
    let job_type = spec.job_type.unwrap_or_default();
    let data = spec.data.unwrap_or_else(|| Value::Object(Default::default()));

    let draft = JobDraft::new(job_type, data);
    match spec.options {
        Some(options) => apply_options(draft, options),
        None => Ok(draft),
    }
}

fn apply_options(mut draft: JobDraft, options: JobOptions) -> Result<JobDraft, FacadeError> {
    if let Some(attempts) = options.attempts {
        let attempts = u32::try_from(attempts.to_i64()?)
            .map_err(|_| FacadeError::validation("attempts must be a non-negative integer"))?;
        draft = draft.attempts(attempts);
    }
    if let Some(priority) = options.priority {
        draft = draft.priority(priority.resolve()?);
    }
    if let Some(delay) = options.delay {
        draft = draft.delay(delay);
    }
    if let Some(keys) = options.search_keys {
        draft = draft.search_keys(keys.into_vec());
    }
    if let Some(backoff) = options.backoff {
        draft = draft.backoff(backoff);
    }
    if let Some(remove) = options.remove_on_complete {
        draft = draft.remove_on_complete(remove);
    }
    if let Some(ttl) = options.ttl {
        draft = draft.ttl(ttl);
    }
    Ok(draft)
}

/// Create every spec in order, stopping at the first failure.
pub async fn ingest(store: &dyn JobStore, specs: Vec<Value>) -> Result<Vec<Created>, FacadeError> {
    let mut created = Vec::with_capacity(specs.len());

    for (index, raw) in specs.into_iter().enumerate() {
        let outcome = match draft_from(raw) {
            Ok(draft) => store.create(draft).await.map_err(|e| FacadeError::store(e.to_string())),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(job) => {
                debug!(index, id = %job.id, job_type = %job.job_type, "job created");
                created.push(Created::new(job.id));
            }
            Err(source) => {
                warn!(index, error = %source, "bulk creation aborted");
                return Err(FacadeError::Batch {
                    index,
                    source: Box::new(source),
                });
            }
        }
    }

    Ok(created)
}
