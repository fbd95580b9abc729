//! Caller-supplied job specifications.
//!
//! These types only describe the input shape. Turning a spec into a
//! [`JobDraft`](crate::job::JobDraft) is the ingestion pipeline's job.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::job::{Backoff, Priority};

/// One job to create: `{"type": "...", "data": {...}, "options": {...}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    #[serde(rename = "type", default)]
    pub job_type: Option<String>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub options: Option<JobOptions>,
}

/// Options bag. Absent fields are left to the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobOptions {
    #[serde(default)]
    pub attempts: Option<Integral>,
    #[serde(default)]
    pub priority: Option<PriorityValue>,
    /// Milliseconds.
    #[serde(default)]
    pub delay: Option<u64>,
    #[serde(default)]
    pub search_keys: Option<SearchKeys>,
    #[serde(default)]
    pub backoff: Option<Backoff>,
    #[serde(default)]
    pub remove_on_complete: Option<bool>,
    /// Milliseconds.
    #[serde(default)]
    pub ttl: Option<u64>,
}

/// An integer that may arrive as a JSON number or a decimal string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Integral {
    Number(i64),
    Text(String),
}

impl Integral {
    pub fn to_i64(&self) -> Result<i64, DomainError> {
        match self {
            Integral::Number(n) => Ok(*n),
            Integral::Text(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| DomainError::validation(format!("not an integer: {s:?}"))),
        }
    }
}

/// Priority as a raw level or one of the named levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriorityValue {
    Level(i64),
    Name(String),
}

impl PriorityValue {
    pub fn resolve(&self) -> Result<Priority, DomainError> {
        match self {
            PriorityValue::Level(level) => Ok(Priority::new(*level)),
            PriorityValue::Name(name) => match name.trim().parse::<i64>() {
                Ok(level) => Ok(Priority::new(level)),
                Err(_) => Priority::from_name(name),
            },
        }
    }
}

/// `searchKeys` accepts a single key or a list of keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SearchKeys {
    One(String),
    Many(Vec<String>),
}

impl SearchKeys {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            SearchKeys::One(key) => vec![key],
            SearchKeys::Many(keys) => keys,
        }
    }
}
