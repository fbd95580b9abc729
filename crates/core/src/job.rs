//! Job model and store-facing draft.

use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::id::JobId;

/// Lifecycle state of a job as tracked by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    /// Queued, waiting for a worker
    Inactive,
    /// Currently being processed
    Active,
    /// Finished successfully
    Complete,
    /// Exhausted its attempts
    Failed,
    /// Waiting for its delay to elapse
    Delayed,
}

impl JobState {
    pub const ALL: [JobState; 5] = [
        JobState::Inactive,
        JobState::Active,
        JobState::Complete,
        JobState::Failed,
        JobState::Delayed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Inactive => "inactive",
            JobState::Active => "active",
            JobState::Complete => "complete",
            JobState::Failed => "failed",
            JobState::Delayed => "delayed",
        }
    }
}

impl core::fmt::Display for JobState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobState {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobState::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("invalid state: {s}")))
    }
}

/// Ordinal priority. Lower values are picked up first by the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Priority(i64);

impl Priority {
    pub const LOW: Priority = Priority(10);
    pub const NORMAL: Priority = Priority(0);
    pub const MEDIUM: Priority = Priority(-5);
    pub const HIGH: Priority = Priority(-10);
    pub const CRITICAL: Priority = Priority(-15);

    pub fn new(level: i64) -> Self {
        Self(level)
    }

    pub fn level(&self) -> i64 {
        self.0
    }

    /// Resolve one of the named levels (`low`, `normal`, `medium`, `high`, `critical`).
    pub fn from_name(name: &str) -> Result<Self, DomainError> {
        match name.to_lowercase().as_str() {
            "low" => Ok(Self::LOW),
            "normal" => Ok(Self::NORMAL),
            "medium" => Ok(Self::MEDIUM),
            "high" => Ok(Self::HIGH),
            "critical" => Ok(Self::CRITICAL),
            _ => Err(DomainError::validation(format!("invalid priority: {name}"))),
        }
    }
}

/// Retry delay strategy applied by the store between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// Fixed delay between retries
    Fixed,
    /// Exponential backoff: delay * 2^attempt
    Exponential,
}

/// Explicit backoff policy: `{"type": "fixed", "delay": 5000}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackoffPolicy {
    #[serde(rename = "type")]
    pub strategy: BackoffStrategy,
    /// Base delay in milliseconds; the job's own delay is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<u64>,
}

/// Backoff descriptor as accepted from callers and stored on the job.
///
/// `true` means "fixed backoff using the job delay".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Backoff {
    Enabled(bool),
    Policy(BackoffPolicy),
}

/// Attempt bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attempts {
    pub made: u32,
    pub max: u32,
}

impl Attempts {
    pub fn remaining(&self) -> u32 {
        self.max.saturating_sub(self.made)
    }
}

/// A job as persisted by the store.
///
/// The facade never keeps one of these between requests; every read goes
/// back to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    #[serde(rename = "type")]
    pub job_type: String,
    pub data: serde_json::Value,
    pub state: JobState,
    pub priority: Priority,
    pub attempts: Attempts,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backoff: Option<Backoff>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,
    #[serde(default)]
    pub remove_on_complete: bool,
    #[serde(default)]
    pub search_keys: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Attempts granted when the caller does not ask for more.
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 1;

    /// Move the job to another state.
    pub fn set_state(&mut self, state: JobState) {
        self.state = state;
        self.updated_at = Utc::now();
    }

    /// Change the job priority.
    pub fn set_priority(&mut self, priority: Priority) {
        self.priority = priority;
        self.updated_at = Utc::now();
    }
}

/// A job that has not been saved yet.
///
/// Every option is `None` until a caller sets it; the store fills in its own
/// defaults in [`JobDraft::into_job`].
#[derive(Debug, Clone, PartialEq)]
pub struct JobDraft {
    pub job_type: String,
    pub data: serde_json::Value,
    pub priority: Option<Priority>,
    pub attempts: Option<u32>,
    pub delay: Option<u64>,
    pub backoff: Option<Backoff>,
    pub ttl: Option<u64>,
    pub remove_on_complete: Option<bool>,
    pub search_keys: Option<Vec<String>>,
}

impl JobDraft {
    pub fn new(job_type: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            job_type: job_type.into(),
            data,
            priority: None,
            attempts: None,
            delay: None,
            backoff: None,
            ttl: None,
            remove_on_complete: None,
            search_keys: None,
        }
    }

    pub fn attempts(mut self, attempts: u32) -> Self {
        self.attempts = Some(attempts);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Delay in milliseconds before the job becomes eligible.
    pub fn delay(mut self, delay_ms: u64) -> Self {
        self.delay = Some(delay_ms);
        self
    }

    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = Some(backoff);
        self
    }

    /// Maximum active time in milliseconds.
    pub fn ttl(mut self, ttl_ms: u64) -> Self {
        self.ttl = Some(ttl_ms);
        self
    }

    pub fn remove_on_complete(mut self, remove: bool) -> Self {
        self.remove_on_complete = Some(remove);
        self
    }

    pub fn search_keys(mut self, keys: Vec<String>) -> Self {
        self.search_keys = Some(keys);
        self
    }

    /// Materialize the draft with store defaults for everything left unset.
    ///
    /// A delayed job starts in `delayed`, everything else in `inactive`.
    pub fn into_job(self, id: JobId, now: DateTime<Utc>) -> Job {
        let state = match self.delay {
            Some(delay) if delay > 0 => JobState::Delayed,
            _ => JobState::Inactive,
        };

        Job {
            id,
            job_type: self.job_type,
            data: self.data,
            state,
            priority: self.priority.unwrap_or_default(),
            attempts: Attempts {
                made: 0,
                max: self.attempts.unwrap_or(Job::DEFAULT_MAX_ATTEMPTS),
            },
            delay: self.delay,
            backoff: self.backoff,
            ttl: self.ttl,
            remove_on_complete: self.remove_on_complete.unwrap_or(false),
            search_keys: self.search_keys.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn state_names_round_trip_through_from_str() {
        for state in JobState::ALL {
            assert_eq!(state.as_str().parse::<JobState>().unwrap(), state);
        }
        assert!(matches!("paused".parse::<JobState>(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn named_priorities_resolve() {
        assert_eq!(Priority::from_name("high").unwrap(), Priority::new(-10));
        assert_eq!(Priority::from_name("Critical").unwrap(), Priority::CRITICAL);
        assert!(Priority::from_name("urgent").is_err());
    }

    #[test]
    fn untouched_draft_gets_store_defaults() {
        let job = JobDraft::new("email", json!({"to": "a@b.c"})).into_job(JobId::new(1), Utc::now());

        assert_eq!(job.state, JobState::Inactive);
        assert_eq!(job.priority, Priority::NORMAL);
        assert_eq!(job.attempts, Attempts { made: 0, max: 1 });
        assert_eq!(job.delay, None);
        assert!(!job.remove_on_complete);
        assert!(job.search_keys.is_empty());
    }

    #[test]
    fn delayed_draft_starts_delayed() {
        let job = JobDraft::new("email", json!({}))
            .delay(5_000)
            .attempts(3)
            .into_job(JobId::new(2), Utc::now());

        assert_eq!(job.state, JobState::Delayed);
        assert_eq!(job.attempts.remaining(), 3);
    }

    #[test]
    fn job_json_uses_wire_names() {
        let job = JobDraft::new("email", json!({}))
            .remove_on_complete(true)
            .backoff(Backoff::Policy(BackoffPolicy {
                strategy: BackoffStrategy::Exponential,
                delay: None,
            }))
            .into_job(JobId::new(3), Utc::now());

        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["type"], "email");
        assert_eq!(value["state"], "inactive");
        assert_eq!(value["removeOnComplete"], true);
        assert_eq!(value["backoff"]["type"], "exponential");
        assert!(value.get("ttl").is_none());
    }

    #[test]
    fn backoff_accepts_bool_or_policy() {
        let enabled: Backoff = serde_json::from_value(json!(true)).unwrap();
        assert_eq!(enabled, Backoff::Enabled(true));

        let fixed: Backoff = serde_json::from_value(json!({"type": "fixed", "delay": 100})).unwrap();
        assert_eq!(
            fixed,
            Backoff::Policy(BackoffPolicy {
                strategy: BackoffStrategy::Fixed,
                delay: Some(100)
            })
        );
    }
}
