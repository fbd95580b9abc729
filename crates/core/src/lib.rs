//! `jobdeck-core`: job domain building blocks.
//!
//! This crate contains **pure domain** types (no store or transport concerns):
//! the job model as the store hands it back, the draft the facade hands to the
//! store, and the caller-supplied job specification.

pub mod error;
pub mod id;
pub mod job;
pub mod spec;

pub use error::DomainError;
pub use id::JobId;
pub use job::{Attempts, Backoff, BackoffPolicy, BackoffStrategy, Job, JobDraft, JobState, Priority};
pub use spec::{Integral, JobOptions, JobSpec, PriorityValue, SearchKeys};
