//! Range and listing query translation.
//!
//! Turns the raw path segments under `/jobs/` into a typed [`JobsQuery`] and
//! runs it against the store. Numeric bounds are parsed strictly: anything
//! that is not an integer is a validation failure and never reaches the store.

use serde::Serialize;

use jobdeck_core::{Job, JobState};
use jobdeck_infra::JobStore;

use super::FacadeError;

/// Separator between the two bounds of a range token (`0..10`).
const RANGE_SEPARATOR: &str = "..";

/// An inclusive index range plus the caller's order token, untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Range {
    pub from: i64,
    pub to: i64,
    pub order: Option<String>,
}

impl Range {
    pub fn parse(from: &str, to: &str, order: Option<&str>) -> Result<Self, FacadeError> {
        Ok(Self {
            from: parse_bound(from)?,
            to: parse_bound(to)?,
            order: order.map(str::to_string),
        })
    }

    /// Parse a `from..to` token.
    pub fn from_token(token: &str, order: Option<&str>) -> Result<Self, FacadeError> {
        let (from, to) = token
            .split_once(RANGE_SEPARATOR)
            .ok_or_else(|| FacadeError::validation(format!("invalid range: {token}")))?;
        Self::parse(from, to, order)
    }

    fn order(&self) -> Option<&str> {
        self.order.as_deref()
    }
}

pub fn parse_bound(raw: &str) -> Result<i64, FacadeError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| FacadeError::validation(format!("invalid range bound: {raw:?}")))
}

fn is_range(segment: &str) -> bool {
    segment.contains(RANGE_SEPARATOR)
}

/// Every query shape served under `/jobs/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobsQuery {
    /// `/jobs/:from..:to/:order?`
    All(Range),
    /// `/jobs/:state/:from..:to/:order?`
    ByState { state: JobState, range: Range },
    /// `/jobs/:type/:state/:from..:to/:order?`
    ByType {
        job_type: String,
        state: JobState,
        range: Range,
    },
    /// `/jobs/:type/:state/stats`
    Count { job_type: String, state: JobState },
}

impl JobsQuery {
    /// Classify path segments. A segment containing `..` is a range token;
    /// its position decides which shape the request has.
    pub fn from_segments(segments: &[&str]) -> Result<Self, FacadeError> {
        match segments {
            [range] => Ok(Self::All(Range::from_token(range, None)?)),
            [range, order] if is_range(range) => Ok(Self::All(Range::from_token(range, Some(*order))?)),
            [state, range] => Ok(Self::ByState {
                state: state.parse()?,
                range: Range::from_token(range, None)?,
            }),
            [state, range, order] if is_range(range) => Ok(Self::ByState {
                state: state.parse()?,
                range: Range::from_token(range, Some(*order))?,
            }),
            [job_type, state, "stats"] => Ok(Self::Count {
                job_type: job_type.to_string(),
                state: state.parse()?,
            }),
            [job_type, state, range] => Ok(Self::ByType {
                job_type: job_type.to_string(),
                state: state.parse()?,
                range: Range::from_token(range, None)?,
            }),
            [job_type, state, range, order] => Ok(Self::ByType {
                job_type: job_type.to_string(),
                state: state.parse()?,
                range: Range::from_token(range, Some(*order))?,
            }),
            _ => Err(FacadeError::NotFound(format!("no jobs query at /jobs/{}", segments.join("/")))),
        }
    }

    /// Split a raw `a/b/c` tail and classify it.
    pub fn from_path(tail: &str) -> Result<Self, FacadeError> {
        let segments: Vec<&str> = tail.split('/').filter(|s| !s.is_empty()).collect();
        Self::from_segments(&segments)
    }
}

/// `{"count": N}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Count {
    pub count: u64,
}

/// What a [`JobsQuery`] produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryOutcome {
    Jobs(Vec<Job>),
    Count(Count),
}

pub async fn run(store: &dyn JobStore, query: JobsQuery) -> Result<QueryOutcome, FacadeError> {
    let jobs = match query {
        JobsQuery::All(range) => store.range(range.from, range.to, range.order()).await?,
        JobsQuery::ByState { state, range } => {
            store
                .range_by_state(state, range.from, range.to, range.order())
                .await?
        }
        JobsQuery::ByType {
            job_type,
            state,
            range,
        } => {
            store
                .range_by_type(&job_type, state, range.from, range.to, range.order())
                .await?
        }
        JobsQuery::Count { job_type, state } => {
            let count = store.card_by_type(&job_type, state).await?;
            return Ok(QueryOutcome::Count(Count { count }));
        }
    };
    Ok(QueryOutcome::Jobs(jobs))
}
