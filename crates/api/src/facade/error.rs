//! Facade error taxonomy.

use jobdeck_core::DomainError;
use jobdeck_infra::{SearchError, StoreError};

/// Every way a facade operation can fail.
///
/// Validation failures never reach the store. Store failures carry the
/// store's own message. `Batch` is the single failure reported for a bulk
/// creation, pointing at the first item that failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FacadeError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Store(String),

    #[error("{source}")]
    Batch {
        index: usize,
        #[source]
        source: Box<FacadeError>,
    },
}

impl FacadeError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// The failure that decides how this error is classified.
    pub fn root(&self) -> &FacadeError {
        match self {
            FacadeError::Batch { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<DomainError> for FacadeError {
    fn from(err: DomainError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<StoreError> for FacadeError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => Self::NotFound(err.to_string()),
            other => Self::Store(other.to_string()),
        }
    }
}

impl From<SearchError> for FacadeError {
    fn from(err: SearchError) -> Self {
        Self::Store(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobdeck_core::JobId;

    #[test]
    fn store_not_found_keeps_its_own_class() {
        let err: FacadeError = StoreError::NotFound(JobId::new(4)).into();
        assert_eq!(err, FacadeError::NotFound("job 4 not found".to_string()));

        let err: FacadeError = StoreError::Backend("connection reset".into()).into();
        assert!(matches!(err, FacadeError::Store(_)));
    }

    #[test]
    fn batch_reports_the_item_message() {
        let err = FacadeError::Batch {
            index: 2,
            source: Box::new(FacadeError::validation("Must provide job type")),
        };
        assert_eq!(err.to_string(), "Must provide job type");
        assert!(matches!(err.root(), FacadeError::Validation(_)));
    }
}
