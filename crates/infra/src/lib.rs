//! Infrastructure layer: the job store and search index collaborators, plus
//! the configuration that selects between their in-memory and Redis adapters.

pub mod config;
pub mod search;
pub mod store;

pub use config::{ConfigError, StoreConfig};
pub use search::{InMemorySearchIndex, SearchError, SearchIndex};
pub use store::{InMemoryJobStore, JobStore, StoreError};

#[cfg(feature = "redis")]
pub use search::RedisSearchIndex;
#[cfg(feature = "redis")]
pub use store::RedisJobStore;
