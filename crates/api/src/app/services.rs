use std::sync::Arc;

use jobdeck_infra::{InMemoryJobStore, InMemorySearchIndex, JobStore, SearchIndex, StoreConfig};

use crate::facade::JobFacade;

#[cfg(feature = "redis")]
use jobdeck_infra::RedisJobStore;

/// Everything a handler needs, shared behind one `Arc`.
#[derive(Clone)]
pub struct AppServices {
    pub facade: JobFacade,
}

#[derive(Debug, thiserror::Error)]
pub enum ServicesError {
    #[error("failed to connect to redis: {0}")]
    Connect(String),
}

impl AppServices {
    pub fn new(store: Arc<dyn JobStore>, search: Arc<dyn SearchIndex>) -> Self {
        Self {
            facade: JobFacade::new(store, search),
        }
    }

    /// In-memory store feeding an in-memory search index (dev/test).
    pub fn in_memory() -> Self {
        let search = Arc::new(InMemorySearchIndex::new());
        let store = Arc::new(InMemoryJobStore::with_search(search.clone()));
        Self::new(store, search)
    }
}

/// Wire the store and search index selected by `config`.
pub async fn build_services(config: &StoreConfig) -> Result<AppServices, ServicesError> {
    if config.use_persistent {
        #[cfg(feature = "redis")]
        {
            return build_persistent_services(config).await;
        }
        #[cfg(not(feature = "redis"))]
        {
            tracing::warn!(
                "USE_PERSISTENT_STORES=true but redis feature not enabled, falling back to in-memory"
            );
            return Ok(AppServices::in_memory());
        }
    }

    Ok(AppServices::in_memory())
}

#[cfg(feature = "redis")]
async fn build_persistent_services(config: &StoreConfig) -> Result<AppServices, ServicesError> {
    let store = RedisJobStore::connect(&config.redis_url, config.key_prefix.clone())
        .await
        .map_err(|e| ServicesError::Connect(e.to_string()))?;
    let search = store
        .search_index()
        .ok_or_else(|| ServicesError::Connect("search index unavailable".to_string()))?;

    tracing::info!(prefix = %config.key_prefix, "using redis job store");
    Ok(AppServices::new(Arc::new(store), Arc::new(search)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn default_config_wires_in_memory_stores() {
        let services = build_services(&StoreConfig::default()).await.unwrap();
        assert!(services.facade.types().await.unwrap().is_empty());
    }
}
