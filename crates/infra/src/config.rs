//! Store configuration loading.
//!
//! Everything is read from the environment:
//!
//! - `USE_PERSISTENT_STORES`: `true` selects the Redis adapters (default `false`)
//! - `REDIS_URL`: default `redis://localhost:6379`
//! - `JOBDECK_KEY_PREFIX`: Redis key namespace, default `q`

const DEFAULT_REDIS_URL: &str = "redis://localhost:6379";
const DEFAULT_KEY_PREFIX: &str = "q";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be true or false, got {value:?}")]
    InvalidBool { var: &'static str, value: String },
    #[error("{var} must not be empty")]
    Empty { var: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub use_persistent: bool,
    pub redis_url: String,
    pub key_prefix: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            use_persistent: false,
            redis_url: DEFAULT_REDIS_URL.to_string(),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }
}

impl StoreConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable source (tests pass a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let use_persistent = match lookup("USE_PERSISTENT_STORES") {
            None => false,
            Some(value) => value
                .trim()
                .parse::<bool>()
                .map_err(|_| ConfigError::InvalidBool {
                    var: "USE_PERSISTENT_STORES",
                    value,
                })?,
        };

        let redis_url = lookup("REDIS_URL").unwrap_or_else(|| DEFAULT_REDIS_URL.to_string());

        let key_prefix = lookup("JOBDECK_KEY_PREFIX").unwrap_or_else(|| DEFAULT_KEY_PREFIX.to_string());
        if key_prefix.trim().is_empty() {
            return Err(ConfigError::Empty {
                var: "JOBDECK_KEY_PREFIX",
            });
        }

        Ok(Self {
            use_persistent,
            redis_url,
            key_prefix,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn defaults_to_in_memory() {
        assert_eq!(StoreConfig::from_lookup(lookup(&[])).unwrap(), StoreConfig::default());
    }

    #[test]
    fn reads_redis_settings() {
        let config = StoreConfig::from_lookup(lookup(&[
            ("USE_PERSISTENT_STORES", "true"),
            ("REDIS_URL", "redis://cache:6380"),
            ("JOBDECK_KEY_PREFIX", "jobs"),
        ]))
        .unwrap();

        assert!(config.use_persistent);
        assert_eq!(config.redis_url, "redis://cache:6380");
        assert_eq!(config.key_prefix, "jobs");
    }

    #[test]
    fn malformed_flag_is_an_error_not_a_default() {
        let err = StoreConfig::from_lookup(lookup(&[("USE_PERSISTENT_STORES", "yes")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBool { .. }));
    }
}
