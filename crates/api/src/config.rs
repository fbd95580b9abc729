//! Server configuration.
//!
//! - `JOBDECK_ADDR`: listen address, default `0.0.0.0:3000`

use std::net::SocketAddr;

const DEFAULT_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("JOBDECK_ADDR is not a socket address: {0:?}")]
    InvalidAddr(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_addr(std::env::var("JOBDECK_ADDR").ok().as_deref())
    }

    fn from_addr(raw: Option<&str>) -> Result<Self, ConfigError> {
        let raw = raw.unwrap_or(DEFAULT_ADDR);
        let addr = raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidAddr(raw.to_string()))?;
        Ok(Self { addr })
    }
}
