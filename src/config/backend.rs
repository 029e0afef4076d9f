//! Backend configuration.

use config::ConfigError;
use serde::Deserialize;

use crate::config::server::parse_port;

/// Environment variable holding the backend credential.
pub const PASSWORD_ENV: &str = "REDIS_PASSWORD";

/// Backend client type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Redis server reached over a connection pool.
    #[default]
    Redis,
    /// Process-local store (development/testing).
    Memory,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Redis => write!(f, "redis"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

/// Key-value backend configuration.
#[derive(Clone, Deserialize)]
pub struct BackendConfig {
    /// Backend type.
    #[serde(default)]
    pub kind: BackendKind,

    /// Redis server address (`host:port`).
    #[serde(default = "default_address")]
    pub address: String,

    /// Redis database index.
    #[serde(default)]
    pub db: i64,

    /// Maximum pooled connections.
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// Connection and pool wait timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Credential, only ever taken from [`PASSWORD_ENV`].
    #[serde(skip)]
    pub password: Option<String>,
}

fn default_address() -> String {
    "127.0.0.1:6379".to_string()
}

const fn default_pool_size() -> usize {
    2000
}

const fn default_connect_timeout() -> u64 {
    5
}

impl BackendConfig {
    /// Validate the backend configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the Redis address, database index or pool size is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.kind == BackendKind::Memory {
            return Ok(());
        }

        if parse_port(&self.address).is_none_or(|port| port == 0) {
            return Err(ConfigError::Message(format!(
                "backend.address must be host:port, got '{}'",
                self.address
            )));
        }
        if self.db < 0 {
            return Err(ConfigError::Message(
                "backend.db cannot be negative".to_string(),
            ));
        }
        if self.pool_size == 0 {
            return Err(ConfigError::Message(
                "backend.pool_size cannot be 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("kind", &self.kind)
            .field("address", &self.address)
            .field("db", &self.db)
            .field("pool_size", &self.pool_size)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::Redis,
            address: default_address(),
            db: 0,
            pool_size: 2000,
            connect_timeout_secs: 5,
            password: None,
        }
    }
}
