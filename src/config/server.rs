//! Server configuration.

use std::time::Duration;

use config::ConfigError;
use serde::Deserialize;

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address and port to listen on (`host:port`).
    #[serde(default = "default_bind")]
    pub bind: String,

    /// How long in-flight requests may run after a shutdown signal.
    #[serde(default = "default_grace_period")]
    pub shutdown_grace_period_secs: u64,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

const fn default_grace_period() -> u64 {
    10
}

impl ServerConfig {
    /// Shutdown grace period as a `Duration`.
    #[must_use]
    pub const fn shutdown_grace_period(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_period_secs)
    }

    /// Validate the server configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `bind` is not `host:port` with a non-zero port.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match parse_port(&self.bind) {
            Some(0) => Err(ConfigError::Message("server.bind port cannot be 0".to_string())),
            Some(_) => Ok(()),
            None => Err(ConfigError::Message(format!(
                "server.bind must be host:port, got '{}'",
                self.bind
            ))),
        }
    }
}

/// Extract the port from a `host:port` string.
pub(crate) fn parse_port(address: &str) -> Option<u16> {
    let (host, port) = address.rsplit_once(':')?;
    if host.is_empty() {
        return None;
    }
    port.parse().ok()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            shutdown_grace_period_secs: 10,
        }
    }
}
