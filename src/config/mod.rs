//! Configuration management module.
//!
//! Supports loading configuration from:
//! - TOML files (config/default.toml, config/{profile}.toml, or `--config <path>`)
//! - Environment variables with `REDIS_GATEWAY__<SECTION>__<KEY>` pattern
//! - Command-line flags, which take precedence over everything else
//!
//! The backend credential is read from `REDIS_PASSWORD` only.

mod backend;
mod server;

use chrono::{DateTime, Utc};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;

pub use backend::{BackendConfig, BackendKind, PASSWORD_ENV};
pub use server::ServerConfig;

use crate::cli::Cli;

/// Routes served by the gateway that the metrics endpoint must not shadow.
const RESERVED_PATHS: [&str; 7] = [
    "/", "/health", "/ready", "/create", "/read", "/update", "/delete",
];

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Key-value backend configuration.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Identifier generator configuration.
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Load configuration from files, environment and command-line flags.
    ///
    /// Configuration is loaded in the following order (later sources override earlier):
    /// 1. `config/default.toml` and `config/{REDIS_GATEWAY_PROFILE}.toml`, or the
    ///    file given with `--config`
    /// 2. Environment variables with `REDIS_GATEWAY__` prefix
    /// 3. Command-line flags
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or is invalid.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Some(path) = &cli.config {
            builder = builder.add_source(File::from(path.as_path()).required(true));
        } else {
            let profile = std::env::var("REDIS_GATEWAY_PROFILE")
                .unwrap_or_else(|_| "development".to_string());
            builder = builder
                .add_source(File::with_name("config/default").required(false))
                .add_source(File::with_name(&format!("config/{profile}")).required(false));
        }

        // REDIS_GATEWAY__SERVER__BIND=0.0.0.0:8080 -> server.bind = "0.0.0.0:8080"
        builder = builder.add_source(
            Environment::with_prefix("REDIS_GATEWAY")
                .separator("__")
                .try_parsing(true),
        );

        let mut app_config = Self::from_builder(apply_cli_overrides(builder, cli)?)?;
        app_config.backend.password = std::env::var(PASSWORD_ENV).ok();
        app_config.validate()?;

        Ok(app_config)
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        builder.build()?.try_deserialize()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.backend.validate()?;

        if self.generator.machine_id == 0 {
            return Err(ConfigError::Message(
                "generator.machine_id cannot be 0".to_string(),
            ));
        }
        if self.generator.start_time > Utc::now() {
            return Err(ConfigError::Message(
                "generator.start_time cannot be in the future".to_string(),
            ));
        }

        self.observability.validate()
    }
}

fn apply_cli_overrides(
    builder: ConfigBuilder<DefaultState>,
    cli: &Cli,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let mut builder = builder
        .set_override_option("server.bind", cli.bind.clone())?
        .set_override_option("backend.address", cli.redis_address.clone())?
        .set_override_option("backend.db", cli.redis_db.map(i64::from))?
        .set_override_option("observability.log_format", cli.log_format.clone())?
        .set_override_option(
            "server.shutdown_grace_period_secs",
            cli.shutdown_grace_period
                .map(|secs| i64::try_from(secs).unwrap_or(i64::MAX)),
        )?;

    if cli.debug {
        builder = builder.set_override("observability.verbose", true)?;
    }
    if cli.memory_backend {
        builder = builder.set_override("backend.kind", "memory")?;
    }

    Ok(builder)
}

/// Identifier generator configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorConfig {
    /// Machine id embedded in the low 16 bits of every identifier; non-zero.
    #[serde(default = "default_machine_id")]
    pub machine_id: u16,

    /// Epoch for the identifier time field.
    #[serde(default = "default_start_time")]
    pub start_time: DateTime<Utc>,
}

const fn default_machine_id() -> u16 {
    1
}

fn default_start_time() -> DateTime<Utc> {
    // 2014-09-01T00:00:00Z
    DateTime::from_timestamp(1_409_529_600, 0).unwrap_or_default()
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            machine_id: default_machine_id(),
            start_time: default_start_time(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format: "text" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Verbose mode: debug logging and periodic counter logs.
    #[serde(default)]
    pub verbose: bool,

    /// Seconds between periodic counter logs.
    #[serde(default = "default_metrics_interval")]
    pub metrics_interval_secs: u64,

    /// Enable the metrics scrape endpoint.
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,

    /// Metrics endpoint path.
    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

const fn default_metrics_interval() -> u64 {
    60
}

const fn default_metrics_enabled() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl ObservabilityConfig {
    /// Level used for the log filter; verbose mode raises `info` to `debug`.
    #[must_use]
    pub fn effective_log_level(&self) -> &str {
        if self.verbose && self.log_level == "info" {
            "debug"
        } else {
            &self.log_level
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.log_format.as_str(), "text" | "json") {
            return Err(ConfigError::Message(format!(
                "observability.log_format must be 'text' or 'json', got '{}'",
                self.log_format
            )));
        }
        if self.metrics_interval_secs == 0 {
            return Err(ConfigError::Message(
                "observability.metrics_interval_secs cannot be 0".to_string(),
            ));
        }
        if !self.metrics_path.starts_with('/') || RESERVED_PATHS.contains(&self.metrics_path.as_str())
        {
            return Err(ConfigError::Message(format!(
                "observability.metrics_path '{}' is not usable",
                self.metrics_path
            )));
        }
        Ok(())
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            verbose: false,
            metrics_interval_secs: 60,
            metrics_enabled: true,
            metrics_path: default_metrics_path(),
        }
    }
}
