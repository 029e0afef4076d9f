//! Command-line flags.
//!
//! Flags override values from configuration files and the environment.

use std::path::PathBuf;

use clap::Parser;

/// Human readable service name.
pub const APPLICATION_DESCRIPTION: &str = "Redis REST Gateway";

/// Redis REST Gateway
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "redis-rest-gateway", disable_version_flag = true)]
pub struct Cli {
    /// Address and port to listen on
    #[arg(long)]
    pub bind: Option<String>,

    /// Address and port of the Redis server
    #[arg(long)]
    pub redis_address: Option<String>,

    /// Redis database id
    #[arg(long)]
    pub redis_db: Option<u32>,

    /// Enable verbose output and periodic counter logging
    #[arg(long)]
    pub debug: bool,

    /// Show version
    #[arg(long)]
    pub version: bool,

    /// Configuration file (TOML); replaces config/default.toml lookup
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log output format: text or json
    #[arg(long)]
    pub log_format: Option<String>,

    /// Use the in-memory backend instead of Redis
    #[arg(long)]
    pub memory_backend: bool,

    /// Seconds to wait for in-flight requests on shutdown
    #[arg(long, value_name = "SECS")]
    pub shutdown_grace_period: Option<u64>,
}

/// Text printed for `--version`.
#[must_use]
pub fn version_text() -> String {
    format!(
        "{APPLICATION_DESCRIPTION}\nVersion: {}",
        env!("CARGO_PKG_VERSION")
    )
}
