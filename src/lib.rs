//! # Redis REST Gateway
//!
//! An HTTP/JSON gateway exposing create, read, update and delete operations,
//! each translated into a single command against a Redis server.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                              Gateway                                  │
//! ├──────────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐  ┌──────────────────┐  ┌─────────────┐              │
//! │  │  API Layer  │→ │  IdGenerator     │  │  Backend    │   (Redis)    │
//! │  │  (Axum)     │→ │  MetricsRegistry │  │  Layer      │ ───────────▶ │
//! │  └─────────────┘  └──────────────────┘  └─────────────┘              │
//! │  ┌────────────────────────────────────────────────────────────────┐  │
//! │  │ lifecycle: Starting → Serving → Draining → Stopped              │  │
//! │  └────────────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod lifecycle;
pub mod service;
pub mod storage;

use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use crate::api::state::AppState;
use crate::cli::Cli;
use crate::config::AppConfig;
use crate::lifecycle::{Gateway, ShutdownSignals};
use crate::storage::create_backend;

/// Run the gateway.
///
/// This function:
/// 1. Parses flags and loads configuration
/// 2. Initializes logging and the backend client
/// 3. Registers signal handlers and binds the listener
/// 4. Serves until SIGINT/SIGTERM, then drains and closes everything
///
/// # Errors
///
/// Returns an error if:
/// - Configuration cannot be loaded
/// - The backend client or identifier generator cannot be created
/// - Signal handlers cannot be installed or the listener fails to bind
/// - The HTTP server fails while serving
pub async fn run() -> anyhow::Result<()> {
    // .env is optional; it may carry REDIS_PASSWORD for local runs
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    if cli.version {
        println!("{}", cli::version_text());
        return Ok(());
    }

    // Load configuration
    let config = AppConfig::load(&cli)?;

    // Initialize logging
    init_logging(&config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting {}",
        cli::APPLICATION_DESCRIPTION
    );

    // Initialize backend client
    let backend = create_backend(&config.backend).await?;
    info!(
        backend = %config.backend.kind,
        address = %config.backend.address,
        db = config.backend.db,
        "Backend client initialized"
    );

    // Create application state
    let state = AppState::new(Arc::new(config.clone()), backend)?;

    let signals = ShutdownSignals::install()?;

    let listener = TcpListener::bind(config.server.bind.as_str()).await?;
    info!(addr = %listener.local_addr()?, "HTTP server listening");

    Gateway::new(state).serve(listener, signals.wait()).await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize logging based on configuration.
fn init_logging(config: &AppConfig) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.observability.effective_log_level()));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.observability.log_format == "json" {
        subscriber.with(fmt::layer().json()).init();
    } else {
        subscriber.with(fmt::layer()).init();
    }
}
