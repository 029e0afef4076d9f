//! OS signal handling.
//!
//! Signal interest is registered during startup so that a failure to install
//! handlers is a bootstrap error, not a silent hang at shutdown time.

use std::io;

use tokio::signal;
use tracing::warn;

/// Signal that triggered shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownTrigger {
    /// SIGINT / Ctrl+C.
    Interrupt,
    /// SIGTERM.
    Terminate,
}

impl std::fmt::Display for ShutdownTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Interrupt => write!(f, "SIGINT"),
            Self::Terminate => write!(f, "SIGTERM"),
        }
    }
}

/// Registered interest in interrupt and termination signals.
pub struct ShutdownSignals {
    #[cfg(unix)]
    interrupt: signal::unix::Signal,
    #[cfg(unix)]
    terminate: signal::unix::Signal,
}

impl ShutdownSignals {
    /// Register signal handlers.
    ///
    /// # Errors
    ///
    /// Returns an error if the handlers cannot be installed.
    #[cfg(unix)]
    pub fn install() -> io::Result<Self> {
        use signal::unix::{SignalKind, signal};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    /// Register signal handlers.
    ///
    /// # Errors
    ///
    /// Never fails on this platform; Ctrl+C is registered on first wait.
    #[cfg(not(unix))]
    pub fn install() -> io::Result<Self> {
        Ok(Self {})
    }

    /// Wait for the first shutdown signal.
    ///
    /// Handlers stay installed for the process lifetime, so later signals are
    /// absorbed and have no effect.
    #[cfg(unix)]
    pub async fn recv(mut self) -> ShutdownTrigger {
        let trigger = tokio::select! {
            _ = self.interrupt.recv() => ShutdownTrigger::Interrupt,
            _ = self.terminate.recv() => ShutdownTrigger::Terminate,
        };
        warn!(signal = %trigger, "Received shutdown signal, initiating graceful shutdown");
        trigger
    }

    /// Wait for the first shutdown signal.
    #[cfg(not(unix))]
    pub async fn recv(self) -> ShutdownTrigger {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Ctrl+C handler failed");
            std::future::pending::<()>().await;
        }
        warn!(signal = %ShutdownTrigger::Interrupt, "Received shutdown signal, initiating graceful shutdown");
        ShutdownTrigger::Interrupt
    }

    /// Wait for a signal, discarding which one arrived.
    pub async fn wait(self) {
        let _ = self.recv().await;
    }
}
