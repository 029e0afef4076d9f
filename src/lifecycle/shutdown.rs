//! Serving and coordinated shutdown.
//!
//! State machine:
//!
//! ```text
//! Starting → Serving → Draining → Stopped
//! ```
//!
//! On the shutdown trigger the listener stops accepting, in-flight requests
//! get a bounded grace period, then the backend client is closed and a final
//! counter snapshot is logged.

use std::future::{Future, IntoFuture};
use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinError;
use tracing::{error, info, warn};

use crate::api::{AppState, create_router};
use crate::service::{Counter, MetricsSnapshot, spawn_notifier};

/// Lifecycle phase of a gateway instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Components constructed, listener not yet serving.
    Starting,
    /// Accepting and handling requests.
    Serving,
    /// No longer accepting; waiting for in-flight requests.
    Draining,
    /// Listener and backend closed.
    Stopped,
}

/// Errors that end a serve run.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    /// The HTTP server failed while serving or draining.
    #[error("HTTP server error: {0}")]
    Server(#[from] io::Error),

    /// The server task panicked or was cancelled.
    #[error("HTTP server task failed: {0}")]
    Task(#[from] JoinError),
}

/// Owns the listener lifecycle for one gateway instance.
pub struct Gateway {
    state: AppState,
    grace_period: Duration,
    lifecycle: watch::Sender<LifecycleState>,
}

impl Gateway {
    /// Create a gateway in the `Starting` state.
    #[must_use]
    pub fn new(state: AppState) -> Self {
        let grace_period = state.config.server.shutdown_grace_period();
        let (lifecycle, _) = watch::channel(LifecycleState::Starting);

        Self {
            state,
            grace_period,
            lifecycle,
        }
    }

    /// Override the drain grace period.
    #[must_use]
    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// Observe lifecycle transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.lifecycle.subscribe()
    }

    fn transition(&self, next: LifecycleState) {
        info!(state = ?next, "Lifecycle transition");
        self.lifecycle.send_replace(next);
    }

    /// Serve on `listener` until `shutdown` completes, then drain and close.
    ///
    /// Returns the final counter snapshot. The backend is closed on every
    /// path, including server failure.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP server failed while serving or draining.
    pub async fn serve<F>(
        self,
        listener: TcpListener,
        shutdown: F,
    ) -> Result<MetricsSnapshot, ServeError>
    where
        F: Future<Output = ()> + Send,
    {
        let metrics = Arc::clone(&self.state.metrics);
        let observability = &self.state.config.observability;
        let (drain_tx, drain_rx) = watch::channel(false);

        let notifier = observability.verbose.then(|| {
            spawn_notifier(
                Arc::clone(&metrics),
                Duration::from_secs(observability.metrics_interval_secs),
                drain_rx.clone(),
            )
        });

        let app = create_router(self.state.clone());
        let mut stop = drain_rx;
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            let _ = stop.wait_for(|draining| *draining).await;
        });
        let mut server_task = tokio::spawn(server.into_future());

        self.transition(LifecycleState::Serving);

        let early_exit = tokio::select! {
            () = shutdown => None,
            result = &mut server_task => Some(result),
        };

        self.transition(LifecycleState::Draining);
        let _ = drain_tx.send(true);

        let served = match early_exit {
            Some(result) => flatten(result),
            None => match tokio::time::timeout(self.grace_period, &mut server_task).await {
                Ok(result) => flatten(result),
                Err(_) => {
                    metrics.increment(Counter::Warnings);
                    warn!(
                        grace_period_secs = self.grace_period.as_secs(),
                        "Grace period elapsed, abandoning remaining connections"
                    );
                    server_task.abort();
                    let _ = server_task.await;
                    Ok(())
                }
            },
        };

        match &served {
            Ok(()) => info!("HTTP server shutdown complete"),
            Err(e) => error!(error = %e, "HTTP server shutdown error"),
        }

        match self.state.backend.close().await {
            Ok(()) => info!(
                backend = self.state.backend.backend_name(),
                "Backend client shutdown complete"
            ),
            Err(e) => error!(error = %e, "Backend client shutdown error"),
        }

        if let Some(notifier) = notifier {
            let _ = notifier.await;
        }

        let snapshot = metrics.snapshot();
        snapshot.log();
        self.transition(LifecycleState::Stopped);

        served.map(|()| snapshot)
    }
}

fn flatten(result: Result<io::Result<()>, JoinError>) -> Result<(), ServeError> {
    Ok(result??)
}
