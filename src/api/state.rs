//! Application state for Axum handlers.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::service::{GeneratorError, IdGenerator, IdSource, MetricsRegistry};
use crate::storage::traits::KvBackend;

/// Shared application state.
///
/// Cloned into every request; all members are reference counted.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Key-value backend client.
    pub backend: Arc<dyn KvBackend>,
    /// Request identifier source.
    pub ids: Arc<dyn IdSource>,
    /// Request counters for this instance.
    pub metrics: Arc<MetricsRegistry>,
}

impl AppState {
    /// Create a new application state with a fresh generator and registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier generator rejects its configuration.
    pub fn new(config: Arc<AppConfig>, backend: Arc<dyn KvBackend>) -> Result<Self, GeneratorError> {
        let ids: Arc<dyn IdSource> = Arc::new(IdGenerator::from_config(&config.generator)?);
        let metrics = Arc::new(MetricsRegistry::new());

        Ok(Self::from_parts(config, backend, ids, metrics))
    }

    /// Assemble state from existing components.
    #[must_use]
    pub const fn from_parts(
        config: Arc<AppConfig>,
        backend: Arc<dyn KvBackend>,
        ids: Arc<dyn IdSource>,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            config,
            backend,
            ids,
            metrics,
        }
    }
}
