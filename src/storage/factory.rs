//! Backend factory.
//!
//! Creates the appropriate backend client based on configuration.

use std::sync::Arc;

use tracing::warn;

use crate::config::{BackendConfig, BackendKind};
use crate::error::BackendError;
use crate::storage::memory::MemoryBackend;
use crate::storage::redis::RedisBackend;
use crate::storage::traits::KvBackend;

/// Create a backend client based on configuration.
///
/// The Redis pool connects lazily; an unreachable server is reported as a
/// warning here and surfaces as request failures later.
///
/// # Errors
///
/// Returns an error if the client cannot be constructed.
pub async fn create_backend(config: &BackendConfig) -> Result<Arc<dyn KvBackend>, BackendError> {
    match config.kind {
        BackendKind::Redis => {
            let backend = RedisBackend::new(config)?;

            if let Err(e) = backend.health_check().await {
                warn!(address = %config.address, error = %e, "Redis not reachable at startup");
            }

            Ok(Arc::new(backend))
        }
        BackendKind::Memory => Ok(Arc::new(MemoryBackend::new())),
    }
}
