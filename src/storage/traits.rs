//! Backend trait definitions.
//!
//! The gateway only needs three commands from the key-value store. Keeping
//! them behind a trait lets tests substitute a recording double for Redis.

use async_trait::async_trait;

use crate::error::BackendResult;

/// Key-value operations used by the request handlers.
///
/// Implementations own their connection pooling; callers borrow a connection
/// for the duration of a single call.
#[async_trait]
pub trait KvBackend: Send + Sync {
    /// Store `value` under `key`, replacing any previous value. No expiry.
    async fn set(&self, key: &str, value: &str) -> BackendResult<()>;

    /// Fetch the value stored under `key`.
    ///
    /// Returns `Ok(None)` when the key does not exist.
    async fn get(&self, key: &str) -> BackendResult<Option<String>>;

    /// Remove `key`, returning the number of keys removed (0 or 1).
    async fn delete(&self, key: &str) -> BackendResult<u64>;

    /// Check that the backend is reachable.
    async fn health_check(&self) -> BackendResult<()>;

    /// Release all pooled connections. Subsequent calls fail.
    async fn close(&self) -> BackendResult<()>;

    /// Get the backend name.
    fn backend_name(&self) -> &'static str;
}
