//! In-memory backend.
//!
//! Used for local runs without a Redis server and as the test double: every
//! call is recorded so tests can assert what reached the backend.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;

use crate::error::{BackendError, BackendResult};
use crate::storage::traits::KvBackend;

/// A call observed by [`MemoryBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Set { key: String, value: String },
    Get { key: String },
    Delete { key: String },
    HealthCheck,
    Close,
}

/// Concurrent in-memory key-value store.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: DashMap<String, String>,
    calls: Mutex<Vec<BackendCall>>,
    closed: AtomicBool,
    unavailable: AtomicBool,
}

impl MemoryBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All calls received so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().clone()
    }

    /// Number of data commands (set/get/delete) received.
    #[must_use]
    pub fn command_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| {
                matches!(
                    call,
                    BackendCall::Set { .. } | BackendCall::Get { .. } | BackendCall::Delete { .. }
                )
            })
            .count()
    }

    /// Whether `close` has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Make every subsequent command fail as if the pool were exhausted.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn record(&self, call: BackendCall) -> BackendResult<()> {
        self.calls.lock().push(call);

        if self.closed.load(Ordering::SeqCst) {
            return Err(BackendError::Closed);
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(BackendError::Pool("no connection available".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl KvBackend for MemoryBackend {
    async fn set(&self, key: &str, value: &str) -> BackendResult<()> {
        self.record(BackendCall::Set {
            key: key.to_string(),
            value: value.to_string(),
        })?;
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get(&self, key: &str) -> BackendResult<Option<String>> {
        self.record(BackendCall::Get {
            key: key.to_string(),
        })?;
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn delete(&self, key: &str) -> BackendResult<u64> {
        self.record(BackendCall::Delete {
            key: key.to_string(),
        })?;
        Ok(u64::from(self.entries.remove(key).is_some()))
    }

    async fn health_check(&self) -> BackendResult<()> {
        self.record(BackendCall::HealthCheck)
    }

    async fn close(&self) -> BackendResult<()> {
        self.calls.lock().push(BackendCall::Close);
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
