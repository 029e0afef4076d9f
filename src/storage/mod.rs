//! Backend client layer.
//!
//! Trait-based abstraction over the key-value store so the handlers never
//! depend on a concrete client.

pub mod factory;
pub mod memory;
pub mod redis;
pub mod traits;

pub use factory::create_backend;
pub use memory::{BackendCall, MemoryBackend};
pub use redis::RedisBackend;
pub use traits::KvBackend;
