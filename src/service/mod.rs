//! Service layer module.
//!
//! Identifier assignment and request counters shared by every handler.

pub mod identifier;
pub mod metrics;

pub use identifier::{Clock, GeneratorError, IdGenerator, IdSource, ManualClock, SystemClock};
pub use metrics::{Counter, MetricsRegistry, MetricsSnapshot, spawn_notifier};
