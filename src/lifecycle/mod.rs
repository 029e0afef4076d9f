//! Lifecycle management.
//!
//! # Data Flow
//! ```text
//! Startup (lib.rs):
//!     Parse flags → Load config → Backend client → Signals → Bind listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain (bounded) → Close backend → Final counters
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::{Gateway, LifecycleState, ServeError};
pub use signals::{ShutdownSignals, ShutdownTrigger};
