//! Request identifier generation.
//!
//! Identifiers use the Sonyflake layout:
//!
//! ```text
//! | 39 bits elapsed time (10ms units) | 8 bits sequence | 16 bits machine id |
//! ```
//!
//! Values are time ordered and unique per process as long as the wall clock
//! does not move backwards.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::config::GeneratorConfig;

/// Bits reserved for elapsed time.
pub const TIME_BITS: u32 = 39;
/// Bits reserved for the per-tick sequence.
pub const SEQUENCE_BITS: u32 = 8;
/// Bits reserved for the machine id.
pub const MACHINE_BITS: u32 = 16;

/// Duration of one time unit in milliseconds.
const TICK_MILLIS: i64 = 10;

const SEQUENCE_MASK: u16 = (1 << SEQUENCE_BITS) - 1;
const MAX_ELAPSED: i64 = (1 << TIME_BITS) - 1;

/// Identifier generation failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeneratorError {
    /// Wall clock reading is earlier than a previous one.
    #[error("clock moved backwards by {behind_ms}ms")]
    ClockMovedBackwards {
        /// How far behind the latest reading the clock is.
        behind_ms: i64,
    },

    /// Elapsed time no longer fits in the time field.
    #[error("identifier time range exhausted")]
    OverTimeLimit,

    /// Configured start time is after the current time.
    #[error("start time {0} is in the future")]
    StartTimeInFuture(DateTime<Utc>),
}

/// Source of wall clock time in milliseconds since the Unix epoch.
pub trait Clock: Send + Sync {
    /// Current time in milliseconds.
    fn now_millis(&self) -> i64;
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now_millis(&self) -> i64 {
        (**self).now_millis()
    }
}

/// System wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Manually driven clock for tests and simulations.
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    /// Create a clock fixed at the given time.
    #[must_use]
    pub const fn new(millis: i64) -> Self {
        Self {
            millis: AtomicI64::new(millis),
        }
    }

    /// Set the current time.
    pub fn set(&self, millis: i64) {
        self.millis.store(millis, Ordering::SeqCst);
    }

    /// Move the clock forward (or backward with a negative delta).
    pub fn advance(&self, delta_ms: i64) {
        self.millis.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.millis.load(Ordering::SeqCst)
    }
}

/// Source of request identifiers, as seen by the handlers.
pub trait IdSource: Send + Sync {
    /// Produce the next identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if no identifier can be produced.
    fn next_id(&self) -> Result<u64, GeneratorError>;
}

#[derive(Debug, Default)]
struct GeneratorState {
    /// Tick encoded in the last identifier.
    elapsed: i64,
    /// Sequence encoded in the last identifier.
    sequence: u16,
    /// Latest clock reading, in ticks.
    observed: i64,
}

/// Process-wide identifier generator.
///
/// Safe to share across tasks behind an `Arc`.
pub struct IdGenerator<C: Clock = SystemClock> {
    clock: C,
    /// Start time in ticks since the Unix epoch.
    start_tick: i64,
    machine_id: u16,
    state: Mutex<GeneratorState>,
}

impl IdGenerator<SystemClock> {
    /// Create a generator from configuration using the system clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured start time is in the future.
    pub fn from_config(config: &GeneratorConfig) -> Result<Self, GeneratorError> {
        Self::with_clock(SystemClock, config.start_time, config.machine_id)
    }
}

impl<C: Clock> IdGenerator<C> {
    /// Create a generator with an explicit clock.
    ///
    /// # Errors
    ///
    /// Returns an error if `start_time` is later than the clock's current time.
    pub fn with_clock(
        clock: C,
        start_time: DateTime<Utc>,
        machine_id: u16,
    ) -> Result<Self, GeneratorError> {
        let start_millis = start_time.timestamp_millis();
        if start_millis > clock.now_millis() {
            return Err(GeneratorError::StartTimeInFuture(start_time));
        }

        Ok(Self {
            clock,
            start_tick: start_millis.div_euclid(TICK_MILLIS),
            machine_id,
            state: Mutex::new(GeneratorState::default()),
        })
    }

    /// Produce the next identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the clock moved backwards since the last call or
    /// the time field is exhausted. No retry is attempted.
    pub fn next_id(&self) -> Result<u64, GeneratorError> {
        let current = self.clock.now_millis().div_euclid(TICK_MILLIS) - self.start_tick;

        let mut state = self.state.lock();

        if current < state.observed {
            return Err(GeneratorError::ClockMovedBackwards {
                behind_ms: (state.observed - current) * TICK_MILLIS,
            });
        }
        state.observed = current;

        if state.elapsed < current {
            state.elapsed = current;
            state.sequence = 0;
        } else {
            state.sequence = (state.sequence + 1) & SEQUENCE_MASK;
            if state.sequence == 0 {
                // Sequence exhausted for this tick: borrow the next one.
                state.elapsed += 1;
            }
        }

        if state.elapsed > MAX_ELAPSED {
            return Err(GeneratorError::OverTimeLimit);
        }

        Ok(self.compose(state.elapsed, state.sequence))
    }

    #[allow(clippy::cast_sign_loss)]
    fn compose(&self, elapsed: i64, sequence: u16) -> u64 {
        ((elapsed as u64) << (SEQUENCE_BITS + MACHINE_BITS))
            | (u64::from(sequence) << MACHINE_BITS)
            | u64::from(self.machine_id)
    }
}

impl<C: Clock> IdSource for IdGenerator<C> {
    fn next_id(&self) -> Result<u64, GeneratorError> {
        Self::next_id(self)
    }
}

/// Split an identifier into `(elapsed_ticks, sequence, machine_id)`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn decompose(id: u64) -> (u64, u16, u16) {
    let elapsed = id >> (SEQUENCE_BITS + MACHINE_BITS);
    let sequence = ((id >> MACHINE_BITS) as u16) & SEQUENCE_MASK;
    let machine = id as u16;
    (elapsed, sequence, machine)
}
