//! Request counters.
//!
//! A [`MetricsRegistry`] is owned by the gateway instance and shared with every
//! handler. Counters are only ever incremented, with relaxed atomic adds.

use std::fmt::Write as _;
use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

/// Counter categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Counter {
    /// Non-fatal anomalies (e.g. deleting a missing key).
    Warnings,
    /// Failed requests, excluding method rejections.
    Errors,
    /// Requests refused for using the wrong HTTP method.
    Rejected,
    /// Successful create operations.
    Create,
    /// Successful read operations.
    Read,
    /// Successful update operations.
    Update,
    /// Successful delete operations.
    Delete,
    /// Index banner hits.
    Index,
}

/// Point-in-time copy of all counters.
///
/// Counters are read one at a time, so a snapshot taken under load is not
/// guaranteed to be consistent across counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub warnings: i32,
    pub errors: i32,
    pub rejected: i32,
    pub create: i32,
    pub read: i32,
    pub update: i32,
    pub delete: i32,
    pub index: i32,
    pub started: DateTime<Utc>,
}

impl MetricsSnapshot {
    /// Emit the snapshot as a single structured log line.
    pub fn log(&self) {
        info!(
            warnings = self.warnings,
            errors = self.errors,
            rejected = self.rejected,
            create = self.create,
            read = self.read,
            update = self.update,
            delete = self.delete,
            index = self.index,
            started = %self.started.to_rfc3339(),
            "Counters"
        );
    }

    /// Render in the Prometheus text exposition format.
    #[must_use]
    pub fn render_prometheus(&self, now: DateTime<Utc>) -> String {
        let mut output = String::new();

        output.push_str("# HELP gateway_requests_total Successful requests by operation\n");
        output.push_str("# TYPE gateway_requests_total counter\n");
        for (operation, value) in [
            ("create", self.create),
            ("read", self.read),
            ("update", self.update),
            ("delete", self.delete),
        ] {
            let _ = writeln!(
                output,
                "gateway_requests_total{{operation=\"{operation}\"}} {value}"
            );
        }

        for (name, help, value) in [
            ("gateway_errors_total", "Failed requests", self.errors),
            ("gateway_warnings_total", "Non-fatal anomalies", self.warnings),
            (
                "gateway_rejected_total",
                "Requests rejected for wrong HTTP method",
                self.rejected,
            ),
            ("gateway_index_hits_total", "Index banner hits", self.index),
        ] {
            let _ = writeln!(output, "# HELP {name} {help}");
            let _ = writeln!(output, "# TYPE {name} counter");
            let _ = writeln!(output, "{name} {value}");
        }

        output.push_str("# HELP gateway_start_time_seconds Process start time\n");
        output.push_str("# TYPE gateway_start_time_seconds gauge\n");
        let _ = writeln!(
            output,
            "gateway_start_time_seconds {}",
            self.started.timestamp()
        );

        output.push_str("# HELP gateway_uptime_seconds Seconds since process start\n");
        output.push_str("# TYPE gateway_uptime_seconds gauge\n");
        let _ = writeln!(
            output,
            "gateway_uptime_seconds {}",
            (now - self.started).num_seconds().max(0)
        );

        output
    }
}

/// Atomic counter set owned by one gateway instance.
#[derive(Debug)]
pub struct MetricsRegistry {
    warnings: AtomicI32,
    errors: AtomicI32,
    rejected: AtomicI32,
    create: AtomicI32,
    read: AtomicI32,
    update: AtomicI32,
    delete: AtomicI32,
    index: AtomicI32,
    started: DateTime<Utc>,
}

impl MetricsRegistry {
    /// Create a registry with all counters at zero, started now.
    #[must_use]
    pub fn new() -> Self {
        Self::started_at(Utc::now())
    }

    /// Create a registry with an explicit start timestamp.
    #[must_use]
    pub const fn started_at(started: DateTime<Utc>) -> Self {
        Self {
            warnings: AtomicI32::new(0),
            errors: AtomicI32::new(0),
            rejected: AtomicI32::new(0),
            create: AtomicI32::new(0),
            read: AtomicI32::new(0),
            update: AtomicI32::new(0),
            delete: AtomicI32::new(0),
            index: AtomicI32::new(0),
            started,
        }
    }

    const fn slot(&self, counter: Counter) -> &AtomicI32 {
        match counter {
            Counter::Warnings => &self.warnings,
            Counter::Errors => &self.errors,
            Counter::Rejected => &self.rejected,
            Counter::Create => &self.create,
            Counter::Read => &self.read,
            Counter::Update => &self.update,
            Counter::Delete => &self.delete,
            Counter::Index => &self.index,
        }
    }

    /// Add one to a counter.
    pub fn increment(&self, counter: Counter) {
        self.slot(counter).fetch_add(1, Ordering::Relaxed);
    }

    /// Current value of a single counter.
    #[must_use]
    pub fn get(&self, counter: Counter) -> i32 {
        self.slot(counter).load(Ordering::Relaxed)
    }

    /// Read every counter.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            warnings: self.get(Counter::Warnings),
            errors: self.get(Counter::Errors),
            rejected: self.get(Counter::Rejected),
            create: self.get(Counter::Create),
            read: self.get(Counter::Read),
            update: self.get(Counter::Update),
            delete: self.get(Counter::Delete),
            index: self.get(Counter::Index),
            started: self.started,
        }
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawn a task that logs a snapshot every `period` until `shutdown` flips to `true`.
pub fn spawn_notifier(
    metrics: Arc<MetricsRegistry>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // First tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => metrics.snapshot().log(),
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
    })
}
