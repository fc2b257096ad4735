//! Metrics collection using metrics-rs.

use metrics::{Counter, Histogram, Unit, counter, histogram};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::execution::ExecutionMode;

/// Whether metrics have been initialized.
static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

const TERMINAL_OPS: &str = "rivulet_terminal_ops";
const TERMINAL_ERRORS: &str = "rivulet_terminal_errors";
const TERMINAL_TIME_NS: &str = "rivulet_terminal_time_ns";
const LANES_SPAWNED: &str = "rivulet_lanes_spawned";
const STAGE_ERRORS: &str = "rivulet_stage_errors";
const BARRIER_MERGES: &str = "rivulet_barrier_merges";

/// Initialize metrics descriptions.
///
/// Call this once at application startup, after installing a recorder.
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init_metrics() {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        return;
    }

    metrics::describe_counter!(
        TERMINAL_OPS,
        Unit::Count,
        "Terminal operations started, by operation and mode"
    );
    metrics::describe_counter!(
        TERMINAL_ERRORS,
        Unit::Count,
        "Terminal operations that returned an error"
    );
    metrics::describe_histogram!(
        TERMINAL_TIME_NS,
        Unit::Nanoseconds,
        "Wall time of one terminal operation"
    );
    metrics::describe_counter!(
        LANES_SPAWNED,
        Unit::Count,
        "Lanes handed to a worker pool"
    );
    metrics::describe_counter!(
        STAGE_ERRORS,
        Unit::Count,
        "User closures that returned an error"
    );
    metrics::describe_counter!(
        BARRIER_MERGES,
        Unit::Count,
        "Barrier stages that merged parallel lanes"
    );
}

/// Record lanes handed to a worker pool.
#[inline]
pub fn record_lanes_spawned(lanes: usize) {
    counter!(LANES_SPAWNED).increment(lanes as u64);
}

/// Record a failed user closure.
#[inline]
pub fn record_stage_error(stage: &str) {
    counter!(STAGE_ERRORS, "stage" => stage.to_string()).increment(1);
}

/// Record a barrier stage merging parallel lanes.
#[inline]
pub fn record_barrier_merge(stage: &str) {
    counter!(BARRIER_MERGES, "stage" => stage.to_string()).increment(1);
}

/// Metrics for one terminal operation.
///
/// Counts the call on creation; time and errors are recorded by the caller.
pub struct TerminalMetrics {
    op: &'static str,
    errors: Counter,
    time: Histogram,
}

impl TerminalMetrics {
    /// Count a terminal operation starting.
    pub fn start(op: &'static str, mode: ExecutionMode) -> Self {
        let mode = mode.to_string();
        counter!(TERMINAL_OPS, "op" => op, "mode" => mode.clone()).increment(1);
        Self {
            op,
            errors: counter!(TERMINAL_ERRORS, "op" => op, "mode" => mode.clone()),
            time: histogram!(TERMINAL_TIME_NS, "op" => op, "mode" => mode),
        }
    }

    /// Record a failure.
    #[inline]
    pub fn record_error(&self) {
        self.errors.increment(1);
    }

    /// Record elapsed time.
    #[inline]
    pub fn record_time(&self, duration: Duration) {
        self.time.record(duration.as_nanos() as f64);
    }

    /// Start a timer and return a guard that records on drop.
    pub fn start_timer(&self) -> TimerGuard<'_> {
        TimerGuard {
            start: Instant::now(),
            metrics: self,
        }
    }

    /// Get the operation name.
    pub fn op(&self) -> &'static str {
        self.op
    }
}

/// Guard that records elapsed time when dropped.
pub struct TimerGuard<'a> {
    start: Instant,
    metrics: &'a TerminalMetrics,
}

impl Drop for TimerGuard<'_> {
    fn drop(&mut self) {
        self.metrics.record_time(self.start.elapsed());
    }
}
