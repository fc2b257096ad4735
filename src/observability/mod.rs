//! Observability features: metrics and tracing.
//!
//! - **Metrics**: Counters and histograms via `metrics-rs`
//! - **Tracing**: Structured logging and spans via `tracing`
//!
//! ## Metrics
//!
//! | Metric | Type | Description |
//! |--------|------|-------------|
//! | `rivulet_terminal_ops` | Counter | Terminal operations started (`op`, `mode`) |
//! | `rivulet_terminal_errors` | Counter | Terminal operations that failed (`op`, `mode`) |
//! | `rivulet_terminal_time_ns` | Histogram | Wall time per terminal operation |
//! | `rivulet_lanes_spawned` | Counter | Lanes handed to a worker pool |
//! | `rivulet_stage_errors` | Counter | User closures that returned an error (`stage`) |
//! | `rivulet_barrier_merges` | Counter | Barrier stages that merged lanes (`stage`) |
//!
//! ## Tracing
//!
//! Every terminal operation runs inside a `terminal` span. Source splits,
//! single-lane fallbacks and barrier merges are logged at `debug`, lane
//! completion at `trace`, failures at `error`.
//!
//! ## Example
//!
//! ```rust
//! use rivulet::observability::init_metrics;
//!
//! // Install a recorder (prometheus, statsd, ...) first, then:
//! init_metrics();
//! ```

mod metrics;
mod tracing_support;

pub use self::metrics::{
    TerminalMetrics, TimerGuard, init_metrics, record_barrier_merge, record_lanes_spawned,
    record_stage_error,
};
pub use self::tracing_support::{
    instrument_terminal, span_terminal, trace_barrier, trace_error, trace_fallback,
    trace_lane_done, trace_split,
};
