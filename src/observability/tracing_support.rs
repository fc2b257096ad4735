//! Tracing integration for structured logging and spans.

use tracing::{Level, Span, span};

use crate::execution::ExecutionMode;
use crate::source::SizeHint;
use crate::stage::StageKind;

/// Create a span for one terminal operation.
///
/// # Example
///
/// ```rust
/// use rivulet::execution::ExecutionMode;
/// use rivulet::observability::span_terminal;
///
/// let span = span_terminal("count", ExecutionMode::Sequential);
/// let _guard = span.enter();
/// ```
#[inline]
pub fn span_terminal(op: &str, mode: ExecutionMode) -> Span {
    span!(Level::DEBUG, "terminal", op = %op, mode = %mode)
}

/// Enter a terminal span and return its guard.
pub fn instrument_terminal(op: &str, mode: ExecutionMode) -> tracing::span::EnteredSpan {
    span_terminal(op, mode).entered()
}

/// Log a source being split into lanes.
#[inline]
pub fn trace_split(source: &str, len: usize, lanes: usize) {
    tracing::debug!(source = %source, len = len, lanes = lanes, "source split");
}

/// Log a parallel evaluation falling back to one lane.
#[inline]
pub fn trace_fallback(source: &str, hint: SizeHint) {
    tracing::debug!(
        source = %source,
        size = ?hint,
        "source cannot split, evaluating on one lane"
    );
}

/// Log a barrier stage merging its lanes.
#[inline]
pub fn trace_barrier(stage: StageKind, lanes: usize, merged: usize) {
    tracing::debug!(stage = %stage, lanes = lanes, merged = merged, "barrier merged");
}

/// Log a lane finishing.
#[inline]
pub fn trace_lane_done(lane: usize, ok: bool) {
    tracing::trace!(lane = lane, ok = ok, "lane done");
}

/// Log a failed terminal operation.
#[inline]
pub fn trace_error(op: &str, error: &dyn std::error::Error) {
    tracing::error!(op = %op, error = %error, "terminal operation failed");
}
