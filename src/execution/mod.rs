//! Execution strategies: sequential pull and split/merge parallel.
//!
//! Every evaluation runs over one or more *lanes*. A lane is a chain of
//! stage cursors rooted at one sub-range of the source.
//!
//! - **Sequential**: exactly one lane, driven on the calling thread.
//! - **Parallel**: splittable sources are cut into balanced sub-ranges, one
//!   lane each. Lanes run on a [`WorkerPool`] and their partial results are
//!   merged in lane order, so ordered sources keep their encounter order
//!   wherever the terminal operation asks for it.
//!
//! Lanes share nothing but a [`StopSignal`]. Short-circuiting terminal
//! operations and failing lanes raise it; lanes stop pulling new elements
//! once they see it. A lane that panics counts as a failing lane.

mod config;
mod pool;

pub use config::{ExecutorConfig, MIN_SPLIT_LEN_ENV, PARALLELISM_ENV};
pub use pool::{InlinePool, Task, ThreadPool, WorkerPool};

use pool::panic_message;

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{Error, Result};
use crate::observability;
use crate::source::BoxSource;
use crate::stage::{BoxCursor, SourceCursor};

/// How a pipeline is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// One lane on the calling thread.
    #[default]
    Sequential,
    /// Split sources across a worker pool.
    Parallel,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequential => f.write_str("sequential"),
            Self::Parallel => f.write_str("parallel"),
        }
    }
}

/// A shared cutoff telling lanes to stop pulling.
///
/// The signal holds the lowest lane index that must stop; every lane at or
/// above it stops. [`raise`](Self::raise) stops all lanes,
/// [`raise_after`](Self::raise_after) only the lanes after a given one.
/// Lanes already inside a stage finish the element they hold but never start
/// another once they are cut off.
#[derive(Debug, Clone)]
pub struct StopSignal(Arc<AtomicUsize>);

impl Default for StopSignal {
    fn default() -> Self {
        Self(Arc::new(AtomicUsize::new(usize::MAX)))
    }
}

impl StopSignal {
    /// Create a signal in the lowered state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tell every lane sharing this signal to stop.
    pub fn raise(&self) {
        self.0.store(0, Ordering::Release);
    }

    /// Tell every lane after `lane` to stop. Lanes up to `lane` keep going.
    pub fn raise_after(&self, lane: usize) {
        self.0.fetch_min(lane.saturating_add(1), Ordering::AcqRel);
    }

    /// Whether every lane has been told to stop.
    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire) == 0
    }

    /// Whether `lane` has been told to stop.
    pub fn stops(&self, lane: usize) -> bool {
        lane >= self.0.load(Ordering::Acquire)
    }
}

/// Mode plus the knobs a pipeline carries into evaluation.
#[derive(Clone)]
pub(crate) struct Strategy {
    pub(crate) mode: ExecutionMode,
    pub(crate) config: ExecutorConfig,
    pub(crate) pool: Option<Arc<dyn WorkerPool>>,
}

impl Default for Strategy {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::Sequential,
            config: ExecutorConfig::process_default(),
            pool: None,
        }
    }
}

impl Strategy {
    pub(crate) fn with_mode(&self, mode: ExecutionMode) -> Self {
        Self {
            mode,
            ..self.clone()
        }
    }
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Strategy")
            .field("mode", &self.mode)
            .field("config", &self.config)
            .field("pool", &self.pool.as_ref().map(|p| p.name().to_string()))
            .finish()
    }
}

/// Per-evaluation state: the pool, the lane count and the stop signal.
pub(crate) struct EvalContext {
    mode: ExecutionMode,
    lanes: usize,
    min_split_len: usize,
    pool: Option<Arc<dyn WorkerPool>>,
    stop: StopSignal,
}

impl EvalContext {
    pub(crate) fn new(strategy: &Strategy) -> Self {
        let pool = match strategy.mode {
            ExecutionMode::Sequential => None,
            ExecutionMode::Parallel => Some(strategy.pool.clone().unwrap_or_else(|| {
                Arc::new(ThreadPool::new(strategy.config.clone())) as Arc<dyn WorkerPool>
            })),
        };
        let lanes = pool.as_ref().map_or(1, |p| p.parallelism().max(1));
        Self {
            mode: strategy.mode,
            lanes,
            min_split_len: strategy.config.min_split_len.max(1),
            pool,
            stop: StopSignal::new(),
        }
    }

    pub(crate) fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub(crate) fn stop(&self) -> &StopSignal {
        &self.stop
    }

    /// Turn a source into lanes, splitting it when the strategy allows.
    pub(crate) fn split<T: Send + 'static>(&self, mut source: BoxSource<T>) -> Vec<BoxCursor<T>> {
        let mut rest = Vec::new();
        if self.lanes > 1 {
            let hint = source.size_hint();
            match hint.exact() {
                Some(len) => {
                    let parts = self.lanes.min(len / self.min_split_len).max(1);
                    rest = source.split_off(parts);
                    observability::trace_split(source.name(), len, rest.len() + 1);
                }
                None => observability::trace_fallback(source.name(), hint),
            }
        }

        std::iter::once(source)
            .chain(rest)
            .enumerate()
            .map(|(i, s)| Box::new(SourceCursor::new(s, i, self.stop.clone())) as BoxCursor<T>)
            .collect()
    }

    /// Run `f` over every lane and return the results in lane order.
    ///
    /// With more than one lane and a pool, lanes run on the pool. A failing
    /// or panicking lane raises the stop signal; the error of the lowest
    /// failing lane is returned, with a panic reported as
    /// [`Error::WorkerPanicked`] for its own lane.
    pub(crate) fn run_lanes<T, R, F>(&self, lanes: Vec<BoxCursor<T>>, f: F) -> Result<Vec<R>>
    where
        T: Send + 'static,
        R: Send,
        F: Fn(usize, BoxCursor<T>) -> Result<R> + Sync,
    {
        let pool = match &self.pool {
            Some(pool) if lanes.len() > 1 => pool,
            _ => {
                let mut out = Vec::with_capacity(lanes.len());
                for (i, lane) in lanes.into_iter().enumerate() {
                    match f(i, lane) {
                        Ok(r) => out.push(r),
                        Err(e) => {
                            self.stop.raise();
                            return Err(e);
                        }
                    }
                }
                return Ok(out);
            }
        };

        let n = lanes.len();
        observability::record_lanes_spawned(n);

        let (tx, rx) = kanal::unbounded::<(usize, Result<R>)>();
        let f = &f;
        let tasks: Vec<Task<'_>> = lanes
            .into_iter()
            .enumerate()
            .map(|(i, lane)| {
                let tx = tx.clone();
                let stop = self.stop.clone();
                Box::new(move || {
                    let result = catch_unwind(AssertUnwindSafe(|| f(i, lane))).unwrap_or_else(
                        |payload| Err(Error::WorkerPanicked(panic_message(payload.as_ref()))),
                    );
                    if result.is_err() {
                        stop.raise();
                    }
                    observability::trace_lane_done(i, result.is_ok());
                    // The receiver outlives every task.
                    let _ = tx.send((i, result));
                }) as Task<'_>
            })
            .collect();
        pool.execute(tasks)?;

        let mut slots: Vec<Option<Result<R>>> = (0..n).map(|_| None).collect();
        while let Ok(Some((i, result))) = rx.try_recv() {
            slots[i] = Some(result);
        }
        drop(tx);

        let mut out = Vec::with_capacity(n);
        for (i, slot) in slots.into_iter().enumerate() {
            match slot {
                Some(Ok(r)) => out.push(r),
                Some(Err(e)) => return Err(e),
                None => return Err(Error::WorkerPanicked(format!("lane {i} reported no result"))),
            }
        }
        Ok(out)
    }
}
