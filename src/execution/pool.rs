//! Worker pools that run sub-range evaluations.
//!
//! The engine hands a pool a batch of independent tasks (one per sub-range)
//! and waits for all of them. Anything that can run a closure to completion
//! on some thread can back a pool: the bundled [`ThreadPool`] uses scoped OS
//! threads fed from a kanal queue, [`InlinePool`] runs everything on the
//! calling thread.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Mutex, PoisonError};

use super::ExecutorConfig;
use crate::error::{Error, Result};

/// A unit of work handed to a [`WorkerPool`].
pub type Task<'a> = Box<dyn FnOnce() + Send + 'a>;

/// Runs batches of independent tasks.
pub trait WorkerPool: Send + Sync {
    /// How many tasks this pool runs at once.
    ///
    /// The parallel strategy splits sources into at most this many sub-ranges.
    fn parallelism(&self) -> usize;

    /// Run every task to completion before returning.
    ///
    /// A panicking task must not stop the others; the first panic is
    /// reported as [`Error::WorkerPanicked`] once the batch is done.
    fn execute<'a>(&self, tasks: Vec<Task<'a>>) -> Result<()>;

    /// Get the name of this pool.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// A fixed-size pool of scoped worker threads.
///
/// Each `execute` call spawns up to `parallelism - 1` named threads; the
/// calling thread works the queue too. Tasks may borrow from the caller.
#[derive(Debug, Clone, Default)]
pub struct ThreadPool {
    config: ExecutorConfig,
}

impl ThreadPool {
    /// Create a pool from an executor config.
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    /// Create a pool with a fixed number of workers.
    pub fn with_workers(workers: usize) -> Self {
        Self::new(ExecutorConfig::default().with_parallelism(workers))
    }

    /// Get the pool configuration.
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }
}

impl WorkerPool for ThreadPool {
    fn parallelism(&self) -> usize {
        self.config.parallelism.max(1)
    }

    fn execute<'a>(&self, tasks: Vec<Task<'a>>) -> Result<()> {
        if tasks.is_empty() {
            return Ok(());
        }
        let workers = self.parallelism().min(tasks.len());

        let (tx, rx) = kanal::unbounded::<Task<'a>>();
        for task in tasks {
            tx.send(task)
                .map_err(|_| Error::WorkerPanicked("task queue closed before dispatch".into()))?;
        }

        let first_panic = Mutex::new(None);
        let drain = |rx: &kanal::Receiver<Task<'a>>| {
            while let Ok(Some(task)) = rx.try_recv() {
                if let Err(payload) = catch_unwind(AssertUnwindSafe(task)) {
                    let mut slot = first_panic.lock().unwrap_or_else(PoisonError::into_inner);
                    slot.get_or_insert_with(|| panic_message(payload.as_ref()));
                }
            }
        };

        std::thread::scope(|scope| {
            for i in 1..workers {
                let rx = rx.clone();
                let drain = &drain;
                let spawned = std::thread::Builder::new()
                    .name(format!("{}-{}", self.config.thread_name, i))
                    .spawn_scoped(scope, move || drain(&rx));
                if let Err(e) = spawned {
                    tracing::warn!(worker = i, error = %e, "failed to spawn worker, continuing with fewer");
                    break;
                }
            }
            drain(&rx);
        });
        drop(tx);

        match first_panic
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
        {
            Some(message) => Err(Error::WorkerPanicked(message)),
            None => Ok(()),
        }
    }

    fn name(&self) -> &str {
        &self.config.thread_name
    }
}

/// A pool that runs every task on the calling thread, in order.
///
/// Useful for deterministic tests of the parallel strategy: sources still
/// split and results still merge, but nothing runs concurrently.
#[derive(Debug, Clone)]
pub struct InlinePool {
    lanes: usize,
}

impl InlinePool {
    /// Create an inline pool that still splits sources `lanes` ways.
    pub fn new(lanes: usize) -> Self {
        Self {
            lanes: lanes.max(1),
        }
    }
}

impl WorkerPool for InlinePool {
    fn parallelism(&self) -> usize {
        self.lanes
    }

    fn execute<'a>(&self, tasks: Vec<Task<'a>>) -> Result<()> {
        let mut first_panic = None;
        for task in tasks {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(task)) {
                first_panic.get_or_insert_with(|| panic_message(payload.as_ref()));
            }
        }
        match first_panic {
            Some(message) => Err(Error::WorkerPanicked(message)),
            None => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "inline"
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_tasks(counter: &AtomicUsize, n: usize) -> Vec<Task<'_>> {
        (0..n)
            .map(|_| {
                Box::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                }) as Task<'_>
            })
            .collect()
    }

    #[test]
    fn test_thread_pool_runs_every_task() {
        let counter = AtomicUsize::new(0);
        let pool = ThreadPool::with_workers(4);
        pool.execute(counting_tasks(&counter, 37)).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 37);
        assert_eq!(pool.parallelism(), 4);
    }

    #[test]
    fn test_thread_pool_empty_batch() {
        ThreadPool::with_workers(2).execute(Vec::new()).unwrap();
    }

    #[test]
    fn test_thread_pool_reports_panic_after_batch() {
        let counter = AtomicUsize::new(0);
        let mut tasks = counting_tasks(&counter, 5);
        let boom: Task<'_> = Box::new(|| panic!("lane exploded"));
        tasks.insert(2, boom);

        let err = ThreadPool::with_workers(3).execute(tasks).unwrap_err();
        assert!(matches!(err, Error::WorkerPanicked(ref m) if m == "lane exploded"));
        assert_eq!(counter.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_thread_pool_names_workers() {
        let names = Mutex::new(Vec::new());
        let pool = ThreadPool::new(
            ExecutorConfig::default()
                .with_parallelism(2)
                .with_thread_name("lane"),
        );
        let tasks: Vec<Task<'_>> = (0..8)
            .map(|_| {
                let names = &names;
                Box::new(move || {
                    let name = std::thread::current().name().map(str::to_string);
                    names.lock().unwrap().push(name);
                    std::thread::sleep(std::time::Duration::from_millis(2));
                }) as Task<'_>
            })
            .collect();
        pool.execute(tasks).unwrap();
        assert_eq!(names.lock().unwrap().len(), 8);
        assert_eq!(pool.name(), "lane");
    }

    #[test]
    fn test_inline_pool_runs_in_order() {
        let order = Mutex::new(Vec::new());
        let tasks: Vec<Task<'_>> = (0..4)
            .map(|i| {
                let order = &order;
                Box::new(move || order.lock().unwrap().push(i)) as Task<'_>
            })
            .collect();
        InlinePool::new(4).execute(tasks).unwrap();
        assert_eq!(order.into_inner().unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_inline_pool_reports_panic() {
        let boom: Task<'_> = Box::new(|| panic!("{}", String::from("owned")));
        let err = InlinePool::new(1).execute(vec![boom]).unwrap_err();
        assert!(matches!(err, Error::WorkerPanicked(ref m) if m == "owned"));
    }
}
