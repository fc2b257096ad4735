//! Pipeline construction.
//!
//! A [`Pipeline`] is a lazy description: a source plus a chain of stages.
//! Builder methods take `&self` and return a new view over the same source,
//! so nothing runs and nothing is consumed until a terminal operation is
//! called. The first terminal operation on any view of a source takes the
//! source; every later one fails with [`Error::AlreadyConsumed`].
//!
//! # Example
//!
//! ```rust
//! use rivulet::Pipeline;
//!
//! let names = Pipeline::of(vec!["ddd2", "aaa2", "bbb1", "aaa1", "bbb3", "ccc"]);
//! let sorted = names
//!     .filter(|s| s.starts_with('a'))
//!     .sorted()
//!     .to_vec()
//!     .unwrap();
//! assert_eq!(sorted, vec!["aaa1", "aaa2"]);
//! ```
//!
//! [`Error::AlreadyConsumed`]: crate::Error::AlreadyConsumed

mod terminal;

use std::cmp::Ordering;
use std::fmt;
use std::hash::Hash;
use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use crate::error::{BoxError, Error};
use crate::execution::{ExecutionMode, ExecutorConfig, Strategy, WorkerPool};
use crate::numeric::{Numeric, NumericPipeline};
use crate::plan::{
    BarrierNode, BarrierOp, DistinctOp, LimitOp, PlanRef, SkipOp, SortedOp, SourceNode, StageList,
    StageNode, Wrap,
};
use crate::source::{self, BoxSource, LineSource, Source, VecSource};
use crate::stage::{
    BoxCursor, Expander, Filter, FlatMap, Map, Mapper, Observer, Peek, Predicate, StageKind,
};

/// A lazy, single-traversal sequence of `T`.
pub struct Pipeline<T> {
    plan: PlanRef<T>,
    strategy: Strategy,
    unordered: bool,
    consumed: AtomicBool,
}

impl<T: Send + 'static> Pipeline<T> {
    /// Create a pipeline over a source.
    pub fn new(source: impl Source<Item = T>) -> Self {
        Self::from_source(Box::new(source))
    }

    /// Create a pipeline over a boxed source.
    pub fn from_source(source: BoxSource<T>) -> Self {
        Self {
            plan: Arc::new(SourceNode::new(source)),
            strategy: Strategy::default(),
            unordered: false,
            consumed: AtomicBool::new(false),
        }
    }

    /// A pipeline over the given elements, in order.
    pub fn of(items: impl IntoIterator<Item = T>) -> Self {
        Self::from_vec(items.into_iter().collect())
    }

    /// A pipeline over a vector, in order.
    pub fn from_vec(items: Vec<T>) -> Self {
        Self::new(VecSource::new(items))
    }

    /// A pipeline over clones of a slice's elements.
    pub fn from_slice(items: &[T]) -> Self
    where
        T: Clone,
    {
        Self::from_vec(items.to_vec())
    }

    /// A pipeline over an iterator.
    ///
    /// The iterator is pulled lazily and never split for parallel evaluation.
    #[allow(clippy::should_implement_trait)]
    pub fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        Self::new(source::from_iter(iter))
    }

    /// The unbounded sequence `seed, f(seed), f(f(seed)), ...`.
    pub fn iterate<F>(seed: T, f: F) -> Self
    where
        T: Clone,
        F: FnMut(&T) -> T + Send + 'static,
    {
        Self::new(source::iterate(seed, f))
    }

    /// The unbounded sequence of values returned by `f`.
    pub fn generate<F>(f: F) -> Self
    where
        F: FnMut() -> T + Send + 'static,
    {
        Self::new(source::generate(f))
    }

    /// A pipeline with no elements.
    pub fn empty() -> Self {
        Self::new(source::empty())
    }

    fn view<U: Send + 'static>(&self, plan: PlanRef<U>) -> Pipeline<U> {
        Pipeline {
            plan,
            strategy: self.strategy.clone(),
            unordered: self.unordered,
            consumed: AtomicBool::new(false),
        }
    }

    fn stage<U: Send + 'static>(&self, kind: StageKind, wrap: Wrap<T, U>) -> Pipeline<U> {
        self.view(Arc::new(StageNode::new(self.plan.clone(), kind, wrap)))
    }

    fn barrier(&self, op: impl BarrierOp<T> + 'static) -> Self {
        self.view(Arc::new(BarrierNode::new(self.plan.clone(), op)))
    }

    /// Another view over the same plan and strategy.
    pub(crate) fn share(&self) -> Self {
        self.with_strategy(self.strategy.clone())
    }

    fn with_strategy(&self, strategy: Strategy) -> Self {
        Self {
            plan: self.plan.clone(),
            strategy,
            unordered: self.unordered,
            consumed: AtomicBool::new(false),
        }
    }

    // ---------------------------------------------------------------------
    // Intermediate stages
    // ---------------------------------------------------------------------

    /// Keep elements for which `predicate` returns `true`.
    pub fn filter<P>(&self, predicate: P) -> Self
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.filter_with(Arc::new(move |item: &T| Ok(predicate(item))))
    }

    /// Like [`filter`](Self::filter), but the predicate may fail.
    ///
    /// A failure aborts the terminal operation with [`Error::Stage`].
    pub fn try_filter<P, E>(&self, predicate: P) -> Self
    where
        P: Fn(&T) -> std::result::Result<bool, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.filter_with(Arc::new(move |item: &T| {
            predicate(item).map_err(|e| Error::stage("filter", e))
        }))
    }

    fn filter_with(&self, predicate: Predicate<T>) -> Self {
        self.stage(
            StageKind::Filter,
            Arc::new(move |lane: BoxCursor<T>| -> BoxCursor<T> {
                Box::new(Filter::new(lane, predicate.clone()))
            }),
        )
    }

    /// Replace each element with `f(element)`.
    pub fn map<U, F>(&self, f: F) -> Pipeline<U>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        self.map_with(Arc::new(move |item: T| Ok(f(item))))
    }

    /// Like [`map`](Self::map), but the function may fail.
    ///
    /// A failure aborts the terminal operation with [`Error::Stage`].
    pub fn try_map<U, F, E>(&self, f: F) -> Pipeline<U>
    where
        U: Send + 'static,
        F: Fn(T) -> std::result::Result<U, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.map_with(Arc::new(move |item: T| {
            f(item).map_err(|e| Error::stage("map", e))
        }))
    }

    fn map_with<U: Send + 'static>(&self, f: Mapper<T, U>) -> Pipeline<U> {
        self.stage(
            StageKind::Map,
            Arc::new(move |lane: BoxCursor<T>| -> BoxCursor<U> {
                Box::new(Map::new(lane, f.clone()))
            }),
        )
    }

    /// Replace each element with the elements of `f(element)`, in order.
    pub fn flat_map<U, I, F>(&self, f: F) -> Pipeline<U>
    where
        U: Send + 'static,
        I: IntoIterator<Item = U>,
        I::IntoIter: Send + 'static,
        F: Fn(T) -> I + Send + Sync + 'static,
    {
        self.flat_map_with(
            StageKind::FlatMap,
            Arc::new(move |item: T| {
                Ok(Box::new(f(item).into_iter()) as Box<dyn Iterator<Item = U> + Send>)
            }),
        )
    }

    /// Like [`flat_map`](Self::flat_map), but the function may fail.
    pub fn try_flat_map<U, I, F, E>(&self, f: F) -> Pipeline<U>
    where
        U: Send + 'static,
        I: IntoIterator<Item = U>,
        I::IntoIter: Send + 'static,
        F: Fn(T) -> std::result::Result<I, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.flat_map_with(
            StageKind::FlatMap,
            Arc::new(move |item: T| match f(item) {
                Ok(items) => {
                    Ok(Box::new(items.into_iter()) as Box<dyn Iterator<Item = U> + Send>)
                }
                Err(e) => Err(Error::stage("flat_map", e)),
            }),
        )
    }

    /// Keep `f(element)` where it is `Some`.
    pub fn filter_map<U, F>(&self, f: F) -> Pipeline<U>
    where
        U: Send + 'static,
        F: Fn(T) -> Option<U> + Send + Sync + 'static,
    {
        self.flat_map_with(
            StageKind::Map,
            Arc::new(move |item: T| {
                Ok(Box::new(f(item).into_iter()) as Box<dyn Iterator<Item = U> + Send>)
            }),
        )
    }

    fn flat_map_with<U: Send + 'static>(&self, kind: StageKind, f: Expander<T, U>) -> Pipeline<U> {
        self.stage(
            kind,
            Arc::new(move |lane: BoxCursor<T>| -> BoxCursor<U> {
                Box::new(FlatMap::new(lane, f.clone()))
            }),
        )
    }

    /// Call `f` on each element as it passes, without changing it.
    pub fn peek<F>(&self, f: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let observer: Observer<T> = Arc::new(f);
        self.stage(
            StageKind::Peek,
            Arc::new(move |lane: BoxCursor<T>| -> BoxCursor<T> {
                Box::new(Peek::new(lane, observer.clone()))
            }),
        )
    }

    /// Drop elements equal to an earlier one; the first occurrence wins.
    pub fn distinct(&self) -> Self
    where
        T: Eq + Hash + Clone,
    {
        self.distinct_by_key(T::clone)
    }

    /// Drop elements whose key equals an earlier element's key.
    pub fn distinct_by_key<K, F>(&self, key: F) -> Self
    where
        K: Eq + Hash + Send + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        self.barrier(DistinctOp { key: Arc::new(key) })
    }

    /// Sort by natural order. Stable.
    ///
    /// Sorting an unbounded pipeline fails with [`Error::Unbounded`].
    pub fn sorted(&self) -> Self
    where
        T: Ord,
    {
        self.sorted_by(T::cmp)
    }

    /// Sort with a comparator. Stable.
    ///
    /// A comparator that panics on a worker lane surfaces as
    /// [`Error::WorkerPanicked`]; use [`try_sorted_by`](Self::try_sorted_by)
    /// to report comparison failures as values.
    pub fn sorted_by<F>(&self, cmp: F) -> Self
    where
        F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        self.barrier(SortedOp {
            cmp: Arc::new(move |a: &T, b: &T| Ok::<_, Error>(cmp(a, b))),
        })
    }

    /// Like [`sorted_by`](Self::sorted_by), but the comparator may fail.
    ///
    /// The first failure aborts the terminal operation with [`Error::Stage`].
    pub fn try_sorted_by<F, E>(&self, cmp: F) -> Self
    where
        F: Fn(&T, &T) -> std::result::Result<Ordering, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.barrier(SortedOp {
            cmp: Arc::new(move |a: &T, b: &T| cmp(a, b).map_err(|e| Error::stage("sorted", e))),
        })
    }

    /// Sort by a derived key. Stable.
    pub fn sorted_by_key<K, F>(&self, key: F) -> Self
    where
        K: Ord,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        self.sorted_by(move |a, b| key(a).cmp(&key(b)))
    }

    /// Stop after `n` elements.
    pub fn limit(&self, n: usize) -> Self {
        self.barrier(LimitOp(n))
    }

    /// Drop the first `n` elements.
    pub fn skip(&self, n: usize) -> Self {
        self.barrier(SkipOp(n))
    }

    /// Give up encounter order for `find_first`, which then returns any match.
    pub fn unordered(&self) -> Self {
        let mut view = self.share();
        view.unordered = true;
        view
    }

    /// Switch to numeric operations over `f(element)`.
    pub fn map_to_numeric<N, F>(&self, f: F) -> NumericPipeline<N>
    where
        N: Numeric,
        F: Fn(T) -> N + Send + Sync + 'static,
    {
        NumericPipeline::from(self.map(f))
    }

    // ---------------------------------------------------------------------
    // Execution strategy
    // ---------------------------------------------------------------------

    /// Evaluate in parallel on a thread pool built from the current config.
    pub fn parallel(&self) -> Self {
        self.with_strategy(self.strategy.with_mode(ExecutionMode::Parallel))
    }

    /// Evaluate in parallel on the given pool.
    pub fn parallel_with(&self, pool: Arc<dyn WorkerPool>) -> Self {
        let mut strategy = self.strategy.with_mode(ExecutionMode::Parallel);
        strategy.pool = Some(pool);
        self.with_strategy(strategy)
    }

    /// Replace the executor configuration.
    pub fn with_config(&self, config: ExecutorConfig) -> Self {
        let mut strategy = self.strategy.clone();
        strategy.config = config;
        self.with_strategy(strategy)
    }

    /// Evaluate on the calling thread.
    pub fn sequential(&self) -> Self {
        self.with_strategy(self.strategy.with_mode(ExecutionMode::Sequential))
    }

    /// Whether terminal operations will run in parallel.
    pub fn is_parallel(&self) -> bool {
        self.strategy.mode == ExecutionMode::Parallel
    }

    /// The current execution mode.
    pub fn mode(&self) -> ExecutionMode {
        self.strategy.mode
    }

    /// The stages of this pipeline, in build order.
    pub fn stages(&self) -> StageList {
        let mut out = StageList::new();
        self.plan.stages(&mut out);
        out
    }
}

impl Pipeline<String> {
    /// The lines of a file, without line terminators.
    ///
    /// The file is opened by the terminal operation, not here; a missing file
    /// fails that operation with [`Error::Io`].
    pub fn from_file(path: impl AsRef<Path>) -> Self {
        Self::new(LineSource::new(path))
    }

    /// The lines of a reader, without line terminators.
    pub fn from_reader<R: BufRead + Send + 'static>(reader: R) -> Self {
        Self::new(LineSource::from_reader(reader))
    }
}

impl<T: Send + 'static> fmt::Debug for Pipeline<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stages())
            .field("strategy", &self.strategy)
            .field("unordered", &self.unordered)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    #[test]
    fn test_builders_are_lazy() {
        let pulled = Arc::new(AtomicUsize::new(0));
        let counter = pulled.clone();
        let p = Pipeline::generate(move || counter.fetch_add(1, AtomicOrdering::SeqCst))
            .filter(|x| x % 2 == 0)
            .map(|x| x * 10)
            .limit(3);
        assert_eq!(pulled.load(AtomicOrdering::SeqCst), 0);
        assert_eq!(p.to_vec().unwrap(), vec![0, 20, 40]);
        assert_eq!(pulled.load(AtomicOrdering::SeqCst), 5);
    }

    #[test]
    fn test_stages_in_build_order() {
        let p = Pipeline::of(vec![3, 1, 2])
            .filter(|x| *x > 1)
            .map(|x| x + 1)
            .sorted()
            .limit(2)
            .filter_map(Some)
            .peek(|_| {});
        assert_eq!(
            p.stages().as_slice(),
            &[
                StageKind::Filter,
                StageKind::Map,
                StageKind::Sorted,
                StageKind::Limit(2),
                StageKind::Map,
                StageKind::Peek,
            ]
        );
    }

    #[test]
    fn test_strategy_switches() {
        let p = Pipeline::of(vec![1, 2, 3]);
        assert!(!p.is_parallel());
        let par = p.parallel();
        assert!(par.is_parallel());
        assert!(!par.sequential().is_parallel());
        assert_eq!(par.filter(|_| true).mode(), ExecutionMode::Parallel);
    }

    #[test]
    fn test_debug_lists_stages() {
        let p = Pipeline::of(vec![1u8]).skip(1);
        let text = format!("{p:?}");
        assert!(text.contains("Skip(1)"));
        assert!(text.contains("Sequential"));
    }
}
