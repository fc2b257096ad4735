//! Pipelines over primitive numbers.

use std::fmt;
use std::sync::Arc;

use super::{Integral, Numeric, Summary};
use crate::error::Result;
use crate::execution::{ExecutionMode, ExecutorConfig, WorkerPool};
use crate::pipeline::Pipeline;
use crate::plan::StageList;
use crate::source::RangeSource;

/// A [`Pipeline`] over a [`Numeric`] type, with numeric reductions.
///
/// ```rust
/// use rivulet::NumericPipeline;
///
/// let evens = NumericPipeline::range(1, 11).filter(|n| n % 2 == 0);
/// assert_eq!(evens.sum().unwrap(), 30);
///
/// let empty = NumericPipeline::<i32>::of(Vec::new());
/// assert_eq!(empty.max().unwrap(), None);
/// ```
pub struct NumericPipeline<N> {
    inner: Pipeline<N>,
}

impl<N: Numeric> From<Pipeline<N>> for NumericPipeline<N> {
    fn from(inner: Pipeline<N>) -> Self {
        Self { inner }
    }
}

impl<N: Integral> NumericPipeline<N> {
    /// The half-open range `[start, end)`.
    pub fn range(start: N, end: N) -> Self {
        Pipeline::new(RangeSource::new(start, end)).into()
    }

    /// The closed range `[start, end]`.
    pub fn range_closed(start: N, end: N) -> Self {
        Pipeline::new(RangeSource::closed(start, end)).into()
    }
}

impl<N: Numeric> NumericPipeline<N> {
    /// A pipeline over the given values, in order.
    pub fn of(values: impl IntoIterator<Item = N>) -> Self {
        Pipeline::of(values).into()
    }

    /// An empty pipeline.
    pub fn empty() -> Self {
        Pipeline::empty().into()
    }

    fn wrap(&self, inner: Pipeline<N>) -> Self {
        Self { inner }
    }

    /// Keep values for which `predicate` returns `true`.
    pub fn filter<P>(&self, predicate: P) -> Self
    where
        P: Fn(&N) -> bool + Send + Sync + 'static,
    {
        self.wrap(self.inner.filter(predicate))
    }

    /// Replace each value with `f(value)`.
    pub fn map<F>(&self, f: F) -> Self
    where
        F: Fn(N) -> N + Send + Sync + 'static,
    {
        self.wrap(self.inner.map(f))
    }

    /// Map into another numeric type.
    pub fn map_to<M, F>(&self, f: F) -> NumericPipeline<M>
    where
        M: Numeric,
        F: Fn(N) -> M + Send + Sync + 'static,
    {
        self.inner.map(f).into()
    }

    /// Map into arbitrary objects.
    pub fn map_to_obj<U, F>(&self, f: F) -> Pipeline<U>
    where
        U: Send + 'static,
        F: Fn(N) -> U + Send + Sync + 'static,
    {
        self.inner.map(f)
    }

    /// Widen every value to `f64`.
    pub fn as_f64(&self) -> NumericPipeline<f64> {
        self.map_to(N::to_f64)
    }

    /// Back to a general pipeline over the same values.
    pub fn boxed(&self) -> Pipeline<N> {
        self.inner.share()
    }

    /// Call `f` on each value as it passes.
    pub fn peek<F>(&self, f: F) -> Self
    where
        F: Fn(&N) + Send + Sync + 'static,
    {
        self.wrap(self.inner.peek(f))
    }

    /// Stop after `n` values.
    pub fn limit(&self, n: usize) -> Self {
        self.wrap(self.inner.limit(n))
    }

    /// Drop the first `n` values.
    pub fn skip(&self, n: usize) -> Self {
        self.wrap(self.inner.skip(n))
    }

    /// Sort ascending; NaN sorts after every other float.
    pub fn sorted(&self) -> Self {
        self.wrap(self.inner.sorted_by(N::total_cmp))
    }

    /// Drop repeated values.
    pub fn distinct(&self) -> Self {
        self.wrap(self.inner.distinct_by_key(|n: &N| n.key()))
    }

    /// Evaluate in parallel.
    pub fn parallel(&self) -> Self {
        self.wrap(self.inner.parallel())
    }

    /// Evaluate in parallel on the given pool.
    pub fn parallel_with(&self, pool: Arc<dyn WorkerPool>) -> Self {
        self.wrap(self.inner.parallel_with(pool))
    }

    /// Replace the executor configuration.
    pub fn with_config(&self, config: ExecutorConfig) -> Self {
        self.wrap(self.inner.with_config(config))
    }

    /// Evaluate on the calling thread.
    pub fn sequential(&self) -> Self {
        self.wrap(self.inner.sequential())
    }

    /// Whether terminal operations will run in parallel.
    pub fn is_parallel(&self) -> bool {
        self.inner.is_parallel()
    }

    /// The current execution mode.
    pub fn mode(&self) -> ExecutionMode {
        self.inner.mode()
    }

    /// The stages of this pipeline, in build order.
    pub fn stages(&self) -> StageList {
        self.inner.stages()
    }

    /// Sum of all values; `0` when empty. Integer sums wrap on overflow.
    pub fn sum(&self) -> Result<N> {
        self.inner
            .fold("sum", || N::ZERO, |acc, n| Ok(acc.plus(n)), N::plus)
    }

    /// Smallest value, or `None` when empty.
    pub fn min(&self) -> Result<Option<N>> {
        self.inner.min_by(N::total_cmp)
    }

    /// Largest value, or `None` when empty.
    pub fn max(&self) -> Result<Option<N>> {
        self.inner.max_by(N::total_cmp)
    }

    /// Arithmetic mean, or `None` when empty.
    pub fn average(&self) -> Result<Option<f64>> {
        Ok(self.summarize("average")?.average())
    }

    /// Number of values.
    pub fn count(&self) -> Result<usize> {
        self.inner.count()
    }

    /// Count, sum, min, max and average in one pass.
    pub fn summary(&self) -> Result<Summary<N>> {
        self.summarize("summary")
    }

    fn summarize(&self, op: &'static str) -> Result<Summary<N>> {
        self.inner.fold(
            op,
            Summary::new,
            |mut s, n| {
                s.accept(n);
                Ok(s)
            },
            Summary::combine,
        )
    }

    /// Fold with an identity and an associative operator.
    pub fn reduce<F>(&self, identity: N, op: F) -> Result<N>
    where
        F: Fn(N, N) -> N + Sync,
    {
        self.inner.reduce(identity, op)
    }

    /// Fold without an identity; `None` when empty.
    pub fn reduce_opt<F>(&self, op: F) -> Result<Option<N>>
    where
        F: Fn(N, N) -> N + Sync,
    {
        self.inner.reduce_opt(op)
    }

    /// Call `action` on every value.
    pub fn for_each<F>(&self, action: F) -> Result<()>
    where
        F: Fn(N) + Sync,
    {
        self.inner.for_each(action)
    }

    /// Collect into a `Vec`, in encounter order.
    pub fn to_vec(&self) -> Result<Vec<N>> {
        self.inner.to_vec()
    }

    /// Whether any value matches.
    pub fn any_match<P>(&self, predicate: P) -> Result<bool>
    where
        P: Fn(&N) -> bool + Sync,
    {
        self.inner.any_match(predicate)
    }

    /// Whether every value matches.
    pub fn all_match<P>(&self, predicate: P) -> Result<bool>
    where
        P: Fn(&N) -> bool + Sync,
    {
        self.inner.all_match(predicate)
    }

    /// Whether no value matches.
    pub fn none_match<P>(&self, predicate: P) -> Result<bool>
    where
        P: Fn(&N) -> bool + Sync,
    {
        self.inner.none_match(predicate)
    }

    /// The first value in encounter order.
    pub fn find_first(&self) -> Result<Option<N>> {
        self.inner.find_first()
    }
}

impl<N: Numeric> fmt::Debug for NumericPipeline<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NumericPipeline").field(&self.inner).finish()
    }
}
