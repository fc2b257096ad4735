//! Terminal operations.
//!
//! Every terminal operation runs at most once per source. Full traversals
//! (`count`, `collect`, `reduce`, ...) reject unbounded pipelines up front;
//! short-circuiting ones (`any_match`, `find_first`, ...) stop pulling as soon
//! as their answer is known. In parallel mode each lane folds its own
//! sub-range and the partial results merge in lane order.

use std::cmp::Ordering;
use std::sync::atomic::Ordering as AtomicOrdering;

use super::Pipeline;
use crate::collector::Collector;
use crate::error::{BoxError, Error, Result};
use crate::execution::EvalContext;
use crate::observability::{self, TerminalMetrics};
use crate::stage::{BoxCursor, drain};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Traversal {
    Full,
    ShortCircuit,
}

impl<T: Send + 'static> Pipeline<T> {
    /// Take the source and run `body` over its lanes, exactly once.
    fn terminal<R, B>(&self, op: &'static str, traversal: Traversal, body: B) -> Result<R>
    where
        B: FnOnce(&EvalContext, Vec<BoxCursor<T>>) -> Result<R>,
    {
        self.plan.validate()?;
        if traversal == Traversal::Full && self.plan.is_unbounded() {
            return Err(Error::Unbounded { operation: op });
        }
        if self.consumed.swap(true, AtomicOrdering::AcqRel) {
            return Err(Error::AlreadyConsumed);
        }

        let ctx = EvalContext::new(&self.strategy);
        let _span = observability::instrument_terminal(op, ctx.mode());
        let metrics = TerminalMetrics::start(op, ctx.mode());
        let _timer = metrics.start_timer();

        let result = self.plan.open(&ctx).and_then(|lanes| body(&ctx, lanes));
        if let Err(e) = &result {
            metrics.record_error();
            if let Error::Stage { stage, .. } = e {
                observability::record_stage_error(stage);
            }
            observability::trace_error(op, e);
        }
        result
    }

    /// Fold every lane from `init()` with `step`, then merge lanes in order.
    pub(crate) fn fold<A, I, S, M>(&self, op: &'static str, init: I, step: S, mut merge: M) -> Result<A>
    where
        A: Send,
        I: Fn() -> A + Sync,
        S: Fn(A, T) -> Result<A> + Sync,
        M: FnMut(A, A) -> A,
    {
        self.try_fold(op, init, step, |a, b| Ok(merge(a, b)))
    }

    /// Like [`fold`](Self::fold), but merging two partial results may fail.
    pub(crate) fn try_fold<A, I, S, M>(&self, op: &'static str, init: I, step: S, merge: M) -> Result<A>
    where
        A: Send,
        I: Fn() -> A + Sync,
        S: Fn(A, T) -> Result<A> + Sync,
        M: FnMut(A, A) -> Result<A>,
    {
        self.terminal(op, Traversal::Full, |ctx, lanes| {
            let parts = ctx.run_lanes(lanes, |_, mut lane| {
                let mut acc = init();
                while let Some(item) = lane.pull()? {
                    acc = step(acc, item)?;
                }
                Ok(acc)
            })?;
            let mut parts = parts.into_iter();
            match parts.next() {
                Some(first) => parts.try_fold(first, merge),
                None => Ok(init()),
            }
        })
    }

    fn gather(&self, op: &'static str) -> Result<Vec<T>> {
        self.terminal(op, Traversal::Full, |ctx, lanes| {
            let parts = ctx.run_lanes(lanes, |_, mut lane| drain(lane.as_mut()))?;
            let mut out = Vec::with_capacity(parts.iter().map(Vec::len).sum());
            for mut part in parts {
                out.append(&mut part);
            }
            Ok(out)
        })
    }

    /// Call `action` on every element.
    ///
    /// In parallel mode the calls happen on worker threads, in no particular
    /// order. Use [`for_each_ordered`](Self::for_each_ordered) to keep
    /// encounter order.
    pub fn for_each<F>(&self, action: F) -> Result<()>
    where
        F: Fn(T) + Sync,
    {
        self.fold(
            "for_each",
            || (),
            |(), item| {
                action(item);
                Ok(())
            },
            |(), ()| (),
        )
    }

    /// Like [`for_each`](Self::for_each), but `action` may fail.
    ///
    /// The first failure stops every lane and is returned as [`Error::Stage`].
    pub fn try_for_each<F, E>(&self, action: F) -> Result<()>
    where
        F: Fn(T) -> std::result::Result<(), E> + Sync,
        E: Into<BoxError>,
    {
        self.fold(
            "try_for_each",
            || (),
            |(), item| action(item).map_err(|e| Error::stage("for_each", e)),
            |(), ()| (),
        )
    }

    /// Call `action` on every element in encounter order, on this thread.
    pub fn for_each_ordered<F>(&self, mut action: F) -> Result<()>
    where
        F: FnMut(T),
    {
        self.terminal("for_each_ordered", Traversal::Full, |ctx, lanes| {
            if lanes.len() == 1 {
                for mut lane in lanes {
                    while let Some(item) = lane.pull()? {
                        action(item);
                    }
                }
                return Ok(());
            }
            let parts = ctx.run_lanes(lanes, |_, mut lane| drain(lane.as_mut()))?;
            parts.into_iter().flatten().for_each(action);
            Ok(())
        })
    }

    /// Collect into any `FromIterator` container, in encounter order.
    pub fn collect<C: FromIterator<T>>(&self) -> Result<C> {
        Ok(self.gather("collect")?.into_iter().collect())
    }

    /// Collect into a `Vec`, in encounter order.
    pub fn to_vec(&self) -> Result<Vec<T>> {
        self.gather("to_vec")
    }

    /// Run a [`Collector`].
    pub fn collect_with<C: Collector<T>>(&self, collector: C) -> Result<C::Output> {
        let acc = self.fold(
            "collect_with",
            || collector.init(),
            |mut acc, item| {
                collector.accumulate(&mut acc, item);
                Ok(acc)
            },
            |left, right| collector.combine(left, right),
        )?;
        Ok(collector.finish(acc))
    }

    /// Count the elements.
    pub fn count(&self) -> Result<usize> {
        self.fold("count", || 0usize, |n, _| Ok(n + 1), |a, b| a + b)
    }

    fn any(&self, op: &'static str, predicate: impl Fn(&T) -> bool + Sync) -> Result<bool> {
        self.terminal(op, Traversal::ShortCircuit, |ctx, lanes| {
            let found = ctx.run_lanes(lanes, |_, mut lane| {
                while let Some(item) = lane.pull()? {
                    if predicate(&item) {
                        ctx.stop().raise();
                        return Ok(true);
                    }
                }
                Ok(false)
            })?;
            Ok(found.contains(&true))
        })
    }

    /// Whether any element matches. Stops at the first match.
    pub fn any_match<P>(&self, predicate: P) -> Result<bool>
    where
        P: Fn(&T) -> bool + Sync,
    {
        self.any("any_match", predicate)
    }

    /// Whether every element matches. Stops at the first mismatch.
    ///
    /// `true` for an empty pipeline.
    pub fn all_match<P>(&self, predicate: P) -> Result<bool>
    where
        P: Fn(&T) -> bool + Sync,
    {
        self.any("all_match", |item| !predicate(item)).map(|miss| !miss)
    }

    /// Whether no element matches. Stops at the first match.
    pub fn none_match<P>(&self, predicate: P) -> Result<bool>
    where
        P: Fn(&T) -> bool + Sync,
    {
        self.any("none_match", predicate).map(|hit| !hit)
    }

    /// The first element in encounter order, or `None` if empty.
    ///
    /// In parallel mode lanes after the earliest lane with a result stop
    /// early. On an [`unordered`](Self::unordered) pipeline this behaves like
    /// [`find_any`](Self::find_any).
    pub fn find_first(&self) -> Result<Option<T>> {
        if self.unordered {
            return self.find("find_first", FindMode::Any);
        }
        self.find("find_first", FindMode::First)
    }

    /// Some element, or `None` if empty. The first lane to find one wins.
    pub fn find_any(&self) -> Result<Option<T>> {
        self.find("find_any", FindMode::Any)
    }

    // A hit in lane `i` cuts off every lane after it, including lanes that
    // are still scanning for their own first match.
    fn find(&self, op: &'static str, mode: FindMode) -> Result<Option<T>> {
        self.terminal(op, Traversal::ShortCircuit, |ctx, lanes| {
            let hits = ctx.run_lanes(lanes, |i, mut lane| {
                let item = lane.pull()?;
                if item.is_some() {
                    match mode {
                        FindMode::First => ctx.stop().raise_after(i),
                        FindMode::Any => ctx.stop().raise(),
                    }
                }
                Ok(item)
            })?;
            Ok(hits.into_iter().flatten().next())
        })
    }

    /// Fold with an identity and an associative operator.
    ///
    /// In parallel mode every lane starts from `identity`, so it must be a
    /// true identity for `op`.
    pub fn reduce<F>(&self, identity: T, op: F) -> Result<T>
    where
        T: Clone + Sync,
        F: Fn(T, T) -> T + Sync,
    {
        self.fold(
            "reduce",
            || identity.clone(),
            |acc, item| Ok(op(acc, item)),
            |a, b| op(a, b),
        )
    }

    /// Like [`reduce`](Self::reduce), but `op` may fail.
    ///
    /// The first failure, while folding a lane or merging two lanes, aborts
    /// the operation with [`Error::Stage`].
    pub fn try_reduce<F, E>(&self, identity: T, op: F) -> Result<T>
    where
        T: Clone + Sync,
        F: Fn(T, T) -> std::result::Result<T, E> + Sync,
        E: Into<BoxError>,
    {
        let apply = |a: T, b: T| op(a, b).map_err(|e| Error::stage("reduce", e));
        self.try_fold("try_reduce", || identity.clone(), apply, apply)
    }

    /// Fold without an identity; `None` if empty.
    pub fn reduce_opt<F>(&self, op: F) -> Result<Option<T>>
    where
        F: Fn(T, T) -> T + Sync,
    {
        self.reduce_named("reduce_opt", op)
    }

    fn reduce_named<F>(&self, name: &'static str, op: F) -> Result<Option<T>>
    where
        F: Fn(T, T) -> T + Sync,
    {
        self.fold(
            name,
            || None,
            |acc, item| {
                Ok(Some(match acc {
                    Some(acc) => op(acc, item),
                    None => item,
                }))
            },
            |a, b| match (a, b) {
                (Some(a), Some(b)) => Some(op(a, b)),
                (a, b) => a.or(b),
            },
        )
    }

    /// Fold into a different type: `accumulate` folds elements into a lane's
    /// partial result, `combine` merges partial results in lane order.
    pub fn reduce_with<A, F, G>(&self, identity: A, accumulate: F, combine: G) -> Result<A>
    where
        A: Clone + Send + Sync,
        F: Fn(A, T) -> A + Sync,
        G: Fn(A, A) -> A + Sync,
    {
        self.fold(
            "reduce_with",
            || identity.clone(),
            |acc, item| Ok(accumulate(acc, item)),
            |a, b| combine(a, b),
        )
    }

    /// The smallest element by `cmp`; the first of equal minima wins.
    pub fn min_by<F>(&self, cmp: F) -> Result<Option<T>>
    where
        F: Fn(&T, &T) -> Ordering + Sync,
    {
        self.reduce_named("min", |a, b| if cmp(&b, &a).is_lt() { b } else { a })
    }

    /// The largest element by `cmp`; the first of equal maxima wins.
    pub fn max_by<F>(&self, cmp: F) -> Result<Option<T>>
    where
        F: Fn(&T, &T) -> Ordering + Sync,
    {
        self.reduce_named("max", |a, b| if cmp(&b, &a).is_gt() { b } else { a })
    }

    /// The smallest element.
    pub fn min(&self) -> Result<Option<T>>
    where
        T: Ord,
    {
        self.min_by(T::cmp)
    }

    /// The largest element.
    pub fn max(&self) -> Result<Option<T>>
    where
        T: Ord,
    {
        self.max_by(T::cmp)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FindMode {
    First,
    Any,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::{counting, grouping_by_with, joining};
    use crate::execution::InlinePool;
    use std::sync::Arc;

    fn inline(p: Pipeline<u32>) -> Pipeline<u32> {
        p.parallel_with(Arc::new(InlinePool::new(4)))
    }

    #[test]
    fn test_terminal_runs_once() {
        let p = Pipeline::of(vec![1u32, 2, 3]);
        assert_eq!(p.count().unwrap(), 3);
        assert!(matches!(p.count(), Err(Error::AlreadyConsumed)));
        // Views share the source.
        assert!(matches!(p.map(|x| x + 1).to_vec(), Err(Error::AlreadyConsumed)));
    }

    #[test]
    fn test_unbounded_rejected_before_consuming() {
        let p = Pipeline::iterate(1u64, |x| x * 2);
        assert!(matches!(p.count(), Err(Error::Unbounded { operation: "count" })));
        assert_eq!(p.limit(4).to_vec().unwrap(), vec![1, 2, 4, 8]);
    }

    #[test]
    fn test_short_circuit_on_unbounded() {
        let p = Pipeline::iterate(1u64, |x| x + 1);
        assert!(p.any_match(|x| *x > 100).unwrap());
        let p = Pipeline::iterate(1u64, |x| x + 1);
        assert_eq!(p.filter(|x| x % 7 == 0).find_first().unwrap(), Some(7));
    }

    #[test]
    fn test_matches() {
        assert!(Pipeline::<u32>::empty().all_match(|_| false).unwrap());
        assert!(Pipeline::<u32>::empty().none_match(|_| true).unwrap());
        assert!(!Pipeline::of(vec![1u32, 2, 3]).all_match(|x| *x < 3).unwrap());
        assert!(inline(Pipeline::of(0..100)).any_match(|x| *x == 99).unwrap());
    }

    #[test]
    fn test_find_first_in_order_across_lanes() {
        let p = inline(Pipeline::of(0..100u32)).filter(|x| *x >= 30 && x % 10 == 7);
        assert_eq!(p.find_first().unwrap(), Some(37));
    }

    #[test]
    fn test_reduce_forms() {
        assert_eq!(inline(Pipeline::of(1..=4)).reduce(0, |a, b| a + b).unwrap(), 10);
        assert_eq!(Pipeline::<u32>::empty().reduce_opt(|a, b| a + b).unwrap(), None);
        let words = Pipeline::of(vec!["a", "bb", "ccc"]);
        let total = words
            .reduce_with(0usize, |n, w| n + w.len(), |a, b| a + b)
            .unwrap();
        assert_eq!(total, 6);
    }

    #[test]
    fn test_try_reduce() {
        let capped = |a: u32, b: u32| {
            let sum = a + b;
            if sum > 20 { Err(format!("{sum} is past 20")) } else { Ok(sum) }
        };
        assert_eq!(Pipeline::of(1..=5u32).try_reduce(0, capped).unwrap(), 15);

        // Sequentially the fold itself overflows; over four lanes of two the
        // lane sums stay small and the merge of 10 and 11 overflows instead.
        let err = Pipeline::of(1..=8u32).try_reduce(0, capped).unwrap_err();
        assert_eq!(err.to_string(), "reduce function failed: 21 is past 20");
        let err = inline(Pipeline::of(1..=8)).try_reduce(0, capped).unwrap_err();
        assert_eq!(err.to_string(), "reduce function failed: 21 is past 20");
        assert!(err.is_stage());
    }

    #[test]
    fn test_find_first_cuts_off_later_lanes() {
        let pulled = Arc::new(std::sync::Mutex::new(Vec::new()));
        let log = pulled.clone();
        let found = inline(Pipeline::of(0..40))
            .peek(move |x| log.lock().unwrap().push(*x))
            .filter(|x| x % 10 == 2)
            .find_first()
            .unwrap();
        assert_eq!(found, Some(2));
        // Lane 0 hits at its third element; lanes 1..4 never start.
        assert_eq!(*pulled.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_min_max_keep_first_on_ties() {
        let items = vec![(2, 'a'), (1, 'b'), (2, 'c'), (1, 'd')];
        let min = Pipeline::of(items.clone()).min_by(|a, b| a.0.cmp(&b.0)).unwrap();
        assert_eq!(min, Some((1, 'b')));
        let max = Pipeline::of(items).max_by(|a, b| a.0.cmp(&b.0)).unwrap();
        assert_eq!(max, Some((2, 'a')));
        assert_eq!(Pipeline::<u32>::empty().max().unwrap(), None);
    }

    #[test]
    fn test_for_each_ordered_parallel() {
        let mut seen = Vec::new();
        inline(Pipeline::of(0..20))
            .for_each_ordered(|x| seen.push(x))
            .unwrap();
        assert_eq!(seen, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_try_for_each_stops() {
        let err = Pipeline::of(vec![1u32, 2, 3])
            .try_for_each(|x| if x == 2 { Err("two") } else { Ok(()) })
            .unwrap_err();
        assert_eq!(err.to_string(), "for_each function failed: two");
    }

    #[test]
    fn test_collect_with() {
        let joined = inline(Pipeline::of(1..=5))
            .map(|x| x.to_string())
            .collect_with(joining(","))
            .unwrap();
        assert_eq!(joined, "1,2,3,4,5");

        let by_len = Pipeline::of(vec!["kiwi", "fig", "pear"])
            .collect_with(grouping_by_with(|w: &&str| w.len(), counting()))
            .unwrap();
        assert_eq!(by_len[&4], 2);
    }
}
