//! Mutable reductions for [`Pipeline::collect_with`](crate::Pipeline::collect_with).
//!
//! A [`Collector`] folds elements into a per-lane accumulator, combines
//! accumulators of adjacent lanes (left before right) and finishes the
//! result. Every collector here preserves encounter order where its output
//! has one.
//!
//! ```rust
//! use rivulet::collector::{grouping_by, joining};
//!
//! let words = rivulet::of(vec!["apple", "avocado", "banana"]);
//! let by_letter = words.collect_with(grouping_by(|w: &&str| w.as_bytes()[0])).unwrap();
//! assert_eq!(by_letter[&b'a'], vec!["apple", "avocado"]);
//!
//! let joined = rivulet::of(vec!["a", "b", "c"]).collect_with(joining(", ")).unwrap();
//! assert_eq!(joined, "a, b, c");
//! ```

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::marker::PhantomData;

use crate::numeric::{Numeric, Summary};

/// A mutable reduction over pipeline elements.
///
/// `combine` must be associative: parallel evaluation combines lane
/// accumulators in lane order, in whatever grouping the lanes finish.
pub trait Collector<T>: Send + Sync {
    /// Per-lane accumulator.
    type Acc: Send;
    /// Final result.
    type Output;

    /// A fresh, empty accumulator.
    fn init(&self) -> Self::Acc;

    /// Fold one element into an accumulator.
    fn accumulate(&self, acc: &mut Self::Acc, item: T);

    /// Merge the accumulator of the following lane into `left`.
    fn combine(&self, left: Self::Acc, right: Self::Acc) -> Self::Acc;

    /// Turn the final accumulator into the result.
    fn finish(&self, acc: Self::Acc) -> Self::Output;
}

/// Collects into a `Vec` in encounter order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToVec;

impl<T: Send> Collector<T> for ToVec {
    type Acc = Vec<T>;
    type Output = Vec<T>;

    fn init(&self) -> Vec<T> {
        Vec::new()
    }

    fn accumulate(&self, acc: &mut Vec<T>, item: T) {
        acc.push(item);
    }

    fn combine(&self, mut left: Vec<T>, right: Vec<T>) -> Vec<T> {
        left.extend(right);
        left
    }

    fn finish(&self, acc: Vec<T>) -> Vec<T> {
        acc
    }
}

/// Collects into a `HashSet`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToSet;

impl<T: Eq + Hash + Send> Collector<T> for ToSet {
    type Acc = HashSet<T>;
    type Output = HashSet<T>;

    fn init(&self) -> HashSet<T> {
        HashSet::new()
    }

    fn accumulate(&self, acc: &mut HashSet<T>, item: T) {
        acc.insert(item);
    }

    fn combine(&self, mut left: HashSet<T>, right: HashSet<T>) -> HashSet<T> {
        left.extend(right);
        left
    }

    fn finish(&self, acc: HashSet<T>) -> HashSet<T> {
        acc
    }
}

/// Counts elements.
#[derive(Debug, Clone, Copy, Default)]
pub struct Counting;

impl<T> Collector<T> for Counting {
    type Acc = usize;
    type Output = usize;

    fn init(&self) -> usize {
        0
    }

    fn accumulate(&self, acc: &mut usize, _item: T) {
        *acc += 1;
    }

    fn combine(&self, left: usize, right: usize) -> usize {
        left + right
    }

    fn finish(&self, acc: usize) -> usize {
        acc
    }
}

/// Concatenates string-like elements with a separator, prefix and suffix.
#[derive(Debug, Clone, Default)]
pub struct Joining {
    separator: String,
    prefix: String,
    suffix: String,
}

impl Joining {
    /// Join with `separator` and no prefix or suffix.
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
            ..Self::default()
        }
    }

    /// Wrap the joined result in `prefix` and `suffix`.
    pub fn with_affixes(mut self, prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self.suffix = suffix.into();
        self
    }
}

impl<T: AsRef<str>> Collector<T> for Joining {
    type Acc = Option<String>;
    type Output = String;

    fn init(&self) -> Option<String> {
        None
    }

    fn accumulate(&self, acc: &mut Option<String>, item: T) {
        match acc {
            Some(joined) => {
                joined.push_str(&self.separator);
                joined.push_str(item.as_ref());
            }
            None => *acc = Some(item.as_ref().to_owned()),
        }
    }

    fn combine(&self, left: Option<String>, right: Option<String>) -> Option<String> {
        match (left, right) {
            (Some(mut l), Some(r)) => {
                l.push_str(&self.separator);
                l.push_str(&r);
                Some(l)
            }
            (l, r) => l.or(r),
        }
    }

    fn finish(&self, acc: Option<String>) -> String {
        let body = acc.unwrap_or_default();
        let mut out = String::with_capacity(self.prefix.len() + body.len() + self.suffix.len());
        out.push_str(&self.prefix);
        out.push_str(&body);
        out.push_str(&self.suffix);
        out
    }
}

/// Groups elements by key, reducing each group with a downstream collector.
pub struct GroupingBy<F, C> {
    key: F,
    downstream: C,
}

impl<T, K, F, C> Collector<T> for GroupingBy<F, C>
where
    F: Fn(&T) -> K + Send + Sync,
    K: Eq + Hash + Send,
    C: Collector<T>,
{
    type Acc = HashMap<K, C::Acc>;
    type Output = HashMap<K, C::Output>;

    fn init(&self) -> Self::Acc {
        HashMap::new()
    }

    fn accumulate(&self, acc: &mut Self::Acc, item: T) {
        let group = acc
            .entry((self.key)(&item))
            .or_insert_with(|| self.downstream.init());
        self.downstream.accumulate(group, item);
    }

    fn combine(&self, mut left: Self::Acc, right: Self::Acc) -> Self::Acc {
        for (key, group) in right {
            let merged = match left.remove(&key) {
                Some(earlier) => self.downstream.combine(earlier, group),
                None => group,
            };
            left.insert(key, merged);
        }
        left
    }

    fn finish(&self, acc: Self::Acc) -> Self::Output {
        acc.into_iter()
            .map(|(key, group)| (key, self.downstream.finish(group)))
            .collect()
    }
}

/// Splits elements into `(matching, rest)` by a predicate.
pub struct PartitioningBy<P> {
    predicate: P,
}

impl<T, P> Collector<T> for PartitioningBy<P>
where
    T: Send,
    P: Fn(&T) -> bool + Send + Sync,
{
    type Acc = (Vec<T>, Vec<T>);
    type Output = (Vec<T>, Vec<T>);

    fn init(&self) -> Self::Acc {
        (Vec::new(), Vec::new())
    }

    fn accumulate(&self, acc: &mut Self::Acc, item: T) {
        if (self.predicate)(&item) {
            acc.0.push(item);
        } else {
            acc.1.push(item);
        }
    }

    fn combine(&self, mut left: Self::Acc, right: Self::Acc) -> Self::Acc {
        left.0.extend(right.0);
        left.1.extend(right.1);
        left
    }

    fn finish(&self, acc: Self::Acc) -> Self::Output {
        acc
    }
}

/// Sums a numeric projection of each element.
pub struct Summing<F, N> {
    f: F,
    _n: PhantomData<fn() -> N>,
}

impl<T, N, F> Collector<T> for Summing<F, N>
where
    N: Numeric,
    F: Fn(&T) -> N + Send + Sync,
{
    type Acc = N;
    type Output = N;

    fn init(&self) -> N {
        N::ZERO
    }

    fn accumulate(&self, acc: &mut N, item: T) {
        *acc = acc.plus((self.f)(&item));
    }

    fn combine(&self, left: N, right: N) -> N {
        left.plus(right)
    }

    fn finish(&self, acc: N) -> N {
        acc
    }
}

/// Summary statistics of a numeric projection of each element.
pub struct Summarizing<F, N> {
    f: F,
    _n: PhantomData<fn() -> N>,
}

impl<T, N, F> Collector<T> for Summarizing<F, N>
where
    N: Numeric,
    F: Fn(&T) -> N + Send + Sync,
{
    type Acc = Summary<N>;
    type Output = Summary<N>;

    fn init(&self) -> Summary<N> {
        Summary::new()
    }

    fn accumulate(&self, acc: &mut Summary<N>, item: T) {
        acc.accept((self.f)(&item));
    }

    fn combine(&self, left: Summary<N>, right: Summary<N>) -> Summary<N> {
        left.combine(right)
    }

    fn finish(&self, acc: Summary<N>) -> Summary<N> {
        acc
    }
}

/// Collect into a `Vec`.
pub fn to_vec() -> ToVec {
    ToVec
}

/// Collect into a `HashSet`.
pub fn to_set() -> ToSet {
    ToSet
}

/// Count elements.
pub fn counting() -> Counting {
    Counting
}

/// Join string-like elements with `separator`.
pub fn joining(separator: impl Into<String>) -> Joining {
    Joining::new(separator)
}

/// Group elements into vectors by key.
pub fn grouping_by<F>(key: F) -> GroupingBy<F, ToVec> {
    GroupingBy {
        key,
        downstream: ToVec,
    }
}

/// Group elements by key, reducing each group with `downstream`.
pub fn grouping_by_with<F, C>(key: F, downstream: C) -> GroupingBy<F, C> {
    GroupingBy { key, downstream }
}

/// Split elements into `(matching, rest)`.
pub fn partitioning_by<P>(predicate: P) -> PartitioningBy<P> {
    PartitioningBy { predicate }
}

/// Sum `f(element)` over all elements.
pub fn summing<F, N>(f: F) -> Summing<F, N> {
    Summing { f, _n: PhantomData }
}

/// [`Summary`] of `f(element)` over all elements.
pub fn summarizing<F, N>(f: F) -> Summarizing<F, N> {
    Summarizing { f, _n: PhantomData }
}
