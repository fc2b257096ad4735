//! Stateful stage cursors: `distinct` and `sorted`.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::hash::Hash;

use super::{BoxCursor, Comparator, Cursor, KeyFn, drain};
use crate::error::Result;

/// Emits each element the first time its key is seen.
///
/// Buffers only the keys it has seen, never elements.
pub(crate) struct Distinct<T, K> {
    upstream: BoxCursor<T>,
    key: KeyFn<T, K>,
    seen: HashSet<K>,
}

impl<T, K> Distinct<T, K> {
    pub(crate) fn new(upstream: BoxCursor<T>, key: KeyFn<T, K>) -> Self {
        Self {
            upstream,
            key,
            seen: HashSet::new(),
        }
    }
}

impl<T, K> Cursor<T> for Distinct<T, K>
where
    T: Send + 'static,
    K: Eq + Hash + Send + 'static,
{
    fn pull(&mut self) -> Result<Option<T>> {
        while let Some(item) = self.upstream.pull()? {
            if self.seen.insert((self.key)(&item)) {
                return Ok(Some(item));
            }
        }
        Ok(None)
    }
}

/// Drains upstream on the first pull, then yields in comparator order.
///
/// The sort is stable: equal elements keep their encounter order. The first
/// comparator error fails the pull; the buffer is dropped unsorted.
pub(crate) struct Sorted<T> {
    upstream: Option<BoxCursor<T>>,
    cmp: Comparator<T>,
    sorted: std::vec::IntoIter<T>,
}

impl<T> Sorted<T> {
    pub(crate) fn new(upstream: BoxCursor<T>, cmp: Comparator<T>) -> Self {
        Self {
            upstream: Some(upstream),
            cmp,
            sorted: Vec::new().into_iter(),
        }
    }
}

impl<T: Send + 'static> Cursor<T> for Sorted<T> {
    fn pull(&mut self) -> Result<Option<T>> {
        // Dropping the upstream cursor releases any buffer it held.
        if let Some(mut upstream) = self.upstream.take() {
            let mut buffer = drain(upstream.as_mut())?;
            drop(upstream);
            sort_stable(&mut buffer, &self.cmp)?;
            self.sorted = buffer.into_iter();
        }
        Ok(self.sorted.next())
    }
}

fn sort_stable<T>(buffer: &mut [T], cmp: &Comparator<T>) -> Result<()> {
    let mut failure = None;
    buffer.sort_by(|a, b| {
        if failure.is_some() {
            return Ordering::Equal;
        }
        cmp(a, b).unwrap_or_else(|e| {
            failure = Some(e);
            Ordering::Equal
        })
    });
    failure.map_or(Ok(()), Err)
}

/// Stable merge of individually sorted runs, given in encounter order.
///
/// Ties resolve towards the earlier run, so merging sorted sub-ranges gives
/// the same order as one stable sort over the concatenation.
pub(crate) fn merge_sorted<T>(mut runs: Vec<Vec<T>>, cmp: &Comparator<T>) -> Result<Vec<T>> {
    if runs.is_empty() {
        return Ok(Vec::new());
    }
    while runs.len() > 1 {
        let mut merged = Vec::with_capacity(runs.len().div_ceil(2));
        let mut pairs = runs.into_iter();
        while let Some(left) = pairs.next() {
            match pairs.next() {
                Some(right) => merged.push(merge_two(left, right, cmp)?),
                None => merged.push(left),
            }
        }
        runs = merged;
    }
    Ok(runs.pop().unwrap_or_default())
}

fn merge_two<T>(left: Vec<T>, right: Vec<T>, cmp: &Comparator<T>) -> Result<Vec<T>> {
    let mut out = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        let take_right = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => cmp(r, l)?.is_lt(),
            (Some(_), None) => false,
            (None, Some(_)) => true,
            (None, None) => break,
        };
        let next = if take_right { right.next() } else { left.next() };
        out.extend(next);
    }
    Ok(out)
}
