//! Stateless stage cursors.

use super::{BoxCursor, Cursor, Expander, Mapper, Observer, Predicate};
use crate::error::Result;

/// Drops elements failing a predicate.
pub(crate) struct Filter<T> {
    upstream: BoxCursor<T>,
    predicate: Predicate<T>,
}

impl<T> Filter<T> {
    pub(crate) fn new(upstream: BoxCursor<T>, predicate: Predicate<T>) -> Self {
        Self {
            upstream,
            predicate,
        }
    }
}

impl<T: Send + 'static> Cursor<T> for Filter<T> {
    fn pull(&mut self) -> Result<Option<T>> {
        while let Some(item) = self.upstream.pull()? {
            if (self.predicate)(&item)? {
                return Ok(Some(item));
            }
        }
        Ok(None)
    }
}

/// Replaces each element with `f(element)`.
pub(crate) struct Map<T, U> {
    upstream: BoxCursor<T>,
    f: Mapper<T, U>,
}

impl<T, U> Map<T, U> {
    pub(crate) fn new(upstream: BoxCursor<T>, f: Mapper<T, U>) -> Self {
        Self { upstream, f }
    }
}

impl<T: Send + 'static, U: Send + 'static> Cursor<U> for Map<T, U> {
    fn pull(&mut self) -> Result<Option<U>> {
        match self.upstream.pull()? {
            Some(item) => (self.f)(item).map(Some),
            None => Ok(None),
        }
    }
}

/// Replaces each element with the sequence `f(element)`, in order.
pub(crate) struct FlatMap<T, U> {
    upstream: BoxCursor<T>,
    f: Expander<T, U>,
    current: Option<Box<dyn Iterator<Item = U> + Send>>,
}

impl<T, U> FlatMap<T, U> {
    pub(crate) fn new(upstream: BoxCursor<T>, f: Expander<T, U>) -> Self {
        Self {
            upstream,
            f,
            current: None,
        }
    }
}

impl<T: Send + 'static, U: Send + 'static> Cursor<U> for FlatMap<T, U> {
    fn pull(&mut self) -> Result<Option<U>> {
        loop {
            if let Some(inner) = self.current.as_mut() {
                if let Some(item) = inner.next() {
                    return Ok(Some(item));
                }
                self.current = None;
            }
            match self.upstream.pull()? {
                Some(outer) => self.current = Some((self.f)(outer)?),
                None => return Ok(None),
            }
        }
    }
}

/// Calls an observer on each element as it passes.
pub(crate) struct Peek<T> {
    upstream: BoxCursor<T>,
    observer: Observer<T>,
}

impl<T> Peek<T> {
    pub(crate) fn new(upstream: BoxCursor<T>, observer: Observer<T>) -> Self {
        Self { upstream, observer }
    }
}

impl<T: Send + 'static> Cursor<T> for Peek<T> {
    fn pull(&mut self) -> Result<Option<T>> {
        let item = self.upstream.pull()?;
        if let Some(item) = &item {
            (self.observer)(item);
        }
        Ok(item)
    }
}

/// Passes at most `remaining` elements, then stops pulling upstream.
pub(crate) struct Limit<T> {
    upstream: BoxCursor<T>,
    remaining: usize,
}

impl<T> Limit<T> {
    pub(crate) fn new(upstream: BoxCursor<T>, n: usize) -> Self {
        Self {
            upstream,
            remaining: n,
        }
    }
}

impl<T: Send + 'static> Cursor<T> for Limit<T> {
    fn pull(&mut self) -> Result<Option<T>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        let item = self.upstream.pull()?;
        if item.is_some() {
            self.remaining -= 1;
        } else {
            self.remaining = 0;
        }
        Ok(item)
    }
}

/// Drops the first `remaining` elements.
pub(crate) struct Skip<T> {
    upstream: BoxCursor<T>,
    remaining: usize,
}

impl<T> Skip<T> {
    pub(crate) fn new(upstream: BoxCursor<T>, n: usize) -> Self {
        Self {
            upstream,
            remaining: n,
        }
    }
}

impl<T: Send + 'static> Cursor<T> for Skip<T> {
    fn pull(&mut self) -> Result<Option<T>> {
        while self.remaining > 0 {
            if self.upstream.pull()?.is_none() {
                self.remaining = 0;
                return Ok(None);
            }
            self.remaining -= 1;
        }
        self.upstream.pull()
    }
}
