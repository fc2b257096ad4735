//! Iterator-backed and empty sources.

use std::marker::PhantomData;

use super::{SizeHint, Source};
use crate::error::Result;

/// A source that produces items from an iterator.
///
/// The iterator's length is not trusted, so the source never splits. An
/// iterator whose own hint reports `(usize::MAX, None)`, such as an open
/// range or `repeat`, is treated as unbounded.
pub struct IterSource<I: Iterator> {
    iter: I,
}

impl<I: Iterator> IterSource<I> {
    /// Create a new iterator source.
    pub fn new(iter: I) -> Self {
        Self { iter }
    }
}

impl<I> Source for IterSource<I>
where
    I: Iterator + Send + 'static,
    I::Item: Send + 'static,
{
    type Item = I::Item;

    fn produce(&mut self) -> Result<Option<I::Item>> {
        Ok(self.iter.next())
    }

    fn size_hint(&self) -> SizeHint {
        match self.iter.size_hint() {
            (usize::MAX, None) => SizeHint::Unbounded,
            _ => SizeHint::Unknown,
        }
    }

    fn name(&self) -> &str {
        "iter"
    }
}

/// Create a source from an iterator.
pub fn from_iter<I>(iter: I) -> IterSource<I::IntoIter>
where
    I: IntoIterator,
    I::IntoIter: Send + 'static,
    I::Item: Send + 'static,
{
    IterSource::new(iter.into_iter())
}

/// A source with no elements.
pub struct EmptySource<T> {
    _t: PhantomData<fn() -> T>,
}

impl<T> EmptySource<T> {
    /// Create an empty source.
    pub fn new() -> Self {
        Self { _t: PhantomData }
    }
}

impl<T> Default for EmptySource<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> Source for EmptySource<T> {
    type Item = T;

    fn produce(&mut self) -> Result<Option<T>> {
        Ok(None)
    }

    fn size_hint(&self) -> SizeHint {
        SizeHint::Exact(0)
    }

    fn name(&self) -> &str {
        "empty"
    }
}

/// Create an empty source.
pub fn empty<T: Send + 'static>() -> EmptySource<T> {
    EmptySource::new()
}
