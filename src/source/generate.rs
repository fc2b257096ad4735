//! Unbounded generative sources.

use super::{SizeHint, Source};
use crate::error::Result;

/// An unbounded source producing `seed, f(seed), f(f(seed)), ...`.
///
/// `f` is only called when the next element is actually pulled, so
/// `iterate(seed, f).limit(n)` calls `f` exactly `n - 1` times.
pub struct Iterate<T, F> {
    seed: Option<T>,
    prev: Option<T>,
    f: F,
}

impl<T, F> Iterate<T, F> {
    /// Create a new iterate source.
    pub fn new(seed: T, f: F) -> Self {
        Self {
            seed: Some(seed),
            prev: None,
            f,
        }
    }
}

impl<T, F> Source for Iterate<T, F>
where
    T: Clone + Send + 'static,
    F: FnMut(&T) -> T + Send + 'static,
{
    type Item = T;

    fn produce(&mut self) -> Result<Option<T>> {
        let next = match (self.seed.take(), self.prev.as_ref()) {
            (Some(seed), _) => seed,
            (None, Some(prev)) => (self.f)(prev),
            (None, None) => return Ok(None),
        };
        self.prev = Some(next.clone());
        Ok(Some(next))
    }

    fn size_hint(&self) -> SizeHint {
        SizeHint::Unbounded
    }

    fn name(&self) -> &str {
        "iterate"
    }
}

/// Create an unbounded source from a seed and a step function.
pub fn iterate<T, F>(seed: T, f: F) -> Iterate<T, F>
where
    T: Clone + Send + 'static,
    F: FnMut(&T) -> T + Send + 'static,
{
    Iterate::new(seed, f)
}

/// An unbounded source that calls a supplier for every element.
pub struct Generate<F> {
    f: F,
}

impl<F> Generate<F> {
    /// Create a new generate source.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<T, F> Source for Generate<F>
where
    T: Send + 'static,
    F: FnMut() -> T + Send + 'static,
{
    type Item = T;

    fn produce(&mut self) -> Result<Option<T>> {
        Ok(Some((self.f)()))
    }

    fn size_hint(&self) -> SizeHint {
        SizeHint::Unbounded
    }

    fn name(&self) -> &str {
        "generate"
    }
}

/// Create an unbounded source from a supplier.
pub fn generate<T, F>(f: F) -> Generate<F>
where
    T: Send + 'static,
    F: FnMut() -> T + Send + 'static,
{
    Generate::new(f)
}
