//! # Rivulet
//!
//! Lazy, single-traversal sequence pipelines with sequential and split/merge
//! parallel execution.
//!
//! A pipeline is a source, a chain of intermediate stages and one terminal
//! operation. Stages are only descriptions: nothing is pulled from the source
//! until the terminal operation runs, and then every element flows through
//! the whole chain before the next one is pulled.
//!
//! ## Features
//!
//! - **Lazy stages**: `filter`, `map`, `flat_map`, `distinct`, `sorted`,
//!   `limit`, `skip`, `peek`
//! - **Short-circuiting**: `limit`, `any_match`, `find_first` stop pulling as
//!   soon as the answer is known, so unbounded sources are fine
//! - **Parallel evaluation**: sized sources split into sub-ranges on a
//!   pluggable [`WorkerPool`](execution::WorkerPool); results merge in
//!   encounter order
//! - **Numeric pipelines**: `sum`, `average`, `min`, `max` and one-pass
//!   [`Summary`](numeric::Summary) statistics
//!
//! ## Quick Start
//!
//! ```rust
//! use rivulet::prelude::*;
//!
//! let strings = rivulet::of(vec!["abc", "", "bc", "efg", "abcd", "", "jkl"]);
//! let non_empty = strings.filter(|s| !s.is_empty()).count()?;
//! assert_eq!(non_empty, 5);
//!
//! let squares = rivulet::of(vec![3, 2, 2, 3, 7, 3, 5])
//!     .map(|n| n * n)
//!     .distinct()
//!     .to_vec()?;
//! assert_eq!(squares, vec![9, 4, 49, 25]);
//!
//! let sum = rivulet::range(1, 101).parallel().sum()?;
//! assert_eq!(sum, 5050);
//! # Ok::<(), rivulet::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod collector;
pub mod error;
pub mod execution;
pub mod numeric;
pub mod observability;
pub mod pipeline;
mod plan;
pub mod source;
pub mod stage;

use std::io::BufRead;
use std::path::Path;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::collector::Collector;
    pub use crate::error::{Error, Result};
    pub use crate::execution::{ExecutionMode, ExecutorConfig, ThreadPool, WorkerPool};
    pub use crate::numeric::{Numeric, NumericPipeline, Summary};
    pub use crate::pipeline::Pipeline;
    pub use crate::source::{SizeHint, Source};
    pub use crate::stage::StageKind;
}

pub use error::{Error, Result};
pub use numeric::NumericPipeline;
pub use pipeline::Pipeline;
pub use plan::StageList;

/// A pipeline over the given elements, in order.
pub fn of<T: Send + 'static>(items: impl IntoIterator<Item = T>) -> Pipeline<T> {
    Pipeline::of(items)
}

/// A pipeline over a vector, in order.
pub fn from_vec<T: Send + 'static>(items: Vec<T>) -> Pipeline<T> {
    Pipeline::from_vec(items)
}

/// A pipeline over clones of a slice's elements.
pub fn from_slice<T: Clone + Send + 'static>(items: &[T]) -> Pipeline<T> {
    Pipeline::from_slice(items)
}

/// A pipeline over an iterator, pulled lazily on one lane.
///
/// An endless iterator such as `0..` gives an unbounded pipeline.
pub fn from_iter<I>(iter: I) -> Pipeline<I::Item>
where
    I: IntoIterator,
    I::IntoIter: Send + 'static,
    I::Item: Send + 'static,
{
    Pipeline::from_iter(iter)
}

/// The unbounded sequence `seed, f(seed), f(f(seed)), ...`.
pub fn iterate<T, F>(seed: T, f: F) -> Pipeline<T>
where
    T: Clone + Send + 'static,
    F: FnMut(&T) -> T + Send + 'static,
{
    Pipeline::iterate(seed, f)
}

/// The unbounded sequence of values returned by `f`.
pub fn generate<T, F>(f: F) -> Pipeline<T>
where
    T: Send + 'static,
    F: FnMut() -> T + Send + 'static,
{
    Pipeline::generate(f)
}

/// A pipeline with no elements.
pub fn empty<T: Send + 'static>() -> Pipeline<T> {
    Pipeline::empty()
}

/// The lines of a file, opened when a terminal operation runs.
pub fn from_file(path: impl AsRef<Path>) -> Pipeline<String> {
    Pipeline::from_file(path)
}

/// The lines of a reader.
pub fn from_reader<R: BufRead + Send + 'static>(reader: R) -> Pipeline<String> {
    Pipeline::from_reader(reader)
}

/// The half-open integer range `[start, end)`.
pub fn range<N: numeric::Integral>(start: N, end: N) -> NumericPipeline<N> {
    NumericPipeline::range(start, end)
}

/// The closed integer range `[start, end]`.
pub fn range_closed<N: numeric::Integral>(start: N, end: N) -> NumericPipeline<N> {
    NumericPipeline::range_closed(start, end)
}
