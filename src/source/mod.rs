//! Sources: where a pipeline's elements come from.
//!
//! A [`Source`] produces elements one at a time, pull-style. Sources with a
//! known size can also be split into balanced sub-ranges, which is what the
//! parallel strategy runs on separate workers. Everything else (iterators,
//! readers, generators) is evaluated on a single lane.
//!
//! | Source | Size | Splits |
//! |--------|------|--------|
//! | [`VecSource`] | exact | yes |
//! | [`RangeSource`] | exact | yes |
//! | [`EmptySource`] | exact (0) | no |
//! | [`IterSource`] | unknown | no |
//! | [`LineSource`] | unknown | no |
//! | [`Iterate`] / [`Generate`] | unbounded | no |

mod generate;
mod iter;
mod lines;
mod range;
mod vec;

pub use generate::{Generate, Iterate, generate, iterate};
pub use iter::{EmptySource, IterSource, empty, from_iter};
pub use lines::LineSource;
pub use range::RangeSource;
pub use vec::VecSource;

use crate::error::Result;

/// A boxed, type-erased source.
pub type BoxSource<T> = Box<dyn Source<Item = T>>;

/// How many elements a source will produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeHint {
    /// Exactly this many elements remain.
    Exact(usize),
    /// Finite, but the count is not known up front.
    Unknown,
    /// The source never ends on its own.
    Unbounded,
}

impl SizeHint {
    /// Whether the source never ends on its own.
    pub fn is_unbounded(&self) -> bool {
        matches!(self, Self::Unbounded)
    }

    /// The exact remaining count, if known.
    pub fn exact(&self) -> Option<usize> {
        match self {
            Self::Exact(n) => Some(*n),
            _ => None,
        }
    }
}

/// A producer of pipeline elements.
///
/// The pipeline owns its source exclusively for the length of one terminal
/// operation and never touches it before then.
pub trait Source: Send + 'static {
    /// The type of elements this source produces.
    type Item: Send + 'static;

    /// Produce the next element.
    ///
    /// Returns `Ok(None)` when the source is exhausted.
    fn produce(&mut self) -> Result<Option<Self::Item>>;

    /// Report how many elements remain.
    fn size_hint(&self) -> SizeHint;

    /// Split the remaining elements into up to `parts` contiguous sub-ranges.
    ///
    /// `self` keeps the first sub-range; the returned sources hold the rest,
    /// in encounter order. Sources that cannot split return an empty vector.
    fn split_off(&mut self, parts: usize) -> Vec<BoxSource<Self::Item>> {
        let _ = parts;
        Vec::new()
    }

    /// Get the name of this source.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Balanced sub-range boundaries for `len` elements split `parts` ways.
///
/// Returns `parts + 1` offsets starting at 0 and ending at `len`.
pub(crate) fn split_points(len: usize, parts: usize) -> Vec<usize> {
    let parts = parts.max(1);
    (0..=parts).map(|p| p * len / parts).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_hint() {
        assert!(SizeHint::Unbounded.is_unbounded());
        assert!(!SizeHint::Unknown.is_unbounded());
        assert_eq!(SizeHint::Exact(4).exact(), Some(4));
        assert_eq!(SizeHint::Unknown.exact(), None);
    }

    #[test]
    fn test_split_points_balanced() {
        assert_eq!(split_points(10, 3), vec![0, 3, 6, 10]);
        assert_eq!(split_points(4, 4), vec![0, 1, 2, 3, 4]);
        assert_eq!(split_points(5, 0), vec![0, 5]);
    }
}
