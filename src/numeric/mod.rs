//! Numeric specialization: primitive element types and their reductions.
//!
//! [`NumericPipeline`] wraps a [`Pipeline`](crate::Pipeline) over a
//! [`Numeric`] element type and adds `sum`, `min`, `max`, `average` and
//! [`Summary`] statistics. Integer ranges come from [`Integral`] types.
//!
//! Integer sums wrap on overflow. Float sums are plain left-to-right
//! additions per lane, so parallel float sums may differ in the last bits
//! from sequential ones.

mod pipeline;
mod summary;

pub use pipeline::NumericPipeline;
pub use summary::Summary;

use std::cmp::Ordering;
use std::fmt;
use std::hash::Hash;

/// A primitive number usable as a pipeline element.
pub trait Numeric: Copy + PartialOrd + Send + Sync + fmt::Debug + fmt::Display + 'static {
    /// The additive identity.
    const ZERO: Self;

    /// Hashable identity used by `distinct`.
    ///
    /// Integers use themselves. Floats use their bit pattern with every NaN
    /// folded into one, so `0.0` and `-0.0` stay distinct.
    type Key: Eq + Hash + Send + Sync + 'static;

    /// Add two values; integers wrap on overflow.
    fn plus(self, other: Self) -> Self;

    /// Convert to `f64`, possibly losing precision.
    fn to_f64(self) -> f64;

    /// A total order over every value, including NaN for floats.
    fn total_cmp(&self, other: &Self) -> Ordering;

    /// The `distinct` key of this value.
    fn key(self) -> Self::Key;
}

/// An integer type that can back a [`RangeSource`](crate::source::RangeSource).
pub trait Integral: Numeric + Ord + Eq + Hash {
    /// `self + n`, computed without intermediate overflow.
    fn offset(self, n: usize) -> Self;

    /// Number of values in `[from, to)`, saturating at `usize::MAX`.
    fn distance(from: Self, to: Self) -> usize;
}

macro_rules! impl_integral {
    ($($t:ty),* $(,)?) => {
        $(
            impl Numeric for $t {
                const ZERO: Self = 0;
                type Key = $t;

                #[inline]
                fn plus(self, other: Self) -> Self {
                    self.wrapping_add(other)
                }

                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }

                #[inline]
                fn total_cmp(&self, other: &Self) -> Ordering {
                    self.cmp(other)
                }

                #[inline]
                fn key(self) -> Self::Key {
                    self
                }
            }

            impl Integral for $t {
                #[inline]
                fn offset(self, n: usize) -> Self {
                    (self as i128 + n as i128) as $t
                }

                #[inline]
                fn distance(from: Self, to: Self) -> usize {
                    if to <= from {
                        return 0;
                    }
                    usize::try_from(to as i128 - from as i128).unwrap_or(usize::MAX)
                }
            }
        )*
    };
}

macro_rules! impl_float {
    ($($t:ty => $bits:ty),* $(,)?) => {
        $(
            impl Numeric for $t {
                const ZERO: Self = 0.0;
                type Key = $bits;

                #[inline]
                fn plus(self, other: Self) -> Self {
                    self + other
                }

                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }

                #[inline]
                fn total_cmp(&self, other: &Self) -> Ordering {
                    <$t>::total_cmp(self, other)
                }

                #[inline]
                fn key(self) -> Self::Key {
                    if self.is_nan() {
                        <$t>::NAN.to_bits()
                    } else {
                        self.to_bits()
                    }
                }
            }
        )*
    };
}

impl_integral!(u8, u32, u64, usize, i32, i64);
impl_float!(f32 => u32, f64 => u64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_sum_wraps() {
        assert_eq!(i32::MAX.plus(1), i32::MIN);
        assert_eq!(250u8.plus(10), 4);
    }

    #[test]
    fn test_offset_and_distance() {
        assert_eq!((-3i32).offset(5), 2);
        assert_eq!(i32::distance(-3, 2), 5);
        assert_eq!(i32::distance(2, -3), 0);
        assert_eq!(u64::distance(0, u64::MAX), usize::try_from(u64::MAX).unwrap_or(usize::MAX));
        assert_eq!(250u8.offset(5), 255);
    }

    #[test]
    fn test_float_keys() {
        assert_eq!(f64::NAN.key(), (-f64::NAN).key());
        assert_ne!(0.0f64.key(), (-0.0f64).key());
        assert_eq!(1.5f32.key(), 1.5f32.to_bits());
    }

    #[test]
    fn test_total_cmp_orders_nan_last() {
        assert_eq!(1.0f64.total_cmp(&f64::NAN), Ordering::Less);
        assert_eq!(Numeric::total_cmp(&3i64, &3), Ordering::Equal);
    }
}
