//! One-pass summary statistics.

use std::fmt;

use super::Numeric;

/// Count, sum, min, max and average of a numeric sequence, in one pass.
///
/// Summaries of sub-ranges merge with [`Summary::combine`]; ties on `min`
/// and `max` keep the value from the left-hand side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary<N> {
    count: usize,
    sum: N,
    total: f64,
    min: Option<N>,
    max: Option<N>,
}

impl<N: Numeric> Default for Summary<N> {
    fn default() -> Self {
        Self {
            count: 0,
            sum: N::ZERO,
            total: 0.0,
            min: None,
            max: None,
        }
    }
}

impl<N: Numeric> Summary<N> {
    /// An empty summary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one value.
    pub fn accept(&mut self, value: N) {
        self.count += 1;
        self.sum = self.sum.plus(value);
        self.total += value.to_f64();
        if self.min.is_none_or(|m| value.total_cmp(&m).is_lt()) {
            self.min = Some(value);
        }
        if self.max.is_none_or(|m| value.total_cmp(&m).is_gt()) {
            self.max = Some(value);
        }
    }

    /// Merge a summary of the elements that follow this one.
    pub fn combine(mut self, other: Self) -> Self {
        self.count += other.count;
        self.sum = self.sum.plus(other.sum);
        self.total += other.total;
        self.min = match (self.min, other.min) {
            (Some(a), Some(b)) if b.total_cmp(&a).is_lt() => Some(b),
            (a, b) => a.or(b),
        };
        self.max = match (self.max, other.max) {
            (Some(a), Some(b)) if b.total_cmp(&a).is_gt() => Some(b),
            (a, b) => a.or(b),
        };
        self
    }

    /// Number of values seen.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Sum of the values; integers wrap on overflow.
    pub fn sum(&self) -> N {
        self.sum
    }

    /// Smallest value, or `None` if empty.
    pub fn min(&self) -> Option<N> {
        self.min
    }

    /// Largest value, or `None` if empty.
    pub fn max(&self) -> Option<N> {
        self.max
    }

    /// Arithmetic mean, or `None` if empty.
    ///
    /// Accumulated in `f64`, so it is unaffected by integer wrap-around.
    pub fn average(&self) -> Option<f64> {
        (self.count > 0).then(|| self.total / self.count as f64)
    }
}

impl<N: Numeric> fmt::Display for Summary<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "count={}, sum={}", self.count, self.sum)?;
        if let (Some(min), Some(max), Some(avg)) = (self.min, self.max, self.average()) {
            write!(f, ", min={min}, average={avg:.6}, max={max}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summarize(values: &[i32]) -> Summary<i32> {
        let mut s = Summary::new();
        for v in values {
            s.accept(*v);
        }
        s
    }

    #[test]
    fn test_empty_summary() {
        let s = Summary::<f64>::new();
        assert_eq!(s.count(), 0);
        assert_eq!(s.sum(), 0.0);
        assert_eq!(s.min(), None);
        assert_eq!(s.average(), None);
        assert_eq!(s.to_string(), "count=0, sum=0");
    }

    #[test]
    fn test_accept() {
        let s = summarize(&[4, -2, 9, 1]);
        assert_eq!(s.count(), 4);
        assert_eq!(s.sum(), 12);
        assert_eq!(s.min(), Some(-2));
        assert_eq!(s.max(), Some(9));
        assert_eq!(s.average(), Some(3.0));
        assert_eq!(
            s.to_string(),
            "count=4, sum=12, min=-2, average=3.000000, max=9"
        );
    }

    #[test]
    fn test_combine_matches_single_pass() {
        let whole = summarize(&[5, 3, 8, 3, 1, 7]);
        let halves = summarize(&[5, 3, 8]).combine(summarize(&[3, 1, 7]));
        assert_eq!(whole, halves);
        assert_eq!(summarize(&[]).combine(summarize(&[2])).max(), Some(2));
    }

    #[test]
    fn test_average_ignores_wrap() {
        let s = summarize(&[i32::MAX, i32::MAX]);
        assert_eq!(s.sum(), -2);
        assert_eq!(s.average(), Some(i32::MAX as f64));
    }
}
