//! Bounded integer range source.

use super::{BoxSource, SizeHint, Source, split_points};
use crate::error::Result;
use crate::numeric::Integral;

/// A source producing `start, start + 1, ...` for a fixed count.
///
/// Elements are computed from their offset, so ranges that end at the type's
/// maximum never overflow and sub-ranges split in constant time.
pub struct RangeSource<N> {
    start: N,
    pos: usize,
    end: usize,
}

impl<N: Integral> RangeSource<N> {
    /// Half-open range `[start, end)`.
    pub fn new(start: N, end: N) -> Self {
        Self {
            start,
            pos: 0,
            end: N::distance(start, end),
        }
    }

    /// Closed range `[start, end]`.
    pub fn closed(start: N, end: N) -> Self {
        let end = if end < start {
            0
        } else {
            N::distance(start, end).saturating_add(1)
        };
        Self { start, pos: 0, end }
    }
}

impl<N: Integral> Source for RangeSource<N> {
    type Item = N;

    fn produce(&mut self) -> Result<Option<N>> {
        if self.pos >= self.end {
            return Ok(None);
        }
        let value = self.start.offset(self.pos);
        self.pos += 1;
        Ok(Some(value))
    }

    fn size_hint(&self) -> SizeHint {
        SizeHint::Exact(self.end - self.pos)
    }

    fn split_off(&mut self, parts: usize) -> Vec<BoxSource<N>> {
        let len = self.end - self.pos;
        if parts < 2 || len < 2 {
            return Vec::new();
        }
        let points = split_points(len, parts.min(len));
        let base = self.pos;
        let rest = points
            .windows(2)
            .skip(1)
            .map(|w| {
                Box::new(RangeSource {
                    start: self.start,
                    pos: base + w[0],
                    end: base + w[1],
                }) as BoxSource<N>
            })
            .collect();
        self.end = base + points[1];
        rest
    }

    fn name(&self) -> &str {
        "range"
    }
}
