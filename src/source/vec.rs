//! Finite ordered snapshot source.

use std::collections::VecDeque;

use super::{BoxSource, SizeHint, Source, split_points};
use crate::error::Result;

/// A source over an owned, ordered snapshot of elements.
///
/// Backs `of`, `from_vec`, `from_slice` and the merged output of parallel
/// barrier stages. Splits into contiguous, balanced sub-ranges.
pub struct VecSource<T> {
    items: VecDeque<T>,
}

impl<T> VecSource<T> {
    /// Create a source over the given elements.
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: items.into(),
        }
    }

    /// Number of elements not yet produced.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether every element has been produced.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> From<Vec<T>> for VecSource<T> {
    fn from(items: Vec<T>) -> Self {
        Self::new(items)
    }
}

impl<T: Send + 'static> Source for VecSource<T> {
    type Item = T;

    fn produce(&mut self) -> Result<Option<T>> {
        Ok(self.items.pop_front())
    }

    fn size_hint(&self) -> SizeHint {
        SizeHint::Exact(self.items.len())
    }

    fn split_off(&mut self, parts: usize) -> Vec<BoxSource<T>> {
        let len = self.items.len();
        if parts < 2 || len < 2 {
            return Vec::new();
        }
        let points = split_points(len, parts.min(len));

        // Peel sub-ranges off the back so earlier offsets stay valid.
        let mut rest: Vec<BoxSource<T>> = Vec::with_capacity(points.len() - 2);
        for &at in points[1..points.len() - 1].iter().rev() {
            let tail = self.items.split_off(at);
            rest.push(Box::new(VecSource { items: tail }));
        }
        rest.reverse();
        rest
    }

    fn name(&self) -> &str {
        "vec"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(source: &mut dyn Source<Item = u32>) -> Vec<u32> {
        let mut out = Vec::new();
        while let Some(x) = source.produce().unwrap() {
            out.push(x);
        }
        out
    }

    #[test]
    fn test_produce_in_order() {
        let mut source = VecSource::new(vec![1u32, 2, 3]);
        assert_eq!(source.size_hint(), SizeHint::Exact(3));
        assert_eq!(drain(&mut source), vec![1, 2, 3]);
        assert_eq!(source.produce().unwrap(), None);
    }

    #[test]
    fn test_split_preserves_encounter_order() {
        let mut source = VecSource::new((0u32..10).collect());
        let mut rest = source.split_off(3);
        assert_eq!(rest.len(), 2);

        let mut all = drain(&mut source);
        assert_eq!(all, vec![0, 1, 2]);
        for part in rest.iter_mut() {
            all.extend(drain(part.as_mut()));
        }
        assert_eq!(all, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_never_yields_empty_parts() {
        let mut source = VecSource::new(vec![1u32, 2]);
        let rest = source.split_off(8);
        assert_eq!(rest.len(), 1);
        assert_eq!(source.len(), 1);
    }

    #[test]
    fn test_single_element_does_not_split() {
        let mut source = VecSource::new(vec![1u32]);
        assert!(source.split_off(4).is_empty());
    }
}
