//! Intermediate stages and the cursors that evaluate them.
//!
//! A stage is a pure description until a terminal operation opens the
//! pipeline. Opening turns every stage into a [`Cursor`] per lane: a pull
//! handle that asks its upstream cursor for elements on demand.
//!
//! | Stage | Stateful | Short-circuit |
//! |-------|----------|---------------|
//! | `filter`, `map`, `flat_map`, `peek`, `skip` | no | no |
//! | `limit` | no | yes |
//! | `distinct`, `sorted` | yes | no |

mod stateful;
mod stateless;

pub(crate) use stateful::{Distinct, Sorted, merge_sorted};
pub(crate) use stateless::{Filter, FlatMap, Limit, Map, Peek, Skip};

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::execution::StopSignal;
use crate::source::BoxSource;

/// The kind of an intermediate stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    /// Drops elements failing a predicate.
    Filter,
    /// Replaces each element with a function of it.
    Map,
    /// Replaces each element with a sequence of elements.
    FlatMap,
    /// Drops elements whose key was already seen.
    Distinct,
    /// Buffers everything, then yields it in comparator order.
    Sorted,
    /// Stops after this many elements.
    Limit(usize),
    /// Drops this many leading elements.
    Skip(usize),
    /// Observes elements without changing them.
    Peek,
}

impl StageKind {
    /// Whether the stage buffers upstream elements before yielding.
    pub fn is_stateful(&self) -> bool {
        matches!(self, Self::Distinct | Self::Sorted)
    }

    /// Whether the stage can stop upstream pulling early.
    pub fn is_short_circuit(&self) -> bool {
        matches!(self, Self::Limit(_))
    }

    /// Whether parallel evaluation must merge sub-ranges at this stage.
    ///
    /// Position-dependent and stateful stages see the whole sequence, so
    /// their upstream lanes are gathered in encounter order first.
    pub fn is_barrier(&self) -> bool {
        matches!(
            self,
            Self::Distinct | Self::Sorted | Self::Limit(_) | Self::Skip(_)
        )
    }

    /// Short lowercase name, as used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Filter => "filter",
            Self::Map => "map",
            Self::FlatMap => "flat_map",
            Self::Distinct => "distinct",
            Self::Sorted => "sorted",
            Self::Limit(_) => "limit",
            Self::Skip(_) => "skip",
            Self::Peek => "peek",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Limit(n) => write!(f, "limit({n})"),
            Self::Skip(n) => write!(f, "skip({n})"),
            other => f.write_str(other.name()),
        }
    }
}

/// A pull handle over one lane of an opened pipeline.
pub(crate) trait Cursor<T>: Send {
    /// Pull the next element, or `Ok(None)` once the lane is exhausted.
    fn pull(&mut self) -> Result<Option<T>>;
}

pub(crate) type BoxCursor<T> = Box<dyn Cursor<T>>;

pub(crate) type Predicate<T> = Arc<dyn Fn(&T) -> Result<bool> + Send + Sync>;
pub(crate) type Mapper<T, U> = Arc<dyn Fn(T) -> Result<U> + Send + Sync>;
pub(crate) type Expander<T, U> =
    Arc<dyn Fn(T) -> Result<Box<dyn Iterator<Item = U> + Send>> + Send + Sync>;
pub(crate) type Observer<T> = Arc<dyn Fn(&T) + Send + Sync>;
pub(crate) type Comparator<T> = Arc<dyn Fn(&T, &T) -> Result<Ordering> + Send + Sync>;
pub(crate) type KeyFn<T, K> = Arc<dyn Fn(&T) -> K + Send + Sync>;

/// The root cursor of a lane: pulls from a source until told to stop.
pub(crate) struct SourceCursor<T> {
    source: BoxSource<T>,
    lane: usize,
    stop: StopSignal,
}

impl<T> SourceCursor<T> {
    pub(crate) fn new(source: BoxSource<T>, lane: usize, stop: StopSignal) -> Self {
        Self { source, lane, stop }
    }
}

impl<T: Send + 'static> Cursor<T> for SourceCursor<T> {
    fn pull(&mut self) -> Result<Option<T>> {
        if self.stop.stops(self.lane) {
            return Ok(None);
        }
        self.source.produce()
    }
}

/// Pull a lane to exhaustion.
pub(crate) fn drain<T>(cursor: &mut dyn Cursor<T>) -> Result<Vec<T>> {
    let mut out = Vec::new();
    while let Some(item) = cursor.pull()? {
        out.push(item);
    }
    Ok(out)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::source::VecSource;

    /// A cursor over a fixed vector, for exercising single stages.
    pub(crate) fn cursor<T: Send + 'static>(items: Vec<T>) -> BoxCursor<T> {
        Box::new(SourceCursor::new(
            Box::new(VecSource::new(items)),
            0,
            StopSignal::new(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_flags() {
        assert!(StageKind::Sorted.is_stateful());
        assert!(StageKind::Distinct.is_stateful());
        assert!(!StageKind::Limit(3).is_stateful());
        assert!(StageKind::Limit(3).is_short_circuit());
        assert!(!StageKind::Skip(3).is_short_circuit());
        assert!(StageKind::Skip(3).is_barrier());
        assert!(!StageKind::Map.is_barrier());
    }

    #[test]
    fn test_display() {
        assert_eq!(StageKind::Limit(5).to_string(), "limit(5)");
        assert_eq!(StageKind::FlatMap.to_string(), "flat_map");
    }

    #[test]
    fn test_source_cursor_stops() {
        let stop = StopSignal::new();
        let mut cursor = SourceCursor::new(
            Box::new(crate::source::VecSource::new(vec![1, 2, 3])),
            0,
            stop.clone(),
        );
        assert_eq!(cursor.pull().unwrap(), Some(1));
        stop.raise();
        assert_eq!(cursor.pull().unwrap(), None);
    }

    #[test]
    fn test_source_cursor_cut_off_after_lane() {
        let stop = StopSignal::new();
        let lane = |i: usize| {
            SourceCursor::new(
                Box::new(crate::source::VecSource::new(vec![i * 10, i * 10 + 1])),
                i,
                stop.clone(),
            )
        };
        let (mut first, mut second, mut third) = (lane(0), lane(1), lane(2));
        assert_eq!(third.pull().unwrap(), Some(20));

        stop.raise_after(1);
        assert_eq!(third.pull().unwrap(), None);
        assert_eq!(first.pull().unwrap(), Some(0));
        assert_eq!(second.pull().unwrap(), Some(10));

        // A later cutoff never reopens a lane.
        stop.raise_after(2);
        assert_eq!(third.pull().unwrap(), None);
        stop.raise_after(0);
        assert_eq!(second.pull().unwrap(), None);
        assert_eq!(first.pull().unwrap(), Some(1));
    }
}
