//! The immutable plan graph behind a pipeline.
//!
//! Every builder call on a [`Pipeline`](crate::Pipeline) adds one node on top
//! of an `Arc`-shared upstream, so views built from the same pipeline share
//! their source node. Nothing is evaluated until a terminal operation calls
//! [`Plan::open`], which turns the graph into one cursor chain per lane.
//!
//! Stateless stages wrap each lane independently. Barrier stages (`limit`,
//! `skip`, `distinct`, `sorted`) need the whole sequence: with more than one
//! lane their upstream lanes run to completion on the worker pool, are merged
//! in lane order, and the merged result is split again for downstream stages.

use std::collections::HashSet;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

use smallvec::SmallVec;

use crate::error::{Error, Result};
use crate::execution::EvalContext;
use crate::observability;
use crate::source::{BoxSource, SizeHint, VecSource};
use crate::stage::{
    BoxCursor, Comparator, Distinct, KeyFn, Limit, Skip, Sorted, StageKind, drain, merge_sorted,
};

/// Stage kinds in build order.
pub type StageList = SmallVec<[StageKind; 8]>;

/// A node of the plan graph producing elements of type `T`.
pub(crate) trait Plan<T>: Send + Sync {
    /// Take the source and build one cursor chain per lane.
    fn open(&self, ctx: &EvalContext) -> Result<Vec<BoxCursor<T>>>;

    /// Whether a full traversal of this node would never end.
    fn is_unbounded(&self) -> bool;

    /// Reject plans that cannot run at all, before any element is pulled.
    fn validate(&self) -> Result<()>;

    /// Append this node's stages, upstream first.
    fn stages(&self, out: &mut StageList);
}

pub(crate) type PlanRef<T> = Arc<dyn Plan<T>>;

/// Builds one lane's cursor from the cursor below it.
pub(crate) type Wrap<T, U> = Arc<dyn Fn(BoxCursor<T>) -> BoxCursor<U> + Send + Sync>;

/// The root: a source that can be taken exactly once.
pub(crate) struct SourceNode<T> {
    slot: Mutex<Option<BoxSource<T>>>,
    hint: SizeHint,
}

impl<T: Send + 'static> SourceNode<T> {
    pub(crate) fn new(source: BoxSource<T>) -> Self {
        Self {
            hint: source.size_hint(),
            slot: Mutex::new(Some(source)),
        }
    }
}

impl<T: Send + 'static> Plan<T> for SourceNode<T> {
    fn open(&self, ctx: &EvalContext) -> Result<Vec<BoxCursor<T>>> {
        let source = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(Error::AlreadyConsumed)?;
        Ok(ctx.split(source))
    }

    fn is_unbounded(&self) -> bool {
        self.hint.is_unbounded()
    }

    fn validate(&self) -> Result<()> {
        Ok(())
    }

    fn stages(&self, _out: &mut StageList) {}
}

/// A lane-local stage: wraps every lane's cursor on its own.
pub(crate) struct StageNode<T, U> {
    upstream: PlanRef<T>,
    kind: StageKind,
    wrap: Wrap<T, U>,
}

impl<T, U> StageNode<T, U> {
    pub(crate) fn new(upstream: PlanRef<T>, kind: StageKind, wrap: Wrap<T, U>) -> Self {
        Self {
            upstream,
            kind,
            wrap,
        }
    }
}

impl<T: Send + 'static, U: Send + 'static> Plan<U> for StageNode<T, U> {
    fn open(&self, ctx: &EvalContext) -> Result<Vec<BoxCursor<U>>> {
        let lanes = self.upstream.open(ctx)?;
        Ok(lanes.into_iter().map(|lane| (self.wrap)(lane)).collect())
    }

    fn is_unbounded(&self) -> bool {
        self.upstream.is_unbounded()
    }

    fn validate(&self) -> Result<()> {
        self.upstream.validate()
    }

    fn stages(&self, out: &mut StageList) {
        self.upstream.stages(out);
        out.push(self.kind);
    }
}

/// How a barrier stage runs on one lane and merges many.
pub(crate) trait BarrierOp<T>: Send + Sync {
    fn kind(&self) -> StageKind;

    /// The stage over a single lane that sees the whole sequence.
    fn wrap(&self, lane: BoxCursor<T>) -> BoxCursor<T>;

    /// Per-lane work done before lanes are merged.
    fn prepass(&self, lane: BoxCursor<T>) -> BoxCursor<T> {
        self.wrap(lane)
    }

    /// Combine pre-passed lanes, given in lane order.
    fn merge(&self, lanes: Vec<Vec<T>>) -> Result<Vec<T>>;

    /// Whether the stage turns an unbounded upstream into a bounded one.
    fn bounds(&self) -> bool {
        false
    }
}

pub(crate) struct BarrierNode<T> {
    upstream: PlanRef<T>,
    op: Box<dyn BarrierOp<T>>,
}

impl<T> BarrierNode<T> {
    pub(crate) fn new(upstream: PlanRef<T>, op: impl BarrierOp<T> + 'static) -> Self {
        Self {
            upstream,
            op: Box::new(op),
        }
    }
}

impl<T: Send + 'static> Plan<T> for BarrierNode<T> {
    fn open(&self, ctx: &EvalContext) -> Result<Vec<BoxCursor<T>>> {
        let lanes = self.upstream.open(ctx)?;
        if lanes.len() == 1 {
            return Ok(lanes.into_iter().map(|lane| self.op.wrap(lane)).collect());
        }

        let count = lanes.len();
        let parts = ctx.run_lanes(lanes, |_, lane| drain(self.op.prepass(lane).as_mut()))?;
        let merged = self.op.merge(parts)?;

        let kind = self.op.kind();
        observability::trace_barrier(kind, count, merged.len());
        observability::record_barrier_merge(kind.name());
        Ok(ctx.split(Box::new(VecSource::new(merged))))
    }

    fn is_unbounded(&self) -> bool {
        !self.op.bounds() && self.upstream.is_unbounded()
    }

    fn validate(&self) -> Result<()> {
        self.upstream.validate()?;
        if self.op.kind() == StageKind::Sorted && self.upstream.is_unbounded() {
            return Err(Error::Unbounded {
                operation: "sorted",
            });
        }
        Ok(())
    }

    fn stages(&self, out: &mut StageList) {
        self.upstream.stages(out);
        out.push(self.op.kind());
    }
}

pub(crate) struct LimitOp(pub(crate) usize);

impl<T: Send + 'static> BarrierOp<T> for LimitOp {
    fn kind(&self) -> StageKind {
        StageKind::Limit(self.0)
    }

    fn wrap(&self, lane: BoxCursor<T>) -> BoxCursor<T> {
        Box::new(Limit::new(lane, self.0))
    }

    fn merge(&self, lanes: Vec<Vec<T>>) -> Result<Vec<T>> {
        Ok(lanes.into_iter().flatten().take(self.0).collect())
    }

    fn bounds(&self) -> bool {
        true
    }
}

pub(crate) struct SkipOp(pub(crate) usize);

impl<T: Send + 'static> BarrierOp<T> for SkipOp {
    fn kind(&self) -> StageKind {
        StageKind::Skip(self.0)
    }

    fn wrap(&self, lane: BoxCursor<T>) -> BoxCursor<T> {
        Box::new(Skip::new(lane, self.0))
    }

    // Which elements to drop depends on every lane before this one.
    fn prepass(&self, lane: BoxCursor<T>) -> BoxCursor<T> {
        lane
    }

    fn merge(&self, lanes: Vec<Vec<T>>) -> Result<Vec<T>> {
        Ok(lanes.into_iter().flatten().skip(self.0).collect())
    }
}

pub(crate) struct DistinctOp<T, K> {
    pub(crate) key: KeyFn<T, K>,
}

impl<T, K> BarrierOp<T> for DistinctOp<T, K>
where
    T: Send + 'static,
    K: Eq + Hash + Send + 'static,
{
    fn kind(&self) -> StageKind {
        StageKind::Distinct
    }

    fn wrap(&self, lane: BoxCursor<T>) -> BoxCursor<T> {
        Box::new(Distinct::new(lane, self.key.clone()))
    }

    fn merge(&self, lanes: Vec<Vec<T>>) -> Result<Vec<T>> {
        let mut seen = HashSet::new();
        Ok(lanes
            .into_iter()
            .flatten()
            .filter(|item| seen.insert((self.key)(item)))
            .collect())
    }
}

pub(crate) struct SortedOp<T> {
    pub(crate) cmp: Comparator<T>,
}

impl<T: Send + 'static> BarrierOp<T> for SortedOp<T> {
    fn kind(&self) -> StageKind {
        StageKind::Sorted
    }

    fn wrap(&self, lane: BoxCursor<T>) -> BoxCursor<T> {
        Box::new(Sorted::new(lane, self.cmp.clone()))
    }

    fn merge(&self, lanes: Vec<Vec<T>>) -> Result<Vec<T>> {
        merge_sorted(lanes, &self.cmp)
    }
}
