//! The `DiagramRules` seam: what it means to reduce a candidate node
//! before it is (maybe) inserted into the node table.
//!
//! This generalizes the teacher's `complement_edge::BCDDRules` pattern
//! (reduce + cofactor) to the edge-weighted setting, where "reduction"
//! also means picking a normalized representative among the child
//! weights rather than just collapsing equal children.

use crate::edge::Edge;
use crate::error::AdddResult;
use crate::manager::{LevelNo, Manager};
use crate::node::InnerNode;

/// Outcome of applying reduction rules to a candidate pair of children:
/// either the pair collapses to one of the children verbatim (no node
/// created), or a new, already-normalized node must be interned.
pub enum ReducedOrNew {
    /// `spec.md` §3 invariant 2: equal children collapse to the child
    /// edge itself.
    Reduced(Edge),
    /// A genuinely new node, plus the edge weight to push to the
    /// parent.
    New(InnerNode, crate::edge::WeightHandle),
}

/// Implemented once per concrete diagram flavor (here, the single
/// complex-weighted EVBDD flavor in `addd-rules-evbdd`). `addd-core`
/// stays opinion-free about what "reduce" does so that a future second
/// diagram flavor (e.g. a real-valued ADD) could reuse the manager and
/// cache machinery.
pub trait DiagramRules<M: Manager> {
    /// Apply the reduction + normalization rules to a candidate node at
    /// `level` with the given two children, returning either a
    /// collapsed edge or a new node ready for `Manager::make_node`.
    fn reduce(manager: &M, level: LevelNo, low: Edge, high: Edge) -> AdddResult<ReducedOrNew>;
}
