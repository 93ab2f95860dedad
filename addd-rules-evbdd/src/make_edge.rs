//! The `make_edge` primitive (`spec.md` §4.3): the single entry point
//! through which every canonicity invariant is enforced.

use addd_core::diagram_rules::ReducedOrNew;
use addd_core::edge::Edge;
use addd_core::manager::Manager;
use addd_core::node::InnerNode;
use addd_core::AdddResult;
use addd_manager::EvbddManager;

use crate::normalize::{normalize, NormStrategy};

/// Reduction here means both the "equal children collapse" rule the
/// teacher's `BCDDRules` implements, and edge-weight normalization,
/// which a plain BDD's rules have no counterpart for. `addd_core`'s
/// `DiagramRules` trait models this same seam, but every call site here
/// goes through the free `make_edge` function below with an explicit
/// `strategy` instead of a trait object, so there is no concrete
/// `DiagramRules` impl to construct.
fn reduce_with(
    manager: &EvbddManager,
    low: Edge,
    high: Edge,
    strategy: NormStrategy,
) -> AdddResult<ReducedOrNew> {
    // Invariant 2: merge-equal-children.
    if low == high {
        return Ok(ReducedOrNew::Reduced(low));
    }

    match normalize(manager, low.weight, high.weight, strategy)? {
        None => {
            // Invariant 1: no-zero-child collapses to the zero terminal.
            Ok(ReducedOrNew::Reduced(Edge::ZERO))
        }
        Some(n) => {
            let node = InnerNode::new(0, low.target, high.target, n.low_weight, n.high_weight);
            Ok(ReducedOrNew::New(node, n.w_norm))
        }
    }
}

/// Build the edge `(var -> low, high)`, normalizing and hash-consing as
/// needed. This is the function every recursive operation in
/// `crate::ops` calls; it is deterministic for a fixed tolerance and
/// strategy (`spec.md` §4.3 contract).
pub fn make_edge(
    manager: &EvbddManager,
    var: addd_core::node::Var,
    low: Edge,
    high: Edge,
    strategy: NormStrategy,
) -> AdddResult<Edge> {
    match reduce_with(manager, low, high, strategy)? {
        ReducedOrNew::Reduced(e) => Ok(e),
        ReducedOrNew::New(mut node, w_norm) => {
            node.var = var;
            let target = manager.make_node(node)?;
            Ok(Edge::new(target, w_norm))
        }
    }
}
