//! Recursive algebraic operations (C6): `plus`, `matvec`, `matmat`,
//! `inner_product`, `tensor`. All share the fork/join shape `spec.md`
//! §4.5 describes: terminal check, cache check, decompose by top
//! variable, recurse in parallel, combine via `make_edge`.

pub mod inner_product;
pub mod matmat;
pub mod matvec;
pub mod plus;
pub mod tensor;

use addd_core::edge::{Edge, WeightHandle};
use addd_core::node::{Node, NodeHandle, Var};
use addd_core::HasApplyCache;
use addd_derive::Countable;
use addd_manager::apply_cache::DirectMappedApplyCache;
use addd_core::manager::Manager;
use addd_manager::EvbddManager;

pub use inner_product::inner_product;
pub use matmat::matmat;
pub use matvec::matvec;
pub use plus::plus;
pub use tensor::tensor;

/// Operator tags for the shared apply cache (C4). One variant per
/// recursive operation plus the two tensor helpers, which are memoized
/// independently.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Countable)]
pub enum EvbddOp {
    Plus,
    Matvec,
    Matmat,
    InnerProduct,
    ShiftVars,
    ReplaceTerminal,
}

impl HasApplyCache<EvbddOp> for EvbddManager {
    type Cache = DirectMappedApplyCache;

    fn apply_cache(&self) -> &Self::Cache {
        EvbddManager::apply_cache(self)
    }
}

/// The variable of `edge`'s target node, or `Var::MAX` for a terminal
/// edge (sentinel "no variable", always sorts after any real variable).
pub(crate) fn top_var(manager: &EvbddManager, edge: Edge) -> Var {
    match manager.get_node(edge.target) {
        Node::Terminal => Var::MAX,
        Node::Inner(node) => node.var,
    }
}

/// Decompose `edge` at variable `v` without folding in `edge`'s own
/// weight: returns the node's two children verbatim when `edge`'s
/// target is an inner node at exactly `v`, or a same-target pass-through
/// with unit weight when `v` does not apply to `edge` (terminal target,
/// or a node whose variable lies strictly above `v`). Callers fold in
/// whatever portion of `edge.weight` their own algorithm requires;
/// `raw_cofactor` itself never does, mirroring `evbdd_get_topvar` in the
/// original engine this crate's algorithms are grounded on.
pub(crate) fn raw_cofactor(manager: &EvbddManager, edge: Edge, v: Var) -> (Edge, Edge) {
    match manager.get_node(edge.target) {
        Node::Terminal => (
            Edge::new(NodeHandle::TERMINAL, WeightHandle::ONE),
            Edge::new(NodeHandle::TERMINAL, WeightHandle::ONE),
        ),
        Node::Inner(node) if node.var == v => (node.low(), node.high()),
        Node::Inner(_) => (
            Edge::new(edge.target, WeightHandle::ONE),
            Edge::new(edge.target, WeightHandle::ONE),
        ),
    }
}

/// `raw_cofactor` with `edge`'s own weight folded into both children —
/// the normal one-level decomposition step used by `plus` and by the
/// second decomposition level inside `matvec`/`matmat` (folding an
/// already-unscaled intermediate edge's own weight into its children).
pub(crate) fn scaled_cofactor(
    manager: &EvbddManager,
    edge: Edge,
    v: Var,
) -> addd_core::AdddResult<(Edge, Edge)> {
    let (low, high) = raw_cofactor(manager, edge, v);
    let low = Edge::new(low.target, manager.weight_mul(edge.weight, low.weight)?);
    let high = Edge::new(high.target, manager.weight_mul(edge.weight, high.weight)?);
    Ok((low, high))
}

/// Sort a commutative operand pair for cache-key normalization (`spec.md`
/// §4.4: "for commutative operations ... sort operand handles before
/// lookup").
pub(crate) fn sorted_pair(a: Edge, b: Edge) -> (Edge, Edge) {
    let ka = (a.target.0, a.weight.0);
    let kb = (b.target.0, b.weight.0);
    if ka <= kb {
        (a, b)
    } else {
        (b, a)
    }
}

pub(crate) fn edge_cache_key(edge: Edge) -> u64 {
    edge.target.0 ^ ((edge.weight.0 as u64) << 48)
}
