//! Kronecker product, `spec.md` §4.5: shift every variable in `b` by
//! `n_a`, then graft `b` onto `a`'s terminal, multiplying the two root
//! weights at the new root edge. `shift_vars` and `replace_terminal` are
//! themselves recursive and memoized helpers.

use addd_core::apply_cache::ApplyCache;
use addd_core::edge::Edge;
use addd_core::node::Var;
use addd_core::AdddResult;

use super::EvbddOp;
use crate::make_edge::make_edge;
use crate::normalize::NormStrategy;
use addd_core::manager::Manager;
use addd_manager::worker::RefGuard;
use addd_manager::EvbddManager;

/// Relabel every variable reachable from `edge` by adding `shift`.
/// Terminal edges are returned unchanged (there is nothing to shift).
pub fn shift_vars(
    manager: &EvbddManager,
    edge: Edge,
    shift: Var,
    strategy: NormStrategy,
) -> AdddResult<Edge> {
    if edge.target.is_terminal() {
        return Ok(edge);
    }

    let key = [edge.target.0, edge.weight.0 as u64, shift as u64];
    if let Some(cached) =
        ApplyCache::<EvbddOp>::get(manager.apply_cache(), EvbddOp::ShiftVars, &key)
    {
        return Ok(cached);
    }

    let node = match manager.get_node(edge.target) {
        addd_core::node::Node::Inner(n) => n,
        addd_core::node::Node::Terminal => unreachable!("checked is_terminal above"),
    };
    let low = shift_vars(manager, node.low(), shift, strategy)?;
    let high = shift_vars(manager, node.high(), shift, strategy)?;
    let result = make_edge(manager, node.var + shift, low, high, strategy)?;
    let result = Edge::new(result.target, manager.weight_mul(edge.weight, result.weight)?);

    ApplyCache::<EvbddOp>::insert(manager.apply_cache(), EvbddOp::ShiftVars, &key, result);
    Ok(result)
}

/// Replace every terminal edge reachable from `edge` by `replacement`,
/// multiplying weights along the way.
pub fn replace_terminal(
    manager: &EvbddManager,
    edge: Edge,
    replacement: Edge,
    strategy: NormStrategy,
) -> AdddResult<Edge> {
    if edge.target.is_terminal() {
        let w = manager.weight_mul(edge.weight, replacement.weight)?;
        return Ok(Edge::new(replacement.target, w));
    }

    let key = [
        edge.target.0,
        edge.weight.0 as u64,
        replacement.target.0,
        replacement.weight.0 as u64,
    ];
    if let Some(cached) =
        ApplyCache::<EvbddOp>::get(manager.apply_cache(), EvbddOp::ReplaceTerminal, &key)
    {
        return Ok(cached);
    }

    let node = match manager.get_node(edge.target) {
        addd_core::node::Node::Inner(n) => n,
        addd_core::node::Node::Terminal => unreachable!("checked is_terminal above"),
    };
    let low = replace_terminal(manager, node.low(), replacement, strategy)?;
    let high = replace_terminal(manager, node.high(), replacement, strategy)?;
    let result = make_edge(manager, node.var, low, high, strategy)?;
    let result = Edge::new(result.target, manager.weight_mul(edge.weight, result.weight)?);

    ApplyCache::<EvbddOp>::insert(manager.apply_cache(), EvbddOp::ReplaceTerminal, &key, result);
    Ok(result)
}

/// `tensor(a, b, n_a)`: `a ⊗ b`, where `a` has `n_a` variables.
pub fn tensor(
    manager: &EvbddManager,
    strategy: NormStrategy,
    a: Edge,
    b: Edge,
    n_a: Var,
) -> AdddResult<Edge> {
    // Operation entry (`spec.md` §4.1/§5): check before doing any work,
    // not only reactively once a table insert has already failed.
    // `a`/`b` are guarded for the duration since a caller may have
    // handed us an edge not yet reachable from anywhere else.
    let g_a = RefGuard::push(a);
    let g_b = RefGuard::push(b);
    manager.maybe_gc();
    let a = g_a.get();
    let b = g_b.get();

    let shifted_b = shift_vars(manager, b, n_a, strategy)?;
    replace_terminal(manager, a, shifted_b, strategy)
}
