//! Matrix-vector multiplication, `spec.md` §4.5. Matrices use the
//! doubled variable order `2k, 2k+1` for the row/column bits of qubit
//! `k`; vectors use variable `k` directly.

use addd_core::apply_cache::ApplyCache;
use addd_core::edge::Edge;
use addd_core::node::{NodeHandle, Var};
use addd_core::AdddResult;
use addd_manager::scheduler;
use addd_manager::worker::RefGuard;
use addd_core::manager::Manager;
use addd_manager::EvbddManager;

use super::{plus, raw_cofactor, scaled_cofactor, EvbddOp};
use crate::make_edge::make_edge;
use crate::normalize::NormStrategy;

/// `matvec(mat, vec, level, n)`: each call defers its own incoming edge
/// weights to the very end (the cache key and the internal decomposition
/// never fold them in), so a cache hit is reusable across callers that
/// reach the same pair of targets with different accumulated scaling.
pub fn matvec(
    manager: &EvbddManager,
    strategy: NormStrategy,
    mat: Edge,
    vec: Edge,
    level: Var,
    n: Var,
) -> AdddResult<Edge> {
    if mat.is_zero() || vec.is_zero() {
        return Ok(Edge::ZERO);
    }

    // Guard the incoming operands before anything that could GC: a
    // caller one level up may have handed us edges not yet reachable
    // from anywhere but its own stack frame.
    let g_mat = RefGuard::push(mat);
    let g_vec = RefGuard::push(vec);
    manager.maybe_gc();
    let mat = g_mat.get();
    let vec = g_vec.get();

    if level == n {
        let w = manager.weight_mul(mat.weight, vec.weight)?;
        return Ok(Edge::new(NodeHandle::TERMINAL, w));
    }

    let key = [mat.target.0, vec.target.0, level as u64];
    if let Some(cached) =
        ApplyCache::<EvbddOp>::get(manager.apply_cache(), EvbddOp::Matvec, &key)
    {
        let prod = manager.weight_mul(mat.weight, vec.weight)?;
        let w = manager.weight_mul(prod, cached.weight)?;
        return Ok(Edge::new(cached.target, w));
    }

    let (vec_low, vec_high) = raw_cofactor(manager, vec, level);
    let (mat_low, mat_high) = raw_cofactor(manager, mat, 2 * level);
    let (u00, u10) = scaled_cofactor(manager, mat_low, 2 * level + 1)?;
    let (u01, u11) = scaled_cofactor(manager, mat_high, 2 * level + 1)?;

    // `mat`/`vec` are read again below, after the fork, through the
    // guards pushed at entry (`g_mat`/`g_vec`), not the plain locals.
    let g_vl = RefGuard::push(vec_low);
    let g_vh = RefGuard::push(vec_high);
    let g00 = RefGuard::push(u00);
    let g10 = RefGuard::push(u10);
    let g01 = RefGuard::push(u01);
    let g11 = RefGuard::push(u11);

    // Every closure resolves its operands through the guard at the
    // moment it actually runs rather than the value it closed over,
    // since a GC can renumber weight handles while the task sits queued
    // on another worker.
    let tasks: Vec<Box<dyn FnOnce() -> AdddResult<Edge> + Send + '_>> = vec![
        Box::new(|| matvec(manager, strategy, g00.get(), g_vl.get(), level + 1, n)),
        Box::new(|| matvec(manager, strategy, g10.get(), g_vl.get(), level + 1, n)),
        Box::new(|| matvec(manager, strategy, g01.get(), g_vh.get(), level + 1, n)),
        Box::new(|| matvec(manager, strategy, g11.get(), g_vh.get(), level + 1, n)),
    ];
    let mut results = scheduler::fork_join_n(tasks);
    let res_high11 = results.pop().unwrap()?;
    let res_high01 = results.pop().unwrap()?;
    let res_low10 = results.pop().unwrap()?;
    let res_low00 = results.pop().unwrap()?;

    let res_low = make_edge(manager, level, res_low00, res_low10, strategy)?;
    let res_high = make_edge(manager, level, res_high01, res_high11, strategy)?;
    let res = plus(manager, strategy, res_low, res_high)?;

    ApplyCache::<EvbddOp>::insert(manager.apply_cache(), EvbddOp::Matvec, &key, res);

    let mat = g_mat.get();
    let vec = g_vec.get();
    let prod = manager.weight_mul(mat.weight, vec.weight)?;

    let w = manager.weight_mul(prod, res.weight)?;
    Ok(Edge::new(res.target, w))
}
