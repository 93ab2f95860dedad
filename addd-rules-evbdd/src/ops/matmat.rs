//! Matrix-matrix multiplication, `spec.md` §4.5. Structurally identical
//! to `matvec` but with two matrices: eight sub-products, assembled as
//! two 2x2 block additions and a final `make_edge` at `2k` combining
//! `make_edge` results at `2k+1`.

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

pub fn matmat(
    manager: &EvbddManager,
    strategy: NormStrategy,
    a: Edge,
    b: Edge,
    level: Var,
    n: Var,
) -> AdddResult<Edge> {
    if a.is_zero() || b.is_zero() {
        return Ok(Edge::ZERO);
    }

    // Guard the incoming operands before anything that could GC: a
    // caller one level up may have handed us edges not yet reachable
    // from anywhere but its own stack frame.
    let g_a = RefGuard::push(a);
    let g_b = RefGuard::push(b);
    manager.maybe_gc();
    let a = g_a.get();
    let b = g_b.get();

    if level == n {
        let w = manager.weight_mul(a.weight, b.weight)?;
        return Ok(Edge::new(NodeHandle::TERMINAL, w));
    }

    let key = [a.target.0, b.target.0, level as u64];
    if let Some(cached) =
        ApplyCache::<EvbddOp>::get(manager.apply_cache(), EvbddOp::Matmat, &key)
    {
        let prod = manager.weight_mul(a.weight, b.weight)?;
        let w = manager.weight_mul(prod, cached.weight)?;
        return Ok(Edge::new(cached.target, w));
    }

    let (a_low, a_high) = raw_cofactor(manager, a, 2 * level);
    let (b_low, b_high) = raw_cofactor(manager, b, 2 * level);
    let (a00, a10) = scaled_cofactor(manager, a_low, 2 * level + 1)?;
    let (a01, a11) = scaled_cofactor(manager, a_high, 2 * level + 1)?;
    let (b00, b10) = scaled_cofactor(manager, b_low, 2 * level + 1)?;
    let (b01, b11) = scaled_cofactor(manager, b_high, 2 * level + 1)?;

    let ga00 = RefGuard::push(a00);
    let ga10 = RefGuard::push(a10);
    let ga01 = RefGuard::push(a01);
    let ga11 = RefGuard::push(a11);
    let gb00 = RefGuard::push(b00);
    let gb10 = RefGuard::push(b10);
    let gb01 = RefGuard::push(b01);
    let gb11 = RefGuard::push(b11);

    // |a00 a01| |b00 b01| = b00*a00 + b10*a01 , b01*a00 + b11*a01
    // |a10 a11| |b10 b11|   b00*a10 + b10*a11   b01*a10 + b11*a11
    //
    // Every closure resolves its operands through the guard at the
    // moment it actually runs rather than the value it closed over,
    // since a GC can renumber weight handles while the task sits queued
    // on another worker.
    let tasks: Vec<Box<dyn FnOnce() -> AdddResult<Edge> + Send + '_>> = vec![
        Box::new(|| matmat(manager, strategy, ga00.get(), gb00.get(), level + 1, n)),
        Box::new(|| matmat(manager, strategy, ga10.get(), gb00.get(), level + 1, n)),
        Box::new(|| matmat(manager, strategy, ga00.get(), gb01.get(), level + 1, n)),
        Box::new(|| matmat(manager, strategy, ga10.get(), gb01.get(), level + 1, n)),
        Box::new(|| matmat(manager, strategy, ga01.get(), gb10.get(), level + 1, n)),
        Box::new(|| matmat(manager, strategy, ga11.get(), gb10.get(), level + 1, n)),
        Box::new(|| matmat(manager, strategy, ga01.get(), gb11.get(), level + 1, n)),
        Box::new(|| matmat(manager, strategy, ga11.get(), gb11.get(), level + 1, n)),
    ];
    let mut results = scheduler::fork_join_n(tasks);
    let a11_b11 = results.pop().unwrap()?;
    let a01_b11 = results.pop().unwrap()?;
    let a11_b10 = results.pop().unwrap()?;
    let a01_b10 = results.pop().unwrap()?;
    let a10_b01 = results.pop().unwrap()?;
    let a00_b01 = results.pop().unwrap()?;
    let a10_b00 = results.pop().unwrap()?;
    let a00_b00 = results.pop().unwrap()?;

    let rh2 = make_edge(manager, 2 * level + 1, a01_b11, a11_b11, strategy)?;
    let lh2 = make_edge(manager, 2 * level + 1, a01_b10, a11_b10, strategy)?;
    let rh1 = make_edge(manager, 2 * level + 1, a00_b01, a10_b01, strategy)?;
    let lh1 = make_edge(manager, 2 * level + 1, a00_b00, a10_b00, strategy)?;

    let g_lh1 = RefGuard::push(lh1);
    let g_lh2 = RefGuard::push(lh2);
    let g_rh1 = RefGuard::push(rh1);
    let g_rh2 = RefGuard::push(rh2);

    let (lh, rh) = scheduler::join(
        || plus(manager, strategy, g_lh1.get(), g_lh2.get()),
        || plus(manager, strategy, g_rh1.get(), g_rh2.get()),
    );
    let lh = lh?;
    let rh = rh?;

    let res = make_edge(manager, 2 * level, lh, rh, strategy)?;

    ApplyCache::<EvbddOp>::insert(manager.apply_cache(), EvbddOp::Matmat, &key, res);

    let a = g_a.get();
    let b = g_b.get();
    let prod = manager.weight_mul(a.weight, b.weight)?;
    let w = manager.weight_mul(prod, res.weight)?;
    Ok(Edge::new(res.target, w))
}
