//! Inner product `⟨a|b⟩`, `spec.md` §4.5. Returns a weight handle rather
//! than an edge; cached as a terminal-targeted `Edge` since the apply
//! cache only stores edges.

use addd_core::apply_cache::ApplyCache;
use addd_core::edge::{Edge, WeightHandle};
use addd_core::node::{NodeHandle, Var};
use addd_core::AdddResult;
use addd_manager::scheduler;
use addd_manager::worker::RefGuard;
use addd_core::manager::Manager;
use addd_manager::EvbddManager;

use super::{raw_cofactor, EvbddOp};

pub fn inner_product(
    manager: &EvbddManager,
    a: Edge,
    b: Edge,
    level: Var,
    n: Var,
) -> AdddResult<WeightHandle> {
    if a.is_zero() || b.is_zero() {
        return Ok(WeightHandle::ZERO);
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
        let conj_b = manager.weight_conj(b.weight)?;
        return manager.weight_mul(a.weight, conj_b);
    }

    let (low_a, high_a) = raw_cofactor(manager, a, level);
    let (low_b, high_b) = raw_cofactor(manager, b, level);

    let key = [a.target.0, b.target.0, level as u64, n as u64];
    if let Some(cached) =
        ApplyCache::<EvbddOp>::get(manager.apply_cache(), EvbddOp::InnerProduct, &key)
    {
        let prod = manager.weight_mul(cached.weight, a.weight)?;
        let conj_b = manager.weight_conj(b.weight)?;
        return manager.weight_mul(prod, conj_b);
    }

    let g1 = RefGuard::push(low_a);
    let g2 = RefGuard::push(high_a);
    let g3 = RefGuard::push(low_b);
    let g4 = RefGuard::push(high_b);

    let (res_low, res_high) = scheduler::join(
        || inner_product(manager, g1.get(), g3.get(), level + 1, n),
        || inner_product(manager, g2.get(), g4.get(), level + 1, n),
    );
    let sum = manager.weight_add(res_low?, res_high?)?;

    ApplyCache::<EvbddOp>::insert(
        manager.apply_cache(),
        EvbddOp::InnerProduct,
        &key,
        Edge::new(NodeHandle::TERMINAL, sum),
    );

    let a = g_a.get();
    let b = g_b.get();
    let prod = manager.weight_mul(sum, a.weight)?;
    let conj_b = manager.weight_conj(b.weight)?;
    manager.weight_mul(prod, conj_b)
}
