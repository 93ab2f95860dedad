//! Pointwise addition, `spec.md` §4.5. Associative and commutative; the
//! cache key is normalized accordingly.

use addd_core::apply_cache::ApplyCache;
use addd_core::edge::Edge;
use addd_core::AdddResult;
use addd_manager::scheduler;
use addd_manager::worker::RefGuard;
use addd_core::manager::Manager;
use addd_manager::EvbddManager;

use super::{edge_cache_key, scaled_cofactor, sorted_pair, top_var, EvbddOp};
use crate::make_edge::make_edge;
use crate::normalize::NormStrategy;

/// `plus(a, b)`: if either operand is the zero edge, return the other
/// unchanged. If both share a target at the same top variable, the
/// weights simply add. Otherwise decompose both operands at their
/// shared leading variable and recurse on the two cofactor pairs in
/// parallel.
pub fn plus(manager: &EvbddManager, strategy: NormStrategy, a: Edge, b: Edge) -> AdddResult<Edge> {
    if a.is_zero() {
        return Ok(b);
    }
    if b.is_zero() {
        return Ok(a);
    }

    // Guard the incoming operands before doing anything that could GC:
    // a caller one level up may have handed us edges that exist nowhere
    // else yet (e.g. a freshly `make_edge`d sibling still only held in
    // its own stack frame), so they are not roots until they are on
    // *our* reference stack.
    let ga = RefGuard::push(a);
    let gb = RefGuard::push(b);

    // Operation entry (`spec.md` §4.1/§5): a table found over threshold
    // at the start of a multiplication/addition GCs right here, rather
    // than waiting to be caught reactively deep in a `make_node`/
    // `intern_weight` failure.
    manager.maybe_gc();
    let a = ga.get();
    let b = gb.get();

    let var_a = top_var(manager, a);
    let var_b = top_var(manager, b);
    let topvar = var_a.min(var_b);

    if a.target == b.target && var_a == var_b {
        let sum = manager.weight_add(a.weight, b.weight)?;
        return Ok(Edge::new(a.target, sum));
    }

    let (x, y) = sorted_pair(a, b);
    let key = [edge_cache_key(x), edge_cache_key(y)];
    if let Some(cached) = ApplyCache::<EvbddOp>::get(manager.apply_cache(), EvbddOp::Plus, &key) {
        return Ok(cached);
    }

    let (low_a, high_a) = scaled_cofactor(manager, a, topvar)?;
    let (low_b, high_b) = scaled_cofactor(manager, b, topvar)?;

    let g1 = RefGuard::push(low_a);
    let g2 = RefGuard::push(high_a);
    let g3 = RefGuard::push(low_b);
    let g4 = RefGuard::push(high_b);

    // Resolve through the guards, not the captured `low_a`/etc. locals:
    // a GC can run (and renumber weight handles) while the forked
    // closure is still queued, before it ever starts executing.
    let (low, high) = scheduler::join(
        || plus(manager, strategy, g1.get(), g3.get()),
        || plus(manager, strategy, g2.get(), g4.get()),
    );
    let res = make_edge(manager, topvar, low?, high?, strategy)?;

    ApplyCache::<EvbddOp>::insert(manager.apply_cache(), EvbddOp::Plus, &key, res);
    Ok(res)
}
