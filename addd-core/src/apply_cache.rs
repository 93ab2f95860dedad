//! The operation (memo) cache contract, `spec.md` §4.4.

use crate::countable::Countable;
use crate::edge::Edge;

/// A memo cache keyed by `(op_id, h1, h2, h3, h4?)`. Collisions overwrite
/// silently; correctness never depends on a hit, only on lookups that do
/// hit returning a result consistent with a from-scratch recomputation
/// at the moment of the hit.
pub trait ApplyCache<Op: Countable> {
    /// Look up a memoized binary-or-ternary operation result.
    fn get(&self, op: Op, operands: &[u64]) -> Option<Edge>;

    /// Memoize a result.
    fn insert(&self, op: Op, operands: &[u64], result: Edge);

    /// Clear every entry. Called whenever a node-table or weight-table
    /// GC runs, since handle values may have changed (`spec.md` §4.4).
    fn clear(&self);
}

/// Implemented by managers that own an apply cache for operator `Op`,
/// mirroring the teacher's `HasApplyCache` workaround for associated-type
/// projection limitations (rust-lang/rust#49601).
pub trait HasApplyCache<Op: Countable> {
    type Cache: ApplyCache<Op>;

    fn apply_cache(&self) -> &Self::Cache;
}
