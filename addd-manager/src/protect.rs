//! External root protection (`spec.md` §5, §6.1 `protect`/`unprotect`).

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use addd_core::edge::Edge;

/// Reference-counted registry of externally-held root edges. An edge
/// protected `n` times must be unprotected `n` times before it is
/// dropped from the root set.
#[derive(Default)]
pub struct ProtectedRoots {
    counts: Mutex<FxHashMap<Edge, u32>>,
}

impl ProtectedRoots {
    pub fn protect(&self, edge: Edge) {
        *self.counts.lock().entry(edge).or_insert(0) += 1;
    }

    pub fn unprotect(&self, edge: Edge) {
        let mut counts = self.counts.lock();
        if let Some(n) = counts.get_mut(&edge) {
            *n -= 1;
            if *n == 0 {
                counts.remove(&edge);
            }
        }
    }

    pub fn snapshot(&self) -> Vec<Edge> {
        self.counts.lock().keys().copied().collect()
    }

    /// Rewrite every registered edge's weight handle according to
    /// `mapping`, preserving its protection count. Called after a
    /// weight-table GC, which may renumber non-reserved weight handles
    /// (`spec.md` §4.1's replacement-table swap).
    pub fn remap_weights(&self, mapping: &FxHashMap<addd_core::edge::WeightHandle, addd_core::edge::WeightHandle>) {
        let mut counts = self.counts.lock();
        let old = std::mem::take(&mut *counts);
        for (edge, n) in old {
            let new_weight = *mapping.get(&edge.weight).unwrap_or(&edge.weight);
            let new_edge = Edge::new(edge.target, new_weight);
            *counts.entry(new_edge).or_insert(0) += n;
        }
    }
}
