//! `EvbddManager`: the concrete `addd_core::Manager` implementation
//! wiring together the node table, weight table, apply cache, protected
//! roots, and GC coordinator.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use addd_core::edge::{Edge, WeightHandle};
use addd_core::error::AdddResult;
use addd_core::node::{InnerNode, Node, NodeHandle};
use addd_core::Manager as ManagerTrait;
use addd_weight::{WeightBackendKind, WeightTable};

use crate::apply_cache::DirectMappedApplyCache;
use crate::gc;
use crate::node_table::NodeTable;
use crate::protect::ProtectedRoots;

/// Construction-time configuration, mirroring `spec.md` §6.3's flags
/// that pertain to table sizing and the engine core (worker count,
/// table sizes, tolerance, back-end, normalization strategy selection
/// lives one layer up in `addd-rules-evbdd`/`addd`, since `addd-core`'s
/// `Manager` trait has no opinion on normalization).
#[derive(Clone, Debug)]
pub struct ManagerConfig {
    pub workers: usize,
    pub node_table_min: usize,
    pub node_table_max: usize,
    pub weight_table_min: usize,
    pub weight_table_max: usize,
    pub cache_min: usize,
    pub cache_max: usize,
    pub tolerance: f64,
    pub weight_backend: WeightBackendKind,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        ManagerConfig {
            workers: 1,
            node_table_min: 1 << 16,
            node_table_max: 1 << 24,
            weight_table_min: 1 << 16,
            weight_table_max: 1 << 23, // matches the 2^23 cache-key bit budget, see DESIGN.md
            cache_min: 1 << 16,
            cache_max: 1 << 20,
            tolerance: 1e-14,
            weight_backend: WeightBackendKind::Hashmap,
        }
    }
}

pub struct EvbddManager {
    pub(crate) node_table: NodeTable,
    pub(crate) weight_table: WeightTable,
    pub(crate) apply_cache: DirectMappedApplyCache,
    pub(crate) protected: ProtectedRoots,
    config: ManagerConfig,
    auto_gc: AtomicBool,
    /// Bit pattern of an `f64` load-factor threshold overriding both
    /// tables' own fixed `0.5`, or `f64::NAN`'s bits when unset
    /// (`spec.md` §6.1 `set_gc_threshold`).
    gc_threshold_override: AtomicU64,
}

impl EvbddManager {
    pub fn new(config: ManagerConfig) -> Self {
        crate::set_worker_count(config.workers);
        EvbddManager {
            node_table: NodeTable::new(config.node_table_min, config.node_table_max),
            weight_table: WeightTable::new(
                config.weight_backend,
                config.weight_table_min,
                config.weight_table_max,
                config.tolerance,
            ),
            apply_cache: DirectMappedApplyCache::new(config.cache_min),
            protected: ProtectedRoots::default(),
            config,
            auto_gc: AtomicBool::new(true),
            gc_threshold_override: AtomicU64::new(f64::NAN.to_bits()),
        }
    }

    /// Enable or disable GC running automatically off the back of
    /// `make_node`/`intern_weight` pressure. Disabling it does not stop
    /// a caller from forcing a cycle via [`Self::force_gc`].
    pub fn set_auto_gc(&self, enabled: bool) {
        self.auto_gc.store(enabled, Ordering::Relaxed);
    }

    /// Override the load-factor fraction (of either table) past which
    /// `maybe_gc` considers a collection due. `NaN` restores each
    /// table's own built-in threshold.
    pub fn set_gc_threshold(&self, fraction: f64) {
        self.gc_threshold_override.store(fraction.to_bits(), Ordering::Relaxed);
    }

    fn gc_threshold_override(&self) -> Option<f64> {
        let bits = self.gc_threshold_override.load(Ordering::Relaxed);
        let v = f64::from_bits(bits);
        if v.is_nan() {
            None
        } else {
            Some(v)
        }
    }

    /// Run a GC cycle unconditionally, bypassing both the auto-GC flag
    /// and either table's load-factor threshold.
    pub fn force_gc(&self) -> bool {
        self.run_gc()
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    pub fn node_table(&self) -> &NodeTable {
        &self.node_table
    }

    pub fn weight_table(&self) -> &WeightTable {
        &self.weight_table
    }

    pub fn apply_cache(&self) -> &DirectMappedApplyCache {
        &self.apply_cache
    }

    /// Edges currently registered as protected roots, reflecting any
    /// weight-handle renumbering from a completed weight-table GC. A
    /// driver that protects an edge and later needs its current value
    /// (rather than re-deriving it from a fresh operation) should read
    /// it back from this snapshot instead of holding the original
    /// `Edge` across a `maybe_gc` point — see `DESIGN.md`.
    pub fn protected_snapshot(&self) -> Vec<Edge> {
        self.protected.snapshot()
    }
}

impl ManagerTrait for EvbddManager {
    fn make_node(&self, node: InnerNode) -> AdddResult<NodeHandle> {
        match self.node_table.lookup_or_insert(node) {
            Ok(h) => Ok(h),
            Err(_) => {
                self.maybe_gc();
                self.node_table.lookup_or_insert(node)
            }
        }
    }

    fn get_node(&self, handle: NodeHandle) -> Node {
        self.node_table.get(handle)
    }

    fn intern_weight(&self, re: f64, im: f64) -> AdddResult<WeightHandle> {
        let value = num_complex::Complex64::new(re, im);
        match self.weight_table.lookup(value) {
            Ok(h) => Ok(h),
            Err(_) => {
                self.maybe_gc();
                self.weight_table.lookup(value)
            }
        }
    }

    fn weight_value(&self, handle: WeightHandle) -> (f64, f64) {
        let v = self.weight_table.value(handle);
        (v.re, v.im)
    }

    fn weight_add(&self, a: WeightHandle, b: WeightHandle) -> AdddResult<WeightHandle> {
        match self.weight_table.add(a, b) {
            Ok(h) => Ok(h),
            Err(_) => {
                self.maybe_gc();
                self.weight_table.add(a, b)
            }
        }
    }

    fn weight_mul(&self, a: WeightHandle, b: WeightHandle) -> AdddResult<WeightHandle> {
        match self.weight_table.mul(a, b) {
            Ok(h) => Ok(h),
            Err(_) => {
                self.maybe_gc();
                self.weight_table.mul(a, b)
            }
        }
    }

    fn weight_neg(&self, a: WeightHandle) -> AdddResult<WeightHandle> {
        match self.weight_table.neg(a) {
            Ok(h) => Ok(h),
            Err(_) => {
                self.maybe_gc();
                self.weight_table.neg(a)
            }
        }
    }

    fn weight_conj(&self, a: WeightHandle) -> AdddResult<WeightHandle> {
        match self.weight_table.conj(a) {
            Ok(h) => Ok(h),
            Err(_) => {
                self.maybe_gc();
                self.weight_table.conj(a)
            }
        }
    }

    fn weight_abs(&self, a: WeightHandle) -> f64 {
        self.weight_table.abs(a)
    }

    fn tolerance(&self) -> f64 {
        self.weight_table.tolerance()
    }

    fn protect(&self, edge: Edge) {
        self.protected.protect(edge);
    }

    fn unprotect(&self, edge: Edge) {
        self.protected.unprotect(edge);
    }

    fn maybe_gc(&self) -> bool {
        if !self.auto_gc.load(Ordering::Relaxed) {
            return false;
        }
        let due = match self.gc_threshold_override() {
            Some(t) => self.node_table.load_factor() > t || self.weight_table.load_factor() > t,
            None => self.node_table.should_gc() || self.weight_table.should_gc(),
        };
        if !due {
            return false;
        }
        self.run_gc()
    }
}

impl EvbddManager {
    fn run_gc(&self) -> bool {
        let roots = self.protected.snapshot();
        let report = gc::collect(&self.node_table, &self.weight_table, &roots);
        if report.weight_gc_ran {
            self.protected.remap_weights(&report.weight_remap);
            // Every in-flight recursive op's `RefGuard`-held operands
            // must see the same renumbering, or a task that resumes
            // after this cycle reads a stale `WeightHandle` back out of
            // its own reference-stack slot (`spec.md` §5; see
            // `crate::worker::RefGuard::get`).
            crate::worker::remap_all_refs(&report.weight_remap);
        }
        if report.node_gc_ran || report.weight_gc_ran {
            // Any GC invalidates the operation cache wholesale
            // (`spec.md` §4.4): keys may reference stale handles.
            self.apply_cache.clear_all();
        }
        true
    }
}
