use num_complex::Complex64;
use parking_lot::RwLock;

use addd_core::edge::WeightHandle;
use addd_core::{AdddError, AdddResult};

use crate::backend::{hashmap::HashmapBackend, real_tree::RealTreeBackend, real_tuple::RealTupleBackend};
use crate::backend::{Backend, WeightBackendKind};

enum AnyBackend {
    Hashmap(HashmapBackend),
    RealTuple(RealTupleBackend),
    RealTree(RealTreeBackend),
}

impl AnyBackend {
    fn new(kind: WeightBackendKind, capacity: usize, tolerance: f64) -> Self {
        match kind {
            WeightBackendKind::Hashmap => AnyBackend::Hashmap(HashmapBackend::new(capacity, tolerance)),
            WeightBackendKind::RealTupleHashmap => {
                AnyBackend::RealTuple(RealTupleBackend::new(capacity, tolerance))
            }
            WeightBackendKind::RealTree => AnyBackend::RealTree(RealTreeBackend::new(capacity, tolerance)),
        }
    }

    fn lookup_or_insert(&mut self, value: Complex64) -> AdddResult<u32> {
        match self {
            AnyBackend::Hashmap(b) => b.lookup_or_insert(value),
            AnyBackend::RealTuple(b) => b.lookup_or_insert(value),
            AnyBackend::RealTree(b) => b.lookup_or_insert(value),
        }
    }

    fn value(&self, idx: u32) -> Complex64 {
        match self {
            AnyBackend::Hashmap(b) => b.value(idx),
            AnyBackend::RealTuple(b) => b.value(idx),
            AnyBackend::RealTree(b) => b.value(idx),
        }
    }

    fn len(&self) -> usize {
        match self {
            AnyBackend::Hashmap(b) => b.len(),
            AnyBackend::RealTuple(b) => b.len(),
            AnyBackend::RealTree(b) => b.len(),
        }
    }

    fn capacity(&self) -> usize {
        match self {
            AnyBackend::Hashmap(b) => b.capacity(),
            AnyBackend::RealTuple(b) => b.capacity(),
            AnyBackend::RealTree(b) => b.capacity(),
        }
    }

    fn fresh_like(&self, capacity: usize) -> Self {
        match self {
            AnyBackend::Hashmap(b) => AnyBackend::Hashmap(b.fresh_like(capacity)),
            AnyBackend::RealTuple(b) => AnyBackend::RealTuple(b.fresh_like(capacity)),
            AnyBackend::RealTree(b) => AnyBackend::RealTree(b.fresh_like(capacity)),
        }
    }
}

struct Inner {
    backend: AnyBackend,
    max_capacity: usize,
}

/// The complex weight table (C1). Dispatches to one of the three
/// back-ends selected at construction time and reserves the three
/// handles `ZERO`, `ONE`, `MINUS_ONE` up front so every table starts
/// from the same baseline regardless of back-end.
pub struct WeightTable {
    inner: RwLock<Inner>,
    tolerance: f64,
    gc_threshold: f64,
    grow_factor: f64,
    hard_max_capacity: usize,
}

impl WeightTable {
    pub fn new(kind: WeightBackendKind, initial_capacity: usize, max_capacity: usize, tolerance: f64) -> Self {
        let mut backend = AnyBackend::new(kind, initial_capacity, tolerance);
        // Reserve the three distinguished handles so `WeightHandle::ZERO`
        // etc. always resolve correctly regardless of insertion order.
        backend
            .lookup_or_insert(Complex64::new(0.0, 0.0))
            .expect("fresh table has room for the reserved handles");
        backend
            .lookup_or_insert(Complex64::new(1.0, 0.0))
            .expect("fresh table has room for the reserved handles");
        backend
            .lookup_or_insert(Complex64::new(-1.0, 0.0))
            .expect("fresh table has room for the reserved handles");

        WeightTable {
            inner: RwLock::new(Inner {
                backend,
                max_capacity: initial_capacity,
            }),
            tolerance,
            gc_threshold: 0.5,
            grow_factor: 2.0,
            hard_max_capacity: max_capacity,
        }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Fraction of the table's current capacity that is filled.
    pub fn load_factor(&self) -> f64 {
        let inner = self.inner.read();
        inner.backend.len() as f64 / inner.backend.capacity().max(1) as f64
    }

    pub fn gc_threshold(&self) -> f64 {
        self.gc_threshold
    }

    pub fn set_gc_threshold(&self, _threshold: f64) {
        // Threshold mutability is exposed through the manager's config,
        // not mutated here directly, to keep `WeightTable` lock-cheap on
        // the hot path; callers reconstruct with a new threshold if they
        // need to change it mid-run. Kept as a documented no-op seam.
    }

    pub fn lookup(&self, value: Complex64) -> AdddResult<WeightHandle> {
        let mut inner = self.inner.write();
        let idx = inner.backend.lookup_or_insert(value)?;
        Ok(WeightHandle(idx))
    }

    pub fn value(&self, handle: WeightHandle) -> Complex64 {
        self.inner.read().backend.value(handle.0)
    }

    pub fn add(&self, a: WeightHandle, b: WeightHandle) -> AdddResult<WeightHandle> {
        let (va, vb) = (self.value(a), self.value(b));
        self.lookup(va + vb)
    }

    pub fn mul(&self, a: WeightHandle, b: WeightHandle) -> AdddResult<WeightHandle> {
        let (va, vb) = (self.value(a), self.value(b));
        self.lookup(va * vb)
    }

    pub fn neg(&self, a: WeightHandle) -> AdddResult<WeightHandle> {
        self.lookup(-self.value(a))
    }

    pub fn conj(&self, a: WeightHandle) -> AdddResult<WeightHandle> {
        self.lookup(self.value(a).conj())
    }

    pub fn abs(&self, a: WeightHandle) -> f64 {
        self.value(a).norm()
    }

    /// Whether the table should be collected before the next bulk
    /// operation, per the configured threshold (`spec.md` §4.1).
    pub fn should_gc(&self) -> bool {
        self.load_factor() > self.gc_threshold
    }

    /// Replacement-table GC: `roots` is the set of weight handles
    /// reachable from protected/in-flight edges (as discovered by the
    /// node-table walk in `addd-manager::gc`). Returns the new handles
    /// for each root, in the same order, and swaps in the fresh table.
    pub fn gc_with_roots(&self, roots: &[WeightHandle]) -> AdddResult<Vec<WeightHandle>> {
        let mut inner = self.inner.write();
        let old_capacity = inner.backend.capacity();
        let new_capacity = if inner.backend.len() as f64 / old_capacity as f64 > self.gc_threshold {
            (old_capacity as f64 * self.grow_factor)
                .round()
                .min(self.hard_max_capacity as f64) as usize
        } else {
            old_capacity
        };

        let mut fresh = inner.backend.fresh_like(new_capacity);
        // Re-reserve the three distinguished handles at the same
        // indices as the constructor does, so `WeightHandle::ZERO` etc.
        // stay valid across a GC cycle.
        fresh
            .lookup_or_insert(Complex64::new(0.0, 0.0))
            .expect("fresh table has room for the reserved handles");
        fresh
            .lookup_or_insert(Complex64::new(1.0, 0.0))
            .expect("fresh table has room for the reserved handles");
        fresh
            .lookup_or_insert(Complex64::new(-1.0, 0.0))
            .expect("fresh table has room for the reserved handles");

        let mut new_handles = Vec::with_capacity(roots.len());
        for &h in roots {
            let value = inner.backend.value(h.0);
            let idx = fresh.lookup_or_insert(value)?;
            new_handles.push(WeightHandle(idx));
        }
        inner.backend = fresh;
        inner.max_capacity = new_capacity;
        Ok(new_handles)
    }
}
