//! The three weight-table back-ends named in `spec.md` §4.1 and §9,
//! modeled as a small sum type with static dispatch instead of the
//! original's function-pointer table — the idiomatic Rust equivalent.

pub mod hashmap;
pub mod real_tree;
pub mod real_tuple;

use num_complex::Complex64;

use addd_core::AdddResult;

/// Selects which concrete back-end a `WeightTable` uses. Chosen once at
/// `init` and fixed for the process lifetime (`spec.md` §6.3
/// `weight-backend`).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum WeightBackendKind {
    /// Open-addressed hash map keyed on a tolerance-bucketed
    /// `(real, imag)` representation.
    #[default]
    Hashmap,
    /// Two real scalars interned independently, combined into a
    /// composite handle.
    RealTupleHashmap,
    /// A tree of real-axis tables (trades lookup depth for better
    /// locality on highly repetitive magnitude spectra).
    RealTree,
}

/// What every back-end must implement. Kept minimal: the table that owns
/// capacity/GC bookkeeping lives in `crate::table`.
pub(crate) trait Backend {
    fn new(capacity: usize, tolerance: f64) -> Self
    where
        Self: Sized;

    /// Find an existing slot within tolerance of `value`, or insert a
    /// new one. Returns the dense index of the slot (not yet offset by
    /// `WeightHandle::FIRST_FREE`).
    fn lookup_or_insert(&mut self, value: Complex64) -> AdddResult<u32>;

    fn value(&self, idx: u32) -> Complex64;

    fn len(&self) -> usize;

    fn capacity(&self) -> usize;

    /// Produce a fresh, empty backend of the same kind and tolerance,
    /// used by replacement-table GC.
    fn fresh_like(&self, capacity: usize) -> Self
    where
        Self: Sized;
}
