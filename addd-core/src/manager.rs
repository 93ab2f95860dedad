//! The `Manager` trait: the seam every recursive operation programs
//! against instead of talking to the node/weight tables directly.

use crate::edge::{Edge, WeightHandle};
use crate::error::AdddResult;
use crate::node::{InnerNode, Node, NodeHandle, Var};

/// A variable level. Distinct from `Var` only in spirit (levels may be
/// reordered independently of variable identity by a future `reorder`
/// pass); kept as its own type so call sites don't conflate the two.
pub type LevelNo = Var;

/// Complex value backing a weight handle. Kept generic-free (a concrete
/// `f64`-pair type lives in `addd-weight`) so `addd-core` has no
/// numeric-type opinion; the manager exposes weight arithmetic purely
/// through handles.
pub trait Manager: Sized {
    /// Intern a node tuple, applying no normalization (the caller — the
    /// diagram rules crate — has already normalized child weights).
    /// Implements hash-consing (`spec.md` §3 invariant 5) and triggers a
    /// node-table GC and retry if the table is full.
    fn make_node(&self, node: InnerNode) -> AdddResult<NodeHandle>;

    /// Total lookup of a live node handle.
    fn get_node(&self, handle: NodeHandle) -> Node;

    /// Intern a complex weight value, returning its handle. Values
    /// within the configured tolerance of an existing entry are fused
    /// (`spec.md` §4.1).
    fn intern_weight(&self, re: f64, im: f64) -> AdddResult<WeightHandle>;

    /// Read back the complex value of a weight handle.
    fn weight_value(&self, handle: WeightHandle) -> (f64, f64);

    /// `a + b` over weight handles, returning the handle of the
    /// (possibly newly interned) sum.
    fn weight_add(&self, a: WeightHandle, b: WeightHandle) -> AdddResult<WeightHandle>;

    /// `a * b` over weight handles.
    fn weight_mul(&self, a: WeightHandle, b: WeightHandle) -> AdddResult<WeightHandle>;

    /// `-a`.
    fn weight_neg(&self, a: WeightHandle) -> AdddResult<WeightHandle>;

    /// `conj(a)`.
    fn weight_conj(&self, a: WeightHandle) -> AdddResult<WeightHandle>;

    /// `|a|`.
    fn weight_abs(&self, a: WeightHandle) -> f64;

    /// The configured weight-equality tolerance `ε`.
    fn tolerance(&self) -> f64;

    /// Register a root edge as protected against GC for as long as the
    /// returned guard lives.
    fn protect(&self, edge: Edge);

    /// Remove a prior `protect` registration.
    fn unprotect(&self, edge: Edge);

    /// Run a GC cycle on the node table, the weight table, or both, if
    /// the caller's configured thresholds say it is warranted. No-op
    /// otherwise. Returns whether a collection actually ran (the
    /// operation cache is cleared wholesale when it does).
    fn maybe_gc(&self) -> bool;
}
