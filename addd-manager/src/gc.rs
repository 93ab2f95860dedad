//! Stop-the-world mark-sweep GC and the rendezvous protocol
//! (`spec.md` §4.2, §5).
//!
//! Marking roots are: (a) externally-protected root edges, (b) every
//! edge live on a worker's reference stack, and (c) any pending
//! completed-task result that is itself a protected handle — (c) falls
//! out for free here since a completed task's result has already been
//! folded into either (a) or (b) by the time GC can observe it (the
//! scheduler never lets a finished subtree's result sit unprotected
//! between completion and its parent consuming it; see
//! `crate::scheduler`).

use rustc_hash::FxHashMap;

use addd_core::edge::{Edge, WeightHandle};
use addd_core::node::NodeHandle;

use crate::node_table::NodeTable;
use crate::worker;

/// Outcome of a single GC cycle: whether anything actually ran, and (if
/// the weight table was collected) the old->new weight handle remap a
/// caller must apply to any externally-held `Edge` copies that predate
/// the cycle.
#[derive(Default)]
pub struct GcReport {
    pub node_gc_ran: bool,
    pub weight_gc_ran: bool,
    pub weight_remap: FxHashMap<WeightHandle, WeightHandle>,
}

/// Mark every node reachable from `roots` in `table`, iteratively (the
/// DAG can be deep; an explicit stack avoids recursion-depth issues the
/// original's `SPAWN`/`SYNC` mark task didn't have to worry about since
/// it ran on a growable fiber stack).
fn mark_reachable(table: &NodeTable, roots: impl IntoIterator<Item = NodeHandle>) {
    let mut stack: Vec<NodeHandle> = roots.into_iter().filter(|h| !h.is_terminal()).collect();
    while let Some(h) = stack.pop() {
        if table.mark(h) {
            // Already marked by a previous visit; its children were
            // already pushed then, skip re-expanding.
            continue;
        }
        if let addd_core::node::Node::Inner(n) = table.get(h) {
            if !n.low_target.is_terminal() {
                stack.push(n.low_target);
            }
            if !n.high_target.is_terminal() {
                stack.push(n.high_target);
            }
        }
    }
}

/// Run a node-table GC unconditionally, and a weight-table GC if
/// `weight_table.should_gc()`. `protected` and worker reference stacks
/// (gathered internally via `worker::snapshot_all_refs`) together form
/// the root set.
pub fn collect(
    node_table: &NodeTable,
    weight_table: &addd_weight::WeightTable,
    protected: &[Edge],
) -> GcReport {
    let refs = worker::snapshot_all_refs();
    let all_roots: Vec<Edge> = protected.iter().copied().chain(refs).collect();

    tracing::debug!(roots = all_roots.len(), "starting node-table GC rendezvous");

    let new_node_capacity = node_table.next_capacity();
    mark_reachable(node_table, all_roots.iter().map(|e| e.target));
    node_table.sweep(new_node_capacity);

    let mut report = GcReport {
        node_gc_ran: true,
        ..Default::default()
    };

    if weight_table.should_gc() {
        tracing::debug!("starting weight-table GC");
        let mut weight_roots: Vec<WeightHandle> = all_roots.iter().map(|e| e.weight).collect();
        for h in node_table.live_handles() {
            if let addd_core::node::Node::Inner(n) = node_table.get(h) {
                weight_roots.push(n.low_weight);
                weight_roots.push(n.high_weight);
            }
        }
        weight_roots.sort_by_key(|w| w.0);
        weight_roots.dedup();

        if let Ok(new_handles) = weight_table.gc_with_roots(&weight_roots) {
            let mapping: FxHashMap<WeightHandle, WeightHandle> = weight_roots
                .into_iter()
                .zip(new_handles)
                .filter(|(old, new)| old != new)
                .collect();
            node_table.remap_weights(&mapping);
            report.weight_gc_ran = true;
            report.weight_remap = mapping;
        }
    }

    report
}
