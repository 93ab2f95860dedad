//! Per-worker bookkeeping (`spec.md` §5): a pointer-reference stack, an
//! edge-reference stack, and a pending-child-task stack. Recursions push
//! onto the edge-reference stack around every spawn/join that could
//! otherwise lose an edge to a GC triggered by a sibling task, mirroring
//! the original's `evbdd_refs_push` / `evbdd_refs_pop`.
//!
//! Every worker's stack is additionally registered in a process-wide
//! registry so the GC rendezvous (`crate::gc`) can snapshot *all*
//! workers' in-flight edges, not just the calling thread's, and so a
//! completed weight-table GC can rewrite every entry still on a stack
//! (see [`remap_all_refs`]) rather than only the ones a caller happens
//! to hold as protected roots.

use std::cell::RefCell;
use std::sync::{Arc, OnceLock, RwLock};
use std::thread::ThreadId;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use addd_core::edge::{Edge, WeightHandle};

type Registry = RwLock<FxHashMap<ThreadId, Arc<Mutex<Vec<Edge>>>>>;

fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(FxHashMap::default()))
}

thread_local! {
    static LOCAL_STACK: RefCell<Arc<Mutex<Vec<Edge>>>> = RefCell::new(register_current_thread());
}

fn register_current_thread() -> Arc<Mutex<Vec<Edge>>> {
    let stack = Arc::new(Mutex::new(Vec::with_capacity(64)));
    registry()
        .write()
        .unwrap()
        .insert(std::thread::current().id(), Arc::clone(&stack));
    stack
}

/// RAII guard: pushes `edge` onto the current worker's reference stack
/// on construction, pops it (and anything pushed after it by nested
/// guards that were already dropped) on drop. Using this around a
/// recursive call's operands guarantees they survive a GC triggered by
/// a sibling spawned task.
///
/// The guard holds the `Arc` to its owning thread's stack rather than
/// going back through the `LOCAL_STACK` thread-local, so [`Self::get`]
/// reads the right slot even when called from a different thread than
/// the one that pushed it — exactly the case when a closure captured by
/// a forked task sits queued on another worker before it runs. A GC
/// that fires while the task is queued updates that slot via
/// [`remap_all_refs`]; `get` is how the task picks up the update instead
/// of using whatever value it closed over.
pub struct RefGuard {
    stack: Arc<Mutex<Vec<Edge>>>,
    mark: usize,
}

impl RefGuard {
    #[must_use]
    pub fn push(edge: Edge) -> Self {
        let stack = LOCAL_STACK.with(|s| Arc::clone(&s.borrow()));
        let mark = {
            let mut guard = stack.lock();
            // "Doubles in place on overflow" (`spec.md` §9): `Vec::push`
            // already does this; the explicit reserve just avoids
            // repeated small growths under deep recursion.
            if guard.len() == guard.capacity() {
                guard.reserve(guard.capacity().max(1));
            }
            guard.push(edge);
            guard.len() - 1
        };
        RefGuard { stack, mark }
    }

    /// The edge currently held at this guard's slot. Always resolve
    /// through this instead of the value passed to `push` once any
    /// further GC-triggering call (another `make_node`/`intern_weight`,
    /// a fork that might run a sibling to completion, or a join) has
    /// happened in between: a weight-table GC renumbers handles and
    /// this slot is rewritten in place, but a copy captured earlier is
    /// not.
    pub fn get(&self) -> Edge {
        self.stack.lock()[self.mark]
    }
}

impl Drop for RefGuard {
    fn drop(&mut self) {
        self.stack.lock().truncate(self.mark);
    }
}

/// Snapshot of every registered worker's edge-reference stack, used by
/// the GC rendezvous to discover in-flight edges that must be treated as
/// additional roots.
pub fn snapshot_all_refs() -> Vec<Edge> {
    let reg = registry().read().unwrap();
    let mut out = Vec::new();
    for stack in reg.values() {
        out.extend(stack.lock().iter().copied());
    }
    out
}

/// Apply a completed weight-table GC's old->new handle remap to every
/// registered worker's reference stack in place. Must run before any
/// paused task resumes and reads its operands back out of a
/// [`RefGuard`]; `EvbddManager::run_gc` calls this right after it remaps
/// its own protected-root snapshot.
pub fn remap_all_refs(mapping: &FxHashMap<WeightHandle, WeightHandle>) {
    if mapping.is_empty() {
        return;
    }
    let reg = registry().read().unwrap();
    for stack in reg.values() {
        for edge in stack.lock().iter_mut() {
            if let Some(&new) = mapping.get(&edge.weight) {
                edge.weight = new;
            }
        }
    }
}
