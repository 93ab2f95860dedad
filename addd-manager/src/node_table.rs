//! Node table (C2): hash-consed storage for `(var, low, high)` tuples.
//!
//! Implemented as an `RwLock`-protected dense store plus a hash-consing
//! map, rather than fully lock-free open addressing — `spec.md` §4.2
//! calls the back-end an implementation choice, and a single-writer
//! table behind `parking_lot::RwLock` keeps the mark-sweep GC (which
//! must see a consistent snapshot anyway) straightforward to reason
//! about. Concurrent readers still proceed lock-free relative to each
//! other; only insertion and GC take the write lock.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use addd_core::edge::WeightHandle;
use addd_core::node::{InnerNode, Node, NodeHandle};
use addd_core::{AdddError, AdddResult};

struct Inner {
    /// Dense storage; `None` marks a tombstoned (freed) slot available
    /// for reuse.
    slots: Vec<Option<InnerNode>>,
    /// Hash-consing map: content tuple -> handle.
    unique: FxHashMap<InnerNode, u64>,
    /// GC mark bits, parallel to `slots`.
    marks: Vec<bool>,
    /// Tombstoned slots available for reuse, LIFO.
    free_list: Vec<u64>,
    max_capacity: usize,
}

pub struct NodeTable {
    inner: RwLock<Inner>,
    gc_threshold: f64,
    grow_factor: f64,
    hard_max_capacity: usize,
}

impl NodeTable {
    pub fn new(initial_capacity: usize, hard_max_capacity: usize) -> Self {
        NodeTable {
            inner: RwLock::new(Inner {
                slots: Vec::with_capacity(initial_capacity),
                unique: FxHashMap::default(),
                marks: Vec::with_capacity(initial_capacity),
                free_list: Vec::new(),
                max_capacity: initial_capacity,
            }),
            gc_threshold: 0.5,
            grow_factor: 2.0,
            hard_max_capacity,
        }
    }

    pub fn load_factor(&self) -> f64 {
        let inner = self.inner.read();
        let live = inner.slots.len() - inner.free_list.len();
        live as f64 / inner.max_capacity.max(1) as f64
    }

    pub fn should_gc(&self) -> bool {
        self.load_factor() > self.gc_threshold
    }

    /// Hash-cons `node`, returning its stable handle. Does not itself
    /// trigger GC on `TableFull`; the manager retries after collecting.
    pub fn lookup_or_insert(&self, node: InnerNode) -> AdddResult<NodeHandle> {
        let mut inner = self.inner.write();
        if let Some(&h) = inner.unique.get(&node) {
            return Ok(NodeHandle(h));
        }
        if let Some(slot) = inner.free_list.pop() {
            inner.slots[slot as usize] = Some(node);
            inner.marks[slot as usize] = false;
            inner.unique.insert(node, slot);
            return Ok(NodeHandle(slot));
        }
        let live = inner.slots.len();
        if live >= inner.max_capacity {
            return Err(AdddError::TableFull);
        }
        let handle = inner.slots.len() as u64;
        inner.slots.push(Some(node));
        inner.marks.push(false);
        inner.unique.insert(node, handle);
        Ok(NodeHandle(handle))
    }

    pub fn get(&self, handle: NodeHandle) -> Node {
        if handle.is_terminal() {
            return Node::Terminal;
        }
        let inner = self.inner.read();
        match inner.slots[handle.0 as usize] {
            Some(n) => Node::Inner(n),
            None => panic!("node_table: dangling handle {:?} (use after GC?)", handle),
        }
    }

    pub fn mark(&self, handle: NodeHandle) -> bool {
        if handle.is_terminal() {
            return false;
        }
        let mut inner = self.inner.write();
        let idx = handle.0 as usize;
        let was_marked = inner.marks[idx];
        inner.marks[idx] = true;
        was_marked
    }

    /// Capacity to grow to for the *next* epoch, applying the configured
    /// growth factor and hard ceiling. Called by the GC coordinator
    /// before sweeping.
    pub fn next_capacity(&self) -> usize {
        let inner = self.inner.read();
        if self.should_gc() {
            ((inner.max_capacity as f64 * self.grow_factor).round() as usize)
                .min(self.hard_max_capacity)
                .max(inner.max_capacity)
        } else {
            inner.max_capacity
        }
    }

    /// Sweep every unmarked live slot, tombstoning it, and reset all
    /// marks. Grows `max_capacity` to `new_capacity`.
    pub fn sweep(&self, new_capacity: usize) {
        let mut inner = self.inner.write();
        inner.max_capacity = new_capacity;
        let len = inner.slots.len();
        for idx in 0..len {
            if inner.marks[idx] {
                inner.marks[idx] = false;
                continue;
            }
            if let Some(node) = inner.slots[idx].take() {
                inner.unique.remove(&node);
                inner.free_list.push(idx as u64);
            }
        }
    }

    /// All currently-live handles, used by the GC coordinator to
    /// discover weight handles reachable through the node table when a
    /// weight-table collection needs to walk "every node," not just
    /// externally protected roots.
    pub fn live_handles(&self) -> Vec<NodeHandle> {
        let inner = self.inner.read();
        inner
            .slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.map(|_| NodeHandle(i as u64)))
            .collect()
    }

    /// Rewrite the weight handles embedded in every live node according
    /// to `mapping`, and rebuild the hash-consing index to match (the
    /// content hash changes when the embedded weights change). Handles
    /// not present in `mapping` are left as-is (the three reserved
    /// weight handles never move, see `addd_weight::table`).
    pub fn remap_weights(&self, mapping: &FxHashMap<WeightHandle, WeightHandle>) {
        let mut inner = self.inner.write();
        let remap = |w: WeightHandle| *mapping.get(&w).unwrap_or(&w);
        let len = inner.slots.len();
        for idx in 0..len {
            if let Some(node) = inner.slots[idx] {
                let updated = InnerNode::new(
                    node.var,
                    node.low_target,
                    node.high_target,
                    remap(node.low_weight),
                    remap(node.high_weight),
                );
                inner.slots[idx] = Some(updated);
            }
        }
        inner.unique = inner
            .slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.map(|n| (n, i as u64)))
            .collect();
    }
}
