//! Header + 16-byte node-record format of `spec.md` §6.2, plus the
//! weight-stream section it references but leaves unspecified.
//!
//! Layout, all integers little-endian:
//!
//! ```text
//! magic:       u32   ("ADD1" read as LE bytes)
//! version:     u16
//! weight_count: u64
//! weights[weight_count]: (f64 re, f64 im)
//! node_count:  u64
//! nodes[node_count]: NodeRecord   (16 bytes each, leaves first)
//! ```
//!
//! A `NodeRecord` is `(var: u32, low_index: u32, high_index: u32,
//! low_weight_index: u16, high_weight_index: u16)`. `low_index`/
//! `high_index` are either `u32::MAX` (the constant terminal) or the
//! index of an earlier record in this same stream — the format is
//! acyclic and self-contained, so readers never need random access into
//! a live node table.

use std::collections::HashMap;
use std::io::{self, Read, Write};

use thiserror::Error;
use tracing::debug;

use addd_core::edge::{Edge, WeightHandle};
use addd_core::manager::Manager;
use addd_core::node::{Node, NodeHandle};
use addd_core::AdddResult;

const MAGIC: u32 = u32::from_le_bytes(*b"ADD1");
const VERSION: u16 = 1;
const TERMINAL_INDEX: u32 = u32::MAX;

#[derive(Debug, Error)]
pub enum NodeStreamError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("bad magic number {0:#010x}, expected {MAGIC:#010x}")]
    BadMagic(u32),
    #[error("unsupported node-stream version {0}, expected {VERSION}")]
    UnsupportedVersion(u16),
    #[error("node record references weight index {0} beyond the {1}-entry weight stream")]
    WeightIndexOutOfRange(u16, u64),
    #[error("node record references node index {0} beyond the {1} records read so far")]
    NodeIndexOutOfRange(u32, u64),
    #[error(transparent)]
    Manager(#[from] addd_core::AdddError),
}

/// Write the sub-DAG rooted at `root` to `w` in topological order,
/// leaves first. Shared nodes and weights are written once and
/// referenced by index.
pub fn write_dump<M: Manager>(
    manager: &M,
    root: Edge,
    w: &mut impl Write,
) -> Result<(), NodeStreamError> {
    let mut node_index: HashMap<NodeHandle, u32> = HashMap::new();
    let mut weight_index: HashMap<WeightHandle, u16> = HashMap::new();
    let mut weights: Vec<(f64, f64)> = Vec::new();
    let mut records: Vec<[u8; 16]> = Vec::new();

    intern_weight(manager, root.weight, &mut weight_index, &mut weights);
    collect(manager, root.target, &mut node_index, &mut weight_index, &mut weights, &mut records)?;

    w.write_all(&MAGIC.to_le_bytes())?;
    w.write_all(&VERSION.to_le_bytes())?;
    w.write_all(&(weights.len() as u64).to_le_bytes())?;
    for (re, im) in &weights {
        w.write_all(&re.to_le_bytes())?;
        w.write_all(&im.to_le_bytes())?;
    }
    w.write_all(&(records.len() as u64).to_le_bytes())?;
    for record in &records {
        w.write_all(record)?;
    }

    debug!(nodes = records.len(), weights = weights.len(), "wrote node-stream dump");
    Ok(())
}

fn intern_weight(
    manager: &impl Manager,
    handle: WeightHandle,
    weight_index: &mut HashMap<WeightHandle, u16>,
    weights: &mut Vec<(f64, f64)>,
) -> u16 {
    if let Some(&idx) = weight_index.get(&handle) {
        return idx;
    }
    let idx = weights.len() as u16;
    weights.push(manager.weight_value(handle));
    weight_index.insert(handle, idx);
    idx
}

fn collect<M: Manager>(
    manager: &M,
    target: NodeHandle,
    node_index: &mut HashMap<NodeHandle, u32>,
    weight_index: &mut HashMap<WeightHandle, u16>,
    weights: &mut Vec<(f64, f64)>,
    records: &mut Vec<[u8; 16]>,
) -> Result<u32, NodeStreamError> {
    if target.is_terminal() {
        return Ok(TERMINAL_INDEX);
    }
    if let Some(&idx) = node_index.get(&target) {
        return Ok(idx);
    }

    let node = match manager.get_node(target) {
        Node::Inner(n) => n,
        Node::Terminal => unreachable!("checked is_terminal above"),
    };
    let low_index = collect(manager, node.low_target, node_index, weight_index, weights, records)?;
    let high_index = collect(manager, node.high_target, node_index, weight_index, weights, records)?;
    let low_weight_index = intern_weight(manager, node.low_weight, weight_index, weights);
    let high_weight_index = intern_weight(manager, node.high_weight, weight_index, weights);

    let mut record = [0u8; 16];
    record[0..4].copy_from_slice(&node.var.to_le_bytes());
    record[4..8].copy_from_slice(&low_index.to_le_bytes());
    record[8..12].copy_from_slice(&high_index.to_le_bytes());
    record[12..14].copy_from_slice(&low_weight_index.to_le_bytes());
    record[14..16].copy_from_slice(&high_weight_index.to_le_bytes());

    let idx = records.len() as u32;
    records.push(record);
    node_index.insert(target, idx);
    Ok(idx)
}

/// Read a node-stream dump back into `manager`, re-interning weights and
/// nodes, and return the edge equivalent to the one originally dumped.
///
/// `root_weight_index`/`root_is_terminal` are not stored separately in
/// the stream; by convention the last record written is the root's
/// target, and its weight is the first entry of the weight stream (see
/// `write_dump`). Callers that need the root edge's own weight should
/// read it back from `weights[0]` via [`read_weights`] directly if they
/// bypass this helper.
pub fn read_dump<M: Manager>(manager: &M, r: &mut impl Read) -> Result<Edge, NodeStreamError> {
    let mut u32_buf = [0u8; 4];
    let mut u16_buf = [0u8; 2];
    let mut u64_buf = [0u8; 8];
    let mut f64_buf = [0u8; 8];

    r.read_exact(&mut u32_buf)?;
    let magic = u32::from_le_bytes(u32_buf);
    if magic != MAGIC {
        return Err(NodeStreamError::BadMagic(magic));
    }
    r.read_exact(&mut u16_buf)?;
    let version = u16::from_le_bytes(u16_buf);
    if version != VERSION {
        return Err(NodeStreamError::UnsupportedVersion(version));
    }

    r.read_exact(&mut u64_buf)?;
    let weight_count = u64::from_le_bytes(u64_buf);
    let mut weight_handles: Vec<WeightHandle> = Vec::with_capacity(weight_count as usize);
    for _ in 0..weight_count {
        r.read_exact(&mut f64_buf)?;
        let re = f64::from_le_bytes(f64_buf);
        r.read_exact(&mut f64_buf)?;
        let im = f64::from_le_bytes(f64_buf);
        weight_handles.push(manager.intern_weight(re, im)?);
    }

    r.read_exact(&mut u64_buf)?;
    let node_count = u64::from_le_bytes(u64_buf);
    let mut node_edges: Vec<Edge> = Vec::with_capacity(node_count as usize);
    for _ in 0..node_count {
        let mut record = [0u8; 16];
        r.read_exact(&mut record)?;
        let var = u32::from_le_bytes(record[0..4].try_into().unwrap());
        let low_index = u32::from_le_bytes(record[4..8].try_into().unwrap());
        let high_index = u32::from_le_bytes(record[8..12].try_into().unwrap());
        let low_weight_index = u16::from_le_bytes(record[12..14].try_into().unwrap());
        let high_weight_index = u16::from_le_bytes(record[14..16].try_into().unwrap());

        let low_target = resolve_node(low_index, &node_edges)?;
        let high_target = resolve_node(high_index, &node_edges)?;
        let low_weight = resolve_weight(low_weight_index, &weight_handles)?;
        let high_weight = resolve_weight(high_weight_index, &weight_handles)?;

        let handle = manager.make_node(addd_core::node::InnerNode::new(
            var,
            low_target,
            high_target,
            low_weight,
            high_weight,
        ))?;
        node_edges.push(Edge::new(handle, WeightHandle::ONE));
    }

    let root_target = node_edges.last().map(|e| e.target).unwrap_or(NodeHandle::TERMINAL);
    let root_weight = weight_handles.first().copied().unwrap_or(WeightHandle::ONE);
    Ok(Edge::new(root_target, root_weight))
}

fn resolve_node(index: u32, prior: &[Edge]) -> Result<NodeHandle, NodeStreamError> {
    if index == TERMINAL_INDEX {
        return Ok(NodeHandle::TERMINAL);
    }
    prior
        .get(index as usize)
        .map(|e| e.target)
        .ok_or(NodeStreamError::NodeIndexOutOfRange(index, prior.len() as u64))
}

fn resolve_weight(index: u16, prior: &[WeightHandle]) -> Result<WeightHandle, NodeStreamError> {
    prior
        .get(index as usize)
        .copied()
        .ok_or(NodeStreamError::WeightIndexOutOfRange(index, prior.len() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap as StdHashMap;

    /// A tiny in-memory manager covering just enough of the trait to
    /// round-trip a dump: one shared terminal, a flat node arena, and a
    /// weight arena deduplicated by exact bit pattern (no tolerance
    /// fusing, since tests only ever re-intern values they just wrote).
    struct FakeManager {
        nodes: RefCell<Vec<addd_core::node::InnerNode>>,
        weights: RefCell<Vec<(f64, f64)>>,
        weight_lookup: RefCell<StdHashMap<(u64, u64), WeightHandle>>,
    }

    impl FakeManager {
        fn new() -> Self {
            FakeManager {
                nodes: RefCell::new(Vec::new()),
                weights: RefCell::new(vec![(0.0, 0.0), (1.0, 0.0), (-1.0, 0.0)]),
                weight_lookup: RefCell::new(StdHashMap::new()),
            }
        }
    }

    impl Manager for FakeManager {
        fn make_node(&self, node: addd_core::node::InnerNode) -> AdddResult<NodeHandle> {
            let mut nodes = self.nodes.borrow_mut();
            for (i, existing) in nodes.iter().enumerate() {
                if existing.var == node.var
                    && existing.low_target == node.low_target
                    && existing.high_target == node.high_target
                    && existing.low_weight == node.low_weight
                    && existing.high_weight == node.high_weight
                {
                    return Ok(NodeHandle(i as u64));
                }
            }
            nodes.push(node);
            Ok(NodeHandle((nodes.len() - 1) as u64))
        }

        fn get_node(&self, handle: NodeHandle) -> Node {
            if handle.is_terminal() {
                return Node::Terminal;
            }
            Node::Inner(self.nodes.borrow()[handle.0 as usize])
        }

        fn intern_weight(&self, re: f64, im: f64) -> AdddResult<WeightHandle> {
            let key = (re.to_bits(), im.to_bits());
            if let Some(&h) = self.weight_lookup.borrow().get(&key) {
                return Ok(h);
            }
            let mut weights = self.weights.borrow_mut();
            let handle = WeightHandle(weights.len() as u32);
            weights.push((re, im));
            self.weight_lookup.borrow_mut().insert(key, handle);
            Ok(handle)
        }

        fn weight_value(&self, handle: WeightHandle) -> (f64, f64) {
            self.weights.borrow()[handle.0 as usize]
        }

        fn weight_add(&self, a: WeightHandle, b: WeightHandle) -> AdddResult<WeightHandle> {
            let (ar, ai) = self.weight_value(a);
            let (br, bi) = self.weight_value(b);
            self.intern_weight(ar + br, ai + bi)
        }

        fn weight_mul(&self, a: WeightHandle, b: WeightHandle) -> AdddResult<WeightHandle> {
            let (ar, ai) = self.weight_value(a);
            let (br, bi) = self.weight_value(b);
            self.intern_weight(ar * br - ai * bi, ar * bi + ai * br)
        }

        fn weight_neg(&self, a: WeightHandle) -> AdddResult<WeightHandle> {
            let (ar, ai) = self.weight_value(a);
            self.intern_weight(-ar, -ai)
        }

        fn weight_conj(&self, a: WeightHandle) -> AdddResult<WeightHandle> {
            let (ar, ai) = self.weight_value(a);
            self.intern_weight(ar, -ai)
        }

        fn weight_abs(&self, a: WeightHandle) -> f64 {
            let (ar, ai) = self.weight_value(a);
            (ar * ar + ai * ai).sqrt()
        }

        fn tolerance(&self) -> f64 {
            0.0
        }

        fn protect(&self, _edge: Edge) {}
        fn unprotect(&self, _edge: Edge) {}
        fn maybe_gc(&self) -> bool {
            false
        }
    }

    #[test]
    fn round_trips_a_small_diagram() {
        let manager = FakeManager::new();
        let low = manager
            .make_node(addd_core::node::InnerNode::new(
                1,
                NodeHandle::TERMINAL,
                NodeHandle::TERMINAL,
                WeightHandle::ONE,
                WeightHandle::ZERO,
            ))
            .unwrap();
        let root = manager
            .make_node(addd_core::node::InnerNode::new(
                0,
                low,
                NodeHandle::TERMINAL,
                WeightHandle::ONE,
                WeightHandle::ONE,
            ))
            .unwrap();
        let root_edge = Edge::new(root, WeightHandle::ONE);

        let mut buf = Vec::new();
        write_dump(&manager, root_edge, &mut buf).unwrap();

        let reader = FakeManager::new();
        let read_back = read_dump(&reader, &mut buf.as_slice()).unwrap();

        assert_eq!(reader.weight_value(read_back.weight), (1.0, 0.0));
        let inner = match reader.get_node(read_back.target) {
            Node::Inner(n) => n,
            Node::Terminal => panic!("expected inner node"),
        };
        assert_eq!(inner.var, 0);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut buf = vec![0u8; 32];
        buf[0] = 0xff;
        let manager = FakeManager::new();
        let err = read_dump(&manager, &mut buf.as_slice()).unwrap_err();
        assert!(matches!(err, NodeStreamError::BadMagic(_)));
    }
}
