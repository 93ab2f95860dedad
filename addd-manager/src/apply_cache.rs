//! Fixed-capacity direct-mapped operation cache (C4).

use parking_lot::RwLock;

use addd_core::apply_cache::ApplyCache as ApplyCacheTrait;
use addd_core::countable::Countable;
use addd_core::edge::Edge;

#[derive(Clone, Copy, PartialEq, Eq)]
struct Slot {
    key: u64,
    op: u32,
    result: Edge,
    occupied: bool,
}

impl Default for Slot {
    fn default() -> Self {
        Slot {
            key: 0,
            op: 0,
            result: Edge::ZERO,
            occupied: false,
        }
    }
}

/// Direct-mapped: each `(op, operands)` key hashes to exactly one slot,
/// and a new insertion simply overwrites whatever was there (`spec.md`
/// §4.4: "collisions overwrite; correctness does not depend on cache
/// hits"). Readers re-validate the full key on a hit before trusting the
/// stored result, since a concurrent writer may have replaced the slot
/// mid-read (`spec.md` §5: "racing tolerated; readers validate").
pub struct DirectMappedApplyCache {
    slots: RwLock<Vec<Slot>>,
    mask: u64,
}

impl DirectMappedApplyCache {
    pub fn new(capacity_pow2: usize) -> Self {
        let capacity = capacity_pow2.next_power_of_two().max(1);
        DirectMappedApplyCache {
            slots: RwLock::new(vec![Slot::default(); capacity]),
            mask: (capacity - 1) as u64,
        }
    }

    fn hash_key(op: u32, operands: &[u64]) -> u64 {
        // FNV-1a over the op id and operand words; cheap and
        // order-sensitive, matching the cache-key-normalization
        // contract (callers sort commutative operand pairs themselves,
        // per `spec.md` §4.4, before calling `get`/`insert`).
        let mut h: u64 = 0xcbf29ce484222325 ^ (op as u64);
        for &w in operands {
            h ^= w;
            h = h.wrapping_mul(0x100000001b3);
        }
        h
    }

    fn full_key(op: u32, operands: &[u64]) -> u64 {
        // A second, independent mix used purely for validating a slot
        // hit (distinct from the index hash) so two different keys that
        // collide on the index essentially never also collide here.
        let mut h: u64 = 0x9e3779b97f4a7c15 ^ ((op as u64) << 1 | 1);
        for &w in operands {
            h = (h ^ w).wrapping_mul(0xff51afd7ed558ccd);
            h ^= h >> 33;
        }
        h
    }

    /// Clear every entry. Exposed as an inherent method (in addition to
    /// the generic `ApplyCache::clear`) so GC coordination code that
    /// does not know which operator enum is in play can still clear the
    /// cache.
    pub fn clear_all(&self) {
        let mut slots = self.slots.write();
        for s in slots.iter_mut() {
            s.occupied = false;
        }
    }
}

impl<Op: Countable> ApplyCacheTrait<Op> for DirectMappedApplyCache {
    fn get(&self, op: Op, operands: &[u64]) -> Option<Edge> {
        let op_id = op.as_usize() as u32;
        let idx = (Self::hash_key(op_id, operands) & self.mask) as usize;
        let expect_key = Self::full_key(op_id, operands);
        let slots = self.slots.read();
        let slot = slots[idx];
        if slot.occupied && slot.op == op_id && slot.key == expect_key {
            Some(slot.result)
        } else {
            None
        }
    }

    fn insert(&self, op: Op, operands: &[u64], result: Edge) {
        let op_id = op.as_usize() as u32;
        let idx = (Self::hash_key(op_id, operands) & self.mask) as usize;
        let key = Self::full_key(op_id, operands);
        let mut slots = self.slots.write();
        slots[idx] = Slot {
            key,
            op: op_id,
            result,
            occupied: true,
        };
    }

    fn clear(&self) {
        self.clear_all();
    }
}
