use num_complex::Complex64;

use addd_core::{AdddError, AdddResult};

use super::Backend;

/// A real-axis search tree over an append-only value store: `entries`
/// holds values at their permanent, stable index; `order` holds those
/// indices sorted by `(re, im)` so lookup can binary-search a range
/// instead of probing hash buckets. Where `HashmapBackend` pays a hash
/// per lookup, this pays `O(log n)` comparisons plus a linear scan of
/// the tolerance window, which tolerates a sliding tolerance without
/// bucket-boundary artifacts.
pub struct RealTreeBackend {
    entries: Vec<Complex64>,
    order: Vec<u32>,
    tolerance: f64,
    max_capacity: usize,
}

impl RealTreeBackend {
    fn find(&self, value: Complex64) -> Option<u32> {
        let tol = self.tolerance.max(0.0);
        let lo = self
            .order
            .partition_point(|&idx| self.entries[idx as usize].re < value.re - tol);
        for &idx in &self.order[lo..] {
            let e = self.entries[idx as usize];
            if e.re > value.re + tol {
                break;
            }
            if (e - value).norm() <= tol {
                return Some(idx);
            }
        }
        None
    }
}

impl Backend for RealTreeBackend {
    fn new(capacity: usize, tolerance: f64) -> Self {
        RealTreeBackend {
            entries: Vec::with_capacity(capacity),
            order: Vec::with_capacity(capacity),
            tolerance,
            max_capacity: capacity,
        }
    }

    fn lookup_or_insert(&mut self, value: Complex64) -> AdddResult<u32> {
        if let Some(idx) = self.find(value) {
            return Ok(idx);
        }
        if self.entries.len() >= self.max_capacity {
            return Err(AdddError::TableFull);
        }
        let idx = self.entries.len() as u32;
        self.entries.push(value);
        let pos = self
            .order
            .partition_point(|&i| self.entries[i as usize].re < value.re);
        self.order.insert(pos, idx);
        Ok(idx)
    }

    fn value(&self, idx: u32) -> Complex64 {
        self.entries[idx as usize]
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn capacity(&self) -> usize {
        self.max_capacity
    }

    fn fresh_like(&self, capacity: usize) -> Self {
        RealTreeBackend::new(capacity, self.tolerance)
    }
}
