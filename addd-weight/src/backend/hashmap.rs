use num_complex::Complex64;
use rustc_hash::FxHashMap;

use addd_core::{AdddError, AdddResult};

use super::Backend;

/// Open-addressed (via `FxHashMap`) back-end keyed on a tolerance-bucketed
/// `(real, imag)` representation, with the exact value stored alongside
/// so a bucket collision can be resolved by checking the true distance.
pub struct HashmapBackend {
    values: Vec<Complex64>,
    buckets: FxHashMap<(i64, i64), Vec<u32>>,
    tolerance: f64,
    max_capacity: usize,
}

impl HashmapBackend {
    fn bucket_key(&self, v: Complex64) -> (i64, i64) {
        let scale = if self.tolerance > 0.0 {
            1.0 / self.tolerance
        } else {
            1e14
        };
        ((v.re * scale).round() as i64, (v.im * scale).round() as i64)
    }

    fn neighbor_keys(key: (i64, i64)) -> [(i64, i64); 9] {
        let (a, b) = key;
        [
            (a - 1, b - 1),
            (a - 1, b),
            (a - 1, b + 1),
            (a, b - 1),
            (a, b),
            (a, b + 1),
            (a + 1, b - 1),
            (a + 1, b),
            (a + 1, b + 1),
        ]
    }
}

impl Backend for HashmapBackend {
    fn new(capacity: usize, tolerance: f64) -> Self {
        HashmapBackend {
            values: Vec::with_capacity(capacity),
            buckets: FxHashMap::default(),
            tolerance,
            max_capacity: capacity,
        }
    }

    fn lookup_or_insert(&mut self, value: Complex64) -> AdddResult<u32> {
        let key = self.bucket_key(value);
        for nk in Self::neighbor_keys(key) {
            if let Some(slots) = self.buckets.get(&nk) {
                for &idx in slots {
                    if (self.values[idx as usize] - value).norm() <= self.tolerance.max(0.0) {
                        return Ok(idx);
                    }
                }
            }
        }
        if self.values.len() >= self.max_capacity {
            return Err(AdddError::TableFull);
        }
        let idx = self.values.len() as u32;
        self.values.push(value);
        self.buckets.entry(key).or_default().push(idx);
        Ok(idx)
    }

    fn value(&self, idx: u32) -> Complex64 {
        self.values[idx as usize]
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn capacity(&self) -> usize {
        self.max_capacity
    }

    fn fresh_like(&self, capacity: usize) -> Self {
        HashmapBackend::new(capacity, self.tolerance)
    }
}
