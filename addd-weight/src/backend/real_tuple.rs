use num_complex::Complex64;
use rustc_hash::FxHashMap;

use addd_core::{AdddError, AdddResult};

use super::Backend;

/// Interns the real and imaginary parts independently in two dense
/// tables, then combines their indices into one composite handle
/// (`re_idx << 32 | im_idx`). Cheaper than `HashmapBackend` when many
/// weights share an axis value (e.g. real amplitudes, or pure phases on
/// a fixed set of angles) but pays an extra indirection per lookup.
pub struct RealTupleBackend {
    reals: Vec<f64>,
    real_index: FxHashMap<i64, u32>,
    imags: Vec<f64>,
    imag_index: FxHashMap<i64, u32>,
    composite: FxHashMap<(u32, u32), u32>,
    composite_values: Vec<Complex64>,
    tolerance: f64,
    max_capacity: usize,
}

impl RealTupleBackend {
    fn bucket(&self, v: f64) -> i64 {
        let scale = if self.tolerance > 0.0 {
            1.0 / self.tolerance
        } else {
            1e14
        };
        (v * scale).round() as i64
    }

    fn intern_axis(
        table: &mut Vec<f64>,
        index: &mut FxHashMap<i64, u32>,
        bucket: i64,
        value: f64,
        tolerance: f64,
    ) -> u32 {
        for b in [bucket - 1, bucket, bucket + 1] {
            if let Some(&idx) = index.get(&b) {
                if (table[idx as usize] - value).abs() <= tolerance.max(0.0) {
                    return idx;
                }
            }
        }
        let idx = table.len() as u32;
        table.push(value);
        index.insert(bucket, idx);
        idx
    }
}

impl Backend for RealTupleBackend {
    fn new(capacity: usize, tolerance: f64) -> Self {
        RealTupleBackend {
            reals: Vec::new(),
            real_index: FxHashMap::default(),
            imags: Vec::new(),
            imag_index: FxHashMap::default(),
            composite: FxHashMap::default(),
            composite_values: Vec::with_capacity(capacity),
            tolerance,
            max_capacity: capacity,
        }
    }

    fn lookup_or_insert(&mut self, value: Complex64) -> AdddResult<u32> {
        let re_bucket = self.bucket(value.re);
        let im_bucket = self.bucket(value.im);
        let re_idx =
            Self::intern_axis(&mut self.reals, &mut self.real_index, re_bucket, value.re, self.tolerance);
        let im_idx =
            Self::intern_axis(&mut self.imags, &mut self.imag_index, im_bucket, value.im, self.tolerance);

        if let Some(&idx) = self.composite.get(&(re_idx, im_idx)) {
            return Ok(idx);
        }
        if self.composite_values.len() >= self.max_capacity {
            return Err(AdddError::TableFull);
        }
        let idx = self.composite_values.len() as u32;
        self.composite_values.push(value);
        self.composite.insert((re_idx, im_idx), idx);
        Ok(idx)
    }

    fn value(&self, idx: u32) -> Complex64 {
        self.composite_values[idx as usize]
    }

    fn len(&self) -> usize {
        self.composite_values.len()
    }

    fn capacity(&self) -> usize {
        self.max_capacity
    }

    fn fresh_like(&self, capacity: usize) -> Self {
        RealTupleBackend::new(capacity, self.tolerance)
    }
}
