//! Edge-weight normalization strategies (`spec.md` §4.3).

use num_complex::Complex64;

use addd_core::edge::WeightHandle;
use addd_core::AdddResult;
use addd_core::manager::Manager;
use addd_manager::EvbddManager;

/// Which common factor to pull up from a candidate node's two children.
/// Selected once per process at `init` (`spec.md` §6.3 `norm-strategy`).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum NormStrategy {
    /// Leading (low, unless zero) child becomes `W_ONE`.
    #[default]
    Low,
    /// Child of largest magnitude becomes `W_ONE`; ties broken by
    /// larger real part, then larger imaginary part.
    Largest,
    /// Child of smallest (nonzero) magnitude becomes `W_ONE`.
    Min,
    /// Both children divided by `sqrt(|low|^2 + |high|^2)`.
    L2,
}

fn value(manager: &EvbddManager, h: WeightHandle) -> Complex64 {
    let (re, im) = manager.weight_value(h);
    Complex64::new(re, im)
}

fn div(manager: &EvbddManager, a: WeightHandle, b: WeightHandle) -> AdddResult<WeightHandle> {
    let (va, vb) = (value(manager, a), value(manager, b));
    let q = va / vb;
    manager.intern_weight(q.re, q.im)
}

/// Result of normalizing a candidate node's two child weights: the
/// factor pushed to the parent edge, and the (already-normalized) child
/// weights to store in the node.
pub struct Normalized {
    pub w_norm: WeightHandle,
    pub low_weight: WeightHandle,
    pub high_weight: WeightHandle,
}

/// `spec.md` §4.3 step 2: normalize `(low, high)` under `strategy`.
/// Returns `None` when `w_norm` would be zero, meaning the whole edge
/// collapses to the `W_ZERO` terminal (both children were zero).
pub fn normalize(
    manager: &EvbddManager,
    low: WeightHandle,
    high: WeightHandle,
    strategy: NormStrategy,
) -> AdddResult<Option<Normalized>> {
    if low.is_zero() && high.is_zero() {
        return Ok(None);
    }

    match strategy {
        NormStrategy::Low => {
            let (w_norm, leading_is_low) = if !low.is_zero() {
                (low, true)
            } else {
                (high, false)
            };
            let (low_weight, high_weight) = if leading_is_low {
                (WeightHandle::ONE, div(manager, high, w_norm)?)
            } else {
                (div(manager, low, w_norm)?, WeightHandle::ONE)
            };
            Ok(Some(Normalized {
                w_norm,
                low_weight,
                high_weight,
            }))
        }

        NormStrategy::Largest | NormStrategy::Min => {
            let (vl, vh) = (value(manager, low), value(manager, high));
            let low_bigger = if strategy == NormStrategy::Largest {
                is_larger(vl, vh)
            } else {
                // smallest nonzero magnitude; a zero child can never be
                // the chosen "leading" one unless both are zero, which
                // was handled above.
                if low.is_zero() {
                    false
                } else if high.is_zero() {
                    true
                } else {
                    !is_larger(vl, vh)
                }
            };
            let (w_norm, low_weight, high_weight) = if low_bigger {
                (low, WeightHandle::ONE, div(manager, high, low)?)
            } else {
                (high, div(manager, low, high)?, WeightHandle::ONE)
            };
            Ok(Some(Normalized {
                w_norm,
                low_weight,
                high_weight,
            }))
        }

        NormStrategy::L2 => {
            let (vl, vh) = (value(manager, low), value(manager, high));
            let norm = (vl.norm_sqr() + vh.norm_sqr()).sqrt();
            // Phase convention: make the low child's normalized value
            // have a non-negative real part (and, on a tie at zero real
            // part, a non-negative imaginary part), fixing the residual
            // global-phase freedom L2 normalization leaves open.
            let low_n = vl / norm;
            let flip = low_n.re < 0.0 || (low_n.re == 0.0 && low_n.im < 0.0);
            let phase = if flip { -1.0 } else { 1.0 };
            let w_norm_val = Complex64::new(norm * phase, 0.0);
            let w_norm = manager.intern_weight(w_norm_val.re, w_norm_val.im)?;
            let low_weight = manager.intern_weight((vl / w_norm_val).re, (vl / w_norm_val).im)?;
            let high_weight = manager.intern_weight((vh / w_norm_val).re, (vh / w_norm_val).im)?;
            Ok(Some(Normalized {
                w_norm,
                low_weight,
                high_weight,
            }))
        }
    }
}

fn is_larger(a: Complex64, b: Complex64) -> bool {
    let (na, nb) = (a.norm(), b.norm());
    if (na - nb).abs() > 0.0 {
        na > nb
    } else if a.re != b.re {
        a.re > b.re
    } else {
        a.im > b.im
    }
}
