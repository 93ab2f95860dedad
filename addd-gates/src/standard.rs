use num_complex::Complex64;
use parking_lot::Mutex;

use crate::{GateError, GateId, GateLibrary, GateResult};

const fn re(r: f64) -> Complex64 {
    Complex64::new(r, 0.0)
}

const ZERO: Complex64 = re(0.0);
const ONE: Complex64 = re(1.0);

/// Fixed single-qubit gate IDs. `PROJ0`/`PROJ1` are the `|0><0|`/`|1><1|`
/// projectors used internally by multi-controlled-gate construction
/// (`spec.md` §4.6), not gates a circuit would apply directly.
pub const I: GateId = 0;
pub const X: GateId = 1;
pub const Y: GateId = 2;
pub const Z: GateId = 3;
pub const H: GateId = 4;
pub const S: GateId = 5;
pub const S_DAG: GateId = 6;
pub const T: GateId = 7;
pub const T_DAG: GateId = 8;
pub const PROJ0: GateId = 9;
pub const PROJ1: GateId = 10;

/// Fixed two-qubit gate IDs.
pub const CNOT: GateId = 20;
pub const CZ: GateId = 21;
pub const SWAP: GateId = 22;

const PARAM_BASE: GateId = 1000;

/// Minimal, test-grade [`GateLibrary`]: the common fixed Clifford+T gate
/// set, plus parametrized `Rx`/`Ry`/`Rz`/`Phase` gates allocated at call
/// time by closing over an angle. Not the full external gate library
/// `spec.md` scopes out — just enough for `addd`'s own constructors and
/// tests to have concrete gate IDs to resolve.
#[derive(Default)]
pub struct StandardGateLibrary {
    parametrized: Mutex<Vec<[[Complex64; 2]; 2]>>,
}

impl StandardGateLibrary {
    pub fn new() -> Self {
        StandardGateLibrary::default()
    }

    /// Allocate an `Rx(theta)` gate and return its ID.
    pub fn rx(&self, theta: f64) -> GateId {
        let (c, s) = ((theta / 2.0).cos(), (theta / 2.0).sin());
        self.alloc(
            [[re(c), Complex64::new(0.0, -s)], [Complex64::new(0.0, -s), re(c)]],
        )
    }

    /// Allocate an `Ry(theta)` gate and return its ID.
    pub fn ry(&self, theta: f64) -> GateId {
        let (c, s) = ((theta / 2.0).cos(), (theta / 2.0).sin());
        self.alloc([[re(c), re(-s)], [re(s), re(c)]])
    }

    /// Allocate an `Rz(theta)` gate and return its ID.
    pub fn rz(&self, theta: f64) -> GateId {
        let half = theta / 2.0;
        let p = Complex64::from_polar(1.0, -half);
        let m = Complex64::from_polar(1.0, half);
        self.alloc([[p, ZERO], [ZERO, m]])
    }

    /// Allocate a `Phase(theta)` gate (diagonal `diag(1, e^{i theta})`).
    pub fn phase(&self, theta: f64) -> GateId {
        self.alloc([[ONE, ZERO], [ZERO, Complex64::from_polar(1.0, theta)]])
    }

    fn alloc(&self, matrix: [[Complex64; 2]; 2]) -> GateId {
        let mut table = self.parametrized.lock();
        table.push(matrix);
        PARAM_BASE + (table.len() as GateId - 1)
    }
}

impl GateLibrary for StandardGateLibrary {
    fn resolve1(&self, id: GateId) -> GateResult<[[Complex64; 2]; 2]> {
        let inv_sqrt2 = re(std::f64::consts::FRAC_1_SQRT_2);
        Ok(match id {
            I => [[ONE, ZERO], [ZERO, ONE]],
            X => [[ZERO, ONE], [ONE, ZERO]],
            Y => [[ZERO, Complex64::new(0.0, -1.0)], [Complex64::new(0.0, 1.0), ZERO]],
            Z => [[ONE, ZERO], [ZERO, re(-1.0)]],
            H => [[inv_sqrt2, inv_sqrt2], [inv_sqrt2, -inv_sqrt2]],
            S => [[ONE, ZERO], [ZERO, Complex64::new(0.0, 1.0)]],
            S_DAG => [[ONE, ZERO], [ZERO, Complex64::new(0.0, -1.0)]],
            T => [[ONE, ZERO], [ZERO, Complex64::from_polar(1.0, std::f64::consts::FRAC_PI_4)]],
            T_DAG => [[ONE, ZERO], [ZERO, Complex64::from_polar(1.0, -std::f64::consts::FRAC_PI_4)]],
            PROJ0 => [[ONE, ZERO], [ZERO, ZERO]],
            PROJ1 => [[ZERO, ZERO], [ZERO, ONE]],
            id if id >= PARAM_BASE => {
                let table = self.parametrized.lock();
                let idx = (id - PARAM_BASE) as usize;
                *table.get(idx).ok_or(GateError::UnknownGate(id))?
            }
            _ => return Err(GateError::NotSingleQubit(id)),
        })
    }

    fn resolve2(&self, id: GateId) -> GateResult<[[Complex64; 4]; 4]> {
        Ok(match id {
            CNOT => [
                [ONE, ZERO, ZERO, ZERO],
                [ZERO, ONE, ZERO, ZERO],
                [ZERO, ZERO, ZERO, ONE],
                [ZERO, ZERO, ONE, ZERO],
            ],
            CZ => [
                [ONE, ZERO, ZERO, ZERO],
                [ZERO, ONE, ZERO, ZERO],
                [ZERO, ZERO, ONE, ZERO],
                [ZERO, ZERO, ZERO, re(-1.0)],
            ],
            SWAP => [
                [ONE, ZERO, ZERO, ZERO],
                [ZERO, ZERO, ONE, ZERO],
                [ZERO, ONE, ZERO, ZERO],
                [ZERO, ZERO, ZERO, ONE],
            ],
            _ => return Err(GateError::NotTwoQubit(id)),
        })
    }

    fn alloc_parametrized(&mut self, matrix: [[Complex64; 2]; 2]) -> GateId {
        self.alloc(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hadamard_is_self_inverse() {
        let lib = StandardGateLibrary::new();
        let h = lib.resolve1(H).unwrap();
        let mut hh = [[ZERO; 2]; 2];
        for i in 0..2 {
            for j in 0..2 {
                for k in 0..2 {
                    hh[i][j] += h[i][k] * h[k][j];
                }
            }
        }
        assert!((hh[0][0] - ONE).norm() < 1e-12);
        assert!((hh[0][1]).norm() < 1e-12);
        assert!((hh[1][1] - ONE).norm() < 1e-12);
    }

    #[test]
    fn rz_allocates_above_fixed_range() {
        let lib = StandardGateLibrary::new();
        let id = lib.rz(std::f64::consts::PI / 4.0);
        assert!(id >= PARAM_BASE);
        assert!(lib.resolve1(id).is_ok());
    }
}
