//! The gate-ID contract (`spec.md` §6.1, §4.6): opaque 32-bit gate
//! identifiers resolved into 2x2 (single-qubit) or 4x4 (two-qubit)
//! complex matrices. `spec.md` explicitly scopes the external gate
//! library's internals out; this crate supplies just enough of a
//! concrete implementation for the engine's own constructors and tests
//! to have gate IDs to resolve, mirroring the teacher's own
//! `StandardGateLibrary`-shaped stand-ins for out-of-scope collaborator
//! interfaces.

mod standard;

pub use standard::{
    StandardGateLibrary, CNOT, CZ, H, I, PROJ0, PROJ1, S, SWAP, S_DAG, T, T_DAG, X, Y, Z,
};

use num_complex::Complex64;
use thiserror::Error;

/// Opaque gate identifier. Fixed gates occupy a small reserved range;
/// `alloc_parametrized` hands out identifiers above that range.
pub type GateId = u32;

#[derive(Debug, Error)]
pub enum GateError {
    #[error("unknown gate id {0}")]
    UnknownGate(GateId),
    #[error("gate {0} is not a single-qubit gate")]
    NotSingleQubit(GateId),
    #[error("gate {0} is not a two-qubit gate")]
    NotTwoQubit(GateId),
}

pub type GateResult<T> = Result<T, GateError>;

/// Resolves opaque gate IDs into dense complex matrices, and allocates
/// fresh IDs for runtime-parametrized gates (rotations, phase gates,
/// custom unitaries), per `spec.md` §6.1: "new gate IDs may be allocated
/// at runtime for parametrized gates."
pub trait GateLibrary {
    fn resolve1(&self, id: GateId) -> GateResult<[[Complex64; 2]; 2]>;
    fn resolve2(&self, id: GateId) -> GateResult<[[Complex64; 4]; 4]>;

    /// Allocate a new gate ID for a single-qubit unitary computed from
    /// `matrix` (e.g. a rotation closing over an angle at call time).
    fn alloc_parametrized(&mut self, matrix: [[Complex64; 2]; 2]) -> GateId;
}
