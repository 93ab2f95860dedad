//! `addd`'s own error type: composes `addd_core::AdddError` with the
//! gate-library errors that only this crate's constructors can raise.

use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Core(#[from] addd_core::AdddError),

    #[error(transparent)]
    Gate(#[from] addd_gates::GateError),

    #[error(transparent)]
    Dump(#[from] addd_dump::NodeStreamError),

    /// `n_qubits == 0` was passed to a constructor or measurement
    /// operation that requires at least one qubit.
    #[error("operation requires at least one qubit")]
    NoQubits,

    /// A bit-string argument's length did not match the declared qubit
    /// count.
    #[error("bit string has length {0}, expected {1}")]
    BitLengthMismatch(usize, usize),
}
