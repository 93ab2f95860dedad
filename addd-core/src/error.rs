//! Error kinds named in the spec's error-handling design.

use thiserror::Error;

use crate::edge::WeightHandle;

/// Result alias used throughout the `addd` crate family.
pub type AdddResult<T> = Result<T, AdddError>;

/// Fatal and recoverable error kinds.
///
/// `TableFull`, `Overflow` and `InvalidOrder` are fatal: the recursion
/// that encounters them aborts without committing a node. The table
/// already attempted a GC before raising `TableFull`.
#[derive(Debug, Error)]
pub enum AdddError {
    /// The node table (or weight table) is full even after a garbage
    /// collection cycle.
    #[error("table full after garbage collection")]
    TableFull,

    /// A variable index exceeded the configured maximum.
    #[error("variable index {0} exceeds configured maximum {1}")]
    Overflow(u32, u32),

    /// A control qubit appeared below its target in variable order
    /// without having been reordered by the caller.
    #[error("control variable {ctrl} is not below target variable {target} in the configured order")]
    InvalidOrder {
        /// Offending control variable.
        ctrl: u32,
        /// Offending target variable.
        target: u32,
    },

    /// The engine was asked to operate before `init` or after `quit`.
    #[error("engine is not initialized")]
    NotInitialized,

    /// Two distinct weight values were fused because they fell within
    /// `ε` of each other. Not propagated as a failure anywhere; named
    /// here so callers that want to log the event have a concrete type
    /// for it.
    #[error("weights within tolerance fused: {0:?} and {1:?} differ by {2:e}")]
    WeightPrecisionLoss(WeightHandle, WeightHandle, f64),

    /// `|p0 + p1 - 1| > ε` after a measurement's marginal probabilities
    /// were computed. Non-fatal: the measurement still completes and
    /// renormalizes against whichever branch was sampled.
    #[error("measurement probabilities sum to {0} (drift {1:e} past tolerance)")]
    MeasurementNorm(f64, f64),
}
