//! Error types for layered elastic analysis.

use thiserror::Error;

/// Result type alias using the engine's Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or evaluating a layered system.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Malformed layer geometry or material data.
    #[error("invalid layer configuration: {0}")]
    InvalidLayerConfiguration(String),

    /// Non-positive or non-finite load parameters.
    #[error("invalid load: {0}")]
    InvalidLoad(String),

    /// Evaluation point outside the half-space.
    #[error("invalid evaluation point: {0}")]
    InvalidEvaluationPoint(String),

    /// Out-of-range quadrature or solver tuning parameters.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The interface system is singular or ill-conditioned at a transform sample.
    #[error("singular interface system at m = {m:.6e}: {detail}")]
    SingularSystem {
        /// Normalised transform parameter of the failing sample (NaN when
        /// raised by a bare solver call).
        m: f64,
        /// What the solver observed.
        detail: String,
    },

    /// Solver input errors (dimension mismatches).
    #[error("solver error: {0}")]
    Solver(String),
}

impl Error {
    /// Whether this error came from a numerically singular system.
    pub fn is_singular(&self) -> bool {
        matches!(self, Error::SingularSystem { .. })
    }

    /// Attach the transform parameter to a singular-system error.
    pub(crate) fn at_sample(self, m: f64) -> Self {
        match self {
            Error::SingularSystem { detail, .. } => Error::SingularSystem { m, detail },
            other => other,
        }
    }
}
