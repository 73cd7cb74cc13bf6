//! Error types for cvxreduce.

use thiserror::Error;

/// Error type for cvxreduce operations.
#[derive(Debug, Error)]
pub enum CvxError {
    /// Static atom data is structurally invalid (e.g. a non-integer `k`).
    #[error("Domain error: {0}")]
    Domain(String),

    /// A reduction met a tree its rule registry cannot classify.
    ///
    /// This is a defect in the rules, never a recoverable condition.
    #[error("Reduction invariant violated: {0}")]
    Invariant(String),

    /// The problem cannot be reduced until its parameters are bound.
    #[error("Reduction deferred until parameters are bound: {0}")]
    Deferred(String),

    /// Problem is not DCP-compliant.
    #[error("Problem is not DCP: {0}")]
    NotDcp(String),

    /// Solver error.
    #[error("Solver error: {0}")]
    SolverError(String),

    /// Shape mismatch.
    #[error("Shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: String, got: String },

    /// Malformed problem, such as an unbound parameter.
    #[error("Invalid problem: {0}")]
    InvalidProblem(String),

    /// Numerical error.
    #[error("Numerical error: {0}")]
    NumericalError(String),
}

/// Result type for cvxreduce operations.
pub type Result<T> = std::result::Result<T, CvxError>;
