//! Error kinds surfaced by the numerical core.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VectorError {
    #[error("division by zero in {operation}: vector has zero length")]
    DivideByZero { operation: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OrthogonalizationError {
    /// Vector `index` of the input lies in the span of the vectors before it.
    #[error("division by zero while orthogonalizing vector {index}: input is linearly dependent")]
    DivideByZero { index: usize },
}

/// The kind of failure that halted a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    DivideByZero,
    Diverged,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::DivideByZero => write!(f, "divide by zero"),
            FailureKind::Diverged => write!(f, "diverged"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LyapunovError {
    #[error("perturbation basis degenerated: vector {index} has zero length")]
    DivideByZero { index: usize },
    #[error("integration diverged: {quantity} is not finite")]
    Diverged { quantity: &'static str },
    #[error("session is halted after a {0} failure; reset before ticking")]
    Halted(FailureKind),
}

impl LyapunovError {
    pub fn kind(&self) -> FailureKind {
        match self {
            LyapunovError::DivideByZero { .. } => FailureKind::DivideByZero,
            LyapunovError::Diverged { .. } => FailureKind::Diverged,
            LyapunovError::Halted(kind) => *kind,
        }
    }
}

impl From<OrthogonalizationError> for LyapunovError {
    fn from(err: OrthogonalizationError) -> Self {
        match err {
            OrthogonalizationError::DivideByZero { index } => LyapunovError::DivideByZero { index },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum KaplanYorkeError {
    #[error("no prefix sum of the exponents is non-negative")]
    NoNonNegativePrefix,
    #[error("Kaplan-Yorke boundary index {index} exceeds exponent count {len}")]
    IndexOutOfRange { index: usize, len: usize },
}
