//! # Geometry Errors
//!
//! Error types for primitive construction and root solving.

use thiserror::Error;

/// Errors raised while constructing geometric primitives.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// Radius that is not strictly positive and finite.
    #[error("invalid radius: {0}")]
    InvalidRadius(f64),

    /// Spine with fewer control points than its degree requires.
    #[error("invalid control polygon: {message}")]
    InvalidControlPolygon {
        /// What is wrong with the polygon.
        message: String,
    },

    /// Spine collapsing to a single point.
    #[error("degenerate spine of length {length:e}")]
    DegenerateSpine {
        /// Length of the control polygon.
        length: f64,
    },
}

impl GeometryError {
    /// Creates an invalid control polygon error.
    pub fn invalid_control_polygon(message: impl Into<String>) -> Self {
        Self::InvalidControlPolygon {
            message: message.into(),
        }
    }
}

/// Failures of the Bézier clipping solvers.
///
/// These never abort a run; callers record them as anomalies.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SolverError {
    /// The polynomial vanishes identically on the domain.
    #[error("degenerate polynomial system")]
    Degenerate,

    /// The subdivision depth or step budget was exhausted.
    #[error("solver did not converge after {steps} steps")]
    NonConvergent {
        /// Steps taken before giving up.
        steps: u32,
    },

    /// Tolerance outside `[SOLVER_EPS_MIN, SOLVER_EPS_MAX]`.
    #[error("solver tolerance {0:e} out of range")]
    InvalidTolerance(f64),
}

/// Result type for solver operations.
pub type SolverResult<T> = Result<T, SolverError>;
