//! Centralized defaults and bounds shared across the cellgen pipeline.
//!
//! Defaults reproduce the behaviour of the reference command line tool; the
//! bounds are the ones enforced by [`crate::settings::CellgenConfig::validate`].

use std::fmt;

// =============================================================================
// PRECISION CONSTANTS
// =============================================================================

/// Numerical tolerance used by geometric predicates.
///
/// # Examples
/// ```
/// use config::constants::EPSILON_TOLERANCE;
/// assert!(EPSILON_TOLERANCE < 1.0e-6);
/// ```
pub const EPSILON_TOLERANCE: f64 = 1.0e-9;

/// Smallest admissible solver tolerance (`univar_eps`, `bivar_eps`).
pub const SOLVER_EPS_MIN: f64 = 1.0e-11;

/// Largest admissible solver tolerance (`univar_eps`, `bivar_eps`).
pub const SOLVER_EPS_MAX: f64 = 1.0e-3;

/// Maximum subdivision depth of the Bézier clipping solvers before a
/// sub-problem is reported as non-convergent.
pub const SOLVER_MAX_DEPTH: u32 = 48;

/// Maximum number of clipping steps spent on a single root finding problem.
pub const SOLVER_MAX_STEPS: u32 = 20_000;

// =============================================================================
// ANALYSIS DEFAULTS
// =============================================================================

/// Default number of analysis worker threads.
pub const DEFAULT_ANA_NTHREADS: usize = 1;

/// Default tolerance of the univariate solver (Bézier clipping).
pub const DEFAULT_UNIVAR_EPS: f64 = 1.0e-6;

/// Default tolerance of the bivariate solver (bivariate linear clipping).
pub const DEFAULT_BIVAR_EPS: f64 = 1.0e-4;

/// Relative inflation of radii for magnified canal surfaces.
///
/// # Examples
/// ```
/// use config::constants::MAGNIFICATION_FACTOR;
/// assert!(MAGNIFICATION_FACTOR > 1.0);
/// ```
pub const MAGNIFICATION_FACTOR: f64 = 1.25;

/// Absolute inflation added on top of [`MAGNIFICATION_FACTOR`].
pub const MAGNIFICATION_MARGIN: f64 = 1.0e-2;

// =============================================================================
// PARTITION / PARAMETRIZATION DEFAULTS
// =============================================================================

/// Default filter angle for the partition strategies, in radians (90°).
pub const DEFAULT_FILTER_ANGLE: f64 = std::f64::consts::FRAC_PI_2;

/// Default filter radius ratio for the partition strategies.
pub const DEFAULT_FILTER_RADIUS_RATIO: f64 = 10.0;

// =============================================================================
// PRECONDITIONING DEFAULTS
// =============================================================================

/// Default minimum segment length in units of the larger end radius.
pub const DEFAULT_PC_ALPHA: f64 = 3.0;

/// Default maximum radius ratio across one segment.
pub const DEFAULT_PC_BETA: f64 = 1.5;

/// Default maximum segment length in units of the smaller end radius.
pub const DEFAULT_PC_GAMMA: f64 = 10.0;

// =============================================================================
// MESHING DEFAULTS AND BOUNDS
// =============================================================================

/// Default icosahedron refinement count for soma spheres.
pub const DEFAULT_SOMA_REFINEMENTS: u32 = 3;

/// Largest admissible soma refinement count.
pub const MAX_SOMA_REFINEMENTS: u32 = 10;

/// Default angular segment count of canal surface rings.
pub const DEFAULT_ANGULAR_SEGMENTS: u32 = 6;

/// Smallest admissible angular segment count.
pub const MIN_ANGULAR_SEGMENTS: u32 = 3;

/// Largest admissible angular segment count.
pub const MAX_ANGULAR_SEGMENTS: u32 = 64;

/// Default multiplier of the optimal canal surface triangle height.
pub const DEFAULT_TRIANGLE_HEIGHT_FACTOR: f64 = 1.0;

/// Default iteration cap of the outer meshing loop.
pub const DEFAULT_OUTER_LOOP_MAXITER: u32 = 16;

/// Default iteration cap of the inner meshing loop.
pub const DEFAULT_INNER_LOOP_MAXITER: u32 = 8;

/// Default face count that triggers flushing of immutable mesh regions.
pub const DEFAULT_FLUSH_FACE_LIMIT: usize = 100_000;

/// Smallest admissible flush face limit.
pub const MIN_FLUSH_FACE_LIMIT: usize = 1024;

/// Default initial radius factor of the outer meshing loop.
pub const DEFAULT_INITIAL_RADIUS_FACTOR: f64 = 1.0;

/// Default decrement applied to the radius factor after a failed attempt.
pub const DEFAULT_RADIUS_FACTOR_DECREMENT: f64 = 0.01;

/// Largest admissible radius factor decrement (10% per step).
pub const MAX_RADIUS_FACTOR_DECREMENT: f64 = 0.1;

/// Radius factor below which an element is declared unmeshable.
///
/// # Examples
/// ```
/// use config::constants::{RADIUS_FACTOR_FLOOR, DEFAULT_INITIAL_RADIUS_FACTOR};
/// assert!(RADIUS_FACTOR_FLOOR < DEFAULT_INITIAL_RADIUS_FACTOR);
/// ```
pub const RADIUS_FACTOR_FLOOR: f64 = 0.5;

/// Default maximum growth factor of complex edges during one merge.
pub const DEFAULT_COMPLEX_EDGE_MAX_GROWTH_FACTOR: f64 = 2.0;

/// Angular phase increment between outer loop attempts (golden angle).
pub const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

// =============================================================================
// POST-PROCESSING DEFAULTS
// =============================================================================

/// Default triangle aspect ratio threshold of the greedy edge collapse.
pub const DEFAULT_GEC_ALPHA: f64 = 1.5;

/// Default lower relative area factor of the greedy edge collapse.
pub const DEFAULT_GEC_LAMBDA: f64 = 0.125;

/// Default area change factor of the greedy edge collapse.
pub const DEFAULT_GEC_MU: f64 = 0.5;

/// Default face neighbourhood depth of the greedy edge collapse.
pub const DEFAULT_GEC_DEPTH: u32 = 5;

/// Default HC smoothing `alpha`.
pub const DEFAULT_HC_ALPHA: f64 = 0.4;

/// Default HC smoothing `beta`.
pub const DEFAULT_HC_BETA: f64 = 0.7;

/// Default HC smoothing iteration count.
pub const DEFAULT_HC_MAXITER: u32 = 10;

// =============================================================================
// FILE NAMING
// =============================================================================

/// Suffix of the individually rendered modelling surfaces output.
pub const INDIVIDUAL_SURFACES_SUFFIX: &str = "_individual_modelling_surfaces";

/// Suffix of the post-processed mesh output.
pub const POST_PROCESSED_SUFFIX: &str = "_post_processed";

/// Extensions stripped from the network name given on the command line.
pub const STRIPPED_EXTENSIONS: [&str; 3] = [".swc", ".obj", ".amv"];

/// Extension that is tolerated but kept as part of the network name.
pub const KEPT_EXTENSION: &str = ".CNG";

// =============================================================================
// ERRORS
// =============================================================================

/// Error returned when invalid configuration values are provided.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A numeric parameter lies outside its admissible range.
    OutOfRange {
        /// Parameter name as exposed on the command line.
        name: &'static str,
        /// Offending value, formatted.
        value: String,
        /// Human readable admissible range.
        expected: &'static str,
    },
    /// HC smoothing requires `beta > alpha`.
    HcBetaNotGreaterThanAlpha {
        /// Supplied alpha.
        alpha: f64,
        /// Supplied beta.
        beta: f64,
    },
    /// Unknown partition or parametrization strategy name.
    UnknownStrategy(String),
    /// Network name with an unsupported extension, or empty.
    InvalidNetworkName(String),
    /// Two settings that exclude each other were requested together.
    Conflict(&'static str),
}

impl ConfigError {
    /// Creates an out-of-range error.
    ///
    /// # Examples
    /// ```
    /// use config::constants::ConfigError;
    /// let err = ConfigError::out_of_range("ana-nthreads", 0, ">= 1");
    /// assert!(err.to_string().contains("ana-nthreads"));
    /// ```
    pub fn out_of_range(name: &'static str, value: impl fmt::Display, expected: &'static str) -> Self {
        Self::OutOfRange {
            name,
            value: value.to_string(),
            expected,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::OutOfRange {
                name,
                value,
                expected,
            } => write!(f, "parameter \"{name}\" = {value} out of range, expected {expected}"),
            ConfigError::HcBetaNotGreaterThanAlpha { alpha, beta } => write!(
                f,
                "HC smoothing beta ({beta:.4}) must be greater than alpha ({alpha:.4})"
            ),
            ConfigError::UnknownStrategy(name) => write!(f, "unknown strategy \"{name}\""),
            ConfigError::InvalidNetworkName(name) => write!(f, "input file name invalid: \"{name}\""),
            ConfigError::Conflict(message) => write!(f, "conflicting settings: {message}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests;
