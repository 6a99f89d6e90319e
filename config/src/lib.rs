//! # Config Crate
//!
//! Centralized configuration for the cellgen pipeline. Every tunable
//! parameter of the geometric analysis, the inductive meshing and the mesh
//! post-processing is declared here, together with the bounds that are
//! enforced before any geometry work starts.
//!
//! ## Usage
//!
//! ```rust
//! use config::settings::CellgenConfig;
//!
//! let cfg = CellgenConfig::default();
//! assert!(cfg.validate().is_ok());
//! assert_eq!(cfg.analysis.nthreads, 1);
//! ```
//!
//! ## Layout
//!
//! - [`constants`]: defaults, bounds and numeric tolerances
//! - [`settings`]: typed settings records and their validation

pub mod constants;
pub mod settings;

pub use constants::ConfigError;
pub use settings::CellgenConfig;
