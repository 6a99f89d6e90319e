//! # Cellgen Geometry
//!
//! Geometry primitives used to model neurite tubes and somata.
//!
//! ## Architecture
//!
//! ```text
//! Vec3 → BoundingBox → BezierCurve → CanalSurface
//!                    ↘ Bernstein1/2 → clipping solvers → contact predicates
//! ```
//!
//! Canal surfaces are tubes swept along a cubic (or linear) Bézier spine
//! with a linearly interpolated radius. All contact predicates reduce to
//! minimising Bernstein polynomials over the unit interval or unit square,
//! which is done with Bézier clipping.
//!
//! ## Usage
//!
//! ```rust
//! use cellgen_geometry::{CanalSurface, Vec3};
//!
//! let tube = CanalSurface::linear(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), 1.0, 2.0).unwrap();
//! assert!((tube.radius(0.5) - 1.5).abs() < 1e-12);
//! assert!(tube.contains(Vec3::new(5.0, 1.0, 0.0), 1.0));
//! ```

pub mod bbox;
pub mod bernstein;
pub mod bezier;
pub mod canal;
pub mod clipping;
pub mod contact;
pub mod error;
pub mod vec3;

pub use bbox::BoundingBox;
pub use bernstein::{Bernstein1, Bernstein2};
pub use bezier::BezierCurve;
pub use canal::CanalSurface;
pub use error::{GeometryError, SolverError};
pub use vec3::Vec3;
