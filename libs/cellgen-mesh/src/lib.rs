//! # Cellgen Mesh
//!
//! Triangle meshes built from canal surfaces and soma spheres.
//!
//! ## Architecture
//!
//! ```text
//! icosphere / tube tessellation → Mesh (annotated) → merge (Red-Blue)
//!                                                   → obj (stream / read)
//!                                                   → postprocess (GEC, HC)
//! ```
//!
//! ## Algorithms
//!
//! - **Soma**: refined icosahedron projected onto the sphere
//! - **Canal surfaces**: rings on parallel transport frames with end caps
//! - **Merging**: complex edge splitting, face classification, hole loop
//!   pairing and zipper stitching
//! - **Post-processing**: greedy edge collapse and HC Laplacian smoothing
//!
//! ## Usage
//!
//! ```rust
//! use cellgen_mesh::icosphere::icosphere;
//! use cellgen_geometry::Vec3;
//!
//! let mesh = icosphere(Vec3::ZERO, 2.0, 1, 0.0, 0);
//! assert!(mesh.is_closed_manifold());
//! assert_eq!(mesh.euler_characteristic(), 2);
//! ```

pub mod error;
pub mod icosphere;
pub mod intersect;
pub mod merge;
pub mod mesh;
pub mod obj;
pub mod postprocess;
pub mod spatial;
pub mod tube;

pub use error::{MeshError, MeshResult};
pub use mesh::{FaceTag, Mesh, VertexTag};
