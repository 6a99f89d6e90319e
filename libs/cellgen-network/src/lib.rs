//! # Cellgen Network
//!
//! Neuron skeleton networks and the pipeline that turns them into a single
//! watertight surface mesh.
//!
//! ## Architecture
//!
//! ```text
//! swc → graph → precondition → partition → parametrize
//!     → analysis (worker pool) → meshing (Red-Blue, flushing)
//!     → pipeline::run (post-processing, reports)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use cellgen_network::swc::parse_swc;
//! use cellgen_network::partition::partition;
//! use cellgen_network::parametrize::parametrize_paths;
//! use cellgen_network::analysis::analyze;
//! use config::settings::{AnalysisSettings, ParametrizationStrategy, PartitionStrategy};
//!
//! let mut graph = parse_swc("1 1 0 0 0 5 -1\n2 3 4.5 0 0 1 1\n3 3 15 0 0 1 2\n").unwrap();
//! let mut paths = partition(&mut graph, &PartitionStrategy::default()).unwrap();
//! parametrize_paths(&mut graph, &mut paths, ParametrizationStrategy::ChordLength).unwrap();
//! let report = analyze(&mut graph, &paths, &AnalysisSettings::default()).unwrap();
//! assert!(report.clean);
//! ```

pub mod analysis;
pub mod error;
pub mod graph;
pub mod meshing;
pub mod parametrize;
pub mod partition;
pub mod path;
pub mod pipeline;
pub mod precondition;
pub mod swc;

pub use error::{CellgenError, CellgenResult, GraphError, GraphResult};
pub use graph::{EdgeId, SkeletonGraph, VertexId, VertexKind};
pub use path::{NeuritePath, Partition, PathId};
pub use pipeline::{run, MeshingOutcome, RunReport};
