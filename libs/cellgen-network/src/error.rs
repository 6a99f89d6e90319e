//! # Network Errors
//!
//! One error enum per stage plus [`CellgenError`], which aggregates them for
//! the top-level run.

use std::path::PathBuf;

use cellgen_mesh::merge::MergeError;
use cellgen_mesh::MeshError;
use config::ConfigError;
use thiserror::Error;

use crate::graph::{EdgeId, VertexId};
use crate::path::PathId;

/// Inconsistent skeleton graph. Always fatal.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    /// Vertex id that is out of range or was removed.
    #[error("unknown vertex {0}")]
    UnknownVertex(VertexId),

    /// Edge id that is out of range or was removed.
    #[error("unknown edge {0}")]
    UnknownEdge(EdgeId),

    /// Edge from a vertex to itself.
    #[error("vertex {0} is its own parent")]
    SelfLoop(VertexId),

    /// Second parent edge for a vertex.
    #[error("vertex {0} has more than one parent")]
    MultipleParents(VertexId),

    /// Parent edge ending in a soma.
    #[error("soma {0} cannot have a parent")]
    SomaWithParent(VertexId),

    /// Neurite vertex without a parent edge.
    #[error("neurite vertex {0} has no parent")]
    MissingParent(VertexId),

    /// Neurite vertex that no soma reaches (orphan subtree or cycle).
    #[error("neurite vertex {0} is not reachable from any soma")]
    Unreachable(VertexId),

    /// Radius that is not strictly positive and finite.
    #[error("vertex {vertex} has invalid radius {radius}")]
    InvalidRadius {
        /// Offending vertex.
        vertex: VertexId,
        /// Its radius.
        radius: f64,
    },

    /// Edge kind that does not match its end points.
    #[error("edge {0} connects vertices of the wrong kind")]
    KindMismatch(EdgeId),

    /// Operation only defined on interior neurite vertices.
    #[error("vertex {0} is not an interior neurite vertex")]
    NotInterior(VertexId),

    /// Network without a single soma.
    #[error("network has no soma")]
    NoSoma,
}

/// Result type of graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// Failure to read an SWC file.
#[derive(Debug, Error)]
pub enum SwcError {
    /// File could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// Input path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// Malformed sample line.
    #[error("line {line}: {message}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// Description.
        message: String,
    },

    /// Samples that do not form a valid network.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl SwcError {
    /// Creates a parse error.
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}

/// Failure to parametrize a neurite path.
///
/// Degenerate paths are not errors; they are marked and reported as
/// anomalies.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParametrizeError {
    /// Path refers to vertices or edges the graph does not have.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Failure to set up the analysis.
///
/// Solver problems are not errors; they are recorded as anomalies.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Worker pool could not be started.
    #[error("cannot build analysis thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Path analysed before it was parametrized.
    #[error("path {0} has no geometry")]
    MissingGeometry(PathId),
}

/// Per-network meshing failure.
#[derive(Debug, Error)]
pub enum MeshingError {
    /// An element could not be merged before the radius factor hit the floor.
    #[error("element {element} could not be merged after {attempts} attempts (last factor {last_factor:.3}): {source}")]
    OuterLoopExhausted {
        /// Element id.
        element: u32,
        /// Attempts made.
        attempts: u32,
        /// Radius factor of the last attempt.
        last_factor: f64,
        /// Failure of the last attempt.
        source: MergeError,
    },

    /// Path meshed before it was parametrized.
    #[error("path {0} has no geometry")]
    MissingGeometry(PathId),

    /// Element refers to a vertex the graph does not have.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Tessellation or output failure.
    #[error(transparent)]
    Mesh(#[from] MeshError),
}

/// Any error escaping a run.
#[derive(Debug, Error)]
pub enum CellgenError {
    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Unreadable input.
    #[error(transparent)]
    Swc(#[from] SwcError),

    /// Inconsistent network.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Path refers to a missing vertex or edge.
    #[error(transparent)]
    Parametrize(#[from] ParametrizeError),

    /// Analysis setup failure.
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

/// Result type of a run.
pub type CellgenResult<T> = Result<T, CellgenError>;
