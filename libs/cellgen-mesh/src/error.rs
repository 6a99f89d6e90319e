//! # Mesh Errors
//!
//! Error types for tessellation and mesh I/O.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while building, reading or writing meshes.
#[derive(Debug, Error)]
pub enum MeshError {
    /// File could not be opened, read or written.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Malformed OBJ content.
    #[error("OBJ parse error at line {line}: {message}")]
    Parse {
        /// One-based line number.
        line: usize,
        /// Description of the problem.
        message: String,
    },

    /// Tessellation input that cannot produce a surface.
    #[error("degenerate geometry: {message}")]
    DegenerateGeometry {
        /// Description of the problem.
        message: String,
    },

    /// Invalid primitive passed down from the geometry layer.
    #[error(transparent)]
    Geometry(#[from] cellgen_geometry::GeometryError),
}

impl MeshError {
    /// Creates an I/O error for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a parse error.
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }

    /// Creates a degenerate geometry error.
    pub fn degenerate(message: impl Into<String>) -> Self {
        Self::DegenerateGeometry {
            message: message.into(),
        }
    }
}

/// Result type for mesh operations.
pub type MeshResult<T> = Result<T, MeshError>;
