//! Error types for distance field generation.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for distance field operations.
pub type FieldResult<T> = Result<T, FieldError>;

/// Errors that can occur while generating, persisting or loading a field.
///
/// Every variant is fatal for the run that raised it. Sampling and
/// decoding themselves never fail once their inputs are validated.
#[derive(Debug, Error)]
pub enum FieldError {
    /// Mesh is empty or geometrically degenerate.
    #[error("invalid mesh: {reason}")]
    InvalidMesh {
        /// What was wrong with the mesh.
        reason: String,
    },

    /// Generation takes exactly one mesh.
    #[error("expected exactly one mesh, found {count}")]
    UnsupportedMeshCount {
        /// Number of meshes supplied.
        count: usize,
    },

    /// A field file could not be opened, read or written.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File involved in the failed operation.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A parameter is out of range.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Which parameter was rejected and why.
        reason: String,
    },

    /// Byte payload does not match the declared resolution.
    #[error("field size mismatch: expected {expected} bytes, got {got}")]
    FieldSizeMismatch {
        /// `N³` for the declared resolution.
        expected: usize,
        /// Actual payload length.
        got: usize,
    },
}

impl FieldError {
    /// Create an invalid mesh error.
    #[must_use]
    pub fn invalid_mesh(reason: impl Into<String>) -> Self {
        Self::InvalidMesh {
            reason: reason.into(),
        }
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Wrap an I/O error with the path it occurred on.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
