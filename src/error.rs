//! Error types for unfold.
//!
//! This module defines all error types used throughout the library.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors that can occur during mesh and unwrapping operations.
#[derive(Error, Debug)]
pub enum MeshError {
    /// The mesh has no faces.
    #[error("mesh has no faces")]
    EmptyMesh,

    /// A face references an invalid vertex index.
    #[error("face {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The face index.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// An island references too few distinct vertices to be flattened.
    #[error("island has {vertices} distinct vertices, at least 3 are required")]
    IslandTooSmall {
        /// Number of distinct vertices in the island.
        vertices: usize,
    },

    /// Every triangle of an island was skipped as degenerate.
    #[error("all {faces} triangles of the island are degenerate")]
    NoValidTriangles {
        /// Number of triangles in the island.
        faces: usize,
    },

    /// The constrained LSCM system has a free unknown with no energy terms.
    #[error("linear system is singular: unknown {column} is unconstrained")]
    SingularSystem {
        /// Column of the unconstrained unknown.
        column: usize,
    },

    /// Sparse factorization of the system matrix failed.
    #[error("sparse factorization failed: {0}")]
    FactorizationFailed(String),

    /// The solver produced NaN or infinite values.
    #[error("linear solve produced non-finite values")]
    NonFiniteSolution,

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error loading mesh from file.
    #[error("failed to load mesh from {path}: {message}")]
    LoadError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Error saving mesh to file.
    #[error("failed to save mesh to {path}: {message}")]
    SaveError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Unsupported file format.
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat {
        /// The file extension.
        extension: String,
    },

    /// Invalid mesh state for the requested operation.
    #[error("invalid mesh state: {0}")]
    InvalidState(String),

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl MeshError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        MeshError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }

    /// Whether this error is local to a single island.
    ///
    /// The unwrap pipeline records these and moves on to the next island.
    pub fn is_island_failure(&self) -> bool {
        matches!(
            self,
            MeshError::IslandTooSmall { .. }
                | MeshError::NoValidTriangles { .. }
                | MeshError::SingularSystem { .. }
                | MeshError::FactorizationFailed(_)
                | MeshError::NonFiniteSolution
        )
    }
}
