//! Error types for mantle.
//!
//! This module defines all error types used throughout the library.

use thiserror::Error;

/// Result type alias using [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors that can occur during mesh operations.
#[derive(Error, Debug)]
pub enum MeshError {
    /// The mesh has no vertices to operate on.
    #[error("mesh has no vertices")]
    EmptyMesh,

    /// A face references a vertex index outside the point array.
    #[error("malformed topology: face {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The face index.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// A vertex id passed to an operation is out of range.
    #[error("vertex {vertex} is out of range for a mesh with {count} vertices")]
    VertexOutOfRange {
        /// The offending vertex id.
        vertex: usize,
        /// Number of vertices in the mesh.
        count: usize,
    },

    /// A per-vertex array does not match the mesh it is used with.
    #[error("{what} has length {actual}, expected {expected}")]
    LengthMismatch {
        /// What was being checked.
        what: &'static str,
        /// The expected length.
        expected: usize,
        /// The length that was supplied.
        actual: usize,
    },

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

    /// A sparse system could not be factorized.
    #[error("failed to factorize the {system} system (matrix is not positive definite)")]
    Factorization {
        /// Which system failed.
        system: &'static str,
    },

    /// An edge loop could not be closed.
    #[error("edge loop is open at vertex {vertex}")]
    OpenLoop {
        /// The vertex where tracing got stuck.
        vertex: usize,
    },

    /// The requested operation is not implemented.
    #[error("operation not implemented: {0}")]
    Unimplemented(&'static str),
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

    /// Create a length mismatch error.
    pub(crate) fn length_mismatch(what: &'static str, expected: usize, actual: usize) -> Self {
        MeshError::LengthMismatch {
            what,
            expected,
            actual,
        }
    }
}
