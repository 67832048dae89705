//! Error types for edgefold.
//!
//! Every fallible operation in the crate returns [`Result`], whose error side
//! is [`MeshError`]. Variants fall into four families: I/O failures, malformed
//! or non-manifold input, topology corruption detected while editing a mesh,
//! and invalid values produced by simplification policies.

use thiserror::Error;

/// Result type alias using [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors that can occur during mesh operations.
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

    /// A face has fewer than three vertices or repeats a vertex.
    #[error("face {face} is degenerate (fewer than 3 distinct vertices)")]
    DegenerateFace {
        /// The face index.
        face: usize,
    },

    /// An edge has more than two incident faces, or two faces traverse it in
    /// the same direction.
    #[error("edge ({v0}, {v1}) has more than two incident faces or inconsistent orientation")]
    NonManifoldEdge {
        /// First vertex of the edge.
        v0: usize,
        /// Second vertex of the edge.
        v1: usize,
    },

    /// A vertex whose incident faces do not form a single fan.
    #[error("vertex {vertex} is non-manifold: {details}")]
    NonManifoldVertex {
        /// The vertex index.
        vertex: usize,
        /// Description of the non-manifold condition.
        details: String,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file contents do not match the declared format.
    #[error("malformed mesh data at line {line}: {message}")]
    Malformed {
        /// 1-based line number where the problem was detected.
        line: usize,
        /// Error message.
        message: String,
    },

    /// Unsupported file format.
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat {
        /// The file extension.
        extension: String,
    },

    /// A half-edge structure references a removed or dangling element.
    #[error("topology corrupted: {details}")]
    Topology {
        /// Description of the inconsistency.
        details: String,
    },

    /// A cost or placement policy produced a value the engine cannot use.
    #[error("policy {policy} produced invalid value {value}")]
    InvalidPolicyValue {
        /// Name of the offending policy.
        policy: &'static str,
        /// The rejected value (as string).
        value: String,
    },

    /// The operation requires a pure triangle mesh.
    #[error("operation requires a triangle mesh, face {face} has {degree} sides")]
    NotTriangleMesh {
        /// First offending face.
        face: usize,
        /// Number of sides of that face.
        degree: usize,
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

    /// Create a topology error.
    pub fn topology(details: impl Into<String>) -> Self {
        MeshError::Topology {
            details: details.into(),
        }
    }

    pub(crate) fn malformed(line: usize, message: impl Into<String>) -> Self {
        MeshError::Malformed {
            line,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = MeshError::malformed(7, "expected 3 coordinates");
        assert_eq!(
            err.to_string(),
            "malformed mesh data at line 7: expected 3 coordinates"
        );

        let err = MeshError::invalid_param("ratio", 1.5, "must be in [0, 1]");
        assert_eq!(
            err.to_string(),
            "invalid parameter: ratio = 1.5 (must be in [0, 1])"
        );
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: MeshError = io.into();
        assert!(matches!(err, MeshError::Io(_)));
    }
}
