//! Error types for mesh preparation.

use thiserror::Error;

/// Errors that can occur while building a half-edge mesh.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    /// Mesh has no triangles.
    #[error("mesh has no faces")]
    EmptyMesh,

    /// A triangle references a vertex that does not exist.
    #[error("face {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// Triangle index.
        face: usize,
        /// Offending vertex index.
        vertex: u32,
    },

    /// A triangle repeats a vertex.
    #[error("face {face} is degenerate (has duplicate vertices)")]
    DegenerateFace {
        /// Triangle index.
        face: usize,
    },

    /// The same directed edge is used by two triangles.
    #[error("edge ({v0}, {v1}) is used by more than one face with the same orientation")]
    NonManifoldEdge {
        /// First vertex index.
        v0: u32,
        /// Second vertex index.
        v1: u32,
    },

    /// A vertex touches more than one boundary loop.
    #[error("vertex {vertex} lies on more than one boundary fan")]
    NonManifoldVertex {
        /// Vertex index.
        vertex: u32,
    },

    /// Material group list does not match the triangle count.
    #[error("expected {expected} material groups, got {actual}")]
    MaterialCount {
        /// Number of triangles.
        expected: usize,
        /// Number of material entries supplied.
        actual: usize,
    },
}

/// Result type for mesh operations.
pub type Result<T> = std::result::Result<T, MeshError>;
