//! Error types for viewmap builds.

use thiserror::Error;
use viewmap_mesh::MeshError;

use crate::pipeline::Stage;

/// Errors that abort a viewmap build.
///
/// Geometric trouble during a build (unsplittable crossings, raycasts without
/// a material, regions without an interior point) is never an error: it is
/// counted in [`crate::Diagnostics`] and the offending item is skipped.
#[derive(Error, Debug)]
pub enum ViewmapError {
    /// The scene has no meshes, or no mesh has any faces.
    #[error("scene has no faces")]
    EmptyScene,

    /// Invalid build options.
    #[error("invalid options: {0}")]
    InvalidOptions(String),

    /// Camera cannot project the scene.
    #[error("invalid camera: {0}")]
    InvalidCamera(String),

    /// A mesh transform cannot be inverted.
    #[error("mesh {mesh} has a singular transform")]
    SingularTransform {
        /// Mesh name.
        mesh: String,
    },

    /// The build was cancelled before `stage` started.
    #[error("build cancelled before stage {stage:?}")]
    Cancelled {
        /// First stage that did not run.
        stage: Stage,
    },

    /// Mesh construction failed.
    #[error(transparent)]
    Mesh(#[from] MeshError),

    /// Options could not be parsed.
    #[error("failed to parse options: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result type for viewmap operations.
pub type Result<T> = std::result::Result<T, ViewmapError>;
