//! Error types for arrangement queries.

use thiserror::Error;

/// Errors that can occur when querying an arrangement region.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArrangementError {
    /// No scanline produced a point strictly inside the region.
    #[error("no interior point found for region of area {area}")]
    NoInteriorPoint {
        /// Signed area of the region.
        area: f64,
    },

    /// The region's outer contour has fewer than three vertices.
    #[error("degenerate contour with {vertices} vertices")]
    DegenerateContour {
        /// Number of vertices in the contour.
        vertices: usize,
    },
}

/// Result type for arrangement operations.
pub type Result<T> = std::result::Result<T, ArrangementError>;
