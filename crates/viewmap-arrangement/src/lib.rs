#![warn(missing_docs)]

//! Planar arrangements for the viewmap pipeline.
//!
//! Turns a soup of 2D segments (projected contour strokes) into the bounded
//! faces they enclose, each an outer contour plus holes.
//!
//! # Architecture
//!
//! - [`sweep`] - x-sorted sweep finding all intersecting segment pairs
//! - [`PlanarGraph`] - Split/snap/prune the segments and trace faces
//! - [`Region`] - Outer contour with holes, area and interior point queries
//! - [`Arrangement`] - The service interface consumed by the pipeline
//!
//! # Example
//!
//! ```
//! use viewmap_arrangement::{Arrangement, PlanarArrangement, Segment2};
//! use viewmap_math::Point2;
//!
//! let corners = [(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)];
//! let segments: Vec<Segment2> = (0..4)
//!     .map(|i| {
//!         let (ax, ay) = corners[i];
//!         let (bx, by) = corners[(i + 1) % 4];
//!         Segment2::new(Point2::new(ax, ay), Point2::new(bx, by))
//!     })
//!     .collect();
//!
//! let regions = PlanarArrangement::default().arrange(&segments);
//! assert_eq!(regions.len(), 1);
//! assert!((regions[0].signed_area() - 16.0).abs() < 1e-9);
//! let p = regions[0].interior_point().unwrap();
//! assert!(regions[0].contains(&p));
//! ```

mod error;
pub mod graph;
pub mod region;
pub mod sweep;

pub use error::{ArrangementError, Result};
pub use graph::PlanarGraph;
pub use region::{contour_area, distance_to_contour, point_in_contour, Region, IMAGE_EPSILON};
pub use sweep::{find_intersections, intersect_segments, Segment2, SegmentIntersection, SweepHit};

/// Default snapping distance between arrangement vertices, in pixels.
pub const DEFAULT_SNAP: f64 = 1e-6;

/// Computes the faces enclosed by a set of segments.
pub trait Arrangement {
    /// Bounded regions formed by `segments`.
    fn arrange(&self, segments: &[Segment2]) -> Vec<Region>;
}

/// Arrangement built from an exact planar graph.
#[derive(Debug, Clone, Copy)]
pub struct PlanarArrangement {
    /// Endpoints and intersections closer than this are merged.
    pub snap: f64,
}

impl Default for PlanarArrangement {
    fn default() -> Self {
        Self { snap: DEFAULT_SNAP }
    }
}

impl Arrangement for PlanarArrangement {
    fn arrange(&self, segments: &[Segment2]) -> Vec<Region> {
        PlanarGraph::build(segments, self.snap).regions()
    }
}
