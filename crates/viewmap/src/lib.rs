#![warn(missing_docs)]

//! Line drawings of triangle-mesh scenes.
//!
//! A [`Viewmap`] holds a [`Scene`] and a [`Camera`] and derives from them the
//! contours a line renderer draws: silhouettes, open-mesh boundaries, creases,
//! material borders and the curves where meshes pass through each other. The
//! contours are cut at singular vertices into [`Chain`]s, resolved as visible
//! or hidden, and the visible ones are arranged into filled [`Polygon`]s.
//!
//! # Architecture
//!
//! - [`classify`] - Edge natures from facing and dihedral angles
//! - [`intersect`] - Mesh-mesh intersection contours
//! - [`singular`] - 3D and image-space singular vertices
//! - [`chain`] - Maximal same-nature polylines
//! - [`visibility`] - Raycast visibility per chain
//! - [`polygons`] - Planar arrangement of visible chains and mesh attribution
//! - [`BuildPipeline`] - The stages above as a cancellable state machine
//!
//! # Example
//!
//! ```
//! use viewmap::{Camera, Scene, SceneMesh, Viewmap, ViewmapOptions};
//! use viewmap_math::{Point3, Transform};
//! use viewmap_mesh::primitives::make_cube;
//!
//! let mut scene = Scene::new();
//! scene.add_mesh(SceneMesh::new("cube", make_cube(1.0).unwrap(), Transform::identity()).unwrap());
//! let camera = Camera::look_at(Point3::new(10.0, 10.0, 10.0), Point3::origin(), 800.0, 600.0);
//!
//! let mut viewmap = Viewmap::new(scene, camera);
//! let report = viewmap.build(&ViewmapOptions::default()).unwrap();
//! assert_eq!(viewmap.visible_chains().count(), report.diagnostics.chains_visible);
//! ```

pub mod camera;
pub mod chain;
pub mod classify;
pub mod diagnostics;
mod error;
pub mod intersect;
pub mod options;
pub mod pipeline;
pub mod polygons;
mod registry;
pub mod scene;
pub mod singular;
pub mod types;
mod viewmap;
pub mod visibility;

pub use camera::Camera;
pub use diagnostics::{BuildReport, Diagnostics, StageTiming};
pub use error::{Result, ViewmapError};
pub use options::{Color, CreaseAngle, ViewmapOptions};
pub use pipeline::{BuildPipeline, CancelToken, Stage};
pub use scene::{DoubleSidedGuard, Material, MeshId, Scene, SceneMesh, Side};
pub use types::{
    Chain, ChainVisibility, EdgeNature, FaceRef, Polygon, VertexSingularity, ViewEdge,
    ViewEdgeId, ViewVertex, ViewVertexId,
};
pub use viewmap::{Split, Viewmap};
