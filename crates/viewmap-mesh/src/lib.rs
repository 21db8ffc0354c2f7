#![warn(missing_docs)]

//! Triangle meshes for the viewmap pipeline.
//!
//! # Architecture
//!
//! - [`HalfEdgeMesh`] - Arena-backed half-edge connectivity with boundary loops
//! - [`Bvh`] - Triangle bounding volume hierarchy for ray casts and
//!   mesh-versus-mesh overlap queries
//! - [`Ray`] / [`RayHit`] - Rays and their triangle hits
//! - [`tri_tri`] - Exact triangle-triangle intersection
//! - [`primitives`] - Boxes and planes for tests
//!
//! # Example
//!
//! ```
//! use viewmap_math::{Point3, Vec3};
//! use viewmap_mesh::{primitives::make_cube, Bvh, Ray};
//!
//! let mesh = make_cube(10.0).unwrap();
//! let bvh = Bvh::build(&mesh);
//! let hits = bvh.trace(&Ray::new(Point3::new(1.0, 2.0, -20.0), Vec3::z()));
//! assert_eq!(hits.len(), 2);
//! assert!(hits[0].front_facing && !hits[1].front_facing);
//! ```

pub mod bbox;
pub mod bvh;
mod error;
pub mod halfedge;
pub mod primitives;
mod ray;
pub mod tri_tri;

pub use bbox::Aabb3;
pub use bvh::Bvh;
pub use error::{MeshError, Result};
pub use halfedge::{Face, FaceId, HalfEdge, HalfEdgeId, HalfEdgeMesh, Vertex, VertexId};
pub use ray::{Ray, RayHit};
pub use tri_tri::{intersect_triangles, TriTriIntersection};
