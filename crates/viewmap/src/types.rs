//! Viewmap entities: vertices, edges, chains and polygons.

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use viewmap_math::{Point2, Point3};
use viewmap_mesh::{FaceId, HalfEdgeId, VertexId};

use crate::options::Color;
use crate::scene::MeshId;

new_key_type! {
    /// Handle to a [`ViewVertex`].
    pub struct ViewVertexId;
    /// Handle to a [`ViewEdge`].
    pub struct ViewEdgeId;
}

/// Visual role of a [`ViewEdge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EdgeNature {
    /// Separates a front-facing face from a back-facing one.
    Silhouette,
    /// Lies on the border of an open mesh.
    Boundary,
    /// Where two meshes pass through each other.
    MeshIntersection,
    /// Sharp fold between two faces with the same facing.
    Crease,
    /// Border between two material groups.
    Material,
}

impl EdgeNature {
    /// Whether edges of this nature can hide or reveal other contours.
    pub fn is_visibility_indicating(self) -> bool {
        matches!(
            self,
            EdgeNature::Silhouette | EdgeNature::Boundary | EdgeNature::MeshIntersection
        )
    }
}

/// Topological role of a [`ViewVertex`].
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum VertexSingularity {
    /// Ordinary point along a contour.
    #[default]
    None,
    /// Three or more silhouette or boundary edges meet.
    Bifurcation,
    /// Edges of different natures meet.
    MeshIntersection,
    /// The contour folds behind the surface.
    CurtainFold,
    /// Two contours cross in the image.
    ImageIntersection,
}

impl VertexSingularity {
    /// Whether chains must stop at this vertex.
    pub fn is_singular(self) -> bool {
        self != VertexSingularity::None
    }
}

/// Visibility of a [`Chain`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChainVisibility {
    /// Not resolved yet.
    #[default]
    Unknown,
    /// Occluded by some surface.
    Hidden,
    /// Seen by the camera.
    Visible,
}

/// A triangle of a specific scene mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FaceRef {
    /// Owning mesh.
    pub mesh: MeshId,
    /// Triangle within the mesh.
    pub face: FaceId,
}

/// A deduplicated 3D point with its image-space projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewVertex {
    /// World position.
    pub pos3: Point3,
    /// Projected position in pixels.
    pub pos2: Point2,
    /// Spatial hash bucket of `pos3`.
    pub hash3: (i64, i64, i64),
    /// Spatial hash bucket of `pos2`.
    pub hash2: (i64, i64),
    /// Singularity classification.
    pub singularity: VertexSingularity,
    /// Incident edges, in insertion order.
    pub edges: Vec<ViewEdgeId>,
    /// Whether a visible chain passes through this vertex.
    pub visible: bool,
    /// Mesh vertices that landed on this point.
    pub mesh_vertices: Vec<(MeshId, VertexId)>,
}

/// An oriented segment between two view vertices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewEdge {
    /// Start vertex.
    pub a: ViewVertexId,
    /// End vertex.
    pub b: ViewVertexId,
    /// Visual role.
    pub nature: EdgeNature,
    /// Angle between the two face normals in degrees (two-face edges only).
    pub face_angle: f64,
    /// Both adjacent faces are back-facing.
    pub is_back: bool,
    /// The surface folds towards the front side of the first face.
    pub is_concave: bool,
    /// Owning meshes (one, or two for mesh intersections).
    pub meshes: Vec<MeshId>,
    /// Adjacent faces (0 to 2).
    pub faces: Vec<FaceRef>,
    /// Originating half-edge, if any.
    pub halfedge: Option<(MeshId, HalfEdgeId)>,
}

impl ViewEdge {
    /// Edge with the given endpoints and nature and no faces.
    pub fn new(a: ViewVertexId, b: ViewVertexId, nature: EdgeNature) -> Self {
        Self {
            a,
            b,
            nature,
            face_angle: 0.0,
            is_back: false,
            is_concave: false,
            meshes: Vec::new(),
            faces: Vec::new(),
            halfedge: None,
        }
    }

    /// Whether `v` is one of the endpoints.
    pub fn has_vertex(&self, v: ViewVertexId) -> bool {
        self.a == v || self.b == v
    }

    /// The endpoint opposite `v`.
    pub fn other(&self, v: ViewVertexId) -> Option<ViewVertexId> {
        if self.a == v {
            Some(self.b)
        } else if self.b == v {
            Some(self.a)
        } else {
            None
        }
    }
}

/// A polyline of connected edges with one nature and one owning mesh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chain {
    /// Vertex sequence (one more than `edges`).
    pub vertices: Vec<ViewVertexId>,
    /// Edge sequence.
    pub edges: Vec<ViewEdgeId>,
    /// Nature shared by every edge.
    pub nature: EdgeNature,
    /// Owning mesh, the first mesh of the seed edge.
    pub mesh: Option<MeshId>,
    /// Visibility, set by the visibility pass.
    pub visibility: ChainVisibility,
    /// Point the visibility ray was cast from.
    pub sample: Option<Point3>,
}

impl Chain {
    /// Number of edges.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Whether the chain has no edges.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Whether the chain starts and ends at the same vertex.
    pub fn is_closed(&self) -> bool {
        self.vertices.len() > 2 && self.vertices.first() == self.vertices.last()
    }
}

/// A filled image region bounded by visible contours.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Polygon {
    /// Outer contour in pixels, counter-clockwise.
    pub outer: Vec<Point2>,
    /// Hole contours in pixels.
    pub holes: Vec<Vec<Point2>>,
    /// A point strictly inside the region.
    pub interior: Point2,
    /// Signed area in pixels².
    pub area: f64,
    /// Mesh seen through the interior point.
    pub mesh: Option<MeshId>,
    /// Fill color.
    pub color: Color,
}
