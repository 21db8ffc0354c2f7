//! The viewmap aggregate and its edge split primitives.

use std::collections::HashMap;

use slotmap::SlotMap;
use viewmap_math::{Point2, Point3, Tolerance};
use viewmap_mesh::VertexId;

use crate::camera::Camera;
use crate::diagnostics::BuildReport;
use crate::error::Result;
use crate::options::ViewmapOptions;
use crate::pipeline::BuildPipeline;
use crate::registry::{hash2, hash3, VertexRegistry};
use crate::scene::{MeshId, Scene};
use crate::types::{
    Chain, ChainVisibility, EdgeNature, FaceRef, Polygon, ViewEdge, ViewEdgeId, ViewVertex,
    ViewVertexId,
};

/// Outcome of splitting an edge at a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    /// The position is already a vertex of the edge; nothing changed.
    Existing(ViewVertexId),
    /// The edge now ends at `vertex`; `edge` continues to the old end.
    Created {
        /// Vertex at the split position.
        vertex: ViewVertexId,
        /// New second half of the edge.
        edge: ViewEdgeId,
    },
}

/// Position of a pixel on an edge's projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Locate2d {
    /// Within merge distance of an endpoint.
    End(ViewVertexId),
    /// Strictly between the ends, as a fraction from `a` to `b`.
    Inside(f64),
}

impl Split {
    /// The vertex at the split position.
    pub fn vertex(&self) -> ViewVertexId {
        match *self {
            Split::Existing(v) => v,
            Split::Created { vertex, .. } => vertex,
        }
    }
}

/// Line drawing of a scene seen from a camera.
///
/// Owns the scene, the camera and every view vertex, edge, chain and polygon
/// derived from them. [`Viewmap::build`] clears the derived state and
/// recomputes it.
#[derive(Debug, Clone)]
pub struct Viewmap {
    pub(crate) scene: Scene,
    pub(crate) camera: Camera,
    pub(crate) vertices: SlotMap<ViewVertexId, ViewVertex>,
    pub(crate) edges: SlotMap<ViewEdgeId, ViewEdge>,
    pub(crate) chains: Vec<Chain>,
    pub(crate) polygons: Vec<Polygon>,
    pub(crate) face_edges: HashMap<FaceRef, Vec<ViewEdgeId>>,
    pub(crate) registry: VertexRegistry,
    pub(crate) tolerance: Tolerance,
}

impl Viewmap {
    /// Empty viewmap for `scene` seen through `camera`.
    pub fn new(scene: Scene, camera: Camera) -> Self {
        let tolerance = Tolerance::DEFAULT;
        Self {
            scene,
            camera,
            vertices: SlotMap::with_key(),
            edges: SlotMap::with_key(),
            chains: Vec::new(),
            polygons: Vec::new(),
            face_edges: HashMap::new(),
            registry: VertexRegistry::new(tolerance.merge),
            tolerance,
        }
    }

    /// Rebuild the viewmap from scratch.
    pub fn build(&mut self, options: &ViewmapOptions) -> Result<BuildReport> {
        BuildPipeline::new(self, options)?.run()
    }

    /// Drop every derived vertex, edge, chain and polygon.
    pub fn clear(&mut self) {
        // Fresh arenas keep ids stable across rebuilds
        self.vertices = SlotMap::with_key();
        self.edges = SlotMap::with_key();
        self.chains.clear();
        self.polygons.clear();
        self.face_edges.clear();
        self.registry.clear();
    }

    /// The scene.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Mutable scene access, e.g. to move meshes between builds.
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// The camera.
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Replace the camera; takes effect on the next build.
    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    /// All view vertices.
    pub fn vertices(&self) -> &SlotMap<ViewVertexId, ViewVertex> {
        &self.vertices
    }

    /// All view edges.
    pub fn edges(&self) -> &SlotMap<ViewEdgeId, ViewEdge> {
        &self.edges
    }

    /// Chains, after the chaining pass.
    pub fn chains(&self) -> &[Chain] {
        &self.chains
    }

    /// Polygons, after the polygon pass.
    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    /// A vertex by id.
    pub fn vertex(&self, id: ViewVertexId) -> Option<&ViewVertex> {
        self.vertices.get(id)
    }

    /// An edge by id.
    pub fn edge(&self, id: ViewEdgeId) -> Option<&ViewEdge> {
        self.edges.get(id)
    }

    /// Edges registered on a face.
    pub fn face_edges(&self, face: FaceRef) -> &[ViewEdgeId] {
        self.face_edges.get(&face).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Edges of one nature.
    pub fn edges_of_nature(
        &self,
        nature: EdgeNature,
    ) -> impl Iterator<Item = (ViewEdgeId, &ViewEdge)> {
        self.edges.iter().filter(move |(_, e)| e.nature == nature)
    }

    /// Chains resolved as visible.
    pub fn visible_chains(&self) -> impl Iterator<Item = &Chain> {
        self.chains
            .iter()
            .filter(|c| c.visibility == ChainVisibility::Visible)
    }

    /// Chains resolved as hidden.
    pub fn hidden_chains(&self) -> impl Iterator<Item = &Chain> {
        self.chains
            .iter()
            .filter(|c| c.visibility == ChainVisibility::Hidden)
    }

    /// A chain's vertices in pixel coordinates.
    pub fn chain_polyline_2d(&self, chain: &Chain) -> Vec<Point2> {
        chain
            .vertices
            .iter()
            .filter_map(|&v| self.vertices.get(v).map(|v| v.pos2))
            .collect()
    }

    /// A chain's vertices in world coordinates.
    pub fn chain_polyline_3d(&self, chain: &Chain) -> Vec<Point3> {
        chain
            .vertices
            .iter()
            .filter_map(|&v| self.vertices.get(v).map(|v| v.pos3))
            .collect()
    }

    /// The vertex standing for `pos`, created and projected if new.
    pub fn vertex_at(&mut self, pos: Point3) -> ViewVertexId {
        if let Some(id) = self.registry.find(&self.vertices, &pos) {
            return id;
        }
        let cell = self.registry.cell();
        let pos2 = self.camera.project(&pos);
        let id = self.vertices.insert(ViewVertex {
            pos3: pos,
            pos2,
            hash3: hash3(&pos, cell),
            hash2: hash2(&pos2, cell),
            singularity: Default::default(),
            edges: Vec::new(),
            visible: false,
            mesh_vertices: Vec::new(),
        });
        self.registry.insert(&pos, id);
        id
    }

    /// The vertex standing for a mesh vertex at world position `pos`.
    pub(crate) fn vertex_for_mesh_vertex(
        &mut self,
        mesh: MeshId,
        vertex: VertexId,
        pos: Point3,
    ) -> ViewVertexId {
        let id = self.vertex_at(pos);
        let refs = &mut self.vertices[id].mesh_vertices;
        if !refs.contains(&(mesh, vertex)) {
            refs.push((mesh, vertex));
        }
        id
    }

    /// Insert an edge and register it on its endpoints and faces.
    pub fn add_edge(&mut self, edge: ViewEdge) -> ViewEdgeId {
        let (a, b) = (edge.a, edge.b);
        let faces = edge.faces.clone();
        let id = self.edges.insert(edge);
        for v in [a, b] {
            if let Some(vertex) = self.vertices.get_mut(v) {
                vertex.edges.push(id);
            }
        }
        for face in faces {
            self.face_edges.entry(face).or_default().push(id);
        }
        id
    }

    /// An edge of `nature` between `a` and `b`, in either direction.
    pub fn find_edge(
        &self,
        a: ViewVertexId,
        b: ViewVertexId,
        nature: EdgeNature,
    ) -> Option<ViewEdgeId> {
        let vertex = self.vertices.get(a)?;
        vertex.edges.iter().copied().find(|&e| {
            self.edges
                .get(e)
                .is_some_and(|edge| edge.nature == nature && edge.other(a) == Some(b))
        })
    }

    /// Split `edge` at a world position lying on it.
    ///
    /// Returns `None` when `pos` is off the edge's line or outside its span.
    pub fn split_edge_3d(&mut self, edge: ViewEdgeId, pos: Point3) -> Option<Split> {
        let e = self.edges.get(edge)?;
        let (a, b) = (e.a, e.b);
        let pa = self.vertices[a].pos3;
        let pb = self.vertices[b].pos3;
        let tol = self.tolerance;

        if tol.points_equal(&pos, &pa) {
            return Some(Split::Existing(a));
        }
        if tol.points_equal(&pos, &pb) {
            return Some(Split::Existing(b));
        }

        let d = pb - pa;
        let len = d.norm();
        if len < tol.linear {
            return None;
        }
        let w = pos - pa;
        if w.cross(&d).norm() / len > tol.colinear {
            return None;
        }
        let along = w.dot(&d) / len;
        if along < 0.0 || along > len {
            return None;
        }

        let v = self.vertex_at(pos);
        if v == a || v == b {
            return Some(Split::Existing(v));
        }
        Some(self.split_at(edge, v))
    }

    /// Where `pos` falls on `edge`'s projection, without changing anything.
    ///
    /// `None` when `pos` is off the projected line or outside its span.
    pub(crate) fn locate_2d(&self, edge: ViewEdgeId, pos: Point2) -> Option<Locate2d> {
        let e = self.edges.get(edge)?;
        let (a, b) = (e.a, e.b);
        let (pa2, pb2) = (self.vertices[a].pos2, self.vertices[b].pos2);
        let tol = self.tolerance.merge;

        if (pos - pa2).norm() < tol {
            return Some(Locate2d::End(a));
        }
        if (pos - pb2).norm() < tol {
            return Some(Locate2d::End(b));
        }

        let d = pb2 - pa2;
        let len = d.norm();
        if len < tol {
            return None;
        }
        let w = pos - pa2;
        if (w.x * d.y - w.y * d.x).abs() / len > tol {
            return None;
        }
        let along = w.dot(&d) / len;
        if along < 0.0 || along > len {
            return None;
        }
        Some(Locate2d::Inside(along / len))
    }

    /// Split `edge` at a pixel position lying on its projection.
    ///
    /// The world position is interpolated with the image-space ratio, and
    /// the new vertex's projection is pinned to `pos` exactly.
    pub fn split_edge_2d(&mut self, edge: ViewEdgeId, pos: Point2) -> Option<Split> {
        let ratio = match self.locate_2d(edge, pos)? {
            Locate2d::End(v) => return Some(Split::Existing(v)),
            Locate2d::Inside(ratio) => ratio,
        };
        let e = &self.edges[edge];
        let (a, b) = (e.a, e.b);
        let (pa3, pb3) = (self.vertices[a].pos3, self.vertices[b].pos3);

        let v = self.vertex_at(pa3 + (pb3 - pa3) * ratio);
        if v == a || v == b {
            return Some(Split::Existing(v));
        }
        let cell = self.registry.cell();
        let vertex = &mut self.vertices[v];
        vertex.pos2 = pos;
        vertex.hash2 = hash2(&pos, cell);
        Some(self.split_at(edge, v))
    }

    /// Shorten `edge` to end at `v` and add the remainder as a new edge.
    fn split_at(&mut self, edge: ViewEdgeId, v: ViewVertexId) -> Split {
        let mut tail = self.edges[edge].clone();
        let old_b = tail.b;
        tail.a = v;
        let faces = tail.faces.clone();
        let new_edge = self.edges.insert(tail);
        self.edges[edge].b = v;

        if let Some(end) = self.vertices.get_mut(old_b) {
            for id in end.edges.iter_mut().filter(|id| **id == edge) {
                *id = new_edge;
            }
        }
        for face in faces {
            self.face_edges.entry(face).or_default().push(new_edge);
        }
        let mid = &mut self.vertices[v];
        mid.edges.push(edge);
        mid.edges.push(new_edge);

        Split::Created {
            vertex: v,
            edge: new_edge,
        }
    }
}
