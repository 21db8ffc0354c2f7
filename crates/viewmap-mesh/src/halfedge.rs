//! Half-edge topology for triangle meshes.
//!
//! Every interior edge is represented by two opposite half-edges. Edges on
//! the mesh boundary also get a twin: a face-less boundary half-edge, linked
//! into boundary loops through `next`/`prev`, so that `twin` is always valid
//! and fans around boundary vertices can be walked without special cases.

use std::collections::HashMap;

use slotmap::{new_key_type, SlotMap};
use viewmap_math::{orient3d, Point3, Sign, Vec3};

use crate::error::{MeshError, Result};

new_key_type! {
    /// Handle to a mesh vertex.
    pub struct VertexId;
    /// Handle to a half-edge.
    pub struct HalfEdgeId;
    /// Handle to a triangle.
    pub struct FaceId;
}

/// Guard against malformed connectivity when walking fans and loops.
const MAX_LOOP_ITERATIONS: usize = 1 << 16;

/// A mesh vertex.
#[derive(Debug, Clone)]
pub struct Vertex {
    /// Position in the mesh's local frame.
    pub point: Point3,
    /// One outgoing half-edge. Boundary vertices store their outgoing
    /// boundary half-edge.
    pub halfedge: HalfEdgeId,
}

/// An oriented half-edge.
#[derive(Debug, Clone)]
pub struct HalfEdge {
    /// Vertex this half-edge starts at.
    pub origin: VertexId,
    /// Opposite half-edge.
    pub twin: HalfEdgeId,
    /// Next half-edge around the face (or boundary loop).
    pub next: HalfEdgeId,
    /// Previous half-edge around the face (or boundary loop).
    pub prev: HalfEdgeId,
    /// Face on the left, `None` for boundary half-edges.
    pub face: Option<FaceId>,
}

/// A triangle.
#[derive(Debug, Clone)]
pub struct Face {
    /// First half-edge of the triangle.
    pub halfedge: HalfEdgeId,
    /// Unit normal following the counter-clockwise winding.
    pub normal: Vec3,
    /// Material group index.
    pub material: usize,
}

/// A triangle mesh with half-edge connectivity.
#[derive(Debug, Clone, Default)]
pub struct HalfEdgeMesh {
    /// Vertex storage.
    pub vertices: SlotMap<VertexId, Vertex>,
    /// Half-edge storage, including boundary half-edges.
    pub half_edges: SlotMap<HalfEdgeId, HalfEdge>,
    /// Face storage.
    pub faces: SlotMap<FaceId, Face>,
}

impl HalfEdgeMesh {
    /// Build from indexed triangles, all in material group 0.
    pub fn from_triangles(points: &[Point3], triangles: &[[u32; 3]]) -> Result<Self> {
        Self::from_triangles_with_materials(points, triangles, &vec![0; triangles.len()])
    }

    /// Build from indexed triangles with one material group per triangle.
    ///
    /// Triangles must be consistently wound (counter-clockwise seen from the
    /// outside) and edge-manifold.
    pub fn from_triangles_with_materials(
        points: &[Point3],
        triangles: &[[u32; 3]],
        materials: &[usize],
    ) -> Result<Self> {
        if triangles.is_empty() {
            return Err(MeshError::EmptyMesh);
        }
        if materials.len() != triangles.len() {
            return Err(MeshError::MaterialCount {
                expected: triangles.len(),
                actual: materials.len(),
            });
        }

        let mut mesh = HalfEdgeMesh::default();
        let vertex_ids: Vec<VertexId> = points
            .iter()
            .map(|p| {
                mesh.vertices.insert(Vertex {
                    point: *p,
                    halfedge: HalfEdgeId::default(),
                })
            })
            .collect();

        let mut directed: HashMap<(u32, u32), HalfEdgeId> = HashMap::new();

        for (fi, tri) in triangles.iter().enumerate() {
            for &vi in tri {
                if vi as usize >= points.len() {
                    return Err(MeshError::InvalidVertexIndex { face: fi, vertex: vi });
                }
            }
            if tri[0] == tri[1] || tri[1] == tri[2] || tri[0] == tri[2] {
                return Err(MeshError::DegenerateFace { face: fi });
            }

            let [p0, p1, p2] = tri.map(|i| points[i as usize]);
            let normal = (p1 - p0).cross(&(p2 - p0));
            let normal = if normal.norm() > 0.0 { normal.normalize() } else { normal };

            let face = mesh.faces.insert(Face {
                halfedge: HalfEdgeId::default(),
                normal,
                material: materials[fi],
            });

            let mut hes = [HalfEdgeId::default(); 3];
            for k in 0..3 {
                let (a, b) = (tri[k], tri[(k + 1) % 3]);
                if directed.contains_key(&(a, b)) {
                    return Err(MeshError::NonManifoldEdge { v0: a, v1: b });
                }
                let he = mesh.half_edges.insert(HalfEdge {
                    origin: vertex_ids[a as usize],
                    twin: HalfEdgeId::default(),
                    next: HalfEdgeId::default(),
                    prev: HalfEdgeId::default(),
                    face: Some(face),
                });
                directed.insert((a, b), he);
                hes[k] = he;
                mesh.vertices[vertex_ids[a as usize]].halfedge = he;
            }
            for k in 0..3 {
                let he = &mut mesh.half_edges[hes[k]];
                he.next = hes[(k + 1) % 3];
                he.prev = hes[(k + 2) % 3];
            }
            mesh.faces[face].halfedge = hes[0];
        }

        // Pair twins, creating boundary half-edges for unmatched edges.
        let mut boundary_out: HashMap<u32, HalfEdgeId> = HashMap::new();
        let mut boundary: Vec<(HalfEdgeId, u32)> = Vec::new();
        let mut keys: Vec<(u32, u32)> = directed.keys().copied().collect();
        keys.sort_unstable();
        for (a, b) in keys {
            let he = directed[&(a, b)];
            if let Some(&twin) = directed.get(&(b, a)) {
                mesh.half_edges[he].twin = twin;
                continue;
            }
            let bhe = mesh.half_edges.insert(HalfEdge {
                origin: vertex_ids[b as usize],
                twin: he,
                next: HalfEdgeId::default(),
                prev: HalfEdgeId::default(),
                face: None,
            });
            mesh.half_edges[he].twin = bhe;
            if boundary_out.insert(b, bhe).is_some() {
                return Err(MeshError::NonManifoldVertex { vertex: b });
            }
            boundary.push((bhe, a));
        }

        // Boundary half-edge b -> a continues with the boundary half-edge leaving a.
        for (bhe, dest) in boundary {
            let next = boundary_out[&dest];
            mesh.half_edges[bhe].next = next;
            mesh.half_edges[next].prev = bhe;
        }
        for (vi, bhe) in boundary_out {
            mesh.vertices[vertex_ids[vi as usize]].halfedge = bhe;
        }

        Ok(mesh)
    }

    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles.
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Destination vertex of a half-edge.
    pub fn dest(&self, he: HalfEdgeId) -> VertexId {
        self.half_edges[self.half_edges[he].next].origin
    }

    /// The three half-edges of a triangle.
    pub fn face_halfedges(&self, face: FaceId) -> [HalfEdgeId; 3] {
        let h0 = self.faces[face].halfedge;
        let h1 = self.half_edges[h0].next;
        let h2 = self.half_edges[h1].next;
        [h0, h1, h2]
    }

    /// The three vertices of a triangle, in winding order.
    pub fn face_vertices(&self, face: FaceId) -> [VertexId; 3] {
        self.face_halfedges(face).map(|he| self.half_edges[he].origin)
    }

    /// The three corner positions of a triangle, in winding order.
    pub fn face_points(&self, face: FaceId) -> [Point3; 3] {
        self.face_vertices(face).map(|v| self.vertices[v].point)
    }

    /// Whether the triangle's front side faces `eye`.
    ///
    /// Points in the triangle's plane count as not front-facing.
    pub fn is_front_facing(&self, face: FaceId, eye: &Point3) -> bool {
        let [a, b, c] = self.face_points(face);
        orient3d(&a, &b, &c, eye) == Sign::Positive
    }

    /// The corner of `face` that is not on half-edge `he`'s edge.
    pub fn opposite_vertex(&self, he: HalfEdgeId) -> Option<VertexId> {
        self.half_edges[he].face?;
        Some(self.half_edges[self.half_edges[he].prev].origin)
    }

    /// Half-edges leaving `v`, rotating around the vertex.
    pub fn outgoing_halfedges(&self, v: VertexId) -> Vec<HalfEdgeId> {
        let mut out = Vec::new();
        let Some(start) = self.vertices.get(v).map(|vx| vx.halfedge) else {
            return out;
        };
        if !self.half_edges.contains_key(start) {
            return out;
        }
        let mut he = start;
        for _ in 0..MAX_LOOP_ITERATIONS {
            out.push(he);
            he = self.half_edges[self.half_edges[he].prev].twin;
            if he == start {
                break;
            }
        }
        out
    }

    /// Faces around `v`.
    pub fn vertex_faces(&self, v: VertexId) -> Vec<FaceId> {
        self.outgoing_halfedges(v)
            .into_iter()
            .filter_map(|he| self.half_edges[he].face)
            .collect()
    }

    /// Whether `v` lies on the mesh boundary.
    ///
    /// Isolated and unknown vertices are not on any boundary.
    pub fn is_boundary_vertex(&self, v: VertexId) -> bool {
        self.vertices
            .get(v)
            .and_then(|vx| self.half_edges.get(vx.halfedge))
            .is_some_and(|he| he.face.is_none())
    }

    /// One half-edge per undirected edge, always the one with a face.
    ///
    /// Interior edges are reported through the half-edge with the smaller
    /// key; boundary edges through their only face-carrying half-edge.
    pub fn edges(&self) -> impl Iterator<Item = HalfEdgeId> + '_ {
        self.half_edges.iter().filter_map(move |(id, he)| {
            he.face?;
            let twin = &self.half_edges[he.twin];
            if twin.face.is_none() || id < he.twin {
                Some(id)
            } else {
                None
            }
        })
    }
}
