//! Edge classification.
//!
//! Every undirected mesh edge is visited once through its representative
//! half-edge and tagged by what it contributes to the drawing: silhouettes
//! where the facing flips, boundaries of open meshes, creases where the
//! surface folds sharply, and material borders. Edges with no nature are
//! never materialized.

use tracing::debug;
use viewmap_math::{angle_between_degrees, orient3d, Point3, Sign};
use viewmap_mesh::{FaceId, HalfEdgeId, VertexId};

use crate::diagnostics::Diagnostics;
use crate::options::CreaseAngle;
use crate::scene::{MeshId, SceneMesh};
use crate::types::{EdgeNature, FaceRef, ViewEdge};
use crate::viewmap::Viewmap;

/// Classification of one mesh edge before it is inserted.
#[derive(Debug, Clone)]
struct Classified {
    halfedge: HalfEdgeId,
    nature: EdgeNature,
    face_angle: f64,
    is_back: bool,
    is_concave: bool,
    faces: Vec<FaceId>,
}

/// Classify a single edge seen from `eye`.
fn classify_halfedge(
    mesh: &SceneMesh,
    he: HalfEdgeId,
    eye: &Point3,
    crease: &CreaseAngle,
) -> Option<Classified> {
    let topo = &mesh.mesh;
    let half = &topo.half_edges[he];
    let face_a = half.face?;
    let twin = half.twin;

    let Some(face_b) = topo.half_edges[twin].face else {
        return Some(Classified {
            halfedge: he,
            nature: EdgeNature::Boundary,
            face_angle: 0.0,
            is_back: false,
            is_concave: false,
            faces: vec![face_a],
        });
    };

    let front_a = mesh.is_front_facing(face_a, eye);
    let front_b = mesh.is_front_facing(face_b, eye);
    let face_angle = angle_between_degrees(&mesh.world_normal(face_a), &mesh.world_normal(face_b));

    // The far corner of face B above face A's plane means a valley
    let is_concave = topo.opposite_vertex(twin).is_some_and(|v| {
        let [a, b, c] = mesh.world_face_points(face_a);
        orient3d(&a, &b, &c, &mesh.world_point(v)) == Sign::Positive
    });

    let nature = if front_a != front_b {
        EdgeNature::Silhouette
    } else if crease.contains(face_angle) {
        EdgeNature::Crease
    } else if topo.faces[face_a].material != topo.faces[face_b].material {
        EdgeNature::Material
    } else {
        return None;
    };

    Some(Classified {
        halfedge: he,
        nature,
        face_angle,
        is_back: !front_a && !front_b,
        is_concave,
        faces: vec![face_a, face_b],
    })
}

/// Create a view edge for every mesh edge with a visual nature.
pub fn classify_edges(vm: &mut Viewmap, crease: &CreaseAngle, diag: &mut Diagnostics) {
    let eye = vm.camera.position;
    let mesh_ids: Vec<MeshId> = vm.scene.iter().map(|(id, _)| id).collect();

    for mesh_id in mesh_ids {
        let Some(mesh) = vm.scene.mesh(mesh_id) else {
            continue;
        };
        let classified: Vec<(Classified, [(VertexId, Point3); 2])> = mesh
            .mesh
            .edges()
            .filter_map(|he| {
                let c = classify_halfedge(mesh, he, &eye, crease)?;
                let origin = mesh.mesh.half_edges[he].origin;
                let dest = mesh.mesh.dest(he);
                Some((
                    c,
                    [
                        (origin, mesh.world_point(origin)),
                        (dest, mesh.world_point(dest)),
                    ],
                ))
            })
            .collect();

        let count = classified.len();
        for (c, [(va, pa), (vb, pb)]) in classified {
            let a = vm.vertex_for_mesh_vertex(mesh_id, va, pa);
            let b = vm.vertex_for_mesh_vertex(mesh_id, vb, pb);
            let mut edge = ViewEdge::new(a, b, c.nature);
            edge.face_angle = c.face_angle;
            edge.is_back = c.is_back;
            edge.is_concave = c.is_concave;
            edge.meshes.push(mesh_id);
            edge.faces = c
                .faces
                .iter()
                .map(|&face| FaceRef {
                    mesh: mesh_id,
                    face,
                })
                .collect();
            edge.halfedge = Some((mesh_id, c.halfedge));
            vm.add_edge(edge);
            *diag.edges_by_nature.entry(c.nature).or_default() += 1;
        }
        debug!(mesh = mesh_id.0, edges = count, "classified mesh edges");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::scene::Scene;
    use viewmap_math::Transform;
    use viewmap_mesh::primitives::{make_cube, make_plane};

    fn cube_viewmap(eye: Point3) -> Viewmap {
        let mut scene = Scene::new();
        let mesh = SceneMesh::new("cube", make_cube(1.0).unwrap(), Transform::identity()).unwrap();
        scene.add_mesh(mesh);
        Viewmap::new(scene, Camera::look_at(eye, Point3::origin(), 800.0, 600.0))
    }

    #[test]
    fn test_cube_edge_natures() {
        let mut vm = cube_viewmap(Point3::new(10.0, 10.0, 10.0));
        let mut diag = Diagnostics::default();
        classify_edges(&mut vm, &CreaseAngle::default(), &mut diag);

        assert_eq!(diag.edges(EdgeNature::Silhouette), 6);
        assert_eq!(diag.edges(EdgeNature::Crease), 6);
        assert_eq!(diag.edges(EdgeNature::Boundary), 0);
        // Quad diagonals are flat and stay within one material group
        assert_eq!(vm.edges().len(), 12);
        assert_eq!(vm.vertices().len(), 8);

        let back: Vec<_> = vm.edges().values().filter(|e| e.is_back).collect();
        assert_eq!(back.len(), 3);
        assert!(back.iter().all(|e| e.nature == EdgeNature::Crease));
        for edge in vm.edges().values() {
            assert!((edge.face_angle - 90.0).abs() < 1e-9);
            assert!(!edge.is_concave);
            assert_eq!(edge.faces.len(), 2);
        }
    }

    #[test]
    fn test_narrow_crease_window_keeps_material_edges() {
        let mut vm = cube_viewmap(Point3::new(10.0, 10.0, 10.0));
        let mut diag = Diagnostics::default();
        let crease = CreaseAngle { min: 100.0, max: 120.0 };
        classify_edges(&mut vm, &crease, &mut diag);
        // Every cube side is its own material group
        assert_eq!(diag.edges(EdgeNature::Crease), 0);
        assert_eq!(diag.edges(EdgeNature::Material), 6);
        assert_eq!(diag.edges(EdgeNature::Silhouette), 6);
    }

    #[test]
    fn test_open_mesh_boundary() {
        let mut scene = Scene::new();
        let mesh = SceneMesh::new("plane", make_plane(2.0, 2.0).unwrap(), Transform::identity())
            .unwrap();
        scene.add_mesh(mesh);
        let camera = Camera::look_at(Point3::new(0.0, -5.0, 5.0), Point3::origin(), 100.0, 100.0);
        let mut vm = Viewmap::new(scene, camera);
        let mut diag = Diagnostics::default();
        classify_edges(&mut vm, &CreaseAngle::default(), &mut diag);

        assert_eq!(diag.edges(EdgeNature::Boundary), 4);
        assert_eq!(vm.edges().len(), 4);
        for edge in vm.edges().values() {
            assert_eq!(edge.faces.len(), 1);
        }
        for vertex in vm.vertices().values() {
            assert_eq!(vertex.edges.len(), 2);
            assert_eq!(vertex.mesh_vertices.len(), 1);
        }
    }

    #[test]
    fn test_concave_fold_detected() {
        // Two triangles folded into a valley seen from above
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 0.5, 1.0),
            Point3::new(-1.0, 0.5, 1.0),
        ];
        let topo = viewmap_mesh::HalfEdgeMesh::from_triangles(&points, &[[0, 2, 1], [0, 1, 3]])
            .unwrap();
        let mut scene = Scene::new();
        scene.add_mesh(SceneMesh::new("valley", topo, Transform::identity()).unwrap());
        let camera = Camera::look_at(Point3::new(0.0, 0.5, 10.0), Point3::origin(), 100.0, 100.0);
        let mut vm = Viewmap::new(scene, camera);
        let mut diag = Diagnostics::default();
        classify_edges(&mut vm, &CreaseAngle { min: 80.0, max: 100.0 }, &mut diag);

        let fold: Vec<_> = vm.edges().values().filter(|e| e.faces.len() == 2).collect();
        assert_eq!(fold.len(), 1);
        assert_eq!(fold[0].nature, EdgeNature::Crease);
        assert!(fold[0].is_concave);
        assert!((fold[0].face_angle - 90.0).abs() < 1e-9);
    }
}
