//! Mesh-mesh intersection contours.
//!
//! For every pair of meshes the BVHs are cast against each other, candidate
//! triangle pairs are intersected exactly, and each intersection segment is
//! inserted as a run of [`EdgeNature::MeshIntersection`] edges. Existing view
//! edges on either triangle that cross the segment are split first so the new
//! contour is stitched into the graph.

use tracing::{debug, warn};
use viewmap_math::{Point3, Tolerance, Vec3};
use viewmap_mesh::{intersect_triangles, FaceId};

use crate::diagnostics::Diagnostics;
use crate::scene::{MeshId, Scene};
use crate::types::{EdgeNature, FaceRef, ViewEdge, ViewEdgeId, ViewVertexId};
use crate::viewmap::Viewmap;

/// One world-space intersection segment between two faces.
#[derive(Debug, Clone, Copy)]
struct Segment3 {
    start: Point3,
    end: Point3,
    face_a: FaceRef,
    face_b: FaceRef,
}

/// Intersect every pair of meshes and insert the resulting contours.
pub fn intersect_meshes(vm: &mut Viewmap, diag: &mut Diagnostics) {
    let n = vm.scene.len();
    for i in 0..n {
        for j in (i + 1)..n {
            let segments = pair_segments(&vm.scene, MeshId(i), MeshId(j), &vm.tolerance);
            let before = diag.edges(EdgeNature::MeshIntersection);
            for segment in &segments {
                insert_segment(vm, segment, diag);
            }
            diag.intersection_segments += segments.len();
            debug!(
                mesh_a = i,
                mesh_b = j,
                segments = segments.len(),
                edges = diag.edges(EdgeNature::MeshIntersection) - before,
                "intersected mesh pair"
            );
        }
    }
}

/// World-space intersection segments between two meshes.
fn pair_segments(scene: &Scene, ia: MeshId, ib: MeshId, tol: &Tolerance) -> Vec<Segment3> {
    let (Some(a), Some(b)) = (scene.mesh(ia), scene.mesh(ib)) else {
        return Vec::new();
    };
    let b_to_a = a.inverse().then(&b.transform);

    let mut pairs: Vec<(FaceId, FaceId)> = Vec::new();
    a.bvh().bvhcast(b.bvh(), &b_to_a, |fa, fb| pairs.push((fa, fb)));

    let mut out = Vec::new();
    for (fa, fb) in pairs {
        let tri_a = a.mesh.face_points(fa);
        let tri_b = b.mesh.face_points(fb).map(|p| b_to_a.apply_point(&p));
        let hit = intersect_triangles(&tri_a, &tri_b);
        if hit.num_points() < 2 {
            continue;
        }
        for (p, q) in hit.segments() {
            let start = a.transform.apply_point(&p);
            let end = a.transform.apply_point(&q);
            if (end - start).norm() < tol.linear {
                continue;
            }
            out.push(Segment3 {
                start,
                end,
                face_a: FaceRef { mesh: ia, face: fa },
                face_b: FaceRef { mesh: ib, face: fb },
            });
        }
    }
    out
}

/// Point where the line `start + t * dir` passes within `tol` of the edge
/// `pa..pb`, for `t` in the segment and the point on the edge span.
fn line_crossing(
    start: &Point3,
    dir: &Vec3,
    pa: &Point3,
    pb: &Point3,
    tol: &Tolerance,
) -> Option<Point3> {
    let e = pb - pa;
    let w0 = start - pa;
    let a = dir.dot(dir);
    let b = dir.dot(&e);
    let c = e.dot(&e);
    let d = dir.dot(&w0);
    let f = e.dot(&w0);
    let denom = a * c - b * b;
    if a < tol.linear || c < tol.linear || denom <= tol.linear * a * c {
        return None;
    }

    let t = (b * f - c * d) / denom;
    let u = (a * f - b * d) / denom;
    let slack_t = tol.colinear / a.sqrt();
    let slack_u = tol.colinear / c.sqrt();
    if t < -slack_t || t > 1.0 + slack_t || u < -slack_u || u > 1.0 + slack_u {
        return None;
    }

    let on_line = start + dir * t;
    let on_edge = pa + e * u.clamp(0.0, 1.0);
    if (on_line - on_edge).norm() > tol.colinear {
        return None;
    }
    Some(on_edge)
}

/// Stitch one intersection segment into the viewmap.
///
/// Only mesh edges on the two faces are split. Earlier intersection curves
/// are never split, so where curves from three meshes cross on one face
/// they pass each other without a shared vertex.
fn insert_segment(vm: &mut Viewmap, segment: &Segment3, diag: &mut Diagnostics) {
    let start = vm.vertex_at(segment.start);
    let end = vm.vertex_at(segment.end);
    if start == end {
        return;
    }
    let dir = segment.end - segment.start;
    let tol = vm.tolerance;

    let mut candidates: Vec<ViewEdgeId> = vm.face_edges(segment.face_a).to_vec();
    candidates.extend_from_slice(vm.face_edges(segment.face_b));
    candidates.sort();
    candidates.dedup();

    let mut touched = vec![start, end];
    for id in candidates {
        let Some(edge) = vm.edges.get(id) else {
            continue;
        };
        if edge.nature == EdgeNature::MeshIntersection {
            continue;
        }
        let pa = vm.vertices[edge.a].pos3;
        let pb = vm.vertices[edge.b].pos3;
        let Some(crossing) = line_crossing(&segment.start, &dir, &pa, &pb, &tol) else {
            continue;
        };
        match vm.split_edge_3d(id, crossing) {
            Some(split) => touched.push(split.vertex()),
            None => {
                diag.unsplittable_crossings += 1;
                warn!(
                    edge = ?id,
                    x = crossing.x,
                    y = crossing.y,
                    z = crossing.z,
                    "crossing could not be split"
                );
            }
        }
    }

    let mut ordered: Vec<(f64, ViewVertexId)> = touched
        .into_iter()
        .map(|v| ((vm.vertices[v].pos3 - segment.start).dot(&dir), v))
        .collect();
    ordered.sort_by(|p, q| p.0.total_cmp(&q.0));
    ordered.dedup_by_key(|(_, v)| *v);

    let mut created = 0;
    for pair in ordered.windows(2) {
        let (a, b) = (pair[0].1, pair[1].1);
        if a == b || vm.find_edge(a, b, EdgeNature::MeshIntersection).is_some() {
            continue;
        }
        let mut edge = ViewEdge::new(a, b, EdgeNature::MeshIntersection);
        edge.meshes = vec![segment.face_a.mesh, segment.face_b.mesh];
        edge.faces = vec![segment.face_a, segment.face_b];
        vm.add_edge(edge);
        created += 1;
    }
    *diag
        .edges_by_nature
        .entry(EdgeNature::MeshIntersection)
        .or_default() += created;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::classify::classify_edges;
    use crate::options::CreaseAngle;
    use crate::scene::SceneMesh;
    use viewmap_math::Transform;
    use viewmap_mesh::primitives::{make_cube, make_plane};

    fn cube_and_plane() -> Viewmap {
        let mut scene = Scene::new();
        scene.add_mesh(SceneMesh::new("cube", make_cube(2.0).unwrap(), Transform::identity()).unwrap());
        scene.add_mesh(
            SceneMesh::new("plane", make_plane(10.0, 10.0).unwrap(), Transform::identity()).unwrap(),
        );
        let camera = Camera::look_at(Point3::new(10.0, 10.0, 10.0), Point3::origin(), 800.0, 600.0);
        Viewmap::new(scene, camera)
    }

    #[test]
    fn test_line_crossing() {
        let tol = Tolerance::DEFAULT;
        let start = Point3::new(-1.0, 0.5, 0.0);
        let dir = Vec3::new(2.0, 0.0, 0.0);
        let hit = line_crossing(
            &start,
            &dir,
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(0.0, 1.0, 0.0),
            &tol,
        )
        .unwrap();
        assert!((hit - Point3::new(0.0, 0.5, 0.0)).norm() < 1e-12);

        // Parallel and out-of-span edges never cross
        assert!(line_crossing(
            &start,
            &dir,
            &Point3::new(0.0, 1.0, 0.0),
            &Point3::new(1.0, 1.0, 0.0),
            &tol
        )
        .is_none());
        assert!(line_crossing(
            &start,
            &dir,
            &Point3::new(0.0, 1.0, 0.0),
            &Point3::new(0.0, 2.0, 0.0),
            &tol
        )
        .is_none());
        // Skew lines that miss each other
        assert!(line_crossing(
            &start,
            &dir,
            &Point3::new(0.0, 0.0, 1.0),
            &Point3::new(0.0, 1.0, 1.0),
            &tol
        )
        .is_none());
    }

    #[test]
    fn test_cube_through_plane_loop() {
        let mut vm = cube_and_plane();
        let mut diag = Diagnostics::default();
        classify_edges(&mut vm, &CreaseAngle::default(), &mut diag);
        let before = vm.vertices().len();
        intersect_meshes(&mut vm, &mut diag);

        assert_eq!(vm.vertices().len() - before, 8);
        assert_eq!(diag.edges(EdgeNature::MeshIntersection), 8);
        assert_eq!(vm.edges_of_nature(EdgeNature::MeshIntersection).count(), 8);

        let on_cube = |p: &Point3| p.z.abs() < 1e-9 && p.x.abs() < 1.0 + 1e-9 && p.y.abs() < 1.0 + 1e-9;
        let ring: Vec<_> = vm.vertices().values().filter(|v| on_cube(&v.pos3)).collect();
        assert_eq!(ring.len(), 8);
        for vertex in ring {
            let mi = vertex
                .edges
                .iter()
                .filter(|&&e| vm.edges[e].nature == EdgeNature::MeshIntersection)
                .count();
            assert_eq!(mi, 2);
        }
        for (_, edge) in vm.edges_of_nature(EdgeNature::MeshIntersection) {
            assert_eq!(edge.meshes, vec![MeshId(0), MeshId(1)]);
            assert_eq!(edge.faces.len(), 2);
        }
    }

    #[test]
    fn test_disjoint_meshes_add_nothing() {
        let mut scene = Scene::new();
        scene.add_mesh(SceneMesh::new("a", make_cube(1.0).unwrap(), Transform::identity()).unwrap());
        scene.add_mesh(
            SceneMesh::new("b", make_cube(1.0).unwrap(), Transform::translation(5.0, 0.0, 0.0))
                .unwrap(),
        );
        let camera = Camera::look_at(Point3::new(0.0, 0.0, 20.0), Point3::origin(), 100.0, 100.0);
        let mut vm = Viewmap::new(scene, camera);
        let mut diag = Diagnostics::default();
        intersect_meshes(&mut vm, &mut diag);
        assert_eq!(diag.intersection_segments, 0);
        assert!(vm.edges().is_empty());
    }

    #[test]
    fn test_earlier_intersection_curves_stay_whole() {
        let camera = Camera::look_at(Point3::new(0.0, 0.0, 10.0), Point3::origin(), 100.0, 100.0);
        let mut vm = Viewmap::new(Scene::new(), camera);
        let shared = FaceRef {
            mesh: MeshId(0),
            face: FaceId::default(),
        };
        let other = FaceRef {
            mesh: MeshId(2),
            face: FaceId::default(),
        };
        let a = vm.vertex_at(Point3::new(-1.0, 0.0, 0.0));
        let b = vm.vertex_at(Point3::new(1.0, 0.0, 0.0));
        let mut earlier = ViewEdge::new(a, b, EdgeNature::MeshIntersection);
        earlier.faces = vec![shared, other];
        vm.add_edge(earlier);

        let segment = Segment3 {
            start: Point3::new(0.0, -1.0, 0.0),
            end: Point3::new(0.0, 1.0, 0.0),
            face_a: shared,
            face_b: FaceRef {
                mesh: MeshId(1),
                face: FaceId::default(),
            },
        };
        let mut diag = Diagnostics::default();
        insert_segment(&mut vm, &segment, &mut diag);

        assert_eq!(vm.edges_of_nature(EdgeNature::MeshIntersection).count(), 2);
        assert_eq!(vm.vertices().len(), 4);
        assert_eq!(diag.unsplittable_crossings, 0);
    }
}
