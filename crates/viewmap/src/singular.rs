//! Singular vertices, where contours start, end or change topology.
//!
//! The 3D pass looks at the natures and geometry of the edges around each
//! vertex. The 2D pass splits edges where their projections cross and marks
//! the occluded crossing vertex.

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, warn};
use viewmap_arrangement::{find_intersections, Segment2, SegmentIntersection};
use viewmap_math::{orient3d, Point2, Sign};

use crate::diagnostics::Diagnostics;
use crate::types::{
    EdgeNature, FaceRef, VertexSingularity, ViewEdge, ViewEdgeId, ViewVertexId,
};
use crate::viewmap::{Split, Viewmap};

pub use viewmap_arrangement::IMAGE_EPSILON;

/// Camera distances closer than this count as the same depth.
const DEPTH_TOLERANCE: f64 = 1e-10;

/// Classify every vertex from its incident edges.
pub fn singularities_3d(vm: &mut Viewmap, diag: &mut Diagnostics) {
    let ids: Vec<ViewVertexId> = vm.vertices.keys().collect();
    for v in ids {
        let singularity = classify_vertex(vm, v);
        vm.vertices[v].singularity = singularity;
    }
    tally(vm, diag);
}

fn classify_vertex(vm: &Viewmap, v: ViewVertexId) -> VertexSingularity {
    let Some(vertex) = vm.vertices.get(v) else {
        return VertexSingularity::None;
    };
    let edges: Vec<&ViewEdge> = vertex
        .edges
        .iter()
        .filter_map(|&e| vm.edges.get(e))
        .collect();
    let Some(first) = edges.first().map(|e| e.nature) else {
        return VertexSingularity::None;
    };

    if edges.len() >= 3
        && matches!(first, EdgeNature::Silhouette | EdgeNature::Boundary)
        && edges.iter().all(|e| e.nature == first)
    {
        return VertexSingularity::Bifurcation;
    }

    // Edges between two back faces never reach the visible contour
    let natures: BTreeSet<EdgeNature> = edges
        .iter()
        .filter(|e| !e.is_back)
        .map(|e| e.nature)
        .collect();
    if natures.len() > 1 && natures.iter().any(|n| n.is_visibility_indicating()) {
        return VertexSingularity::MeshIntersection;
    }

    let folds = edges
        .iter()
        .filter(|e| e.nature == EdgeNature::Silhouette && e.faces.len() == 2);
    let concave = folds.clone().any(|e| e.is_concave);
    let convex = folds.clone().any(|e| !e.is_concave);
    if concave && convex {
        return VertexSingularity::CurtainFold;
    }

    if boundary_curtain_fold(vm, v, &edges) {
        return VertexSingularity::CurtainFold;
    }
    VertexSingularity::None
}

/// Whether a face around `v` hides the farthest incident boundary edge.
///
/// Seen from the eye, the direction towards the far end `w` of that edge
/// must fall strictly inside the wedge a face spans at `v`.
fn boundary_curtain_fold(vm: &Viewmap, v: ViewVertexId, edges: &[&ViewEdge]) -> bool {
    let eye = vm.camera.position;
    let p = vm.vertices[v].pos3;

    let far = edges
        .iter()
        .filter(|e| e.nature == EdgeNature::Boundary)
        .filter_map(|e| {
            let w = vm.vertices.get(e.other(v)?)?.pos3;
            Some((*e, w, vm.camera.distance_to(&w)))
        })
        .max_by(|a, b| a.2.total_cmp(&b.2));
    let Some((edge, w, _)) = far else {
        return false;
    };
    let skip: Option<FaceRef> = edge.faces.first().copied();

    for &(mesh_id, mv) in &vm.vertices[v].mesh_vertices {
        let Some(mesh) = vm.scene.mesh(mesh_id) else {
            continue;
        };
        for face in mesh.mesh.vertex_faces(mv) {
            if skip == Some(FaceRef { mesh: mesh_id, face }) {
                continue;
            }
            let corners: Vec<_> = mesh
                .mesh
                .face_vertices(face)
                .into_iter()
                .filter(|&c| c != mv)
                .map(|c| mesh.world_point(c))
                .collect();
            let [q, r] = corners.as_slice() else {
                continue;
            };
            let towards_w = orient3d(&eye, &p, q, &w);
            if towards_w != Sign::Zero
                && orient3d(&eye, &p, &w, r) == towards_w
                && orient3d(&eye, &p, q, r) == towards_w
            {
                return true;
            }
        }
    }
    false
}

/// Split edges at image-space crossings and mark the occluded vertex.
pub fn singularities_2d(vm: &mut Viewmap, diag: &mut Diagnostics) {
    let mut ids: Vec<ViewEdgeId> = Vec::new();
    let mut ends: Vec<(ViewVertexId, ViewVertexId)> = Vec::new();
    let mut segments: Vec<Segment2> = Vec::new();
    for (id, edge) in &vm.edges {
        let segment = Segment2::new(vm.vertices[edge.a].pos2, vm.vertices[edge.b].pos2);
        if segment.length() < IMAGE_EPSILON {
            continue;
        }
        ids.push(id);
        ends.push((edge.a, edge.b));
        segments.push(segment);
    }

    let hits = find_intersections(&segments, IMAGE_EPSILON);
    let mut pieces: HashMap<ViewEdgeId, Vec<ViewEdgeId>> = HashMap::new();

    for hit in hits {
        let SegmentIntersection::Point { point, .. } = hit.intersection else {
            continue;
        };
        let (i, j) = (hit.first, hit.second);
        let (ea, eb) = (ends[i], ends[j]);
        if ea.0 == eb.0 || ea.0 == eb.1 || ea.1 == eb.0 || ea.1 == eb.1 {
            continue;
        }
        let (first, second) = (ids[i], ids[j]);
        let indicating = [first, second].iter().any(|&e| {
            vm.edges
                .get(e)
                .is_some_and(|edge| edge.nature.is_visibility_indicating())
        });
        if !indicating {
            continue;
        }

        let Some((va, vb)) = split_crossing(vm, &mut pieces, first, second, point) else {
            diag.unsplittable_crossings += 1;
            warn!(
                first = ?first,
                second = ?second,
                x = point.x,
                y = point.y,
                "image crossing could not be split"
            );
            continue;
        };

        diag.image_crossings += 1;
        mark_occluded(vm, va, vb);
    }

    debug!(crossings = diag.image_crossings, "resolved image crossings");
    tally(vm, diag);
}

/// The current piece of `edge` whose projection contains `point`.
fn locate_piece(
    vm: &Viewmap,
    pieces: &HashMap<ViewEdgeId, Vec<ViewEdgeId>>,
    edge: ViewEdgeId,
    point: Point2,
) -> Option<ViewEdgeId> {
    let single = [edge];
    let list: &[ViewEdgeId] = match pieces.get(&edge) {
        Some(list) => list,
        None => &single,
    };
    list.iter()
        .copied()
        .find(|&piece| vm.locate_2d(piece, point).is_some())
}

/// Split both edges at `point`, or neither.
///
/// Returns the vertex on each edge at the crossing.
fn split_crossing(
    vm: &mut Viewmap,
    pieces: &mut HashMap<ViewEdgeId, Vec<ViewEdgeId>>,
    first: ViewEdgeId,
    second: ViewEdgeId,
    point: Point2,
) -> Option<(ViewVertexId, ViewVertexId)> {
    let piece_a = locate_piece(vm, pieces, first, point)?;
    let piece_b = locate_piece(vm, pieces, second, point)?;
    let va = split_located(vm, pieces, first, piece_a, point)?;
    let vb = split_located(vm, pieces, second, piece_b, point)?;
    Some((va, vb))
}

fn split_located(
    vm: &mut Viewmap,
    pieces: &mut HashMap<ViewEdgeId, Vec<ViewEdgeId>>,
    edge: ViewEdgeId,
    piece: ViewEdgeId,
    point: Point2,
) -> Option<ViewVertexId> {
    match vm.split_edge_2d(piece, point)? {
        Split::Existing(v) => Some(v),
        Split::Created { vertex, edge: tail } => {
            pieces.entry(edge).or_insert_with(|| vec![edge]).push(tail);
            Some(vertex)
        }
    }
}

/// Mark the crossing vertex farther from the eye; equal depths mark both.
fn mark_occluded(vm: &mut Viewmap, va: ViewVertexId, vb: ViewVertexId) {
    if va == vb {
        mark_image_intersection(vm, va);
        return;
    }
    let da = vm.camera.distance_to(&vm.vertices[va].pos3);
    let db = vm.camera.distance_to(&vm.vertices[vb].pos3);
    if (da - db).abs() < DEPTH_TOLERANCE {
        mark_image_intersection(vm, va);
        mark_image_intersection(vm, vb);
    } else if da > db {
        mark_image_intersection(vm, va);
    } else {
        mark_image_intersection(vm, vb);
    }
}

fn mark_image_intersection(vm: &mut Viewmap, v: ViewVertexId) {
    if let Some(vertex) = vm.vertices.get_mut(v) {
        vertex.singularity = VertexSingularity::ImageIntersection;
    }
}

fn tally(vm: &Viewmap, diag: &mut Diagnostics) {
    diag.vertices_by_singularity.clear();
    for vertex in vm.vertices.values() {
        *diag
            .vertices_by_singularity
            .entry(vertex.singularity)
            .or_default() += 1;
    }
}
