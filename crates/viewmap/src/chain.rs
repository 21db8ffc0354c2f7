//! Chaining of edges into maximal polylines.

use std::collections::BTreeSet;

use tracing::debug;

use crate::scene::MeshId;
use crate::types::{Chain, ChainVisibility, EdgeNature, ViewEdgeId, ViewVertexId};
use crate::viewmap::Viewmap;

/// Partition every edge into chains. Returns the number of chains.
///
/// A chain grows from a seed edge in both directions through non-singular
/// vertices, taking edges of the same nature and owning mesh.
pub fn build_chains(vm: &mut Viewmap) -> usize {
    let mut residual: BTreeSet<ViewEdgeId> = vm.edges.keys().collect();
    let mut chains = Vec::new();

    while let Some(seed) = residual.pop_first() {
        let Some(edge) = vm.edges.get(seed) else {
            continue;
        };
        let (a, b, nature) = (edge.a, edge.b, edge.nature);
        let mesh = edge.meshes.first().copied();

        let forward = walk(vm, &mut residual, nature, mesh, b);
        let backward = walk(vm, &mut residual, nature, mesh, a);

        let mut vertices = Vec::with_capacity(forward.len() + backward.len() + 2);
        let mut edges = Vec::with_capacity(forward.len() + backward.len() + 1);
        for &(e, v) in backward.iter().rev() {
            vertices.push(v);
            edges.push(e);
        }
        vertices.extend([a, b]);
        edges.push(seed);
        for (e, v) in forward {
            edges.push(e);
            vertices.push(v);
        }

        chains.push(Chain {
            vertices,
            edges,
            nature,
            mesh,
            visibility: ChainVisibility::Unknown,
            sample: None,
        });
    }

    let count = chains.len();
    debug!(chains = count, "chained edges");
    vm.chains = chains;
    count
}

/// Follow matching residual edges from `start` until a singular vertex or a
/// dead end. Returns each edge taken with the vertex it leads to.
fn walk(
    vm: &Viewmap,
    residual: &mut BTreeSet<ViewEdgeId>,
    nature: EdgeNature,
    mesh: Option<MeshId>,
    start: ViewVertexId,
) -> Vec<(ViewEdgeId, ViewVertexId)> {
    let mut out = Vec::new();
    let mut current = start;
    loop {
        let Some(vertex) = vm.vertices.get(current) else {
            break;
        };
        if vertex.singularity.is_singular() {
            break;
        }
        let next = vertex.edges.iter().copied().find(|e| {
            residual.contains(e)
                && vm.edges.get(*e).is_some_and(|edge| {
                    edge.nature == nature && edge.meshes.first().copied() == mesh
                })
        });
        let Some(e) = next else {
            break;
        };
        residual.remove(&e);
        let Some(far) = vm.edges[e].other(current) else {
            break;
        };
        out.push((e, far));
        current = far;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::scene::Scene;
    use crate::types::{VertexSingularity, ViewEdge};
    use viewmap_math::Point3;

    fn viewmap() -> Viewmap {
        let camera = Camera::look_at(Point3::new(0.0, 0.0, 10.0), Point3::origin(), 100.0, 100.0);
        Viewmap::new(Scene::new(), camera)
    }

    /// A closed square of silhouette edges plus a crease spur off one corner.
    fn square_with_spur(vm: &mut Viewmap) -> Vec<ViewVertexId> {
        let corners = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ]
        .map(|p| vm.vertex_at(p));
        for i in 0..4 {
            let mut edge = ViewEdge::new(corners[i], corners[(i + 1) % 4], EdgeNature::Silhouette);
            edge.meshes.push(MeshId(0));
            vm.add_edge(edge);
        }
        let tip = vm.vertex_at(Point3::new(2.0, 2.0, 0.0));
        let mut spur = ViewEdge::new(corners[2], tip, EdgeNature::Crease);
        spur.meshes.push(MeshId(0));
        vm.add_edge(spur);
        corners.to_vec()
    }

    fn assert_partition(vm: &Viewmap) {
        let mut seen = BTreeSet::new();
        for chain in vm.chains() {
            assert_eq!(chain.vertices.len(), chain.edges.len() + 1);
            for (i, &e) in chain.edges.iter().enumerate() {
                assert!(seen.insert(e), "edge in two chains");
                let edge = &vm.edges()[e];
                assert_eq!(edge.nature, chain.nature);
                assert!(edge.has_vertex(chain.vertices[i]));
                assert_eq!(edge.other(chain.vertices[i]), Some(chain.vertices[i + 1]));
            }
        }
        assert_eq!(seen.len(), vm.edges().len());
    }

    #[test]
    fn test_closed_loop_and_spur() {
        let mut vm = viewmap();
        square_with_spur(&mut vm);
        assert_eq!(build_chains(&mut vm), 2);
        assert_partition(&vm);

        let square = vm
            .chains()
            .iter()
            .find(|c| c.nature == EdgeNature::Silhouette)
            .unwrap();
        assert_eq!(square.len(), 4);
        assert!(square.is_closed());
        assert_eq!(square.mesh, Some(MeshId(0)));
    }

    #[test]
    fn test_singular_vertex_breaks_chain() {
        let mut vm = viewmap();
        let corners = square_with_spur(&mut vm);
        vm.vertices[corners[0]].singularity = VertexSingularity::MeshIntersection;
        vm.vertices[corners[2]].singularity = VertexSingularity::MeshIntersection;
        assert_eq!(build_chains(&mut vm), 3);
        assert_partition(&vm);
        let lengths: Vec<usize> = vm
            .chains()
            .iter()
            .filter(|c| c.nature == EdgeNature::Silhouette)
            .map(Chain::len)
            .collect();
        assert_eq!(lengths, vec![2, 2]);
    }

    #[test]
    fn test_different_meshes_do_not_join() {
        let mut vm = viewmap();
        let a = vm.vertex_at(Point3::new(0.0, 0.0, 0.0));
        let b = vm.vertex_at(Point3::new(1.0, 0.0, 0.0));
        let c = vm.vertex_at(Point3::new(2.0, 0.0, 0.0));
        for (p, q, mesh) in [(a, b, 0), (b, c, 1)] {
            let mut edge = ViewEdge::new(p, q, EdgeNature::Boundary);
            edge.meshes.push(MeshId(mesh));
            vm.add_edge(edge);
        }
        assert_eq!(build_chains(&mut vm), 2);
        assert_partition(&vm);
    }
}
