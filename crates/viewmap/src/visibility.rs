//! Chain visibility by raycasting towards the eye.

use slotmap::SlotMap;
use tracing::{debug, warn};
use viewmap_math::Point3;
use viewmap_mesh::Ray;

use crate::diagnostics::Diagnostics;
use crate::options::ViewmapOptions;
use crate::types::{Chain, ChainVisibility, ViewEdge, ViewEdgeId, ViewVertex, ViewVertexId};
use crate::viewmap::Viewmap;

/// Resolve every chain as visible or hidden.
///
/// A chain is sampled at the midpoint of its middle edge; the ray from there
/// to the eye is cast against every face on both sides, and the chain is
/// visible when the summed hit distances stay under the tolerance.
pub fn resolve_visibility(vm: &mut Viewmap, options: &ViewmapOptions, diag: &mut Diagnostics) {
    let Viewmap {
        scene,
        camera,
        vertices,
        edges,
        chains,
        ..
    } = vm;

    if options.ignore_visibility {
        for chain in chains.iter_mut() {
            chain.visibility = ChainVisibility::Visible;
        }
    } else {
        let guard = scene.force_double_sided();
        for chain in chains.iter_mut() {
            let Some(sample) = sample_point(chain, edges, vertices) else {
                warn!(edges = chain.len(), "chain has no sample point");
                chain.visibility = ChainVisibility::Hidden;
                continue;
            };
            chain.sample = Some(sample);

            let dist = camera.distance_to(&sample);
            let ray = Ray::new(sample, camera.position - sample);
            let occlusion: f64 = guard
                .raycast(&ray)
                .iter()
                .map(|(_, hit)| hit.t)
                .filter(|&t| t >= 0.0 && t < dist)
                .sum();
            chain.visibility = if occlusion < options.visibility_tolerance {
                ChainVisibility::Visible
            } else {
                ChainVisibility::Hidden
            };
        }
    }

    for chain in chains.iter() {
        match chain.visibility {
            ChainVisibility::Visible => {
                diag.chains_visible += 1;
                for &v in &chain.vertices {
                    if let Some(vertex) = vertices.get_mut(v) {
                        vertex.visible = true;
                    }
                }
            }
            ChainVisibility::Hidden => diag.chains_hidden += 1,
            ChainVisibility::Unknown => {}
        }
    }
    debug!(
        visible = diag.chains_visible,
        hidden = diag.chains_hidden,
        "resolved chain visibility"
    );
}

/// Midpoint of the chain's middle edge.
fn sample_point(
    chain: &Chain,
    edges: &SlotMap<ViewEdgeId, ViewEdge>,
    vertices: &SlotMap<ViewVertexId, ViewVertex>,
) -> Option<Point3> {
    let edge = edges.get(*chain.edges.get(chain.len() / 2)?)?;
    let a = vertices.get(edge.a)?.pos3;
    let b = vertices.get(edge.b)?.pos3;
    Some(nalgebra::center(&a, &b))
}
