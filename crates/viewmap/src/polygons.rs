//! Filled regions between visible contours.

use tracing::{debug, warn};
use viewmap_arrangement::{Arrangement, Segment2};

use crate::diagnostics::Diagnostics;
use crate::options::ViewmapOptions;
use crate::types::Polygon;
use crate::viewmap::Viewmap;

/// Projected segments of every visible chain.
pub fn visible_segments(vm: &Viewmap) -> Vec<Segment2> {
    let mut segments = Vec::new();
    for chain in vm.visible_chains() {
        for pair in chain.vertices.windows(2) {
            let (Some(a), Some(b)) = (vm.vertices.get(pair[0]), vm.vertices.get(pair[1])) else {
                continue;
            };
            if a.hash2 == b.hash2 {
                continue;
            }
            segments.push(Segment2::new(a.pos2, b.pos2));
        }
    }
    segments
}

/// Arrange the visible contours into polygons.
pub fn extract_polygons(
    vm: &mut Viewmap,
    arrangement: &dyn Arrangement,
    options: &ViewmapOptions,
    diag: &mut Diagnostics,
) {
    let segments = visible_segments(vm);
    let regions = arrangement.arrange(&segments);

    let mut polygons = Vec::with_capacity(regions.len());
    for region in regions {
        let area = region.signed_area();
        if area <= options.min_polygon_area {
            diag.small_regions_discarded += 1;
            continue;
        }
        let interior = match region.interior_point() {
            Ok(p) => p,
            Err(err) => {
                diag.arrangement_failures += 1;
                warn!(area, error = %err, "region discarded");
                continue;
            }
        };
        polygons.push(Polygon {
            outer: region.outer,
            holes: region.holes,
            interior,
            area,
            mesh: None,
            color: options.default_mesh_color,
        });
    }

    diag.polygons = polygons.len();
    debug!(
        segments = segments.len(),
        polygons = polygons.len(),
        discarded = diag.small_regions_discarded,
        "extracted polygons"
    );
    vm.polygons = polygons;
}

/// Attribute each polygon to the mesh seen through its interior point.
pub fn assign_polygons(vm: &mut Viewmap, options: &ViewmapOptions, diag: &mut Diagnostics) {
    let Viewmap {
        scene,
        camera,
        polygons,
        ..
    } = vm;

    for (idx, polygon) in polygons.iter_mut().enumerate() {
        let ray = camera.ray_through_pixel(&polygon.interior);
        let Some((mesh_id, hit)) = scene.raycast_first(&ray) else {
            diag.polygons_unassigned += 1;
            continue;
        };
        polygon.mesh = Some(mesh_id);
        diag.polygons_assigned += 1;

        let material = scene
            .mesh(mesh_id)
            .and_then(|mesh| mesh.face_material(hit.face_id));
        polygon.color = match material {
            Some(m) => m.color.unwrap_or(options.default_mesh_color),
            None => {
                diag.missing_attribution += 1;
                warn!(polygon = idx, mesh = mesh_id.0, "hit face has no material");
                options.default_mesh_color
            }
        };
    }

    debug!(
        assigned = diag.polygons_assigned,
        unassigned = diag.polygons_unassigned,
        "assigned polygons"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::options::Color;
    use crate::scene::{Material, MeshId, Scene, SceneMesh};
    use crate::types::{Chain, ChainVisibility, EdgeNature, ViewEdge};
    use viewmap_arrangement::{PlanarArrangement, Region};
    use viewmap_math::{Point2, Point3, Transform};
    use viewmap_mesh::primitives::make_plane;

    const RED: Color = Color::rgb(1.0, 0.0, 0.0);

    /// A plane facing a camera on the +z axis, with its outline as one
    /// visible chain.
    fn framed_plane(materials: Vec<Material>) -> Viewmap {
        let mesh = SceneMesh::new("plane", make_plane(2.0, 2.0).unwrap(), Transform::identity())
            .unwrap()
            .with_materials(materials);
        let mut scene = Scene::new();
        scene.add_mesh(mesh);
        let camera = Camera::look_at(Point3::new(0.0, 0.0, 5.0), Point3::origin(), 400.0, 400.0);
        let mut vm = Viewmap::new(scene, camera);

        let corners = [
            Point3::new(-1.0, -1.0, 0.0),
            Point3::new(1.0, -1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(-1.0, 1.0, 0.0),
        ]
        .map(|p| vm.vertex_at(p));
        let mut edges = Vec::new();
        for i in 0..4 {
            let mut edge = ViewEdge::new(corners[i], corners[(i + 1) % 4], EdgeNature::Boundary);
            edge.meshes.push(MeshId(0));
            edges.push(vm.add_edge(edge));
        }
        let mut vertices = corners.to_vec();
        vertices.push(corners[0]);
        vm.chains.push(Chain {
            vertices,
            edges,
            nature: EdgeNature::Boundary,
            mesh: Some(MeshId(0)),
            visibility: ChainVisibility::Visible,
            sample: None,
        });
        vm
    }

    #[test]
    fn test_outline_becomes_assigned_polygon() {
        let mut vm = framed_plane(vec![Material::new("paint", RED)]);
        let options = ViewmapOptions::default();
        let mut diag = Diagnostics::default();
        extract_polygons(&mut vm, &PlanarArrangement::default(), &options, &mut diag);
        assert_eq!(vm.polygons().len(), 1);
        assert!(vm.polygons()[0].area > options.min_polygon_area);

        assign_polygons(&mut vm, &options, &mut diag);
        let polygon = &vm.polygons()[0];
        assert_eq!(polygon.mesh, Some(MeshId(0)));
        assert_eq!(polygon.color, RED);
        assert_eq!(diag.polygons_assigned, 1);
        assert_eq!(diag.missing_attribution, 0);
    }

    #[test]
    fn test_missing_material_uses_default_color() {
        let mut vm = framed_plane(Vec::new());
        let options = ViewmapOptions {
            default_mesh_color: Color::rgb(0.0, 0.0, 1.0),
            ..Default::default()
        };
        let mut diag = Diagnostics::default();
        extract_polygons(&mut vm, &PlanarArrangement::default(), &options, &mut diag);
        assign_polygons(&mut vm, &options, &mut diag);
        assert_eq!(vm.polygons()[0].color, Color::rgb(0.0, 0.0, 1.0));
        assert_eq!(diag.missing_attribution, 1);
    }

    #[test]
    fn test_area_filter() {
        let mut vm = framed_plane(Vec::new());
        let options = ViewmapOptions {
            min_polygon_area: 1e12,
            ..Default::default()
        };
        let mut diag = Diagnostics::default();
        extract_polygons(&mut vm, &PlanarArrangement::default(), &options, &mut diag);
        assert!(vm.polygons().is_empty());
        assert_eq!(diag.small_regions_discarded, 1);
    }

    /// A square in the image corner plus a sliver with no area.
    struct CornerSquare;

    impl Arrangement for CornerSquare {
        fn arrange(&self, _segments: &[Segment2]) -> Vec<Region> {
            vec![
                Region::new(vec![
                    Point2::new(0.0, 0.0),
                    Point2::new(10.0, 0.0),
                    Point2::new(10.0, 10.0),
                    Point2::new(0.0, 10.0),
                ]),
                Region::new(vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)]),
            ]
        }
    }

    #[test]
    fn test_unassigned_polygon_is_counted() {
        let mut vm = framed_plane(Vec::new());
        let options = ViewmapOptions::default();
        let mut diag = Diagnostics::default();
        extract_polygons(&mut vm, &CornerSquare, &options, &mut diag);
        assert_eq!(vm.polygons().len(), 1);
        assert_eq!(diag.small_regions_discarded, 1);

        // The square sits away from the plane's footprint
        assign_polygons(&mut vm, &options, &mut diag);
        assert_eq!(diag.polygons_unassigned, 1);
        assert_eq!(diag.polygons_assigned, 0);
        assert_eq!(vm.polygons()[0].mesh, None);
    }
}
