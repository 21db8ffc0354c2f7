//! Small triangulated primitives for tests and benchmarks.

use viewmap_math::Point3;

use crate::error::Result;
use crate::halfedge::HalfEdgeMesh;

/// Axis-aligned box of size `sx × sy × sz` centered at the origin.
///
/// Twelve outward-facing triangles, two per side.
pub fn make_box(sx: f64, sy: f64, sz: f64) -> Result<HalfEdgeMesh> {
    let (hx, hy, hz) = (sx / 2.0, sy / 2.0, sz / 2.0);
    let points = vec![
        Point3::new(-hx, -hy, -hz), // 0
        Point3::new(hx, -hy, -hz),  // 1
        Point3::new(hx, hy, -hz),   // 2
        Point3::new(-hx, hy, -hz),  // 3
        Point3::new(-hx, -hy, hz),  // 4
        Point3::new(hx, -hy, hz),   // 5
        Point3::new(hx, hy, hz),    // 6
        Point3::new(-hx, hy, hz),   // 7
    ];
    let quads: [[u32; 4]; 6] = [
        [0, 3, 2, 1], // bottom (z-)
        [4, 5, 6, 7], // top (z+)
        [0, 1, 5, 4], // front (y-)
        [2, 3, 7, 6], // back (y+)
        [0, 4, 7, 3], // left (x-)
        [1, 2, 6, 5], // right (x+)
    ];
    let triangles: Vec<[u32; 3]> = quads
        .iter()
        .flat_map(|&[a, b, c, d]| [[a, b, c], [a, c, d]])
        .collect();
    // One material group per side
    let materials: Vec<usize> = (0..triangles.len()).map(|i| i / 2).collect();
    HalfEdgeMesh::from_triangles_with_materials(&points, &triangles, &materials)
}

/// Cube of edge length `size` centered at the origin.
pub fn make_cube(size: f64) -> Result<HalfEdgeMesh> {
    make_box(size, size, size)
}

/// Rectangle in the XY plane at z = 0, facing +z, split into two triangles.
pub fn make_plane(width: f64, height: f64) -> Result<HalfEdgeMesh> {
    let (hw, hh) = (width / 2.0, height / 2.0);
    let points = vec![
        Point3::new(-hw, -hh, 0.0),
        Point3::new(hw, -hh, 0.0),
        Point3::new(hw, hh, 0.0),
        Point3::new(-hw, hh, 0.0),
    ];
    HalfEdgeMesh::from_triangles(&points, &[[0, 1, 2], [0, 2, 3]])
}
