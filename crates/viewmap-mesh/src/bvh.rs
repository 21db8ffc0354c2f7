//! Bounding volume hierarchy over mesh triangles.
//!
//! Built top-down with a surface-area cost. Supports ray queries
//! and pairwise traversal against another BVH (`bvhcast`), which is the
//! broadphase of mesh-mesh intersection.

use viewmap_math::{Point3, Transform};

use crate::bbox::Aabb3;
use crate::halfedge::{FaceId, HalfEdgeMesh};
use crate::{Ray, RayHit};

/// Leaves hold at most this many triangles.
const MAX_LEAF_TRIANGLES: usize = 4;

/// A triangle stored in the BVH.
#[derive(Debug, Clone)]
struct BvhTriangle {
    face: FaceId,
    points: [Point3; 3],
    aabb: Aabb3,
    centroid: Point3,
}

/// A BVH node - either a leaf containing triangles or an internal node with children.
#[derive(Debug, Clone)]
pub enum BvhNode {
    /// Leaf node containing triangle slots.
    Leaf {
        /// Axis-aligned bounding box of this node.
        aabb: Aabb3,
        /// Indices into the BVH's triangle list.
        triangles: Vec<usize>,
    },
    /// Internal node with two children.
    Internal {
        /// Axis-aligned bounding box of this node.
        aabb: Aabb3,
        /// Left child node.
        left: Box<BvhNode>,
        /// Right child node.
        right: Box<BvhNode>,
    },
}

impl BvhNode {
    /// Bounding box of this node.
    pub fn aabb(&self) -> &Aabb3 {
        match self {
            BvhNode::Leaf { aabb, .. } => aabb,
            BvhNode::Internal { aabb, .. } => aabb,
        }
    }
}

/// Bounding Volume Hierarchy for accelerated ray and triangle-pair queries.
#[derive(Debug, Clone)]
pub struct Bvh {
    root: Option<BvhNode>,
    triangles: Vec<BvhTriangle>,
}

impl Bvh {
    /// Build a BVH over every triangle of `mesh` (in the mesh's own frame).
    pub fn build(mesh: &HalfEdgeMesh) -> Self {
        let mut triangles: Vec<BvhTriangle> = mesh
            .faces
            .keys()
            .map(|face| {
                let points = mesh.face_points(face);
                let aabb = Aabb3::from_points(&points);
                BvhTriangle {
                    face,
                    points,
                    centroid: aabb.centroid(),
                    aabb,
                }
            })
            .collect();

        let mut order: Vec<usize> = (0..triangles.len()).collect();
        let root = if order.is_empty() {
            None
        } else {
            Some(build_node(&triangles, &mut order))
        };
        triangles.shrink_to_fit();

        Self { root, triangles }
    }

    /// Number of triangles in the hierarchy.
    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    /// Whether the hierarchy is empty.
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Root of the hierarchy, `None` for an empty mesh.
    pub fn root(&self) -> Option<&BvhNode> {
        self.root.as_ref()
    }

    /// Every triangle the ray passes through, nearest first.
    ///
    /// Both sides of every triangle are reported; callers filter on
    /// [`RayHit::front_facing`].
    pub fn trace(&self, ray: &Ray) -> Vec<RayHit> {
        let mut hits = Vec::new();
        let mut stack: Vec<&BvhNode> = self.root.iter().collect();
        while let Some(node) = stack.pop() {
            if ray.intersect_aabb(node.aabb()).is_none() {
                continue;
            }
            match node {
                BvhNode::Leaf { triangles, .. } => {
                    hits.extend(triangles.iter().filter_map(|&slot| self.hit(ray, slot)));
                }
                BvhNode::Internal { left, right, .. } => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }
        hits.sort_by(|a, b| a.t.total_cmp(&b.t));
        hits
    }

    /// Nearest hit that `accept` lets through.
    pub fn trace_closest(&self, ray: &Ray, accept: impl Fn(&RayHit) -> bool) -> Option<RayHit> {
        let mut best: Option<RayHit> = None;
        let mut stack: Vec<(&BvhNode, f64)> = Vec::new();
        if let Some(root) = &self.root {
            if let Some((enter, _)) = ray.intersect_aabb(root.aabb()) {
                stack.push((root, enter));
            }
        }

        while let Some((node, enter)) = stack.pop() {
            let bound = best.map_or(f64::INFINITY, |hit| hit.t);
            if enter >= bound {
                continue;
            }
            match node {
                BvhNode::Leaf { triangles, .. } => {
                    for &slot in triangles {
                        let Some(hit) = self.hit(ray, slot) else {
                            continue;
                        };
                        if hit.t < best.map_or(f64::INFINITY, |b| b.t) && accept(&hit) {
                            best = Some(hit);
                        }
                    }
                }
                BvhNode::Internal { left, right, .. } => {
                    let near = ray.intersect_aabb(left.aabb()).map(|(t, _)| (&**left, t));
                    let far = ray.intersect_aabb(right.aabb()).map(|(t, _)| (&**right, t));
                    let (first, second) = match (near, far) {
                        (Some(l), Some(r)) if r.1 < l.1 => (Some(r), Some(l)),
                        pair => pair,
                    };
                    // Push the farther child first so the nearer one pops next
                    stack.extend(second);
                    stack.extend(first);
                }
            }
        }
        best
    }

    fn hit(&self, ray: &Ray, slot: usize) -> Option<RayHit> {
        let tri = &self.triangles[slot];
        let [p0, p1, p2] = tri.points;
        let (t, front_facing) = ray.intersect_triangle(&tri.points)?;
        let normal = (p1 - p0).cross(&(p2 - p0));
        Some(RayHit::new(t, ray.at(t), normal, tri.face, front_facing))
    }

    /// Report every pair of triangles whose bounding boxes overlap.
    ///
    /// `other_to_self` maps `other`'s frame into this BVH's frame. The
    /// callback receives `(face in self, face in other)`; exact intersection
    /// is left to the caller.
    pub fn bvhcast(
        &self,
        other: &Bvh,
        other_to_self: &Transform,
        mut callback: impl FnMut(FaceId, FaceId),
    ) {
        let (Some(a), Some(b)) = (&self.root, &other.root) else {
            return;
        };
        self.cast_nodes(a, other, b, other_to_self, &mut callback);
    }

    fn cast_nodes(
        &self,
        a: &BvhNode,
        other: &Bvh,
        b: &BvhNode,
        other_to_self: &Transform,
        callback: &mut dyn FnMut(FaceId, FaceId),
    ) {
        if !a.aabb().overlaps(&b.aabb().transformed(other_to_self)) {
            return;
        }

        match (a, b) {
            (BvhNode::Leaf { triangles: ta, .. }, BvhNode::Leaf { triangles: tb, .. }) => {
                for &ib in tb {
                    let tri_b = &other.triangles[ib];
                    let box_b = tri_b.aabb.transformed(other_to_self);
                    for &ia in ta {
                        let tri_a = &self.triangles[ia];
                        if tri_a.aabb.overlaps(&box_b) {
                            callback(tri_a.face, tri_b.face);
                        }
                    }
                }
            }
            (BvhNode::Internal { left, right, .. }, BvhNode::Leaf { .. }) => {
                self.cast_nodes(left, other, b, other_to_self, callback);
                self.cast_nodes(right, other, b, other_to_self, callback);
            }
            (_, BvhNode::Internal { left, right, .. }) => {
                self.cast_nodes(a, other, left, other_to_self, callback);
                self.cast_nodes(a, other, right, other_to_self, callback);
            }
        }
    }
}

/// Relative cost of visiting an internal node, against one triangle test.
const TRAVERSAL_COST: f64 = 0.125;

fn bounds_of(triangles: &[BvhTriangle], slots: &[usize]) -> Aabb3 {
    let mut bounds = Aabb3::empty();
    for &slot in slots {
        bounds.include_aabb(&triangles[slot].aabb);
    }
    bounds
}

fn build_node(triangles: &[BvhTriangle], slots: &mut [usize]) -> BvhNode {
    let aabb = bounds_of(triangles, slots);
    if slots.len() <= MAX_LEAF_TRIANGLES {
        return BvhNode::Leaf {
            aabb,
            triangles: slots.to_vec(),
        };
    }

    let (axis, at) = sah_split(triangles, slots, &aabb);
    slots.sort_unstable_by(|&a, &b| {
        triangles[a].centroid[axis].total_cmp(&triangles[b].centroid[axis])
    });
    let (left, right) = slots.split_at_mut(at);

    BvhNode::Internal {
        aabb,
        left: Box::new(build_node(triangles, left)),
        right: Box::new(build_node(triangles, right)),
    }
}

/// Axis and split index of the cheapest surface-area split.
///
/// Slots are ordered by centroid along each axis in turn; prefix and suffix
/// boxes give the cost of every cut. Ties and flat axes fall back to a
/// median cut on the first axis.
fn sah_split(triangles: &[BvhTriangle], slots: &mut [usize], bounds: &Aabb3) -> (usize, usize) {
    let n = slots.len();
    let area = bounds.surface_area().max(f64::MIN_POSITIVE);
    let mut best = (0, n / 2, f64::INFINITY);

    let mut suffix = vec![0.0; n];
    for axis in 0..3 {
        if bounds.max[axis] - bounds.min[axis] < 1e-10 {
            continue;
        }
        slots.sort_unstable_by(|&a, &b| {
            triangles[a].centroid[axis].total_cmp(&triangles[b].centroid[axis])
        });

        let mut right = Aabb3::empty();
        for i in (1..n).rev() {
            right.include_aabb(&triangles[slots[i]].aabb);
            suffix[i] = right.surface_area();
        }

        let mut left = Aabb3::empty();
        for i in 1..n {
            left.include_aabb(&triangles[slots[i - 1]].aabb);
            let cost = TRAVERSAL_COST
                + (left.surface_area() * i as f64 + suffix[i] * (n - i) as f64) / area;
            if cost < best.2 {
                best = (axis, i, cost);
            }
        }
    }
    (best.0, best.1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{make_box, make_plane};
    use viewmap_math::Vec3;

    #[test]
    fn test_bvh_build() {
        let cube = make_box(10.0, 10.0, 10.0).unwrap();
        let bvh = Bvh::build(&cube);
        assert!(bvh.root().is_some());
        assert_eq!(bvh.len(), 12);
    }

    #[test]
    fn test_trace_enters_and_leaves_box() {
        let cube = make_box(10.0, 10.0, 10.0).unwrap();
        let bvh = Bvh::build(&cube);

        // Enters through z = -5, leaves through z = 5
        let ray = Ray::new(Point3::new(1.0, 2.0, -15.0), Vec3::new(0.0, 0.0, 1.0));

        let hits = bvh.trace(&ray);
        assert_eq!(hits.len(), 2);
        assert!((hits[0].point.z + 5.0).abs() < 1e-8);
        assert!(hits[0].front_facing);
        assert!((hits[1].point.z - 5.0).abs() < 1e-8);
        assert!(!hits[1].front_facing);
    }

    #[test]
    fn test_trace_beside_box() {
        let cube = make_box(10.0, 10.0, 10.0).unwrap();
        let bvh = Bvh::build(&cube);
        let ray = Ray::new(Point3::new(50.0, 50.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(bvh.trace(&ray).is_empty());
    }

    #[test]
    fn test_bvh_trace_closest_with_filter() {
        let cube = make_box(10.0, 10.0, 10.0).unwrap();
        let bvh = Bvh::build(&cube);
        let ray = Ray::new(Point3::new(1.0, 2.0, -15.0), Vec3::new(0.0, 0.0, 1.0));

        let closest = bvh.trace_closest(&ray, |_| true).unwrap();
        assert!((closest.point.z + 5.0).abs() < 1e-8);

        let back_only = bvh.trace_closest(&ray, |hit| !hit.front_facing).unwrap();
        assert!((back_only.point.z - 5.0).abs() < 1e-8);
    }

    #[test]
    fn test_bvhcast_reports_overlapping_pairs() {
        let cube = make_box(1.0, 1.0, 1.0).unwrap();
        let plane = make_plane(10.0, 10.0).unwrap();
        let a = Bvh::build(&cube);
        let b = Bvh::build(&plane);

        let mut pairs = Vec::new();
        a.bvhcast(&b, &Transform::identity(), |fa, fb| pairs.push((fa, fb)));
        // The z=0 plane crosses the 8 side triangles of the cube
        let mut cube_faces: Vec<_> = pairs.iter().map(|(fa, _)| *fa).collect();
        cube_faces.sort();
        cube_faces.dedup();
        assert_eq!(cube_faces.len(), 8);

        // Lift the plane well above the cube: no pairs
        let mut far = 0;
        a.bvhcast(&b, &Transform::translation(0.0, 0.0, 3.0), |_, _| far += 1);
        assert_eq!(far, 0);
    }
}
