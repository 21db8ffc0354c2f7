//! Rays against boxes and triangles.

use viewmap_math::{Dir3, Point3, Vec3};

use crate::bbox::Aabb3;
use crate::halfedge::FaceId;

/// Determinant threshold under which a ray counts as parallel to a triangle.
const PARALLEL_EPSILON: f64 = 1e-12;

/// Half-line `origin + t * direction`, `t >= 0`.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Start of the ray.
    pub origin: Point3,
    /// Unit direction.
    pub direction: Dir3,
    recip: Vec3,
}

impl Ray {
    /// Ray from `origin` along `direction`, which need not be normalized.
    pub fn new(origin: Point3, direction: Vec3) -> Self {
        let direction = Dir3::new_normalize(direction);
        let recip = direction.map(|c| 1.0 / c);
        Self {
            origin,
            direction,
            recip,
        }
    }

    /// Position at parameter `t`.
    #[inline]
    pub fn at(&self, t: f64) -> Point3 {
        self.origin + self.direction.into_inner() * t
    }

    /// Entry and exit parameters through `aabb`, clamped to the ray's start.
    ///
    /// Zero direction components give infinite reciprocals, which the slab
    /// comparisons handle without a special case.
    #[inline]
    pub fn intersect_aabb(&self, aabb: &Aabb3) -> Option<(f64, f64)> {
        let mut enter = f64::NEG_INFINITY;
        let mut exit = f64::INFINITY;
        for axis in 0..3 {
            let lo = (aabb.min[axis] - self.origin[axis]) * self.recip[axis];
            let hi = (aabb.max[axis] - self.origin[axis]) * self.recip[axis];
            enter = enter.max(lo.min(hi));
            exit = exit.min(lo.max(hi));
        }
        (exit >= enter && exit >= 0.0).then(|| (enter.max(0.0), exit))
    }

    /// Möller-Trumbore test against a triangle, from either side.
    ///
    /// Returns `t` and whether the counter-clockwise side faces the ray.
    /// Hits behind the origin are rejected.
    pub fn intersect_triangle(&self, tri: &[Point3; 3]) -> Option<(f64, bool)> {
        let d = self.direction.as_ref();
        let e1 = tri[1] - tri[0];
        let e2 = tri[2] - tri[0];
        let p = d.cross(&e2);
        let det = e1.dot(&p);
        if det.abs() < PARALLEL_EPSILON {
            return None;
        }
        let inv_det = det.recip();
        let s = self.origin - tri[0];
        let u = s.dot(&p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }
        let q = s.cross(&e1);
        let v = d.dot(&q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }
        let t = e2.dot(&q) * inv_det;
        // det > 0: travelling against the counter-clockwise normal
        (t >= 0.0).then_some((t, det > 0.0))
    }
}

/// A ray-triangle hit.
#[derive(Debug, Clone, Copy)]
pub struct RayHit {
    /// Ray parameter.
    pub t: f64,
    /// Hit position.
    pub point: Point3,
    /// Geometric normal of the triangle.
    pub normal: Vec3,
    /// Triangle that was hit.
    pub face_id: FaceId,
    /// Whether the triangle's front side faced the ray.
    pub front_facing: bool,
}

impl RayHit {
    /// Bundle a hit.
    pub fn new(t: f64, point: Point3, normal: Vec3, face_id: FaceId, front_facing: bool) -> Self {
        Self {
            t,
            point,
            normal,
            face_id,
            front_facing,
        }
    }
}
