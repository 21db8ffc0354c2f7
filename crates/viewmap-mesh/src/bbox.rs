//! Axis-aligned bounding boxes.
//!
//! The broadphase for BVH traversal: only triangle pairs whose boxes
//! overlap reach the exact triangle-triangle test.

use viewmap_math::{Point3, Transform};

/// Axis-aligned bounding box in 3D.
#[derive(Debug, Clone, Copy)]
pub struct Aabb3 {
    /// Smallest corner.
    pub min: Point3,
    /// Largest corner.
    pub max: Point3,
}

impl Aabb3 {
    /// Box spanning `min` to `max`.
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// Inverted box that any include turns into a valid one.
    pub fn empty() -> Self {
        Self::new(
            Point3::from([f64::INFINITY; 3]),
            Point3::from([f64::NEG_INFINITY; 3]),
        )
    }

    /// Tight box around a set of points.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Self {
        points.into_iter().fold(Self::empty(), |mut aabb, p| {
            aabb.include_point(p);
            aabb
        })
    }

    /// Grow to contain `p`.
    pub fn include_point(&mut self, p: &Point3) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }

    /// Grow to contain `other`.
    pub fn include_aabb(&mut self, other: &Aabb3) {
        self.min = self.min.inf(&other.min);
        self.max = self.max.sup(&other.max);
    }

    /// True until something has been included.
    pub fn is_empty(&self) -> bool {
        (0..3).any(|axis| self.min[axis] > self.max[axis])
    }

    /// Overlap test; shared faces count.
    pub fn overlaps(&self, other: &Aabb3) -> bool {
        (0..3).all(|axis| self.min[axis] <= other.max[axis] && other.min[axis] <= self.max[axis])
    }

    /// Midpoint of the box.
    pub fn centroid(&self) -> Point3 {
        self.min + (self.max - self.min) * 0.5
    }

    /// Surface area, the SAH cost weight.
    pub fn surface_area(&self) -> f64 {
        let d = self.max - self.min;
        2.0 * (d.x * d.y + d.y * d.z + d.z * d.x)
    }

    /// Box around the eight corners mapped through `t`.
    pub fn transformed(&self, t: &Transform) -> Aabb3 {
        let corners = (0..8).map(|i: usize| {
            let pick = |axis: usize| {
                if i & (1 << axis) == 0 {
                    self.min[axis]
                } else {
                    self.max[axis]
                }
            };
            t.apply_point(&Point3::new(pick(0), pick(1), pick(2)))
        });
        let mut out = Aabb3::empty();
        for corner in corners {
            out.include_point(&corner);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit() -> Aabb3 {
        Aabb3::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_overlap_and_touch() {
        let touching = Aabb3::new(Point3::new(1.0, 0.5, 0.5), Point3::new(2.0, 2.0, 2.0));
        let apart = Aabb3::new(Point3::new(1.1, 0.5, 0.5), Point3::new(2.0, 2.0, 2.0));
        assert!(unit().overlaps(&touching));
        assert!(!unit().overlaps(&apart));
    }

    #[test]
    fn test_transformed_box() {
        let moved = unit().transformed(&Transform::translation(5.0, 0.0, 0.0));
        assert!((moved.min.x - 5.0).abs() < 1e-12);
        assert!((moved.max.x - 6.0).abs() < 1e-12);
        assert!((unit().surface_area() - 6.0).abs() < 1e-12);

        let turned = unit().transformed(&Transform::rotation_z(std::f64::consts::FRAC_PI_4));
        assert!((turned.max.y - 2f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_empty_box() {
        let mut a = Aabb3::empty();
        assert!(a.is_empty());
        a.include_point(&Point3::new(1.0, 2.0, 3.0));
        assert!(!a.is_empty());
        assert!((a.centroid() - Point3::new(1.0, 2.0, 3.0)).norm() < 1e-12);
    }
}
