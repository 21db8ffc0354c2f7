#![warn(missing_docs)]

//! Math types for the viewmap pipeline.
//!
//! Thin wrappers around nalgebra providing the point, vector and transform
//! types shared by the mesh, arrangement and viewmap crates, together with
//! the tolerance constants the line-drawing pipeline relies on.

use nalgebra::{Matrix3, Matrix4, Rotation3, Unit, Vector2, Vector3};

pub mod predicates;

pub use predicates::{orient2d, orient3d, Sign};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// Unit-length 3D direction.
pub type Dir3 = Unit<Vector3<f64>>;

/// A point in the image plane (pixels) or any other 2D space.
pub type Point2 = nalgebra::Point2<f64>;

/// A vector in 2D space.
pub type Vec2 = Vector2<f64>;

/// Placement of a mesh in the world, stored as a homogeneous matrix.
///
/// Matrices compose right to left: `a.then(&b)` maps through `b` first.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Homogeneous 4x4 matrix.
    pub matrix: Matrix4<f64>,
}

impl Transform {
    /// Identity transform.
    pub fn identity() -> Self {
        Self::from_matrix(Matrix4::identity())
    }

    /// Wrap an existing homogeneous matrix.
    pub fn from_matrix(matrix: Matrix4<f64>) -> Self {
        Self { matrix }
    }

    /// Translation by `(dx, dy, dz)`.
    pub fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        Self::from_matrix(Matrix4::new_translation(&Vec3::new(dx, dy, dz)))
    }

    /// Per-axis scale.
    pub fn scale(sx: f64, sy: f64, sz: f64) -> Self {
        Self::from_matrix(Matrix4::new_nonuniform_scaling(&Vec3::new(sx, sy, sz)))
    }

    /// Rotation of `angle` radians about `axis`.
    pub fn rotation(axis: &Vec3, angle: f64) -> Self {
        let axis = Unit::new_normalize(*axis);
        Self::from_matrix(Rotation3::from_axis_angle(&axis, angle).to_homogeneous())
    }

    /// Rotation about +X.
    pub fn rotation_x(angle: f64) -> Self {
        Self::rotation(&Vec3::x(), angle)
    }

    /// Rotation about +Z.
    pub fn rotation_z(angle: f64) -> Self {
        Self::rotation(&Vec3::z(), angle)
    }

    /// `self * other`: applies `other`, then `self`.
    pub fn then(&self, other: &Transform) -> Self {
        Self::from_matrix(self.matrix * other.matrix)
    }

    /// Map a position.
    pub fn apply_point(&self, p: &Point3) -> Point3 {
        self.matrix.transform_point(p)
    }

    /// Map a direction; translation is dropped.
    pub fn apply_vec(&self, v: &Vec3) -> Vec3 {
        self.matrix.transform_vector(v)
    }

    /// Map a surface normal through the inverse transpose of the linear part.
    ///
    /// Singular transforms leave the normal untouched.
    pub fn apply_normal(&self, n: &Vec3) -> Vec3 {
        let linear: Matrix3<f64> = self.matrix.fixed_view::<3, 3>(0, 0).into_owned();
        match linear.try_inverse() {
            Some(inv) => inv.transpose() * n,
            None => *n,
        }
    }

    /// Inverse, or `None` for a singular matrix.
    pub fn inverse(&self) -> Option<Self> {
        self.matrix.try_inverse().map(Self::from_matrix)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Distances used by the pipeline's geometric comparisons.
///
/// `linear` decides identity of positions and rejects degenerate segments;
/// `merge` is the cell size of the grid vertices are deduplicated on.
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    /// Two positions closer than this are the same point.
    pub linear: f64,
    /// Spatial hash cell size used to deduplicate vertices.
    pub merge: f64,
    /// Largest allowed distance of a split position from its edge.
    pub colinear: f64,
}

impl Tolerance {
    /// 1e-10 linear, 1e-6 merge grid, 1e-7 colinearity.
    pub const DEFAULT: Self = Self {
        linear: 1e-10,
        merge: 1e-6,
        colinear: 1e-7,
    };

    /// Whether `a` and `b` lie within `linear` of each other.
    pub fn points_equal(&self, a: &Point3, b: &Point3) -> bool {
        nalgebra::distance(a, b) < self.linear
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Unsigned angle from `a` to `b` in degrees. Zero-length input gives 0.
pub fn angle_between_degrees(a: &Vec3, b: &Vec3) -> f64 {
    if a.norm_squared() == 0.0 || b.norm_squared() == 0.0 {
        return 0.0;
    }
    a.angle(b).to_degrees()
}
