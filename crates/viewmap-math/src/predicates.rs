//! Epsilon-guarded orientation predicates.
//!
//! These are plain floating-point determinants with a dead zone around
//! zero: anything whose magnitude falls under the epsilon is reported as
//! [`Sign::Zero`] (coplanar / colinear).

use nalgebra::Matrix4;

use crate::{Point2, Point3};

/// Default dead zone for [`orient3d`] and [`orient2d`].
pub const ORIENTATION_EPSILON: f64 = 1e-10;

/// Result of an orientation predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sign {
    /// Strictly positive side.
    Positive,
    /// Strictly negative side.
    Negative,
    /// Within the epsilon band around zero.
    Zero,
}

impl Sign {
    /// Classify a raw determinant value.
    pub fn of(value: f64, epsilon: f64) -> Self {
        if value > epsilon {
            Sign::Positive
        } else if value < -epsilon {
            Sign::Negative
        } else {
            Sign::Zero
        }
    }

    /// `+1`, `-1` or `0`.
    pub fn as_i8(self) -> i8 {
        match self {
            Sign::Positive => 1,
            Sign::Negative => -1,
            Sign::Zero => 0,
        }
    }

    /// The opposite sign.
    pub fn flip(self) -> Self {
        match self {
            Sign::Positive => Sign::Negative,
            Sign::Negative => Sign::Positive,
            Sign::Zero => Sign::Zero,
        }
    }
}

/// Which side of the plane through `a`, `b`, `c` the point `d` lies on.
///
/// Evaluates the 4x4 determinant of the homogeneous coordinates of the four
/// points. The result is [`Sign::Positive`] when `d` lies on the side the
/// counter-clockwise normal `(b - a) × (c - a)` points to, i.e. when the
/// triangle `abc` is seen front-facing from `d`.
pub fn orient3d(a: &Point3, b: &Point3, c: &Point3, d: &Point3) -> Sign {
    orient3d_eps(a, b, c, d, ORIENTATION_EPSILON)
}

/// [`orient3d`] with an explicit dead zone.
pub fn orient3d_eps(a: &Point3, b: &Point3, c: &Point3, d: &Point3, epsilon: f64) -> Sign {
    #[rustfmt::skip]
    let m = Matrix4::new(
        a.x, a.y, a.z, 1.0,
        b.x, b.y, b.z, 1.0,
        c.x, c.y, c.z, 1.0,
        d.x, d.y, d.z, 1.0,
    );
    // det(m) = -(d - a) · ((b - a) × (c - a))
    Sign::of(-m.determinant(), epsilon)
}

/// Which side of the directed line `a → b` the point `c` lies on.
///
/// [`Sign::Positive`] when `c` is to the left (counter-clockwise turn).
pub fn orient2d(a: &Point2, b: &Point2, c: &Point2) -> Sign {
    let det = (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x);
    Sign::of(det, ORIENTATION_EPSILON)
}
