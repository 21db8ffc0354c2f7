//! Triangle-triangle intersection.
//!
//! For triangles in general position the intersection lies on the line
//! where their planes meet; its endpoints are the points where one
//! triangle's edges pierce the other's plane while staying inside the other
//! triangle. Coplanar pairs are clipped against each other in 2D and
//! reported as a convex polygon.

use viewmap_math::{Point2, Point3, Vec3};

/// Distances under this are treated as zero.
pub const TRI_TRI_EPSILON: f64 = 1e-10;

/// Result of intersecting two triangles.
#[derive(Debug, Clone, PartialEq)]
pub enum TriTriIntersection {
    /// Disjoint.
    None,
    /// Touching in a single point.
    Point(Point3),
    /// Crossing along a segment.
    Segment(Point3, Point3),
    /// Coplanar overlap, as a convex polygon in winding order.
    Coplanar(Vec<Point3>),
}

impl TriTriIntersection {
    /// Number of intersection points (0, 1, 2 or the polygon size).
    pub fn num_points(&self) -> usize {
        match self {
            TriTriIntersection::None => 0,
            TriTriIntersection::Point(_) => 1,
            TriTriIntersection::Segment(..) => 2,
            TriTriIntersection::Coplanar(poly) => poly.len(),
        }
    }

    /// The intersection as a list of segments: one for a crossing, the
    /// closed sequence of polygon edges for a coplanar overlap.
    pub fn segments(&self) -> Vec<(Point3, Point3)> {
        match self {
            TriTriIntersection::None | TriTriIntersection::Point(_) => Vec::new(),
            TriTriIntersection::Segment(a, b) => vec![(*a, *b)],
            TriTriIntersection::Coplanar(poly) => (0..poly.len())
                .map(|i| (poly[i], poly[(i + 1) % poly.len()]))
                .collect(),
        }
    }
}

/// Intersect triangles `p` and `q`, given in the same frame.
pub fn intersect_triangles(p: &[Point3; 3], q: &[Point3; 3]) -> TriTriIntersection {
    let Some(nq) = unit_normal(q) else {
        return TriTriIntersection::None;
    };
    let Some(np) = unit_normal(p) else {
        return TriTriIntersection::None;
    };

    let dp = p.map(|v| signed_distance(&v, &q[0], &nq));
    if dp.iter().all(|d| d.abs() < TRI_TRI_EPSILON) {
        return coplanar_intersection(p, q, &nq);
    }
    if same_strict_side(&dp) {
        return TriTriIntersection::None;
    }

    let dq = q.map(|v| signed_distance(&v, &p[0], &np));
    if same_strict_side(&dq) {
        return TriTriIntersection::None;
    }

    let mut pts: Vec<Point3> = Vec::new();
    collect_plane_crossings(p, &dp, q, &nq, &mut pts);
    collect_plane_crossings(q, &dq, p, &np, &mut pts);

    let mut uniq: Vec<Point3> = Vec::new();
    for pt in pts {
        if !uniq.iter().any(|u| (u - pt).norm() < TRI_TRI_EPSILON) {
            uniq.push(pt);
        }
    }

    match uniq.len() {
        0 => TriTriIntersection::None,
        1 => TriTriIntersection::Point(uniq[0]),
        2 => TriTriIntersection::Segment(uniq[0], uniq[1]),
        _ => {
            // More than 2 points - select the two most distant points
            let mut best = (0, 1);
            let mut best_d = 0.0;
            for i in 0..uniq.len() {
                for j in (i + 1)..uniq.len() {
                    let d = (uniq[j] - uniq[i]).norm_squared();
                    if d > best_d {
                        best_d = d;
                        best = (i, j);
                    }
                }
            }
            TriTriIntersection::Segment(uniq[best.0], uniq[best.1])
        }
    }
}

fn unit_normal(t: &[Point3; 3]) -> Option<Vec3> {
    let n = (t[1] - t[0]).cross(&(t[2] - t[0]));
    let len = n.norm();
    if len < TRI_TRI_EPSILON {
        None
    } else {
        Some(n / len)
    }
}

fn signed_distance(p: &Point3, origin: &Point3, normal: &Vec3) -> f64 {
    normal.dot(&(p - origin))
}

fn same_strict_side(d: &[f64; 3]) -> bool {
    d.iter().all(|&x| x > TRI_TRI_EPSILON) || d.iter().all(|&x| x < -TRI_TRI_EPSILON)
}

/// Points where the edges of `tri` meet the plane of `other`, kept when
/// they lie inside `other`.
fn collect_plane_crossings(
    tri: &[Point3; 3],
    dist: &[f64; 3],
    other: &[Point3; 3],
    other_normal: &Vec3,
    out: &mut Vec<Point3>,
) {
    for i in 0..3 {
        let j = (i + 1) % 3;
        let (da, db) = (dist[i], dist[j]);
        let a_on = da.abs() < TRI_TRI_EPSILON;
        let b_on = db.abs() < TRI_TRI_EPSILON;

        let crossing = if a_on {
            Some(tri[i])
        } else if b_on {
            Some(tri[j])
        } else if da * db < 0.0 {
            let t = da / (da - db);
            Some(tri[i] + (tri[j] - tri[i]) * t)
        } else {
            None
        };

        if let Some(pt) = crossing {
            if point_in_triangle(&pt, other, other_normal) {
                out.push(pt);
            }
        }
    }
}

/// Whether `p` (assumed on the triangle's plane) lies inside or on the triangle.
fn point_in_triangle(p: &Point3, tri: &[Point3; 3], normal: &Vec3) -> bool {
    (0..3).all(|i| {
        let a = tri[i];
        let b = tri[(i + 1) % 3];
        let edge = b - a;
        let len = edge.norm();
        if len == 0.0 {
            return false;
        }
        // Signed distance of p from the edge, positive inside
        normal.cross(&edge).dot(&(p - a)) / len >= -TRI_TRI_EPSILON
    })
}

/// Index pair of the axes to keep when projecting along `n`.
fn coplanar_axes(n: &Vec3) -> (usize, usize) {
    let na = [n.x.abs(), n.y.abs(), n.z.abs()];
    if na[0] >= na[1] && na[0] >= na[2] {
        (1, 2)
    } else if na[1] >= na[2] {
        (2, 0)
    } else {
        (0, 1)
    }
}

fn coplanar_intersection(p: &[Point3; 3], q: &[Point3; 3], n: &Vec3) -> TriTriIntersection {
    let (i0, i1) = coplanar_axes(n);
    let project = |v: &Point3| Point2::new(v[i0], v[i1]);

    let mut subject: Vec<Point2> = p.iter().map(project).collect();
    let mut clip: Vec<Point2> = q.iter().map(project).collect();
    if signed_area(&subject) < 0.0 {
        subject.reverse();
    }
    if signed_area(&clip) < 0.0 {
        clip.reverse();
    }

    // Sutherland-Hodgman against each edge of the clip triangle
    let mut poly = subject;
    for k in 0..3 {
        let a = clip[k];
        let b = clip[(k + 1) % 3];
        let inside = |pt: &Point2| cross2(&a, &b, pt) >= -TRI_TRI_EPSILON;
        let input = std::mem::take(&mut poly);
        for i in 0..input.len() {
            let cur = input[i];
            let prev = input[(i + input.len() - 1) % input.len()];
            match (inside(&prev), inside(&cur)) {
                (true, true) => poly.push(cur),
                (true, false) => poly.push(line_hit(&prev, &cur, &a, &b)),
                (false, true) => {
                    poly.push(line_hit(&prev, &cur, &a, &b));
                    poly.push(cur);
                }
                (false, false) => {}
            }
        }
        if poly.is_empty() {
            return TriTriIntersection::None;
        }
    }

    let mut uniq: Vec<Point2> = Vec::new();
    for pt in poly {
        if !uniq.iter().any(|u| (u - pt).norm() < TRI_TRI_EPSILON) {
            uniq.push(pt);
        }
    }

    // Lift back onto p's plane by solving for the dropped coordinate
    let drop = 3 - i0 - i1;
    let lift = |pt: &Point2| {
        let mut v = Point3::origin();
        v[i0] = pt.x;
        v[i1] = pt.y;
        v[drop] = p[0][drop]
            - (n[i0] * (pt.x - p[0][i0]) + n[i1] * (pt.y - p[0][i1])) / n[drop];
        v
    };
    let lifted: Vec<Point3> = uniq.iter().map(lift).collect();

    match lifted.len() {
        0 => TriTriIntersection::None,
        1 => TriTriIntersection::Point(lifted[0]),
        2 => TriTriIntersection::Segment(lifted[0], lifted[1]),
        _ => TriTriIntersection::Coplanar(lifted),
    }
}

fn cross2(a: &Point2, b: &Point2, p: &Point2) -> f64 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

fn signed_area(poly: &[Point2]) -> f64 {
    let n = poly.len();
    (0..n)
        .map(|i| {
            let a = poly[i];
            let b = poly[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum::<f64>()
        / 2.0
}

/// Intersection of segment `p0 → p1` with the infinite line `a → b`.
fn line_hit(p0: &Point2, p1: &Point2, a: &Point2, b: &Point2) -> Point2 {
    let d0 = cross2(a, b, p0);
    let d1 = cross2(a, b, p1);
    let denom = d0 - d1;
    if denom.abs() < f64::EPSILON {
        return *p0;
    }
    let t = d0 / denom;
    p0 + (p1 - p0) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tri(a: [f64; 3], b: [f64; 3], c: [f64; 3]) -> [Point3; 3] {
        [
            Point3::new(a[0], a[1], a[2]),
            Point3::new(b[0], b[1], b[2]),
            Point3::new(c[0], c[1], c[2]),
        ]
    }

    #[test]
    fn test_disjoint() {
        let a = tri([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        let b = tri([0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [0.0, 1.0, 1.0]);
        assert_eq!(intersect_triangles(&a, &b), TriTriIntersection::None);
    }

    #[test]
    fn test_crossing_segment() {
        // Horizontal triangle pierced by a vertical one along x in [0.2, 0.6]
        let a = tri([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        let b = tri([0.2, 0.25, -1.0], [0.6, 0.25, -1.0], [0.4, 0.25, 1.0]);
        match intersect_triangles(&a, &b) {
            TriTriIntersection::Segment(s, e) => {
                let (lo, hi) = if s.x < e.x { (s, e) } else { (e, s) };
                assert!((lo.x - 0.3).abs() < 1e-9, "lo = {lo:?}");
                assert!((hi.x - 0.5).abs() < 1e-9, "hi = {hi:?}");
                assert!(lo.z.abs() < 1e-12 && hi.z.abs() < 1e-12);
                assert!((lo.y - 0.25).abs() < 1e-12);
            }
            other => panic!("expected segment, got {other:?}"),
        }
    }

    #[test]
    fn test_touching_vertex_is_a_point() {
        let a = tri([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        let b = tri([0.2, 0.2, 0.0], [0.2, 0.2, 1.0], [0.5, 0.9, 1.0]);
        let result = intersect_triangles(&a, &b);
        assert_eq!(result.num_points(), 1);
        assert!(result.segments().is_empty());
    }

    #[test]
    fn test_coplanar_overlap() {
        let a = tri([0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 2.0, 0.0]);
        let b = tri([0.5, 0.5, 0.0], [3.0, 0.5, 0.0], [0.5, 3.0, 0.0]);
        match intersect_triangles(&a, &b) {
            TriTriIntersection::Coplanar(poly) => {
                assert_eq!(poly.len(), 3);
                assert!(poly.iter().all(|p| p.z.abs() < 1e-12));
            }
            other => panic!("expected polygon, got {other:?}"),
        }
    }
}
