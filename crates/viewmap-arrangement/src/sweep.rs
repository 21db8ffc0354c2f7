//! Pairwise segment intersection with an x-sorted sweep.
//!
//! Segments are visited in order of their leftmost x coordinate while an
//! active list keeps every segment whose x extent still reaches the current
//! one. Only active pairs are tested exactly, which keeps the common case of
//! many short, spatially scattered segments close to linear.

use viewmap_math::{Point2, Vec2};

/// A 2D line segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment2 {
    /// Start point.
    pub a: Point2,
    /// End point.
    pub b: Point2,
}

impl Segment2 {
    /// Create a segment from two endpoints.
    pub fn new(a: Point2, b: Point2) -> Self {
        Self { a, b }
    }

    /// Direction vector `b - a`.
    pub fn direction(&self) -> Vec2 {
        self.b - self.a
    }

    /// Segment length.
    pub fn length(&self) -> f64 {
        self.direction().norm()
    }

    /// Smallest x coordinate.
    pub fn min_x(&self) -> f64 {
        self.a.x.min(self.b.x)
    }

    /// Largest x coordinate.
    pub fn max_x(&self) -> f64 {
        self.a.x.max(self.b.x)
    }

    /// Point at parameter `t` (0 at `a`, 1 at `b`).
    pub fn point_at(&self, t: f64) -> Point2 {
        self.a + self.direction() * t
    }

    /// Parameter of the projection of `p` onto the segment's line.
    pub fn param_of(&self, p: &Point2) -> f64 {
        let d = self.direction();
        let len2 = d.norm_squared();
        if len2 == 0.0 {
            return 0.0;
        }
        (p - self.a).dot(&d) / len2
    }

    fn overlaps_y(&self, other: &Segment2, eps: f64) -> bool {
        self.a.y.min(self.b.y) <= other.a.y.max(other.b.y) + eps
            && other.a.y.min(other.b.y) <= self.a.y.max(self.b.y) + eps
    }
}

/// How two segments meet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SegmentIntersection {
    /// Disjoint.
    None,
    /// A single shared point: a proper crossing, a T-junction or touching
    /// endpoints. `t` and `u` are the parameters on the first and second
    /// segment.
    Point {
        /// Intersection point.
        point: Point2,
        /// Parameter along the first segment, in `[0, 1]`.
        t: f64,
        /// Parameter along the second segment, in `[0, 1]`.
        u: f64,
    },
    /// Colinear segments sharing a stretch of positive length.
    Overlap {
        /// Start of the shared stretch.
        start: Point2,
        /// End of the shared stretch.
        end: Point2,
    },
}

fn cross(a: &Vec2, b: &Vec2) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Intersect two segments, treating distances under `eps` as zero.
pub fn intersect_segments(s: &Segment2, o: &Segment2, eps: f64) -> SegmentIntersection {
    let d = s.direction();
    let e = o.direction();
    let len_d = d.norm();
    let len_e = e.norm();
    if len_d <= eps || len_e <= eps {
        return SegmentIntersection::None;
    }

    let w = o.a - s.a;
    let denom = cross(&d, &e);

    if denom.abs() <= eps * len_d * len_e {
        // Parallel: only colinear segments can meet
        if cross(&d, &w).abs() / len_d > eps {
            return SegmentIntersection::None;
        }
        let t0 = s.param_of(&o.a);
        let t1 = s.param_of(&o.b);
        let lo = t0.min(t1).max(0.0);
        let hi = t0.max(t1).min(1.0);
        let gap = (hi - lo) * len_d;
        if gap < -eps {
            return SegmentIntersection::None;
        }
        if gap <= eps {
            let point = s.point_at(lo.clamp(0.0, 1.0));
            return SegmentIntersection::Point {
                point,
                t: lo.clamp(0.0, 1.0),
                u: o.param_of(&point).clamp(0.0, 1.0),
            };
        }
        return SegmentIntersection::Overlap {
            start: s.point_at(lo),
            end: s.point_at(hi),
        };
    }

    let t = cross(&w, &e) / denom;
    let u = cross(&w, &d) / denom;
    let eps_t = eps / len_d;
    let eps_u = eps / len_e;
    if t < -eps_t || t > 1.0 + eps_t || u < -eps_u || u > 1.0 + eps_u {
        return SegmentIntersection::None;
    }

    let t = t.clamp(0.0, 1.0);
    SegmentIntersection::Point {
        point: s.point_at(t),
        t,
        u: u.clamp(0.0, 1.0),
    }
}

/// An intersecting pair found by [`find_intersections`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepHit {
    /// Index of the first segment (always the smaller index).
    pub first: usize,
    /// Index of the second segment.
    pub second: usize,
    /// How the two segments meet, parameterized relative to `first`.
    pub intersection: SegmentIntersection,
}

/// Every intersecting pair of segments, ordered by `(first, second)`.
pub fn find_intersections(segments: &[Segment2], eps: f64) -> Vec<SweepHit> {
    let mut order: Vec<usize> = (0..segments.len()).collect();
    order.sort_by(|&i, &j| segments[i].min_x().total_cmp(&segments[j].min_x()));

    let mut active: Vec<usize> = Vec::new();
    let mut hits = Vec::new();

    for &i in &order {
        let seg = &segments[i];
        active.retain(|&j| segments[j].max_x() >= seg.min_x() - eps);

        for &j in &active {
            if !seg.overlaps_y(&segments[j], eps) {
                continue;
            }
            let (first, second) = if i < j { (i, j) } else { (j, i) };
            let intersection = intersect_segments(&segments[first], &segments[second], eps);
            if intersection != SegmentIntersection::None {
                hits.push(SweepHit {
                    first,
                    second,
                    intersection,
                });
            }
        }
        active.push(i);
    }

    hits.sort_by_key(|h| (h.first, h.second));
    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(ax: f64, ay: f64, bx: f64, by: f64) -> Segment2 {
        Segment2::new(Point2::new(ax, ay), Point2::new(bx, by))
    }

    #[test]
    fn test_proper_crossing() {
        let r = intersect_segments(&seg(0.0, 0.0, 2.0, 2.0), &seg(0.0, 2.0, 2.0, 0.0), 1e-9);
        match r {
            SegmentIntersection::Point { point, t, u } => {
                assert!((point.x - 1.0).abs() < 1e-12);
                assert!((point.y - 1.0).abs() < 1e-12);
                assert!((t - 0.5).abs() < 1e-12);
                assert!((u - 0.5).abs() < 1e-12);
            }
            other => panic!("expected point, got {other:?}"),
        }
    }

    #[test]
    fn test_t_junction() {
        let r = intersect_segments(&seg(0.0, 0.0, 4.0, 0.0), &seg(1.0, 0.0, 1.0, 3.0), 1e-9);
        match r {
            SegmentIntersection::Point { t, u, .. } => {
                assert!((t - 0.25).abs() < 1e-12);
                assert!(u.abs() < 1e-12);
            }
            other => panic!("expected point, got {other:?}"),
        }
    }

    #[test]
    fn test_parallel_and_disjoint() {
        assert_eq!(
            intersect_segments(&seg(0.0, 0.0, 1.0, 0.0), &seg(0.0, 1.0, 1.0, 1.0), 1e-9),
            SegmentIntersection::None
        );
        assert_eq!(
            intersect_segments(&seg(0.0, 0.0, 1.0, 0.0), &seg(2.0, -1.0, 2.0, 1.0), 1e-9),
            SegmentIntersection::None
        );
    }

    #[test]
    fn test_colinear_overlap() {
        let r = intersect_segments(&seg(0.0, 0.0, 3.0, 0.0), &seg(2.0, 0.0, 5.0, 0.0), 1e-9);
        match r {
            SegmentIntersection::Overlap { start, end } => {
                assert!((start.x - 2.0).abs() < 1e-12);
                assert!((end.x - 3.0).abs() < 1e-12);
            }
            other => panic!("expected overlap, got {other:?}"),
        }
    }

    #[test]
    fn test_sweep_finds_all_pairs() {
        // A square plus one diagonal: 4 corners shared, diagonal touches 2 corners
        let segments = vec![
            seg(0.0, 0.0, 1.0, 0.0),
            seg(1.0, 0.0, 1.0, 1.0),
            seg(1.0, 1.0, 0.0, 1.0),
            seg(0.0, 1.0, 0.0, 0.0),
            seg(0.0, 0.0, 1.0, 1.0),
            seg(5.0, 5.0, 6.0, 6.0),
        ];
        let hits = find_intersections(&segments, 1e-9);
        let pairs: Vec<(usize, usize)> = hits.iter().map(|h| (h.first, h.second)).collect();
        assert_eq!(
            pairs,
            vec![(0, 1), (0, 3), (0, 4), (1, 2), (1, 4), (2, 3), (2, 4), (3, 4)]
        );
    }
}
