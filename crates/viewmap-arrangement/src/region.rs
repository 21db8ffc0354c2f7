//! Regions of an arrangement: an outer contour with optional holes.

use serde::{Deserialize, Serialize};
use viewmap_math::Point2;

use crate::error::{ArrangementError, Result};

/// Image-space tolerance in pixels.
///
/// Interior-point scans scale it by the contour extent.
pub const IMAGE_EPSILON: f64 = 1e-6;

/// Signed area of a closed contour (positive when counter-clockwise).
pub fn contour_area(contour: &[Point2]) -> f64 {
    let n = contour.len();
    if n < 3 {
        return 0.0;
    }
    let mut area = 0.0;
    for i in 0..n {
        let a = contour[i];
        let b = contour[(i + 1) % n];
        area += a.x * b.y - b.x * a.y;
    }
    area / 2.0
}

/// Point-in-polygon test using ray casting.
pub fn point_in_contour(p: &Point2, contour: &[Point2]) -> bool {
    let n = contour.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;

    let mut j = n - 1;
    for i in 0..n {
        let vi = &contour[i];
        let vj = &contour[j];

        if ((vi.y > p.y) != (vj.y > p.y))
            && (p.x < (vj.x - vi.x) * (p.y - vi.y) / (vj.y - vi.y) + vi.x)
        {
            inside = !inside;
        }

        j = i;
    }

    inside
}

/// A bounded face of an arrangement.
///
/// The outer contour runs counter-clockwise, holes run clockwise, so
/// [`Region::signed_area`] is the filled area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Outer contour.
    pub outer: Vec<Point2>,
    /// Hole contours.
    pub holes: Vec<Vec<Point2>>,
}

impl Region {
    /// Region without holes.
    pub fn new(outer: Vec<Point2>) -> Self {
        Self {
            outer,
            holes: Vec::new(),
        }
    }

    /// Filled area: outer area plus the (negative) hole areas.
    pub fn signed_area(&self) -> f64 {
        contour_area(&self.outer) + self.holes.iter().map(|h| contour_area(h)).sum::<f64>()
    }

    /// Whether `p` lies inside the outer contour and outside every hole.
    pub fn contains(&self, p: &Point2) -> bool {
        point_in_contour(p, &self.outer) && !self.holes.iter().any(|h| point_in_contour(p, h))
    }

    /// A point strictly inside the region.
    ///
    /// Scans horizontal lines halfway between consecutive vertex heights.
    /// Heights closer than [`IMAGE_EPSILON`] times the contour extent are
    /// merged and slabs thinner than that are skipped. The result is the
    /// midpoint of the inside interval whose `min(width, slab height)` is
    /// largest, which keeps it clear of the boundary in both directions.
    pub fn interior_point(&self) -> Result<Point2> {
        if self.outer.len() < 3 {
            return Err(ArrangementError::DegenerateContour {
                vertices: self.outer.len(),
            });
        }

        let contours = || std::iter::once(&self.outer).chain(self.holes.iter());

        let mut ys: Vec<f64> = contours().flatten().map(|p| p.y).collect();
        ys.sort_by(f64::total_cmp);
        let (lo, hi) = match (ys.first(), ys.last()) {
            (Some(&lo), Some(&hi)) => (lo, hi),
            _ => return Err(ArrangementError::NoInteriorPoint { area: 0.0 }),
        };
        let tol = IMAGE_EPSILON * (hi - lo).abs().max(1.0);
        ys.dedup_by(|a, b| (*a - *b).abs() < tol);

        let mut best: Option<(f64, Point2)> = None;
        for pair in ys.windows(2) {
            let height = pair[1] - pair[0];
            if height < tol {
                continue;
            }
            let y = (pair[0] + pair[1]) / 2.0;

            let mut xs: Vec<f64> = Vec::new();
            for contour in contours() {
                let n = contour.len();
                for i in 0..n {
                    let a = contour[i];
                    let b = contour[(i + 1) % n];
                    if (a.y > y) != (b.y > y) {
                        xs.push(a.x + (y - a.y) * (b.x - a.x) / (b.y - a.y));
                    }
                }
            }
            xs.sort_by(f64::total_cmp);

            for span in xs.chunks_exact(2) {
                let score = (span[1] - span[0]).min(height);
                if best.map_or(true, |(s, _)| score > s) {
                    best = Some((score, Point2::new((span[0] + span[1]) / 2.0, y)));
                }
            }
        }

        match best {
            Some((score, p)) if score > tol && self.contains(&p) => Ok(p),
            _ => Err(ArrangementError::NoInteriorPoint {
                area: self.signed_area(),
            }),
        }
    }
}

/// Distance to the nearest contour edge.
pub fn distance_to_contour(p: &Point2, contour: &[Point2]) -> f64 {
    let n = contour.len();
    (0..n)
        .map(|i| {
            let a = contour[i];
            let b = contour[(i + 1) % n];
            let ab = b - a;
            let len2 = ab.norm_squared();
            let t = if len2 > 0.0 {
                ((p - a).dot(&ab) / len2).clamp(0.0, 1.0)
            } else {
                0.0
            };
            (p - (a + ab * t)).norm()
        })
        .fold(f64::INFINITY, f64::min)
}
