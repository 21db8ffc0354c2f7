use viewmap_arrangement::{Arrangement, PlanarArrangement, Segment2};
use viewmap_math::Point2;

fn polyline(points: &[(f64, f64)]) -> Vec<Segment2> {
    points
        .windows(2)
        .map(|w| Segment2::new(Point2::new(w[0].0, w[0].1), Point2::new(w[1].0, w[1].1)))
        .collect()
}

#[test]
fn hexagon_outline_with_inner_spokes() {
    // Projected cube silhouette: a hexagon split into three rhombi
    let s = 3f64.sqrt() / 2.0;
    let hex = [
        (0.0, 1.0),
        (-s, 0.5),
        (-s, -0.5),
        (0.0, -1.0),
        (s, -0.5),
        (s, 0.5),
        (0.0, 1.0),
    ];
    let mut segments = polyline(&hex);
    segments.extend(polyline(&[(0.0, 0.0), (0.0, -1.0)]));
    segments.extend(polyline(&[(0.0, 0.0), (-s, 0.5)]));
    segments.extend(polyline(&[(0.0, 0.0), (s, 0.5)]));

    let regions = PlanarArrangement::default().arrange(&segments);
    assert_eq!(regions.len(), 3);

    let total: f64 = regions.iter().map(|r| r.signed_area()).sum();
    let hex_area = 3.0 * 3f64.sqrt() / 2.0;
    assert!((total - hex_area).abs() < 1e-9);

    for region in &regions {
        assert!(region.holes.is_empty());
        let p = region.interior_point().unwrap();
        assert!(region.contains(&p));
    }
}

#[test]
fn open_polyline_has_no_regions() {
    let segments = polyline(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (2.0, 1.0)]);
    assert!(PlanarArrangement::default().arrange(&segments).is_empty());
}

#[test]
fn disjoint_squares_are_separate_regions() {
    let a = polyline(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)]);
    let b = polyline(&[(5.0, 0.0), (6.0, 0.0), (6.0, 1.0), (5.0, 1.0), (5.0, 0.0)]);
    let segments: Vec<Segment2> = a.into_iter().chain(b).collect();
    let regions = PlanarArrangement::default().arrange(&segments);
    assert_eq!(regions.len(), 2);
    assert!(regions.iter().all(|r| r.holes.is_empty()));
}
