//! Planar graph construction and face tracing.
//!
//! Input segments are split at every mutual intersection, their endpoints
//! snapped together, duplicate edges merged and dangling edges pruned. The
//! remaining graph is walked face by face: at each vertex the walk takes the
//! sharpest left turn, so bounded faces come out counter-clockwise and the
//! outer boundary of every connected component comes out clockwise.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;
use viewmap_math::Point2;

use crate::region::{contour_area, point_in_contour, Region};
use crate::sweep::{find_intersections, SegmentIntersection, Segment2};

/// Vertices snapped onto a grid of cell size `snap`.
struct PointIndex {
    snap: f64,
    cells: HashMap<(i64, i64), Vec<usize>>,
    points: Vec<Point2>,
}

impl PointIndex {
    fn new(snap: f64) -> Self {
        Self {
            snap,
            cells: HashMap::new(),
            points: Vec::new(),
        }
    }

    fn key(&self, p: &Point2) -> (i64, i64) {
        (
            (p.x / self.snap).round() as i64,
            (p.y / self.snap).round() as i64,
        )
    }

    fn get_or_insert(&mut self, p: Point2) -> usize {
        let (kx, ky) = self.key(&p);
        for dx in -1..=1 {
            for dy in -1..=1 {
                if let Some(ids) = self.cells.get(&(kx + dx, ky + dy)) {
                    for &id in ids {
                        if (self.points[id] - p).norm() <= self.snap {
                            return id;
                        }
                    }
                }
            }
        }
        let id = self.points.len();
        self.points.push(p);
        self.cells.entry((kx, ky)).or_default().push(id);
        id
    }
}

/// An undirected planar graph with snapped vertices.
#[derive(Debug, Clone, Default)]
pub struct PlanarGraph {
    /// Vertex positions.
    pub points: Vec<Point2>,
    /// Undirected edges as `(lo, hi)` vertex index pairs.
    pub edges: Vec<(usize, usize)>,
}

impl PlanarGraph {
    /// Split, snap and deduplicate `segments` into a graph without
    /// dangling edges.
    pub fn build(segments: &[Segment2], snap: f64) -> Self {
        let segments: Vec<Segment2> = segments
            .iter()
            .copied()
            .filter(|s| s.length() > snap)
            .collect();

        let mut params: Vec<Vec<f64>> = vec![vec![0.0, 1.0]; segments.len()];
        for hit in find_intersections(&segments, snap) {
            match hit.intersection {
                SegmentIntersection::None => {}
                SegmentIntersection::Point { t, u, .. } => {
                    params[hit.first].push(t);
                    params[hit.second].push(u);
                }
                SegmentIntersection::Overlap { start, end } => {
                    for idx in [hit.first, hit.second] {
                        let s = &segments[idx];
                        params[idx].push(s.param_of(&start).clamp(0.0, 1.0));
                        params[idx].push(s.param_of(&end).clamp(0.0, 1.0));
                    }
                }
            }
        }

        let mut index = PointIndex::new(snap);
        let mut edge_set: BTreeSet<(usize, usize)> = BTreeSet::new();
        for (seg, mut ts) in segments.iter().zip(params) {
            ts.sort_by(f64::total_cmp);
            let ids: Vec<usize> = ts
                .iter()
                .map(|&t| index.get_or_insert(seg.point_at(t)))
                .collect();
            for w in ids.windows(2) {
                if w[0] != w[1] {
                    edge_set.insert((w[0].min(w[1]), w[0].max(w[1])));
                }
            }
        }

        let mut graph = PlanarGraph {
            points: index.points,
            edges: edge_set.into_iter().collect(),
        };
        graph.prune_dangling();
        graph
    }

    /// Repeatedly remove edges touching a degree-1 vertex.
    fn prune_dangling(&mut self) {
        loop {
            let mut degree = vec![0usize; self.points.len()];
            for &(a, b) in &self.edges {
                degree[a] += 1;
                degree[b] += 1;
            }
            let before = self.edges.len();
            self.edges.retain(|&(a, b)| degree[a] > 1 && degree[b] > 1);
            if self.edges.len() == before {
                break;
            }
        }
    }

    /// Trace every face cycle of the graph as vertex index loops.
    fn trace_cycles(&self) -> Vec<Vec<usize>> {
        // Half-edge 2k runs a -> b, 2k + 1 runs b -> a
        let n_he = self.edges.len() * 2;
        let origin = |he: usize| {
            let (a, b) = self.edges[he / 2];
            if he % 2 == 0 {
                a
            } else {
                b
            }
        };
        let dest = |he: usize| origin(he ^ 1);

        let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); self.points.len()];
        for he in 0..n_he {
            outgoing[origin(he)].push(he);
        }
        let angle = |he: usize| {
            let d = self.points[dest(he)] - self.points[origin(he)];
            d.y.atan2(d.x)
        };
        for list in &mut outgoing {
            list.sort_by(|&a, &b| angle(a).total_cmp(&angle(b)));
        }

        // Position of every half-edge in its origin's angular order
        let mut slot = vec![0usize; n_he];
        for list in &outgoing {
            for (i, &he) in list.iter().enumerate() {
                slot[he] = i;
            }
        }

        let next = |he: usize| {
            let twin = he ^ 1;
            let list = &outgoing[origin(twin)];
            list[(slot[twin] + list.len() - 1) % list.len()]
        };

        let mut visited = vec![false; n_he];
        let mut cycles = Vec::new();
        for start in 0..n_he {
            if visited[start] {
                continue;
            }
            let mut cycle = Vec::new();
            let mut he = start;
            while !visited[he] {
                visited[he] = true;
                cycle.push(origin(he));
                he = next(he);
            }
            if cycle.len() >= 3 {
                cycles.push(cycle);
            }
        }
        cycles
    }

    /// Connected component label of every vertex.
    fn components(&self) -> Vec<usize> {
        let mut parent: Vec<usize> = (0..self.points.len()).collect();
        fn find(parent: &mut [usize], mut x: usize) -> usize {
            while parent[x] != x {
                parent[x] = parent[parent[x]];
                x = parent[x];
            }
            x
        }
        for &(a, b) in &self.edges {
            let ra = find(&mut parent, a);
            let rb = find(&mut parent, b);
            if ra != rb {
                parent[ra] = rb;
            }
        }
        (0..self.points.len()).map(|v| find(&mut parent, v)).collect()
    }

    /// Bounded faces of the graph with their holes.
    pub fn regions(&self) -> Vec<Region> {
        let component = self.components();
        let mut faces: Vec<(Vec<Point2>, f64, usize)> = Vec::new();
        let mut outlines: Vec<(Vec<Point2>, usize)> = Vec::new();

        for cycle in self.trace_cycles() {
            let contour: Vec<Point2> = cycle.iter().map(|&v| self.points[v]).collect();
            let area = contour_area(&contour);
            let comp = component[cycle[0]];
            if area > 0.0 {
                faces.push((contour, area, comp));
            } else {
                outlines.push((contour, comp));
            }
        }

        let mut regions: Vec<Region> = faces
            .iter()
            .map(|(outer, _, _)| Region::new(outer.clone()))
            .collect();

        for (outline, comp) in outlines {
            // The smallest face of another component that encloses this one
            let sample = outline[0];
            let host = faces
                .iter()
                .enumerate()
                .filter(|(_, (outer, _, c))| *c != comp && point_in_contour(&sample, outer))
                .min_by(|a, b| a.1 .1.total_cmp(&b.1 .1))
                .map(|(i, _)| i);
            if let Some(i) = host {
                regions[i].holes.push(outline);
            }
        }

        debug!(
            vertices = self.points.len(),
            edges = self.edges.len(),
            regions = regions.len(),
            "traced arrangement"
        );
        regions
    }
}
