//! Spatial hashing of view vertices.
//!
//! Positions are bucketed on a grid with cell size equal to the merge
//! distance. A lookup first takes whatever vertex owns the exact bucket, then
//! searches the neighbouring buckets for a vertex within the merge distance,
//! so two positions closer than the merge distance always resolve to the same
//! vertex even when they straddle a cell border.

use std::collections::HashMap;

use slotmap::SlotMap;
use viewmap_math::{Point2, Point3};

use crate::types::{ViewVertex, ViewVertexId};

/// Floor of `x`, saturating for non-finite values.
fn floor_key(x: f64) -> i64 {
    if !x.is_finite() {
        return if x.is_sign_positive() { i64::MAX } else { i64::MIN };
    }
    x.floor() as i64
}

/// 3D bucket of `p` on a grid of size `cell`.
pub fn hash3(p: &Point3, cell: f64) -> (i64, i64, i64) {
    let inv = 1.0 / cell;
    (floor_key(p.x * inv), floor_key(p.y * inv), floor_key(p.z * inv))
}

/// 2D bucket of `p` on a grid of size `cell`.
pub fn hash2(p: &Point2, cell: f64) -> (i64, i64) {
    let inv = 1.0 / cell;
    (floor_key(p.x * inv), floor_key(p.y * inv))
}

/// Bucket index from 3D positions to view vertices.
#[derive(Debug, Clone)]
pub struct VertexRegistry {
    cell: f64,
    buckets: HashMap<(i64, i64, i64), ViewVertexId>,
}

impl VertexRegistry {
    /// Empty registry merging positions closer than `cell`.
    pub fn new(cell: f64) -> Self {
        Self {
            cell,
            buckets: HashMap::new(),
        }
    }

    /// Grid cell size, which is also the merge distance.
    pub fn cell(&self) -> f64 {
        self.cell
    }

    /// Number of registered vertices.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Forget every vertex.
    pub fn clear(&mut self) {
        self.buckets.clear();
    }

    /// Vertex already standing for `p`, if any.
    pub fn find(
        &self,
        vertices: &SlotMap<ViewVertexId, ViewVertex>,
        p: &Point3,
    ) -> Option<ViewVertexId> {
        let key = hash3(p, self.cell);
        if let Some(&id) = self.buckets.get(&key) {
            return Some(id);
        }
        let mut best: Option<(f64, ViewVertexId)> = None;
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let k = (key.0 + dx, key.1 + dy, key.2 + dz);
                    let Some(&id) = self.buckets.get(&k) else {
                        continue;
                    };
                    let Some(v) = vertices.get(id) else {
                        continue;
                    };
                    let d = (v.pos3 - p).norm();
                    if d < self.cell && best.map_or(true, |(bd, _)| d < bd) {
                        best = Some((d, id));
                    }
                }
            }
        }
        best.map(|(_, id)| id)
    }

    /// Record `id` as the owner of `p`'s bucket. Returns `false` if the
    /// bucket is already taken.
    pub fn insert(&mut self, p: &Point3, id: ViewVertexId) -> bool {
        let key = hash3(p, self.cell);
        if self.buckets.contains_key(&key) {
            return false;
        }
        self.buckets.insert(key, id);
        true
    }
}
