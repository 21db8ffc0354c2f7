//! Per-build counters and stage timings.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;

use crate::pipeline::Stage;
use crate::types::{EdgeNature, VertexSingularity};

/// Counters describing what a build produced and what it had to skip.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    /// Edges per nature after classification and intersection.
    pub edges_by_nature: BTreeMap<EdgeNature, usize>,
    /// Vertices per singularity after both singularity passes.
    pub vertices_by_singularity: BTreeMap<VertexSingularity, usize>,
    /// Mesh intersection segments processed.
    pub intersection_segments: usize,
    /// Crossings that could not be turned into a split.
    pub unsplittable_crossings: usize,
    /// Image-space crossings that produced a singular vertex.
    pub image_crossings: usize,
    /// Chains resolved as visible.
    pub chains_visible: usize,
    /// Chains resolved as hidden.
    pub chains_hidden: usize,
    /// Polygons kept.
    pub polygons: usize,
    /// Regions discarded for their small area.
    pub small_regions_discarded: usize,
    /// Regions without an interior point.
    pub arrangement_failures: usize,
    /// Polygons attributed to a mesh.
    pub polygons_assigned: usize,
    /// Polygons no mesh was seen through.
    pub polygons_unassigned: usize,
    /// Hits whose face or material could not be resolved.
    pub missing_attribution: usize,
}

impl Diagnostics {
    /// Count of edges of one nature.
    pub fn edges(&self, nature: EdgeNature) -> usize {
        self.edges_by_nature.get(&nature).copied().unwrap_or(0)
    }

    /// Count of vertices of one singularity.
    pub fn vertices(&self, singularity: VertexSingularity) -> usize {
        self.vertices_by_singularity
            .get(&singularity)
            .copied()
            .unwrap_or(0)
    }
}

/// Wall-clock time spent in one stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageTiming {
    /// Stage that ran.
    pub stage: Stage,
    /// Time it took.
    pub duration: Duration,
}

/// Everything a build reports besides the viewmap itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BuildReport {
    /// Stage timings in execution order.
    pub timings: Vec<StageTiming>,
    /// Counters.
    pub diagnostics: Diagnostics,
}

impl BuildReport {
    /// Sum of all stage timings.
    pub fn total_time(&self) -> Duration {
        self.timings.iter().map(|t| t.duration).sum()
    }

    /// Report as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_json() {
        let mut report = BuildReport::default();
        report.diagnostics.edges_by_nature.insert(EdgeNature::Silhouette, 6);
        report.timings.push(StageTiming {
            stage: Stage::ClassifyEdges,
            duration: Duration::from_millis(3),
        });
        report.timings.push(StageTiming {
            stage: Stage::Chain,
            duration: Duration::from_millis(2),
        });
        assert_eq!(report.total_time(), Duration::from_millis(5));
        assert_eq!(report.diagnostics.edges(EdgeNature::Silhouette), 6);
        assert_eq!(report.diagnostics.edges(EdgeNature::Crease), 0);

        let json = report.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["diagnostics"]["edges_by_nature"]["Silhouette"], 6);
        assert_eq!(value["timings"][0]["stage"], "ClassifyEdges");
    }
}
