//! Staged viewmap build.
//!
//! A build is a fixed sequence of [`Stage`]s run one after the other against
//! the same [`Viewmap`]. Each stage commits its output before the next one
//! starts. A [`CancelToken`] is checked between stages.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info_span};
use viewmap_arrangement::{Arrangement, PlanarArrangement};

use crate::chain::build_chains;
use crate::classify::classify_edges;
use crate::diagnostics::{BuildReport, StageTiming};
use crate::error::{Result, ViewmapError};
use crate::intersect::intersect_meshes;
use crate::options::ViewmapOptions;
use crate::polygons::{assign_polygons, extract_polygons};
use crate::singular::{singularities_2d, singularities_3d};
use crate::viewmap::Viewmap;
use crate::visibility::resolve_visibility;

/// One step of a build, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Tag mesh edges with their nature.
    ClassifyEdges,
    /// Add contours where meshes pass through each other.
    IntersectMeshes,
    /// Mark singular vertices from their incident edges.
    Singularities3d,
    /// Split image-space crossings.
    Singularities2d,
    /// Group edges into chains.
    Chain,
    /// Raycast chain visibility.
    Visibility,
    /// Arrange visible chains into polygons.
    Polygons,
    /// Attribute polygons to meshes and colors.
    AssignPolygons,
    /// Nothing left to run.
    Done,
}

impl Stage {
    /// Every runnable stage, in order.
    pub const ALL: [Stage; 8] = [
        Stage::ClassifyEdges,
        Stage::IntersectMeshes,
        Stage::Singularities3d,
        Stage::Singularities2d,
        Stage::Chain,
        Stage::Visibility,
        Stage::Polygons,
        Stage::AssignPolygons,
    ];

    /// The stage after this one.
    pub fn next(self) -> Stage {
        match self {
            Stage::ClassifyEdges => Stage::IntersectMeshes,
            Stage::IntersectMeshes => Stage::Singularities3d,
            Stage::Singularities3d => Stage::Singularities2d,
            Stage::Singularities2d => Stage::Chain,
            Stage::Chain => Stage::Visibility,
            Stage::Visibility => Stage::Polygons,
            Stage::Polygons => Stage::AssignPolygons,
            Stage::AssignPolygons | Stage::Done => Stage::Done,
        }
    }
}

/// Shared flag a caller sets to stop a build at the next stage boundary.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Fresh, uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A build in progress.
pub struct BuildPipeline<'a> {
    viewmap: &'a mut Viewmap,
    options: &'a ViewmapOptions,
    arrangement: Box<dyn Arrangement + 'a>,
    cancel: Option<CancelToken>,
    stage: Stage,
    report: BuildReport,
}

impl<'a> BuildPipeline<'a> {
    /// Validate inputs and reset the viewmap for a fresh build.
    pub fn new(viewmap: &'a mut Viewmap, options: &'a ViewmapOptions) -> Result<Self> {
        options.validate()?;
        viewmap.camera.validate()?;
        if viewmap.scene.is_empty() || viewmap.scene.num_faces() == 0 {
            return Err(ViewmapError::EmptyScene);
        }
        if options.update_meshes {
            viewmap.scene.refresh()?;
        }
        viewmap.clear();

        Ok(Self {
            viewmap,
            options,
            arrangement: Box::new(PlanarArrangement::default()),
            cancel: None,
            stage: Stage::ClassifyEdges,
            report: BuildReport::default(),
        })
    }

    /// Use a different planar arrangement service.
    pub fn with_arrangement(mut self, arrangement: impl Arrangement + 'a) -> Self {
        self.arrangement = Box::new(arrangement);
        self
    }

    /// Check `token` before every stage.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// The next stage to run.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Timings and counters so far.
    pub fn report(&self) -> &BuildReport {
        &self.report
    }

    /// The viewmap being built.
    pub fn viewmap(&self) -> &Viewmap {
        &*self.viewmap
    }

    /// Run the next stage and return the one after it.
    pub fn step(&mut self) -> Result<Stage> {
        let stage = self.stage;
        if stage == Stage::Done {
            return Ok(Stage::Done);
        }
        if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            return Err(ViewmapError::Cancelled { stage });
        }

        let span = info_span!("viewmap_stage", stage = ?stage);
        let _enter = span.enter();
        let started = Instant::now();

        let vm = &mut *self.viewmap;
        let diag = &mut self.report.diagnostics;
        let options = self.options;
        match stage {
            Stage::ClassifyEdges => classify_edges(vm, &options.crease_angle, diag),
            Stage::IntersectMeshes => intersect_meshes(vm, diag),
            Stage::Singularities3d => singularities_3d(vm, diag),
            Stage::Singularities2d => singularities_2d(vm, diag),
            Stage::Chain => {
                build_chains(vm);
            }
            Stage::Visibility => resolve_visibility(vm, options, diag),
            Stage::Polygons => extract_polygons(vm, self.arrangement.as_ref(), options, diag),
            Stage::AssignPolygons => assign_polygons(vm, options, diag),
            Stage::Done => {}
        }

        let duration = started.elapsed();
        debug!(
            elapsed_us = duration.as_micros() as u64,
            vertices = vm.vertices.len(),
            edges = vm.edges.len(),
            chains = vm.chains.len(),
            "stage complete"
        );
        self.report.timings.push(StageTiming { stage, duration });
        self.stage = stage.next();
        Ok(self.stage)
    }

    /// Run every remaining stage.
    pub fn run(mut self) -> Result<BuildReport> {
        while self.step()? != Stage::Done {}
        debug!(
            total_us = self.report.total_time().as_micros() as u64,
            "viewmap built"
        );
        Ok(self.report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::scene::{Scene, SceneMesh};
    use viewmap_math::{Point3, Transform};
    use viewmap_mesh::primitives::make_cube;

    fn cube_viewmap() -> Viewmap {
        let mut scene = Scene::new();
        scene.add_mesh(SceneMesh::new("cube", make_cube(1.0).unwrap(), Transform::identity()).unwrap());
        let camera = Camera::look_at(Point3::new(10.0, 10.0, 10.0), Point3::origin(), 800.0, 600.0);
        Viewmap::new(scene, camera)
    }

    #[test]
    fn test_stage_order() {
        let mut stage = Stage::ClassifyEdges;
        let mut seen = vec![stage];
        while stage.next() != Stage::Done {
            stage = stage.next();
            seen.push(stage);
        }
        assert_eq!(seen, Stage::ALL.to_vec());
        assert_eq!(Stage::Done.next(), Stage::Done);
    }

    #[test]
    fn test_step_records_each_stage() {
        let mut vm = cube_viewmap();
        let options = ViewmapOptions::default();
        let mut pipeline = BuildPipeline::new(&mut vm, &options).unwrap();
        assert_eq!(pipeline.step().unwrap(), Stage::IntersectMeshes);
        assert_eq!(pipeline.viewmap().edges().len(), 12);
        while pipeline.step().unwrap() != Stage::Done {}
        assert_eq!(pipeline.step().unwrap(), Stage::Done);

        let stages: Vec<Stage> = pipeline.report().timings.iter().map(|t| t.stage).collect();
        assert_eq!(stages, Stage::ALL.to_vec());
    }

    #[test]
    fn test_cancel_between_stages() {
        let mut vm = cube_viewmap();
        let options = ViewmapOptions::default();
        let token = CancelToken::new();
        let mut pipeline = BuildPipeline::new(&mut vm, &options)
            .unwrap()
            .with_cancel_token(token.clone());
        pipeline.step().unwrap();
        token.cancel();
        let err = pipeline.step().unwrap_err();
        assert!(matches!(
            err,
            ViewmapError::Cancelled {
                stage: Stage::IntersectMeshes
            }
        ));
        assert_eq!(pipeline.stage(), Stage::IntersectMeshes);
    }

    #[test]
    fn test_empty_scene_rejected() {
        let camera = Camera::look_at(Point3::new(0.0, 0.0, 5.0), Point3::origin(), 10.0, 10.0);
        let mut vm = Viewmap::new(Scene::new(), camera);
        let options = ViewmapOptions::default();
        assert!(matches!(
            BuildPipeline::new(&mut vm, &options),
            Err(ViewmapError::EmptyScene)
        ));
    }

    #[test]
    fn test_invalid_options_rejected() {
        let mut vm = cube_viewmap();
        let mut options = ViewmapOptions::default();
        options.crease_angle.min = 120.0;
        assert!(matches!(
            BuildPipeline::new(&mut vm, &options),
            Err(ViewmapError::InvalidOptions(_))
        ));
    }
}
