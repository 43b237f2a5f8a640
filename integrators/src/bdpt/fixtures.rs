//! Test Fixtures

use super::BdptConfig;
use tof_core::base::*;
use tof_core::decomposition::*;
use tof_core::film::*;
use tof_core::geometry::*;
use tof_core::memory::*;
use tof_core::paramset::*;
use tof_core::path::*;
use tof_core::sampler::*;
use tof_filters::create_filter;
use tof_scenes::*;

/// Builds a parameter set from `name=value` strings.
pub fn params(assignments: &[&str]) -> ParamSet {
    let mut ps = ParamSet::new();
    for a in assignments {
        ps.add_assignment(a).unwrap();
    }
    ps
}

/// Returns the fog scene described by `ps`.
pub fn fog_scene(ps: &ParamSet) -> FogScene {
    FogScene::try_from(ps).unwrap()
}

/// Returns the decomposition described by `ps` with a box filter.
pub fn decomposition(ps: &ParamSet) -> DecompositionConfig {
    let filter = create_filter("box", ps).unwrap();
    DecompositionConfig::try_from((ps, filter)).unwrap()
}

/// Keeps every sample it receives.
#[derive(Default)]
pub struct RecordingSink {
    pub splats: Vec<(Point2f, Vec<Float>)>,
    pub direct: Vec<(Point2f, Vec<Float>)>,
}

impl SampleSink for RecordingSink {
    fn splat(&mut self, pos: &Point2f, values: &[Float]) -> bool {
        self.splats.push((*pos, values.to_vec()));
        true
    }

    fn put_direct_sample(&mut self, pos: &Point2f, values: &[Float]) -> bool {
        self.direct.push((*pos, values.to_vec()));
        true
    }
}

/// Walks an emitter and a sensor sub-path for `pixel`.
pub fn walk_pair(
    scene: &FogScene,
    sampler: &mut dyn Sampler,
    arena: &mut PathArena,
    bdpt: &BdptConfig,
    pixel: Point2i,
) -> (Path, Path) {
    let mut emitter = Path::new();
    let mut sensor = Path::new();
    scene.walk(sampler, arena, PathRoot::Emitter, bdpt.max_depth, bdpt.rr_depth, &mut emitter);
    scene.walk(sampler, arena, PathRoot::Sensor { pixel }, bdpt.max_depth, bdpt.rr_depth, &mut sensor);
    (emitter, sensor)
}
