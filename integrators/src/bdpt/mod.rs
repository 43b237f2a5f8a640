//! Bi-directional Path Tracer

use crate::progress::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tof_core::base::*;
use tof_core::decomposition::*;
use tof_core::film::*;
use tof_core::geometry::*;
use tof_core::memory::*;
use tof_core::paramset::*;
use tof_core::path::*;
use tof_core::sampler::*;
use tof_core::scene::*;
use tof_core::spectrum::*;
use tof_core::{
    report_stats, stat_counter, stat_dist, stat_distribution, stat_inc, stat_percent, stat_ratio, stat_register_fns,
    stats::*,
};

mod adaptive;
mod connect;
mod ellipsoid;
mod mis;
mod strategy;
mod weights;

#[cfg(test)]
mod fixtures;

// Re-export.
pub use adaptive::*;
pub use connect::*;
pub use ellipsoid::*;
pub use mis::*;
pub use strategy::*;
pub use weights::*;

stat_counter!(
    "Integrator/Strategies skipped for zero throughput",
    ZERO_THROUGHPUT_STRATEGIES,
    bdpt_stats_zero_throughput,
);
stat_counter!("Integrator/Failed connections", FAILED_CONNECTIONS, bdpt_stats_failed_connections);
stat_percent!(
    "Integrator/Ellipsoid samples rejected",
    FAILED_ELLIPSOID_SAMPLES,
    ELLIPSOID_SAMPLES,
    bdpt_stats_failed_ellipsoid_samples,
);
stat_counter!(
    "Integrator/Path lengths out of range",
    OUT_OF_RANGE_LENGTHS,
    bdpt_stats_out_of_range_lengths,
);
stat_ratio!(
    "Integrator/Adaptive samples per budget",
    ADAPTIVE_SAMPLES,
    ADAPTIVE_BUDGET,
    bdpt_stats_adaptive_samples,
);
stat_distribution!(
    "Integrator/Adaptive samples per pixel frame",
    ADAPTIVE_FRAME_SAMPLES,
    bdpt_stats_adaptive_frame_samples,
);

stat_register_fns!(
    bdpt_stats_zero_throughput,
    bdpt_stats_failed_connections,
    bdpt_stats_failed_ellipsoid_samples,
    bdpt_stats_out_of_range_lengths,
    bdpt_stats_adaptive_samples,
    bdpt_stats_adaptive_frame_samples,
);

/// Number of samples of the luminance pre-pass of adaptive sampling.
const PREPASS_SAMPLES: usize = 1000;

/// Integrator settings.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BdptConfig {
    /// Maximum number of scattering events; -1 for unlimited.
    pub max_depth: Int,

    /// Depth at which Russian roulette starts.
    pub rr_depth: Int,

    /// Connect emitter vertices to the sensor and splat them to the light image.
    pub light_image: bool,

    /// Sample emitters and the sensor directly for `s = 1` and `t = 1`.
    pub sample_direct: bool,

    /// Samples per pixel.
    pub sample_count: usize,

    /// Keep per strategy statistics.
    pub record_strategies: bool,
}

impl Default for BdptConfig {
    fn default() -> Self {
        Self {
            max_depth: -1,
            rr_depth: 5,
            light_image: true,
            sample_direct: true,
            sample_count: 16,
            record_strategies: false,
        }
    }
}

impl TryFrom<&ParamSet> for BdptConfig {
    type Error = String;

    /// Create a `BdptConfig` from `ParamSet`.
    ///
    /// * `params` - Parameter set.
    fn try_from(params: &ParamSet) -> Result<Self, Self::Error> {
        let defaults = Self::default();

        let max_depth = params.find_one_int("maxDepth", defaults.max_depth);
        if max_depth != -1 && max_depth <= 0 {
            return Err(format!("maxDepth must be -1 or positive; got {max_depth}"));
        }
        let rr_depth = params.find_one_int("rrDepth", defaults.rr_depth);
        if rr_depth <= 0 {
            return Err(format!("rrDepth must be positive; got {rr_depth}"));
        }
        let sample_count = params.find_one_int("sampleCount", defaults.sample_count as Int);
        if sample_count <= 0 {
            return Err(format!("sampleCount must be positive; got {sample_count}"));
        }

        Ok(Self {
            max_depth,
            rr_depth,
            light_image: params.find_one_bool("lightImage", defaults.light_image),
            sample_direct: params.find_one_bool("sampleDirect", defaults.sample_direct),
            sample_count: sample_count as usize,
            record_strategies: params.find_one_bool("recordStrategies", defaults.record_strategies),
        })
    }
}

/// Options of one render process.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RenderOptions {
    /// Worker threads.
    pub threads: usize,

    /// Edge length of the square tiles handed to workers.
    pub tile_size: usize,

    /// Hide the progress bar.
    pub quiet: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            threads: 1,
            tile_size: 32,
            quiet: true,
        }
    }
}

/// The arena and path buffers of one worker.
struct Subpaths {
    /// Pool for vertices and edges.
    arena: PathArena,

    /// Emitter sub-path.
    emitter: Path,

    /// Sensor sub-path.
    sensor: Path,
}

impl Subpaths {
    fn new() -> Self {
        Self {
            arena: PathArena::new(),
            emitter: Path::new(),
            sensor: Path::new(),
        }
    }
}

/// Implements bi-directional path tracing with path length resolved output.
pub struct BdptIntegrator {
    /// Integrator settings.
    config: BdptConfig,

    /// Output decomposition.
    decomposition: DecompositionConfig,

    /// The sampler; workers clone it per tile.
    sampler: Box<dyn Sampler>,

    /// Configuration of the adaptive luminance pre-pass, which resolves a single bin spanning all lengths.
    prepass: Option<DecompositionConfig>,
}

impl BdptIntegrator {
    /// Create a new `BdptIntegrator`.
    ///
    /// * `config`        - Integrator settings.
    /// * `decomposition` - Output decomposition.
    /// * `sampler`       - The sampler.
    pub fn new(config: BdptConfig, decomposition: DecompositionConfig, sampler: Box<dyn Sampler>) -> Result<Self, String> {
        register_stats();

        decomposition.validate()?;
        decomposition.check_sample_count(config.sample_count)?;
        if sampler.samples_per_pixel() != config.sample_count {
            return Err(format!(
                "sampler takes {} samples per pixel but sampleCount is {}",
                sampler.samples_per_pixel(),
                config.sample_count
            ));
        }
        if decomposition.kind == DecompositionKind::TransientEllipse && config.light_image && config.sample_direct {
            return Err(String::from(
                "decomposition 'transientellipse' cannot sample the sensor directly; disable lightImage or sampleDirect",
            ));
        }

        let prepass = decomposition.adaptive.map(|_| {
            let mut prepass = decomposition.clone();
            prepass.frames = 1;
            prepass.bin_width = decomposition.max_bound - decomposition.min_bound;
            prepass.adaptive = None;
            prepass
        });

        Ok(Self {
            config,
            decomposition,
            sampler,
            prepass,
        })
    }

    /// Returns the integrator settings.
    pub fn config(&self) -> &BdptConfig {
        &self.config
    }

    /// Renders the scene into `film`. Returns the per strategy statistics, which are empty unless
    /// `record_strategies` is set.
    ///
    /// Rendering stops early, leaving the film partially rendered, once `stop` is set.
    ///
    /// * `scene`   - The scene.
    /// * `film`    - Receives the image and the light image.
    /// * `options` - Thread count and tile size.
    /// * `stop`    - Polled between samples.
    pub fn render<S>(&self, scene: &S, film: &Film, options: &RenderOptions, stop: &AtomicBool) -> Result<StrategyTally, String>
    where
        S: Scene + SubpathWalker,
    {
        let resolution = scene.film_resolution();
        if resolution != self.decomposition.size {
            return Err(format!(
                "scene resolution {resolution} does not match the image size {}",
                self.decomposition.size
            ));
        }
        if film.channel_count() != self.decomposition.channel_count() {
            return Err(format!(
                "film has {} channels but the decomposition needs {}",
                film.channel_count(),
                self.decomposition.channel_count()
            ));
        }

        // Partition the image into tiles.
        let sample_bounds = self.decomposition.sample_bounds();
        let sample_extent = sample_bounds.diagonal();
        let tile_size = max(options.tile_size, 1) as Int;
        let n_tiles = Point2u::new(
            ((sample_extent.x + tile_size - 1) / tile_size) as usize,
            ((sample_extent.y + tile_size - 1) / tile_size) as usize,
        );
        let tile_count = n_tiles.x * n_tiles.y;
        let n_threads = max(options.threads, 1);
        info!("Rendering {tile_count} tiles with {n_threads} threads");

        let progress = create_progress_bar(tile_count as u64, options.quiet);
        progress.set_message("Rendering scene");
        let tally = Mutex::new(StrategyTally::new());

        crossbeam::scope(|scope| {
            let (tx, rx) = crossbeam_channel::bounded(n_threads);

            // Spawn worker threads.
            for _ in 0..n_threads {
                let rxc = rx.clone();
                let progress = &progress;
                let tally = &tally;
                scope.spawn(move |_| {
                    let mut subpaths = Subpaths::new();
                    let mut light_image = film.create_light_image();
                    let mut evaluator = ConnectionEvaluator::new(scene, &self.decomposition, &self.config);

                    for tile_idx in rxc.iter() {
                        let tile = Tile::new(tile_idx, n_tiles, sample_bounds, tile_size);
                        let block = self.render_tile(
                            scene,
                            film,
                            &tile,
                            &mut subpaths,
                            &mut evaluator,
                            &mut light_image,
                            stop,
                        );
                        film.merge_block(&block);
                        progress.inc(1);
                    }

                    film.merge_light_image(&light_image);
                    if let Some(t) = evaluator.tally() {
                        tally.lock().unwrap().merge(t);
                    }
                    report_stats!();
                });
            }
            drop(rx); // Drop extra rx since we've cloned one for each worker.

            // Send work.
            for tile_idx in 0..tile_count {
                if stop.load(Ordering::Relaxed) || tx.send(tile_idx).is_err() {
                    break;
                }
            }
        })
        .map_err(|_| String::from("a render worker panicked"))?;

        if stop.load(Ordering::Relaxed) {
            progress.abandon_with_message("Render stopped");
            warn!("Rendering stopped before all tiles were finished");
        } else {
            progress.finish_with_message("Render complete");
        }

        let tally = tally.into_inner().unwrap();
        if self.config.record_strategies {
            tally.log();
        }
        Ok(tally)
    }

    /// Renders a tile and returns its image block.
    fn render_tile<S>(
        &self,
        scene: &S,
        film: &Film,
        tile: &Tile,
        subpaths: &mut Subpaths,
        evaluator: &mut ConnectionEvaluator,
        light_image: &mut ImageBlock,
        stop: &AtomicBool,
    ) -> ImageBlock
    where
        S: Scene + SubpathWalker,
    {
        info!("Starting image tile {} -> {}", tile.index, tile.bounds);

        let mut sampler = self.sampler.clone_sampler(tile.index as u64);
        let mut block = film.create_block(&tile.bounds);

        match (self.decomposition.adaptive, self.prepass.as_ref()) {
            (Some(params), Some(prepass)) => self.render_adaptive(
                scene,
                tile,
                &params,
                prepass,
                sampler.as_mut(),
                subpaths,
                evaluator,
                &mut block,
                light_image,
                stop,
            ),
            _ => {
                let ld_sampling = self.decomposition.ld_sampling;
                'pixels: for pixel in tile.bounds {
                    sampler.start_pixel(&pixel);
                    for j in 0..self.config.sample_count {
                        if stop.load(Ordering::Relaxed) {
                            break 'pixels;
                        }
                        let target = self
                            .decomposition
                            .sample_target(ld_sampling.then_some(j), sampler.get_1d());
                        let mut sink = BlockSink {
                            block: &mut block,
                            light_image: &mut *light_image,
                        };
                        self.sample_pixel(scene, sampler.as_mut(), subpaths, evaluator, pixel, target, &mut sink);
                    }
                }
            }
        }

        assert_eq!(
            subpaths.arena.outstanding(),
            0,
            "path records leaked while rendering tile {}",
            tile.index
        );
        block
    }

    /// Renders a tile with adaptive sampling. Every frame of a pixel is sampled until its estimate converges or the
    /// sample cap is reached, then blended against a snapshot taken before so that heavily sampled pixels do not
    /// dominate their neighbours through the filter.
    fn render_adaptive<S>(
        &self,
        scene: &S,
        tile: &Tile,
        params: &AdaptiveParams,
        prepass: &DecompositionConfig,
        sampler: &mut dyn Sampler,
        subpaths: &mut Subpaths,
        evaluator: &mut ConnectionEvaluator,
        block: &mut ImageBlock,
        light_image: &mut ImageBlock,
        stop: &AtomicBool,
    ) where
        S: Scene + SubpathWalker,
    {
        let global_luminance = self.prepass_luminance(scene, tile, prepass, sampler, subpaths);
        info!("Tile {}: pre-pass luminance {global_luminance}", tile.index);

        let budget = self.decomposition.budget(self.config.sample_count);
        let mut controller = AdaptiveController::new(params, budget, global_luminance);
        let border = block.border();

        for pixel in tile.bounds {
            if stop.load(Ordering::Relaxed) {
                break;
            }
            sampler.start_pixel(&pixel);

            for j in 0..self.decomposition.frames {
                let snapshot = block.snapshot(&pixel, border, j);
                controller.reset();

                while !stop.load(Ordering::Relaxed) {
                    let target = self.decomposition.sample_target(Some(j), sampler.get_1d());
                    let mut sink = BlockSink {
                        block: &mut *block,
                        light_image: &mut *light_image,
                    };
                    let value = self.sample_pixel(scene, sampler, subpaths, evaluator, pixel, target, &mut sink);
                    stat_inc!(ADAPTIVE_SAMPLES, 1);
                    if controller.update(value.y()) != AdaptiveDecision::Continue {
                        break;
                    }
                }

                block.blend(&snapshot, controller.blend_factor());
                stat_inc!(ADAPTIVE_BUDGET, budget as i64);
                stat_dist!(ADAPTIVE_FRAME_SAMPLES, controller.sample_count() as f64);
            }
        }
    }

    /// Returns the average luminance of samples taken at random pixels of a tile with a single bin covering every
    /// resolved length.
    fn prepass_luminance<S>(
        &self,
        scene: &S,
        tile: &Tile,
        prepass: &DecompositionConfig,
        sampler: &mut dyn Sampler,
        subpaths: &mut Subpaths,
    ) -> Float
    where
        S: Scene + SubpathWalker,
    {
        let bounds = tile.bounds;
        let mut evaluator = ConnectionEvaluator::new(scene, prepass, &self.config);
        let mut block = ImageBlock::new(
            bounds.p_min,
            bounds.diagonal(),
            prepass.channel_count(),
            prepass.filter.clone(),
        );
        let mut light_image = block.clone();

        let size = bounds.diagonal();
        let mut sum = 0.0;
        for _ in 0..PREPASS_SAMPLES {
            let u = sampler.get_2d();
            let pixel = Point2i::new(
                bounds.p_min.x + min((u.x * size.x as Float) as Int, size.x - 1),
                bounds.p_min.y + min((u.y * size.y as Float) as Int, size.y - 1),
            );
            let target = prepass.sample_target(None, sampler.get_1d());
            let mut sink = BlockSink {
                block: &mut block,
                light_image: &mut light_image,
            };
            let value = self.sample_pixel(scene, sampler, subpaths, &mut evaluator, pixel, target, &mut sink);
            sum += value.y() as f64;
        }
        (sum / PREPASS_SAMPLES as f64) as Float
    }

    /// Takes one sample of a pixel: an emitter sub-path is joined with `sub_samples` sensor sub-paths. Returns the
    /// average primary estimate.
    fn sample_pixel<S>(
        &self,
        scene: &S,
        sampler: &mut dyn Sampler,
        subpaths: &mut Subpaths,
        evaluator: &mut ConnectionEvaluator,
        pixel: Point2i,
        target: Float,
        sink: &mut dyn SampleSink,
    ) -> Spectrum
    where
        S: Scene + SubpathWalker,
    {
        let max_depth = self.walk_depth();
        let rr_depth = self.config.rr_depth;
        let Subpaths {
            arena,
            emitter,
            sensor,
        } = subpaths;

        scene.walk(sampler, arena, PathRoot::Emitter, max_depth, rr_depth, emitter);

        let sub_samples = self.decomposition.sub_samples;
        let mut sum = Spectrum::ZERO;
        for _ in 0..sub_samples {
            scene.walk(sampler, arena, PathRoot::Sensor { pixel }, max_depth, rr_depth, sensor);
            sum += evaluator.evaluate(sampler, arena, emitter, sensor, target, sink);
            sensor.release(arena);
        }
        emitter.release(arena);

        sum / sub_samples as Float
    }

    /// Returns the depth of the random walks. Ellipsoidal connections insert a vertex, so the walks stop one
    /// vertex earlier.
    fn walk_depth(&self) -> Int {
        if self.config.max_depth != -1 && self.decomposition.kind == DecompositionKind::TransientEllipse {
            max(self.config.max_depth - 1, 1)
        } else {
            self.config.max_depth
        }
    }
}

/// A rectangular region of the image rendered by one worker.
struct Tile {
    /// Unique tile index.
    index: usize,

    /// Raster bounds.
    bounds: Bounds2i,
}

impl Tile {
    /// Create the tile with a given index.
    ///
    /// * `index`         - Unique tile index.
    /// * `n_tiles`       - Number of tiles in (x, y) direction.
    /// * `sample_bounds` - Pixels that receive samples.
    /// * `tile_size`     - Edge length of a tile.
    fn new(index: usize, n_tiles: Point2u, sample_bounds: Bounds2i, tile_size: Int) -> Self {
        let tile_x = (index % n_tiles.x) as Int;
        let tile_y = (index / n_tiles.x) as Int;
        let x0 = sample_bounds.p_min.x + tile_x * tile_size;
        let x1 = min(x0 + tile_size, sample_bounds.p_max.x);
        let y0 = sample_bounds.p_min.y + tile_y * tile_size;
        let y1 = min(y0 + tile_size, sample_bounds.p_max.y);
        Self {
            index,
            bounds: Bounds2i::new(Point2i::new(x0, y0), Point2i::new(x1, y1)),
        }
    }
}

// ---- Tests ----

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use float_cmp::*;
    use tof_samplers::*;

    fn integrator(ps: &ParamSet) -> BdptIntegrator {
        let config = BdptConfig::try_from(ps).unwrap();
        let sampler = Box::new(RandomSampler::new(config.sample_count, 1));
        BdptIntegrator::new(config, decomposition(ps), sampler).unwrap()
    }

    fn render(ps: &ParamSet, options: &RenderOptions) -> (Film, StrategyTally) {
        let scene = fog_scene(ps);
        let integrator = integrator(ps);
        let film = Film::new(&integrator.decomposition);
        let tally = integrator
            .render(&scene, &film, options, &AtomicBool::new(false))
            .unwrap();
        (film, tally)
    }

    const TWO_THREADS: RenderOptions = RenderOptions {
        threads: 2,
        tile_size: 4,
        quiet: true,
    };

    #[test]
    fn config_defaults_and_validation() {
        let config = BdptConfig::try_from(&ParamSet::new()).unwrap();
        assert_eq!(config, BdptConfig::default());

        let config = BdptConfig::try_from(&params(&["maxDepth=3", "lightImage=false", "sampleCount=4"])).unwrap();
        assert_eq!(config.max_depth, 3);
        assert!(!config.light_image);
        assert_eq!(config.sample_count, 4);

        assert!(BdptConfig::try_from(&params(&["maxDepth=0"])).is_err());
        assert!(BdptConfig::try_from(&params(&["maxDepth=-2"])).is_err());
        assert!(BdptConfig::try_from(&params(&["rrDepth=0"])).is_err());
        assert!(BdptConfig::try_from(&params(&["sampleCount=0"])).is_err());
    }

    #[test]
    fn setup_errors() {
        let ps = params(&["width=8", "height=8"]);
        let sampler = Box::new(RandomSampler::new(3, 1));
        let err = BdptIntegrator::new(BdptConfig::default(), decomposition(&ps), sampler);
        assert!(err.is_err());

        let ps = params(&[
            "width=8",
            "height=8",
            "decomposition=transientellipse",
            "minBound=5",
            "maxBound=9",
        ]);
        let sampler = Box::new(RandomSampler::new(16, 1));
        let err = BdptIntegrator::new(BdptConfig::default(), decomposition(&ps), sampler);
        assert!(matches!(err, Err(e) if e.contains("transientellipse")));

        let ps = params(&[
            "width=8",
            "height=8",
            "decomposition=transientellipse",
            "minBound=5",
            "maxBound=9",
            "adapSampling=true",
            "sampleCount=6",
            "lightImage=false",
        ]);
        let config = BdptConfig::try_from(&ps).unwrap();
        let sampler = Box::new(RandomSampler::new(6, 1));
        assert!(BdptIntegrator::new(config, decomposition(&ps), sampler).is_err());
    }

    #[test]
    fn resolution_must_match() {
        let ps = params(&["width=8", "height=8", "sampleCount=1"]);
        let integrator = integrator(&ps);
        let film = Film::new(&integrator.decomposition);
        let scene = fog_scene(&params(&["width=4", "height=8"]));
        let result = integrator.render(&scene, &film, &RenderOptions::default(), &AtomicBool::new(false));
        assert!(result.is_err());
    }

    #[test]
    fn vacuum_light_image_matches_inverse_square_law() {
        let ps = params(&[
            "width=8",
            "height=8",
            "sigmaS=0",
            "intensity=10",
            "filter=box",
            "sampleCount=4",
            "recordStrategies=true",
        ]);
        let scene = fog_scene(&ps);
        let (film, tally) = render(&ps, &TWO_THREADS);

        assert_eq!(tally.count(1, 1), 64 * 4);
        assert_eq!(tally.iter().count(), 1);

        let image = film.develop(1.0 / 4.0);
        let total: Float = image[0].iter().map(|s| s[0]).sum();
        let expected = 64.0 * 10.0 / (25.0 * scene.sensor.area());
        assert!(approx_eq!(f32, total, expected, epsilon = 1e-3 * expected), "{total} != {expected}");

        // The light projects onto the four pixels around the image centre.
        for (i, s) in image[0].iter().enumerate() {
            let (x, y) = (i % 8, i / 8);
            if !(3..=4).contains(&x) || !(3..=4).contains(&y) {
                assert_eq!(s[0], 0.0);
            }
        }
    }

    #[test]
    fn without_light_image_a_vacuum_stays_dark() {
        let ps = params(&[
            "width=8",
            "height=8",
            "sigmaS=0",
            "sampleCount=2",
            "lightImage=false",
            "recordStrategies=true",
        ]);
        let (film, tally) = render(&ps, &TWO_THREADS);
        assert!(tally.is_empty());
        assert!(film.develop(0.5)[0].iter().all(|s| s.is_black()));
    }

    #[test]
    fn stop_flag_skips_rendering() {
        let ps = params(&["width=8", "height=8", "sampleCount=2", "recordStrategies=true"]);
        let scene = fog_scene(&ps);
        let integrator = integrator(&ps);
        let film = Film::new(&integrator.decomposition);
        let tally = integrator
            .render(&scene, &film, &TWO_THREADS, &AtomicBool::new(true))
            .unwrap();
        assert!(tally.is_empty());
        assert!(film.develop(0.5)[0].iter().all(|s| s.is_black()));
    }

    #[test]
    fn fog_renders_every_tile() {
        let ps = params(&["width=8", "height=6", "sigmaS=0.4", "sampleCount=2", "recordStrategies=true"]);
        let (film, tally) = render(&ps, &TWO_THREADS);

        assert!(tally.count(1, 2) > 0);
        assert!(tally.count(2, 1) > 0);
        let image = film.develop(0.5);
        assert_eq!(image[0].len(), 48);
        assert!(image[0].iter().all(|s| s.is_valid()));
        let lit = image[0].iter().filter(|s| !s.is_black()).count();
        assert!(lit > 24, "only {lit} pixels received light");
    }

    #[test]
    fn short_paths_use_only_short_strategies() {
        for light_image in [true, false] {
            let ps = params(&[
                "width=8",
                "height=8",
                "sigmaS=0.5",
                "maxDepth=2",
                "sampleCount=2",
                "recordStrategies=true",
                if light_image { "lightImage=true" } else { "lightImage=false" },
            ]);
            let (_, tally) = render(&ps, &TWO_THREADS);

            assert!(!tally.is_empty());
            for ((s, t), count, _) in tally.iter() {
                assert!(count > 0);
                assert!(s >= 1 && t >= 1);
                assert!(s + t <= 3, "strategy ({s}, {t}) is longer than maxDepth");
                assert!(light_image || t >= 2, "strategy ({s}, {t}) needs the light image");
            }
            assert_eq!(tally.count(1, 1) > 0, light_image);
        }
    }

    #[test]
    fn transient_frames_before_first_arrival_are_dark() {
        let ps = params(&[
            "width=8",
            "height=8",
            "sigmaS=0.4",
            "sampleCount=2",
            "decomposition=transient",
            "minBound=0",
            "maxBound=10",
            "binWidth=1",
        ]);
        let (film, _) = render(&ps, &TWO_THREADS);
        let frames = film.develop(0.5);
        assert_eq!(frames.len(), 10);
        for frame in frames.iter().take(4) {
            assert!(frame.iter().all(|s| s.is_black()));
        }
        assert!(frames[6..].iter().any(|frame| frame.iter().any(|s| !s.is_black())));
    }

    #[test]
    fn adaptive_sampling_fills_every_frame() {
        let ps = params(&[
            "width=4",
            "height=4",
            "sigmaS=0.5",
            "decomposition=transientellipse",
            "minBound=6",
            "maxBound=8",
            "binWidth=1",
            "adapSampling=true",
            "adapMaxSampleFactor=2",
            "sampleCount=4",
            "lightImage=false",
            "recordStrategies=true",
        ]);
        let (film, tally) = render(&ps, &TWO_THREADS);

        assert!(!tally.is_empty());
        let frames = film.develop(0.25);
        assert_eq!(frames.len(), 2);
        for frame in frames.iter() {
            assert!(frame.iter().all(|s| s.is_valid()));
            assert!(frame.iter().any(|s| !s.is_black()));
        }
    }
}
