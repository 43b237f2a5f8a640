//! Connection Evaluator

use super::ellipsoid::*;
use super::mis::*;
use super::strategy::*;
use super::weights::*;
use super::BdptConfig;
use super::{
    ELLIPSOID_SAMPLES, FAILED_CONNECTIONS, FAILED_ELLIPSOID_SAMPLES, OUT_OF_RANGE_LENGTHS, ZERO_THROUGHPUT_STRATEGIES,
};
use tof_core::base::*;
use tof_core::decomposition::*;
use tof_core::film::*;
use tof_core::geometry::*;
use tof_core::memory::*;
use tof_core::path::*;
use tof_core::sampler::*;
use tof_core::scene::*;
use tof_core::spectrum::*;
use tof_core::stat_inc;

/// The two sub-paths of one sample and what every strategy needs to know about them.
struct SubpathPair<'p> {
    /// Emitter sub-path.
    emitter: &'p Path,

    /// Sensor sub-path.
    sensor: &'p Path,

    /// Strategies that may contribute.
    rules: StrategyRules,

    /// Raster position of the sensor sample.
    initial_pos: Point2f,

    /// Total length of ellipsoidal connections.
    target: Float,
}

/// Joins an emitter and a sensor sub-path with every `(s, t)` strategy, weights the results with multiple importance
/// sampling and sends them to a `SampleSink`, binned by path length when a transient decomposition is active.
///
/// The evaluator owns its scratch buffers; a worker keeps one for all of its samples.
pub struct ConnectionEvaluator<'a> {
    /// The scene.
    scene: &'a dyn Scene,

    /// Decomposition settings.
    config: &'a DecompositionConfig,

    /// Integrator settings.
    bdpt: &'a BdptConfig,

    /// Prefix weights of the emitter sub-path.
    emitter_weights: SubpathWeights,

    /// Prefix weights of the sensor sub-path.
    sensor_weights: SubpathWeights,

    /// Flattened vertices of the path being weighted.
    flat: Vec<PathVertex>,

    /// Densities of the path being weighted.
    mis: MisTerms,

    /// Binned primary estimate followed by weight and alpha.
    binned: Vec<Float>,

    /// Values of one light image sample.
    light: Vec<Float>,

    /// Unbinned primary estimate.
    primary: Spectrum,

    /// Per strategy statistics when enabled.
    tally: Option<StrategyTally>,
}

impl<'a> ConnectionEvaluator<'a> {
    /// Create a new `ConnectionEvaluator`.
    ///
    /// * `scene`  - The scene.
    /// * `config` - Decomposition settings.
    /// * `bdpt`   - Integrator settings.
    pub fn new(scene: &'a dyn Scene, config: &'a DecompositionConfig, bdpt: &'a BdptConfig) -> Self {
        assert_eq!(SPECTRUM_SAMPLES, 3, "binned output needs three spectral channels");
        let channels = config.channel_count();
        Self {
            scene,
            config,
            bdpt,
            emitter_weights: SubpathWeights::new(),
            sensor_weights: SubpathWeights::new(),
            flat: Vec::new(),
            mis: MisTerms::new(),
            binned: vec![0.0; channels],
            light: vec![0.0; channels],
            primary: Spectrum::ZERO,
            tally: bdpt.record_strategies.then(StrategyTally::new),
        }
    }

    /// Returns the strategy statistics gathered so far, if enabled.
    pub fn tally(&self) -> Option<&StrategyTally> {
        self.tally.as_ref()
    }

    /// Evaluates every strategy joining two sub-paths.
    ///
    /// Contributions with `t >= 2` are summed into a primary sample splatted at the raster position of the sensor
    /// sample. Contributions with `t = 1` go to the light image at the position they project to. Returns the primary
    /// estimate summed over bins.
    ///
    /// * `sampler` - Source of random numbers for direct and ellipsoidal sampling.
    /// * `arena`   - Arena holding both sub-paths.
    /// * `emitter` - Emitter sub-path.
    /// * `sensor`  - Sensor sub-path; must contain the sensor sample.
    /// * `target`  - Total path length of ellipsoidal connections.
    /// * `sink`    - Receives the contributions.
    pub fn evaluate(
        &mut self,
        sampler: &mut dyn Sampler,
        arena: &mut PathArena,
        emitter: &Path,
        sensor: &Path,
        target: Float,
        sink: &mut dyn SampleSink,
    ) -> Spectrum {
        let config = self.config;
        let bdpt = self.bdpt;

        self.emitter_weights
            .compute(arena, emitter, TransportMode::Importance, config.kind);
        self.sensor_weights
            .compute(arena, sensor, TransportMode::Radiance, config.kind);
        self.binned.iter_mut().for_each(|v| *v = 0.0);
        self.primary = Spectrum::ZERO;

        let laser = emitter.vertex_count() > 1 && arena.vertex(emitter.vertex(1)).is_laser();
        let pair = SubpathPair {
            emitter,
            sensor,
            rules: StrategyRules {
                light_image: bdpt.light_image,
                sample_direct: bdpt.sample_direct,
                transient: config.kind == DecompositionKind::Transient,
                laser,
            },
            initial_pos: arena.vertex(sensor.vertex(1)).sample_pos,
            target,
        };

        // The constrained connection inserts a vertex of its own.
        let max_depth = if config.kind == DecompositionKind::TransientEllipse {
            bdpt.max_depth - 1
        } else {
            bdpt.max_depth
        };

        let s_count = emitter.vertex_count() as Int;
        let t_count = sensor.vertex_count() as Int;
        for s in (1..s_count).rev() {
            let min_t = max(2 - s, if bdpt.light_image { 1 } else { 2 });
            let mut max_t = t_count - 1;
            if bdpt.max_depth != -1 {
                max_t = min(max_t, max_depth + 1 - s);
            }

            for t in (min_t..=max_t).rev() {
                let (s, t) = (s as usize, t as usize);
                if !pair.rules.allows(s, t) {
                    continue;
                }
                if config.force_bounce && (s != config.s_bounce || t != config.t_bounce) {
                    continue;
                }
                self.strategy(sampler, arena, &pair, s, t, sink);
            }
        }

        let c = self.binned.len();
        if !config.is_binned() {
            self.binned[..SPECTRUM_SAMPLES].copy_from_slice(&[self.primary[0], self.primary[1], self.primary[2]]);
        }
        self.binned[c - 2] = 1.0;
        self.binned[c - 1] = 1.0;
        sink.splat(&pair.initial_pos, &self.binned);

        self.primary
    }

    /// Evaluates strategy `(s, t)`. Returns `None` when it contributes nothing.
    fn strategy(
        &mut self,
        sampler: &mut dyn Sampler,
        arena: &mut PathArena,
        pair: &SubpathPair,
        s: usize,
        t: usize,
        sink: &mut dyn SampleSink,
    ) -> Option<()> {
        let scene = self.scene;
        let config = self.config;

        let vs_id = pair.emitter.vertex(s);
        let vt_id = pair.sensor.vertex(t);
        let mut vs = *arena.vertex(vs_id);
        let mut vt = *arena.vertex(vt_id);
        let mut vs_pred = predecessor(arena, pair.emitter, s);
        let mut vt_pred = predecessor(arena, pair.sensor, t);
        let remaining = self.bdpt.max_depth - (s + t) as Int + 1;
        let emitter_length = self.emitter_weights.length(s);
        let sensor_length = self.sensor_weights.length(t);

        let mut kind = config.kind;
        let mut corr_weight = 1.0;
        let mut direct = None;
        let mut value;
        let length;

        if self.bdpt.sample_direct && s == 1 && t > 1 {
            if vt.is_degenerate() {
                return None;
            }
            let ds = scene.sample_direct(&vt, &sampler.get_2d(), TransportMode::Importance)?;
            vs = ds.vertex;
            vs_pred = None;
            value = self.sensor_weights.weight(t)
                * ds.value
                * scene.eval(&vt, vt_pred.as_ref(), &vs, TransportMode::Radiance);

            let full_length = sensor_length + vs.p.distance(&vt.p);
            if config.combine_samplings
                && kind == DecompositionKind::TransientEllipse
                && config.in_range(full_length)
            {
                kind = DecompositionKind::Transient;
            }
            if kind == DecompositionKind::TransientEllipse {
                // Emitters sampled from a sensor vertex have no constrained counterpart.
                return None;
            }

            length = match kind {
                DecompositionKind::Transient => full_length,
                DecompositionKind::Bounce => sensor_length + 1.0,
                _ => 0.0,
            };
            direct = Some(TransportMode::Importance);
        } else if self.bdpt.sample_direct && t == 1 && s > 1 {
            if vs.is_degenerate() {
                return None;
            }
            let ds = scene.sample_direct(&vs, &sampler.get_2d(), TransportMode::Radiance)?;
            vt = ds.vertex;
            vt_pred = None;
            value = self.emitter_weights.weight(s)
                * ds.value
                * scene.eval(&vs, vs_pred.as_ref(), &vt, TransportMode::Importance);

            let full_length = emitter_length + vs.p.distance(&vt.p);
            if config.combine_samplings
                && kind == DecompositionKind::TransientEllipse
                && config.in_range(full_length)
            {
                (kind, corr_weight) = self.choose_sampling(sampler, full_length);
            }
            if kind == DecompositionKind::TransientEllipse {
                panic!("Cannot make direct ellipsoidal connections (s={s}, t={t})");
            }

            length = match kind {
                DecompositionKind::Transient => full_length,
                DecompositionKind::Bounce => emitter_length + 1.0,
                _ => 0.0,
            };
            direct = Some(TransportMode::Radiance);
        } else {
            if vs.is_degenerate() || vt.is_degenerate() {
                return None;
            }

            let full_length = emitter_length + sensor_length + vs.p.distance(&vt.p);
            if config.combine_samplings
                && kind == DecompositionKind::TransientEllipse
                && config.in_range(full_length)
            {
                (kind, corr_weight) = self.choose_sampling(sampler, full_length);
            }

            let prefix = self.emitter_weights.weight(s) * self.sensor_weights.weight(t);
            if kind == DecompositionKind::TransientEllipse {
                if config.combine_samplings && full_length > config.min_bound {
                    return None;
                }
                return self.connect_ellipsoid(
                    sampler,
                    arena,
                    pair,
                    (s, t),
                    (&vs, vs_pred.as_ref()),
                    (&vt, vt_pred.as_ref()),
                    prefix,
                    remaining,
                    corr_weight,
                    sink,
                );
            }

            value = prefix
                * scene.eval(&vs, vs_pred.as_ref(), &vt, TransportMode::Importance)
                * scene.eval(&vt, vt_pred.as_ref(), &vs, TransportMode::Radiance);
            length = match kind {
                DecompositionKind::Transient => full_length,
                DecompositionKind::Bounce => emitter_length + sensor_length + 1.0,
                _ => 0.0,
            };
        }

        // Endpoints are evaluated with their walked measures and weighted in area measure.
        let arena = MeasureGuard::new(arena, [Some(vs_id), Some(vt_id)]);
        vs.measure = Measure::Area;
        vt.measure = Measure::Area;

        if value.is_black() {
            stat_inc!(ZERO_THROUGHPUT_STRATEGIES, 1);
            return None;
        }

        let tr = match scene.connect(&vs, &vt, remaining) {
            Some(tr) => tr,
            None => {
                stat_inc!(FAILED_CONNECTIONS, 1);
                return None;
            }
        };
        let edge = PathEdge::between(&vs, &vt, tr);
        let terms = match direct {
            None => EdgeTerms::EVERYTHING,
            Some(TransportMode::Importance) => EdgeTerms::TRANSMITTANCE | EdgeTerms::COSINE_SENSOR_SIDE,
            Some(TransportMode::Radiance) => EdgeTerms::TRANSMITTANCE | EdgeTerms::COSINE_EMITTER_SIDE,
        };
        value *= edge.eval_cached(&vs, &vt, terms);

        let weight = self.mis_weight(&arena, pair, s, t, (&vs, vs_pred.as_ref()), (&vt, vt_pred.as_ref()));
        let pos = if vt.is_sensor_sample() {
            scene.sensor_position(&vt, &vs)?
        } else {
            pair.initial_pos
        };

        self.accumulate(s, t, value * weight, length, corr_weight, &pos, sink);
        Some(())
    }

    /// Decides between the unconstrained and the constrained connection of a path whose unconstrained length lies in
    /// range. Returns the kind to evaluate and the reciprocal of its selection probability.
    fn choose_sampling(&self, sampler: &mut dyn Sampler, length: Float) -> (DecompositionKind, Float) {
        let length_sampler = &self.config.path_length_sampler;
        if !length_sampler.is_modulated() {
            return (DecompositionKind::Transient, 1.0);
        }

        let corr = length_sampler.correlation(length);
        if sampler.get_1d() < corr {
            (DecompositionKind::Transient, 1.0 / corr)
        } else {
            (DecompositionKind::TransientEllipse, 1.0 / (1.0 - corr))
        }
    }

    /// Joins `vs` and `vt` through a vertex sampled on the ellipsoid that completes the path to the target length.
    fn connect_ellipsoid(
        &mut self,
        sampler: &mut dyn Sampler,
        arena: &PathArena,
        pair: &SubpathPair,
        (s, t): (usize, usize),
        (vs, vs_pred): (&PathVertex, Option<&PathVertex>),
        (vt, vt_pred): (&PathVertex, Option<&PathVertex>),
        prefix: Spectrum,
        remaining: Int,
        corr_weight: Float,
        sink: &mut dyn SampleSink,
    ) -> Option<()> {
        let prefix_length = self.emitter_weights.length(s) + self.sensor_weights.length(t);
        let remaining_length = pair.target - prefix_length;
        if prefix.is_black() {
            stat_inc!(ZERO_THROUGHPUT_STRATEGIES, 1);
            return None;
        }
        if !(remaining_length > 0.0) {
            return None;
        }

        let connector = EllipsoidalConnector::new(self.scene);
        let u = sampler.get_2d();
        stat_inc!(ELLIPSOID_SAMPLES, 1);
        let connection = match connector.sample(vs, vs_pred, vt, vt_pred, remaining_length, remaining, &u) {
            Some(c) => c,
            None => {
                stat_inc!(FAILED_ELLIPSOID_SAMPLES, 1);
                return None;
            }
        };

        let count = self.ellipsoid_strategy_count(arena, pair, s, t, vs, vt, &connection.vertex);
        let weight = uniform_weight(count) * self.config.target_range();
        let value = prefix * connection.value * weight;
        let pos = if vt.is_sensor_sample() {
            self.scene.sensor_position(vt, &connection.vertex)?
        } else {
            pair.initial_pos
        };

        self.accumulate(s, t, value, prefix_length + connection.length, corr_weight, &pos, sink);
        Some(())
    }

    /// Returns the number of ellipsoidal strategies able to generate the path `e[1..s], x, v[t..1]`. They all sample
    /// the inserted vertex with the same density per unit length.
    fn ellipsoid_strategy_count(
        &mut self,
        arena: &PathArena,
        pair: &SubpathPair,
        s: usize,
        t: usize,
        vs: &PathVertex,
        vt: &PathVertex,
        x: &PathVertex,
    ) -> usize {
        self.flatten(arena, pair, s, t, vs, vt, Some(x));
        let flat = &self.flat;
        let n = flat.len();
        (1..n - 1)
            .filter(|&i| {
                pair.rules.allows_ellipsoid(i, n - 1 - i) && flat[i - 1].is_connectable() && flat[i + 1].is_connectable()
            })
            .count()
    }

    /// Returns the balance heuristic weight of strategy `(s, t)` for the path ending in `vs` and `vt`.
    fn mis_weight(
        &mut self,
        arena: &PathArena,
        pair: &SubpathPair,
        s: usize,
        t: usize,
        (vs, vs_pred): (&PathVertex, Option<&PathVertex>),
        (vt, vt_pred): (&PathVertex, Option<&PathVertex>),
    ) -> Float {
        let scene = self.scene;
        self.flatten(arena, pair, s, t, vs, vt, None);
        let flat = &self.flat;
        let n = flat.len();

        let m = &mut self.mis;
        m.clear();
        for v in flat.iter() {
            m.push(v.pdf(TransportMode::Importance), v.pdf(TransportMode::Radiance), v.is_connectable());
        }

        // Densities next to the connection change now that the two sub-paths meet.
        m.p_imp[s] = scene.pdf(vs, vs_pred, vt, TransportMode::Importance);
        if t >= 2 {
            m.p_imp[s + 1] = scene.pdf(vt, Some(vs), &flat[s + 1], TransportMode::Importance);
        }
        m.p_rad[s - 1] = scene.pdf(vt, vt_pred, vs, TransportMode::Radiance);
        if s >= 2 {
            m.p_rad[s - 2] = scene.pdf(vs, Some(vt), &flat[s - 2], TransportMode::Radiance);
        }
        m.remap_zeros();

        if self.bdpt.sample_direct && n >= 3 {
            m.direct_emitter = Some(scene.pdf_direct(&flat[1], &flat[0], TransportMode::Importance));
            m.direct_sensor = Some(scene.pdf_direct(&flat[n - 2], &flat[n - 1], TransportMode::Radiance));
        }

        let rules = pair.rules;
        mis_weight(&self.mis, s, |s, t| rules.allows(s, t))
    }

    /// Lays out the full path from the emitter sample to the sensor sample, optionally with an inserted vertex between
    /// `vs` and `vt`.
    fn flatten(
        &mut self,
        arena: &PathArena,
        pair: &SubpathPair,
        s: usize,
        t: usize,
        vs: &PathVertex,
        vt: &PathVertex,
        inserted: Option<&PathVertex>,
    ) {
        self.flat.clear();
        self.flat
            .extend((1..s).map(|i| *arena.vertex(pair.emitter.vertex(i))));
        self.flat.push(*vs);
        self.flat.extend(inserted.copied());
        self.flat.push(*vt);
        self.flat
            .extend((1..t).rev().map(|i| *arena.vertex(pair.sensor.vertex(i))));
    }

    /// Adds a weighted contribution to the primary estimate or the light image.
    fn accumulate(
        &mut self,
        s: usize,
        t: usize,
        value: Spectrum,
        length: Float,
        corr_weight: Float,
        pos: &Point2f,
        sink: &mut dyn SampleSink,
    ) {
        let config = self.config;
        let mut value = if t == 1 {
            value / config.sub_samples as Float
        } else {
            value
        };

        let bin = if config.is_binned() {
            match config.bin_index(length) {
                Some(bin) => bin,
                None => {
                    stat_inc!(OUT_OF_RANGE_LENGTHS, 1);
                    return;
                }
            }
        } else {
            if config.is_modulated() {
                value *= config.path_length_sampler.correlation(length) * corr_weight;
            }
            0
        };

        if t == 1 {
            let c = self.light.len();
            self.light.iter_mut().for_each(|v| *v = 0.0);
            for i in 0..SPECTRUM_SAMPLES {
                self.light[SPECTRUM_SAMPLES * bin + i] = value[i];
            }
            self.light[c - 2] = 1.0;
            self.light[c - 1] = 1.0;
            sink.put_direct_sample(pos, &self.light);
        } else {
            if config.is_binned() {
                for i in 0..SPECTRUM_SAMPLES {
                    self.binned[SPECTRUM_SAMPLES * bin + i] += value[i];
                }
            }
            self.primary += value;
        }

        if let Some(tally) = self.tally.as_mut() {
            tally.record(s, t, &value);
        }
    }
}

/// Returns the vertex preceding vertex `i` of a sub-path, or `None` when it is the supernode.
fn predecessor(arena: &PathArena, path: &Path, i: usize) -> Option<PathVertex> {
    (i >= 2).then(|| *arena.vertex(path.vertex(i - 1)))
}

// ---- Tests ----
