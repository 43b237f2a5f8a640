//! Fog Scene

use crate::emitter::*;
use crate::medium::*;
use crate::sensor::*;
use std::convert::TryFrom;
use tof_core::base::*;
use tof_core::geometry::*;
use tof_core::memory::*;
use tof_core::paramset::*;
use tof_core::path::*;
use tof_core::sampler::*;
use tof_core::sampling::*;
use tof_core::scene::*;
use tof_core::spectrum::*;

/// A point emitter and a pinhole sensor immersed in an unbounded homogeneous
/// medium. There are no surfaces, so every point of the medium can hold a
/// scattering vertex and nothing is ever occluded.
#[derive(Copy, Clone, Debug)]
pub struct FogScene {
    /// The medium filling all of space.
    pub medium: HomogeneousMedium,

    /// The only emitter.
    pub emitter: PointEmitter,

    /// The sensor.
    pub sensor: PinholeSensor,
}

impl FogScene {
    /// Create a new `FogScene`.
    ///
    /// * `medium`  - The medium filling all of space.
    /// * `emitter` - The emitter.
    /// * `sensor`  - The sensor.
    pub fn new(medium: HomogeneousMedium, emitter: PointEmitter, sensor: PinholeSensor) -> Self {
        Self {
            medium,
            emitter,
            sensor,
        }
    }

    /// Returns the area density of reaching `succ` by a free flight of length
    /// `distance`, per unit solid angle at the origin of the flight.
    fn free_flight_pdf(&self, succ: &PathVertex, distance: Float) -> Float {
        if succ.is_medium_interaction() {
            self.medium.distance_pdf(distance) / (distance * distance)
        } else {
            0.0
        }
    }
}

impl Scene for FogScene {
    fn eval(&self, v: &PathVertex, _pred: Option<&PathVertex>, succ: &PathVertex, _mode: TransportMode) -> Spectrum {
        match v.kind {
            VertexKind::EmitterSample => self.emitter.profile(),
            VertexKind::SensorSample => {
                let d = succ.p - v.p;
                if d.length_squared() > 0.0 {
                    Spectrum::new(self.sensor.importance(&d.normalize()))
                } else {
                    Spectrum::ZERO
                }
            }
            VertexKind::Medium => self.medium.sigma_s * self.medium.phase(),
            _ => Spectrum::ZERO,
        }
    }

    fn pdf(&self, v: &PathVertex, _pred: Option<&PathVertex>, succ: &PathVertex, _mode: TransportMode) -> Float {
        match v.kind {
            VertexKind::EmitterSupernode => {
                if succ.is_emitter_sample() {
                    1.0
                } else {
                    0.0
                }
            }
            VertexKind::SensorSupernode => {
                if succ.is_sensor_sample() {
                    1.0
                } else {
                    0.0
                }
            }
            VertexKind::EmitterSample | VertexKind::SensorSample | VertexKind::Medium => {
                let d = succ.p - v.p;
                let distance = d.length();
                if !(distance > 0.0) {
                    return 0.0;
                }
                let w = d / distance;
                let pdf_w = match v.kind {
                    VertexKind::EmitterSample => uniform_sphere_pdf(),
                    VertexKind::SensorSample => self.sensor.direction_pdf(&w),
                    _ => self.medium.phase(),
                };
                pdf_w * self.free_flight_pdf(succ, distance)
            }
            _ => 0.0,
        }
    }

    fn sample_direct(&self, v: &PathVertex, _u: &Point2f, side: TransportMode) -> Option<DirectSample> {
        match side {
            TransportMode::Importance => {
                let dist_sq = v.p.distance_squared(&self.emitter.p);
                if !(dist_sq > 0.0) {
                    return None;
                }
                Some(DirectSample {
                    vertex: self.emitter.sample(),
                    value: self.emitter.intensity / dist_sq,
                    pdf: 1.0,
                })
            }
            TransportMode::Radiance => {
                let d = v.p - self.sensor.p;
                let dist_sq = d.length_squared();
                if !(dist_sq > 0.0) {
                    return None;
                }
                let w = d.normalize();
                let raster = self.sensor.project(&w)?;
                let value = self.sensor.importance(&w) * self.sensor.cos_theta(&w) / dist_sq;
                Some(DirectSample {
                    vertex: self.sensor.sample(raster),
                    value: Spectrum::new(value),
                    pdf: 1.0,
                })
            }
        }
    }

    fn pdf_direct(&self, v: &PathVertex, endpoint: &PathVertex, side: TransportMode) -> Float {
        let visible = match side {
            TransportMode::Importance => endpoint.is_emitter_sample(),
            TransportMode::Radiance => {
                endpoint.is_sensor_sample() && self.sensor.project(&(v.p - self.sensor.p).normalize()).is_some()
            }
        };
        if visible {
            1.0
        } else {
            0.0
        }
    }

    fn connect(&self, a: &PathVertex, b: &PathVertex, _remaining: Int) -> Option<Spectrum> {
        Some(self.medium.tr(a.p.distance(&b.p)))
    }

    fn sensor_position(&self, sensor: &PathVertex, target: &PathVertex) -> Option<Point2f> {
        let d = target.p - sensor.p;
        if d.length_squared() > 0.0 {
            self.sensor.project(&d.normalize())
        } else {
            None
        }
    }

    fn sample_direction(
        &self,
        v: &PathVertex,
        _pred: Option<&PathVertex>,
        u: &Point2f,
        _mode: TransportMode,
    ) -> Option<(Vector3f, Float)> {
        match v.kind {
            VertexKind::EmitterSample | VertexKind::Medium => Some((uniform_sample_sphere(u), uniform_sphere_pdf())),
            VertexKind::SensorSample => {
                let res = self.sensor.resolution;
                let raster = Point2f::new(u.x * res.x as Float, u.y * res.y as Float);
                let w = self.sensor.direction(&raster);
                let pdf = self.sensor.direction_pdf(&w);
                (pdf > 0.0).then_some((w, pdf))
            }
            _ => None,
        }
    }

    fn locate(&self, p: &Point3f, _w: &Vector3f) -> Option<PathVertex> {
        if self.medium.sigma_s.is_black() {
            None
        } else {
            Some(PathVertex::new(VertexKind::Medium, *p))
        }
    }

    fn film_resolution(&self) -> Point2i {
        self.sensor.resolution
    }
}

impl SubpathWalker for FogScene {
    /// Random walk through the medium. Directions are sampled from the emission
    /// profile, the sensor's raster or the phase function, and free-flight
    /// distances from the medium. The walk ends when the medium lets it escape,
    /// when Russian roulette terminates it, or when it holds `max_depth`
    /// vertices besides the supernode.
    fn walk(
        &self,
        sampler: &mut dyn Sampler,
        arena: &mut PathArena,
        root: PathRoot,
        max_depth: Int,
        rr_depth: Int,
        path: &mut Path,
    ) {
        let (mode, supernode, endpoint, mut first_dir) = match root {
            PathRoot::Emitter => (
                TransportMode::Importance,
                self.emitter.supernode(),
                self.emitter.sample(),
                None,
            ),
            PathRoot::Sensor { pixel } => {
                let sample_pos = Point2f::from(pixel) + sampler.get_2d();
                (
                    TransportMode::Radiance,
                    self.sensor.supernode(),
                    self.sensor.sample(sample_pos),
                    Some(self.sensor.direction(&sample_pos)),
                )
            }
        };

        let root_id = arena.alloc_vertex(supernode);
        path.push_root(root_id);
        let first_edge = arena.alloc_edge(PathEdge::default());
        let endpoint_id = arena.alloc_vertex(endpoint);
        path.append(first_edge, endpoint_id);

        let mut throughput = Spectrum::ONE;
        loop {
            let depth = path.length();
            if max_depth >= 0 && depth >= max_depth as usize {
                break;
            }

            let cur_id = path.vertex(depth);
            let pred_id = if depth >= 2 { Some(path.vertex(depth - 1)) } else { None };
            let cur = *arena.vertex(cur_id);
            let pred = pred_id.map(|id| *arena.vertex(id));

            let (w, pdf_w) = match first_dir.take() {
                Some(w) => (w, self.sensor.direction_pdf(&w)),
                None => match self.sample_direction(&cur, pred.as_ref(), &sampler.get_2d(), mode) {
                    Some(s) => s,
                    None => break,
                },
            };
            if !(pdf_w > 0.0) {
                break;
            }

            let ahead = PathVertex::new(VertexKind::Medium, cur.p + w);
            let weight = self.eval(&cur, pred.as_ref(), &ahead, mode) * (cur.abs_cos(&w) / pdf_w);
            if weight.is_black() {
                break;
            }

            let u_channel = sampler.get_1d();
            let distance = match self.medium.sample_distance(u_channel, sampler.get_1d()) {
                Some(d) if d > 0.0 => d,
                _ => break,
            };
            let tr = self.medium.tr(distance);
            let edge_weight = tr / self.medium.distance_pdf(distance);

            let mut rr_weight = 1.0;
            if rr_depth >= 0 && depth as Int >= rr_depth {
                let q = min((throughput * weight).max_component_value(), 0.95);
                if !(sampler.get_1d() < q) {
                    break;
                }
                rr_weight = 1.0 / q;
            }

            let mut next = PathVertex::new(VertexKind::Medium, cur.p + w * distance);
            next.measure = Measure::SolidAngle;
            next.pdf[mode.index()] = self.pdf(&cur, pred.as_ref(), &next, mode);

            let d = match mode {
                TransportMode::Importance => w,
                TransportMode::Radiance => -w,
            };
            let edge = PathEdge {
                length: distance,
                d,
                weight: [edge_weight; 2],
                tr,
            };

            {
                let v = arena.vertex_mut(cur_id);
                v.weight[mode.index()] = weight;
                v.rr_weight = rr_weight;
            }
            if let (Some(id), Some(pred)) = (pred_id, pred) {
                let other = mode.other();
                arena.vertex_mut(id).pdf[other.index()] = self.pdf(&cur, Some(&next), &pred, other);
            }

            let edge_id = arena.alloc_edge(edge);
            let next_id = arena.alloc_vertex(next);
            path.append(edge_id, next_id);

            throughput *= weight * edge_weight * rr_weight;
        }
    }
}

impl TryFrom<&ParamSet> for FogScene {
    type Error = String;

    /// Builds the scene from `sigmaA`, `sigmaS`, `lightX/Y/Z`, `intensity`,
    /// `cameraX/Y/Z`, `fov`, `width` and `height`. The camera looks down the
    /// positive z-axis.
    ///
    /// * `params` - Parameter set.
    fn try_from(params: &ParamSet) -> Result<Self, Self::Error> {
        let sigma_a = params.find_one_float("sigmaA", 0.0);
        let sigma_s = params.find_one_float("sigmaS", 0.1);
        if sigma_a < 0.0 || sigma_s < 0.0 {
            return Err(format!("medium coefficients sigmaA={sigma_a}, sigmaS={sigma_s} must not be negative"));
        }
        let medium = HomogeneousMedium::new(Spectrum::new(sigma_a), Spectrum::new(sigma_s));

        let light = Point3f::new(
            params.find_one_float("lightX", 0.0),
            params.find_one_float("lightY", 0.0),
            params.find_one_float("lightZ", 5.0),
        );
        let intensity = params.find_one_float("intensity", 10.0);
        if !(intensity >= 0.0) {
            return Err(format!("intensity {intensity} must not be negative"));
        }
        let emitter = PointEmitter::new(light, Spectrum::new(intensity));

        let eye = Point3f::new(
            params.find_one_float("cameraX", 0.0),
            params.find_one_float("cameraY", 0.0),
            params.find_one_float("cameraZ", 0.0),
        );
        let resolution = Point2i::new(params.find_one_int("width", 768), params.find_one_int("height", 576));
        let sensor = PinholeSensor::new(
            eye,
            eye + Vector3f::new(0.0, 0.0, 1.0),
            Vector3f::new(0.0, 1.0, 0.0),
            params.find_one_float("fov", 45.0),
            resolution,
        )?;

        debug!("Fog scene: sigma_t {}, emitter at {}, sensor at {}", medium.sigma_t, light, eye);
        Ok(Self::new(medium, emitter, sensor))
    }
}

// ---- Tests ----
