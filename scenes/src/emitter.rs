//! Point Emitter

use tof_core::base::*;
use tof_core::geometry::*;
use tof_core::path::*;
use tof_core::spectrum::*;

/// An isotropic point light.
#[derive(Copy, Clone, Debug)]
pub struct PointEmitter {
    /// Position.
    pub p: Point3f,

    /// Radiant intensity.
    pub intensity: Spectrum,
}

impl PointEmitter {
    /// Create a new `PointEmitter`.
    ///
    /// * `p`         - Position.
    /// * `intensity` - Radiant intensity.
    pub fn new(p: Point3f, intensity: Spectrum) -> Self {
        Self { p, intensity }
    }

    /// Returns the total emitted power.
    pub fn power(&self) -> Spectrum {
        self.intensity * FOUR_PI
    }

    /// Returns the supernode that starts every emitter sub-path. Its importance
    /// weight carries the emitted power.
    pub fn supernode(&self) -> PathVertex {
        let mut v = PathVertex::new(VertexKind::EmitterSupernode, Point3f::default());
        v.measure = Measure::Discrete;
        v.weight[TransportMode::Importance.index()] = self.power();
        v.pdf = [1.0; 2];
        v
    }

    /// Returns the position sample on the emitter. The position is fixed, so its
    /// density is one in discrete measure.
    pub fn sample(&self) -> PathVertex {
        let mut v = PathVertex::new(VertexKind::EmitterSample, self.p);
        v.flags = VertexFlags::DELTA_POSITION;
        v.measure = Measure::Discrete;
        v.pdf[TransportMode::Importance.index()] = 1.0;
        v
    }

    /// Returns the directional emission profile, normalised to integrate to one
    /// over the sphere.
    pub fn profile(&self) -> Spectrum {
        Spectrum::new(INV_FOUR_PI)
    }
}
