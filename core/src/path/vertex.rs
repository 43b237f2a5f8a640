//! Path Vertex

use super::{Measure, TransportMode};
use crate::base::*;
use crate::geometry::*;
use crate::spectrum::*;
use bitflags::bitflags;

/// Classification of a path vertex.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VertexKind {
    /// Placeholder for an unused arena slot.
    Invalid,

    /// Abstract vertex standing for all emitters of the scene.
    EmitterSupernode,

    /// Abstract vertex standing for the sensor.
    SensorSupernode,

    /// Position sampled on an emitter.
    EmitterSample,

    /// Position sampled on the sensor aperture.
    SensorSample,

    /// Scattering event on a surface.
    Surface,

    /// Scattering event inside a participating medium.
    Medium,
}

bitflags! {
    /// Capability flags of a path vertex.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct VertexFlags: u8 {
        /// The scattering or emission profile is a Dirac delta; the vertex cannot be connected to.
        const DEGENERATE = 1;

        /// The endpoint position was not sampled from a continuous density.
        const DELTA_POSITION = 2;

        /// The endpoint direction was not sampled from a continuous density.
        const DELTA_DIRECTION = 4;
    }
}

/// A vertex of a sub-path.
#[derive(Copy, Clone, Debug)]
pub struct PathVertex {
    /// Classification.
    pub kind: VertexKind,

    /// Capability flags.
    pub flags: VertexFlags,

    /// Measure of `pdf`.
    pub measure: Measure,

    /// Position. Supernodes leave this at the origin.
    pub p: Point3f,

    /// Surface normal for surface and endpoint vertices; `None` inside media.
    pub n: Option<Vector3f>,

    /// Outgoing weight per transport mode, the sampled value divided by its density.
    pub weight: [Spectrum; 2],

    /// Area density with which the vertex was generated from the importance (index 0) and radiance (index 1) side.
    pub pdf: [Float; 2],

    /// Russian roulette survival weight.
    pub rr_weight: Float,

    /// Raster position of a sensor sample.
    pub sample_pos: Point2f,
}

impl Default for PathVertex {
    fn default() -> Self {
        Self {
            kind: VertexKind::Invalid,
            flags: VertexFlags::empty(),
            measure: Measure::Area,
            p: Point3f::default(),
            n: None,
            weight: [Spectrum::ZERO; 2],
            pdf: [0.0; 2],
            rr_weight: 1.0,
            sample_pos: Point2f::default(),
        }
    }
}

impl PathVertex {
    /// Create a vertex of a given kind at a position with unit weights.
    ///
    /// * `kind` - Classification.
    /// * `p`    - Position.
    pub fn new(kind: VertexKind, p: Point3f) -> Self {
        Self {
            kind,
            p,
            weight: [Spectrum::ONE; 2],
            ..Default::default()
        }
    }

    /// Returns `true` for either supernode.
    #[inline]
    pub fn is_supernode(&self) -> bool {
        matches!(self.kind, VertexKind::EmitterSupernode | VertexKind::SensorSupernode)
    }

    /// Returns `true` for the emitter supernode.
    #[inline]
    pub fn is_emitter_supernode(&self) -> bool {
        self.kind == VertexKind::EmitterSupernode
    }

    /// Returns `true` for the sensor supernode.
    #[inline]
    pub fn is_sensor_supernode(&self) -> bool {
        self.kind == VertexKind::SensorSupernode
    }

    /// Returns `true` for a position on an emitter.
    #[inline]
    pub fn is_emitter_sample(&self) -> bool {
        self.kind == VertexKind::EmitterSample
    }

    /// Returns `true` for a position on the sensor.
    #[inline]
    pub fn is_sensor_sample(&self) -> bool {
        self.kind == VertexKind::SensorSample
    }

    /// Returns `true` for an endpoint sample on either side.
    #[inline]
    pub fn is_endpoint(&self) -> bool {
        self.is_emitter_sample() || self.is_sensor_sample()
    }

    /// Returns `true` for a scattering event inside a medium.
    #[inline]
    pub fn is_medium_interaction(&self) -> bool {
        self.kind == VertexKind::Medium
    }

    /// Returns `true` when the vertex cannot take part in a deterministic connection.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.flags.contains(VertexFlags::DEGENERATE)
    }

    /// Returns `true` when a connection may end at this vertex.
    #[inline]
    pub fn is_connectable(&self) -> bool {
        !self.is_degenerate()
    }

    /// Returns `true` for an emitter endpoint that needs neither a position nor a direction sample (a laser).
    #[inline]
    pub fn is_laser(&self) -> bool {
        self.is_emitter_sample()
            && self
                .flags
                .contains(VertexFlags::DELTA_POSITION | VertexFlags::DELTA_DIRECTION)
    }

    /// Returns the outgoing weight for a transport mode.
    ///
    /// * `mode` - Transport mode.
    #[inline]
    pub fn weight(&self, mode: TransportMode) -> Spectrum {
        self.weight[mode.index()]
    }

    /// Returns the stored density for a transport mode.
    ///
    /// * `mode` - Transport mode.
    #[inline]
    pub fn pdf(&self, mode: TransportMode) -> Float {
        self.pdf[mode.index()]
    }

    /// Returns `|cos|` between the vertex normal and a unit direction or 1 when the vertex has no normal.
    ///
    /// * `w` - Unit direction.
    pub fn abs_cos(&self, w: &Vector3f) -> Float {
        self.n.map_or(1.0, |n| n.abs_dot(w))
    }
}

// ---- Tests ----
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn laser_needs_both_delta_flags() {
        let mut v = PathVertex::new(VertexKind::EmitterSample, Point3f::default());
        assert!(!v.is_laser());

        v.flags = VertexFlags::DELTA_POSITION;
        assert!(!v.is_laser());

        v.flags |= VertexFlags::DELTA_DIRECTION;
        assert!(v.is_laser());

        v.kind = VertexKind::SensorSample;
        assert!(!v.is_laser());
    }

    #[test]
    fn degenerate_is_not_connectable() {
        let mut v = PathVertex::new(VertexKind::Surface, Point3f::default());
        assert!(v.is_connectable());
        v.flags.insert(VertexFlags::DEGENERATE);
        assert!(!v.is_connectable());
    }

    #[test]
    fn abs_cos_without_normal() {
        let mut v = PathVertex::new(VertexKind::Medium, Point3f::default());
        let w = Vector3f::new(0.0, 0.6, 0.8);
        assert_eq!(v.abs_cos(&w), 1.0);

        v.n = Some(Vector3f::new(0.0, 0.0, -1.0));
        assert!((v.abs_cos(&w) - 0.8).abs() < 1e-6);
    }
}
