//! Path Edge

use super::PathVertex;
use crate::base::*;
use crate::geometry::*;
use crate::spectrum::*;
use bitflags::bitflags;

bitflags! {
    /// Selects the factors evaluated by `PathEdge::eval_cached()`.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct EdgeTerms: u8 {
        /// Transmittance along the segment.
        const TRANSMITTANCE = 1;

        /// Inverse squared distance.
        const INVERSE_SQUARE = 2;

        /// Foreshortening at the vertex on the emitter side.
        const COSINE_EMITTER_SIDE = 4;

        /// Foreshortening at the vertex on the sensor side.
        const COSINE_SENSOR_SIDE = 8;

        /// Geometric term of a deterministic connection.
        const GEOMETRIC = Self::INVERSE_SQUARE.bits()
            | Self::COSINE_EMITTER_SIDE.bits()
            | Self::COSINE_SENSOR_SIDE.bits();

        /// Everything a generic connection needs.
        const EVERYTHING = Self::TRANSMITTANCE.bits() | Self::GEOMETRIC.bits();
    }
}

/// An edge of a sub-path.
#[derive(Copy, Clone, Debug)]
pub struct PathEdge {
    /// Physical length of the segment.
    pub length: Float,

    /// Unit direction pointing from the emitter side to the sensor side.
    pub d: Vector3f,

    /// Outgoing weight per transport mode, transmittance divided by the distance sampling density.
    pub weight: [Spectrum; 2],

    /// Transmittance along the segment.
    pub tr: Spectrum,
}

impl Default for PathEdge {
    fn default() -> Self {
        Self {
            length: 0.0,
            d: Vector3f::default(),
            weight: [Spectrum::ONE; 2],
            tr: Spectrum::ONE,
        }
    }
}

impl PathEdge {
    /// Create the edge of a deterministic connection.
    ///
    /// * `a`  - Vertex on the emitter side.
    /// * `b`  - Vertex on the sensor side.
    /// * `tr` - Transmittance between them.
    pub fn between(a: &PathVertex, b: &PathVertex, tr: Spectrum) -> Self {
        let v = b.p - a.p;
        let length = v.length();
        let d = if length > 0.0 { v / length } else { Vector3f::default() };
        Self {
            length,
            d,
            weight: [tr; 2],
            tr,
        }
    }

    /// Evaluates the selected factors of the edge between its end points.
    ///
    /// * `a`     - Vertex on the emitter side.
    /// * `b`     - Vertex on the sensor side.
    /// * `terms` - Factors to evaluate.
    pub fn eval_cached(&self, a: &PathVertex, b: &PathVertex, terms: EdgeTerms) -> Spectrum {
        let mut g: Float = 1.0;
        if terms.contains(EdgeTerms::INVERSE_SQUARE) {
            if self.length <= 0.0 {
                return Spectrum::ZERO;
            }
            g /= self.length * self.length;
        }
        if terms.contains(EdgeTerms::COSINE_EMITTER_SIDE) {
            g *= a.abs_cos(&self.d);
        }
        if terms.contains(EdgeTerms::COSINE_SENSOR_SIDE) {
            g *= b.abs_cos(&self.d);
        }

        if terms.contains(EdgeTerms::TRANSMITTANCE) {
            self.tr * g
        } else {
            Spectrum::new(g)
        }
    }
}

// ---- Tests ----
#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::VertexKind;
    use float_cmp::*;

    #[test]
    fn geometric_term_uses_normals() {
        let mut a = PathVertex::new(VertexKind::Surface, Point3f::new(0.0, 0.0, 0.0));
        a.n = Some(Vector3f::new(0.0, 0.0, 1.0));
        let b = PathVertex::new(VertexKind::Medium, Point3f::new(0.0, 3.0, 4.0));

        let e = PathEdge::between(&a, &b, Spectrum::new(0.5));
        assert!(approx_eq!(f32, e.length, 5.0, epsilon = 1e-6));

        let g = e.eval_cached(&a, &b, EdgeTerms::GEOMETRIC);
        assert!(approx_eq!(f32, g[0], 0.8 / 25.0, epsilon = 1e-6));

        let everything = e.eval_cached(&a, &b, EdgeTerms::EVERYTHING);
        assert!(approx_eq!(f32, everything[1], 0.4 / 25.0, epsilon = 1e-6));

        let direct = e.eval_cached(&a, &b, EdgeTerms::TRANSMITTANCE | EdgeTerms::COSINE_SENSOR_SIDE);
        assert!(approx_eq!(f32, direct[2], 0.5, epsilon = 1e-6));
    }

    #[test]
    fn zero_length_has_no_geometric_term() {
        let a = PathVertex::new(VertexKind::Medium, Point3f::new(1.0, 1.0, 1.0));
        let e = PathEdge::between(&a, &a, Spectrum::ONE);
        assert!(e.eval_cached(&a, &a, EdgeTerms::GEOMETRIC).is_black());
        assert_eq!(e.eval_cached(&a, &a, EdgeTerms::TRANSMITTANCE), Spectrum::ONE);
    }
}
