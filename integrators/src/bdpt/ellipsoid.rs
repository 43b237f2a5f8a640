//! Ellipsoidal Connections

use tof_core::base::*;
use tof_core::geometry::*;
use tof_core::path::*;
use tof_core::scene::*;
use tof_core::spectrum::*;

/// A scattering vertex inserted between two sub-paths so that the joined path has a prescribed length.
#[derive(Copy, Clone, Debug)]
pub struct EllipsoidalConnection {
    /// The inserted vertex.
    pub vertex: PathVertex,

    /// Edges from the emitter side vertex to the inserted vertex and from there to the sensor side vertex.
    pub edges: [PathEdge; 2],

    /// Length of the two edges.
    pub length: Float,

    /// Throughput of the connection from the emitter side vertex to the sensor side vertex, both included, divided by
    /// the density of the inserted vertex per unit volume and per unit path length.
    pub value: Spectrum,
}

/// Samples connections constrained to an ellipsoid whose foci are the two connected vertices.
pub struct EllipsoidalConnector<'a> {
    /// The scene.
    scene: &'a dyn Scene,
}

impl<'a> EllipsoidalConnector<'a> {
    /// Create a new `EllipsoidalConnector`.
    ///
    /// * `scene` - The scene.
    pub fn new(scene: &'a dyn Scene) -> Self {
        Self { scene }
    }

    /// Samples a vertex `x` with `|vs - x| + |x - vt| = remaining_length`.
    ///
    /// A direction is drawn from the scattering profile at `vs` and intersected with the ellipsoid. The returned value
    /// includes the Jacobian between solid angle at `vs` and path length, so multiplying it by the reciprocal density
    /// of the target length gives an estimate of the length resolved transport. Returns `None` when the ellipsoid does
    /// not exist, when the sampled point cannot scatter, or when a segment is blocked.
    ///
    /// * `vs`               - Last emitter side vertex.
    /// * `vs_pred`          - Its predecessor; `None` when `vs` is the emitter sample.
    /// * `vt`               - Last sensor side vertex.
    /// * `vt_pred`          - Its predecessor; `None` when `vt` is the sensor sample.
    /// * `remaining_length` - Length the two new edges must add up to.
    /// * `remaining`        - Index-matched interfaces that may be crossed; negative for unlimited.
    /// * `u`                - Sample value for the direction.
    pub fn sample(
        &self,
        vs: &PathVertex,
        vs_pred: Option<&PathVertex>,
        vt: &PathVertex,
        vt_pred: Option<&PathVertex>,
        remaining_length: Float,
        remaining: Int,
        u: &Point2f,
    ) -> Option<EllipsoidalConnection> {
        if !(remaining_length > 0.0) {
            return None;
        }
        let ellipsoid = Ellipsoid::new(vs.p, vt.p, remaining_length)?;

        let (w, pdf_w) = self
            .scene
            .sample_direction(vs, vs_pred, u, TransportMode::Importance)?;
        if !(pdf_w > 0.0) {
            return None;
        }

        let (p, _) = ellipsoid.point(&w);
        let jacobian = ellipsoid.solid_angle_to_length_jacobian(&p);
        if !(jacobian > 0.0 && jacobian.is_finite()) {
            return None;
        }

        let mut x = self.scene.locate(&p, &w)?;
        x.measure = Measure::Area;

        let tr_in = self.scene.connect(vs, &x, remaining)?;
        let tr_out = self.scene.connect(&x, vt, remaining)?;
        let e_in = PathEdge::between(vs, &x, tr_in);
        let e_out = PathEdge::between(&x, vt, tr_out);

        let value = self.scene.eval(vs, vs_pred, &x, TransportMode::Importance)
            * e_in.eval_cached(vs, &x, EdgeTerms::EVERYTHING)
            * self.scene.eval(&x, Some(vs), vt, TransportMode::Importance)
            * e_out.eval_cached(&x, vt, EdgeTerms::EVERYTHING)
            * self.scene.eval(vt, vt_pred, &x, TransportMode::Radiance)
            * (jacobian / pdf_w);
        if value.is_black() || !value.is_valid() {
            return None;
        }

        Some(EllipsoidalConnection {
            vertex: x,
            edges: [e_in, e_out],
            length: e_in.length + e_out.length,
            value,
        })
    }
}

// ---- Tests ----

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tof_scenes::*;

    fn fog() -> FogScene {
        let sensor = PinholeSensor::new(
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(0.0, 0.0, 1.0),
            Vector3f::new(0.0, 1.0, 0.0),
            60.0,
            Point2i::new(8, 8),
        )
        .unwrap();
        FogScene::new(
            HomogeneousMedium::new(Spectrum::new(0.02), Spectrum::new(0.3)),
            PointEmitter::new(Point3f::new(0.0, 0.0, 5.0), Spectrum::new(1.0)),
            sensor,
        )
    }

    fn medium_vertex(p: Point3f) -> PathVertex {
        PathVertex::new(VertexKind::Medium, p)
    }

    #[test]
    fn too_short_lengths_fail() {
        let scene = fog();
        let connector = EllipsoidalConnector::new(&scene);
        let vs = medium_vertex(Point3f::new(0.0, 0.0, 3.0));
        let vt = medium_vertex(Point3f::new(0.0, 0.0, 1.0));
        let u = Point2f::new(0.3, 0.6);
        assert!(connector.sample(&vs, None, &vt, None, -1.0, -1, &u).is_none());
        assert!(connector.sample(&vs, None, &vt, None, 1.5, -1, &u).is_none());
    }

    #[test]
    fn vacuum_has_no_scattering_vertex() {
        let mut scene = fog();
        scene.medium = HomogeneousMedium::vacuum();
        let connector = EllipsoidalConnector::new(&scene);
        let vs = medium_vertex(Point3f::new(0.0, 0.0, 3.0));
        let vt = medium_vertex(Point3f::new(0.0, 0.0, 1.0));
        assert!(connector
            .sample(&vs, None, &vt, None, 4.0, -1, &Point2f::new(0.5, 0.5))
            .is_none());
    }

    proptest! {
        #[test]
        fn connection_has_requested_length(
            extra in 0.1f32..6.0,
            ux in 0.0f32..1.0,
            uy in 0.0f32..1.0,
        ) {
            let scene = fog();
            let connector = EllipsoidalConnector::new(&scene);
            let vs = medium_vertex(Point3f::new(0.5, -0.2, 3.0));
            let vt = medium_vertex(Point3f::new(-0.3, 0.1, 1.0));
            let target = vs.p.distance(&vt.p) + extra;

            let c = connector.sample(&vs, None, &vt, None, target, -1, &Point2f::new(ux, uy));
            prop_assert!(c.is_some());
            let c = c.unwrap();
            prop_assert!((c.length - target).abs() <= 1e-4 * target + 1e-4, "{} != {}", c.length, target);
            prop_assert!(c.value.is_valid() && !c.value.is_black());
            prop_assert!(c.vertex.is_medium_interaction());
        }
    }
}
