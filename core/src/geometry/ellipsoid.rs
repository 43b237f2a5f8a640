//! Prolate Ellipsoids of Revolution
//!
//! The locus of points whose distances to two foci sum to a constant. Points
//! are parameterized from the first focus by the polar angle to the major axis
//! and an azimuth about it.

use super::*;
use crate::base::*;

/// An ellipsoid defined by its foci and the constant sum of focal distances.
#[derive(Copy, Clone, Debug)]
pub struct Ellipsoid {
    /// First focus. Angular coordinates are measured from here.
    pub f1: Point3f,

    /// Second focus.
    pub f2: Point3f,

    /// Semi-major axis; half the constant path length.
    pub a: Float,

    /// Half the distance between the foci.
    pub c: Float,

    /// Frame whose z-axis points from `f1` to `f2`.
    pub frame: Frame,
}

impl Ellipsoid {
    /// Creates the ellipsoid of points `x` with `|x - f1| + |x - f2| = length`.
    /// Returns `None` when no real ellipsoid exists, i.e. when the length does
    /// not exceed the focal distance.
    ///
    /// * `f1`     - First focus.
    /// * `f2`     - Second focus.
    /// * `length` - Sum of distances to the foci.
    pub fn new(f1: Point3f, f2: Point3f, length: Float) -> Option<Self> {
        let axis = f2 - f1;
        let focal_distance = axis.length();
        if !(length > 0.0) || length <= focal_distance * (1.0 + SHADOW_EPSILON) {
            return None;
        }

        let n = if focal_distance > 0.0 {
            axis / focal_distance
        } else {
            Vector3f::new(0.0, 0.0, 1.0)
        };

        Some(Self {
            f1,
            f2,
            a: 0.5 * length,
            c: 0.5 * focal_distance,
            frame: Frame::from_normal(&n),
        })
    }

    /// Returns the constant sum of focal distances.
    pub fn length(&self) -> Float {
        2.0 * self.a
    }

    /// Returns the distance from `f1` to the surface along a direction making
    /// the given angle with the major axis.
    ///
    /// * `cos_theta` - Cosine of the angle between the direction and the axis.
    pub fn radius(&self, cos_theta: Float) -> Float {
        (self.a * self.a - self.c * self.c) / (self.a - self.c * cos_theta)
    }

    /// Returns the world space direction from `f1` for angular coordinates.
    ///
    /// * `cos_theta` - Cosine of the polar angle about the major axis.
    /// * `phi`       - Azimuth about the major axis.
    pub fn direction(&self, cos_theta: Float, phi: Float) -> Vector3f {
        self.frame.to_world(&Frame::spherical_direction(cos_theta, phi))
    }

    /// Returns the angular coordinates `(cos_theta, phi)` of a unit direction
    /// leaving `f1`.
    ///
    /// * `w` - The unit direction.
    pub fn angles(&self, w: &Vector3f) -> (Float, Float) {
        let local = self.frame.to_local(w);
        let phi = local.y.atan2(local.x);
        (
            clamp(local.z, -1.0, 1.0),
            if phi < 0.0 { phi + TWO_PI } else { phi },
        )
    }

    /// Returns the surface point hit by travelling from `f1` along a unit
    /// direction, together with its distance from `f1`.
    ///
    /// * `w` - The unit direction.
    pub fn point(&self, w: &Vector3f) -> (Point3f, Float) {
        let r = self.radius(clamp(w.dot(&self.frame.n), -1.0, 1.0));
        (self.f1 + *w * r, r)
    }

    /// Returns the sum of distances from a point to the two foci.
    ///
    /// * `p` - The point.
    pub fn path_length(&self, p: &Point3f) -> Float {
        p.distance(&self.f1) + p.distance(&self.f2)
    }

    /// Returns the outward unit surface normal at a point on the ellipsoid.
    ///
    /// * `p` - The point.
    pub fn normal(&self, p: &Point3f) -> Vector3f {
        self.length_gradient(p).normalize()
    }

    /// Returns the gradient of the path length function `|p-f1| + |p-f2|`.
    ///
    /// * `p` - The point.
    pub fn length_gradient(&self, p: &Point3f) -> Vector3f {
        let w1 = (*p - self.f1).normalize();
        let d2 = *p - self.f2;
        let l2 = d2.length();
        if l2 > 0.0 {
            w1 + d2 / l2
        } else {
            w1
        }
    }

    /// Converts a solid angle density at `f1` into a density per unit volume
    /// per unit path length at the matching surface point. Dividing a
    /// contribution by `pdf_solid_angle` and multiplying by this factor yields an
    /// estimate resolved by path length.
    ///
    /// * `p` - A point on the ellipsoid.
    pub fn solid_angle_to_length_jacobian(&self, p: &Point3f) -> Float {
        let d1 = *p - self.f1;
        let r = d1.length();
        let denom = self.length_gradient(p).dot(&(d1 / r));
        if denom <= 0.0 {
            0.0
        } else {
            r * r / denom
        }
    }
}

// ---- Tests ----

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::*;
    use proptest::prelude::*;

    fn test_ellipsoid() -> Ellipsoid {
        Ellipsoid::new(Point3f::new(1.0, -2.0, 0.5), Point3f::new(3.0, 1.0, -0.5), 7.0).unwrap()
    }

    #[test]
    fn no_real_ellipsoid_for_short_length() {
        let f1 = Point3f::new(0.0, 0.0, 0.0);
        let f2 = Point3f::new(2.0, 0.0, 0.0);
        assert!(Ellipsoid::new(f1, f2, 2.0).is_none());
        assert!(Ellipsoid::new(f1, f2, 1.0).is_none());
        assert!(Ellipsoid::new(f1, f2, -5.0).is_none());
        assert!(Ellipsoid::new(f1, f2, 2.5).is_some());
    }

    #[test]
    fn coincident_foci_give_a_sphere() {
        let f = Point3f::new(0.0, 1.0, 0.0);
        let e = Ellipsoid::new(f, f, 4.0).unwrap();
        for &mu in &[-1.0, -0.3, 0.0, 0.7, 1.0] {
            assert!(approx_eq!(f32, e.radius(mu), 2.0, epsilon = 1e-6));
        }
    }

    #[test]
    fn radius_along_axis_reaches_vertex() {
        let e = test_ellipsoid();
        assert!(approx_eq!(f32, e.radius(1.0), e.a + e.c, epsilon = 1e-5));
        assert!(approx_eq!(f32, e.radius(-1.0), e.a - e.c, epsilon = 1e-5));
    }

    #[test]
    fn jacobian_integrates_to_volume_derivative() {
        // The volume of the ellipsoid is 4/3 π a b², so d(volume)/d(length)
        // is 2/3 π (3a² - c²).
        let e = test_ellipsoid();
        let n_mu = 4000;
        let mut sum = 0.0f64;
        for i in 0..n_mu {
            let mu = -1.0 + 2.0 * (i as Float + 0.5) / n_mu as Float;
            let w = e.direction(mu, 0.3);
            let (p, _) = e.point(&w);
            sum += e.solid_angle_to_length_jacobian(&p) as f64;
        }
        let integral = sum * (2.0 / n_mu as f64) * 2.0 * std::f64::consts::PI;
        let (a, c) = (e.a as f64, e.c as f64);
        let expected = 2.0 / 3.0 * std::f64::consts::PI * (3.0 * a * a - c * c);
        assert!((integral - expected).abs() / expected < 1e-3);
    }

    proptest! {
        #[test]
        fn sampled_points_lie_on_the_ellipsoid(mu in -1.0f32..1.0f32, phi in 0.0f32..TWO_PI) {
            let e = test_ellipsoid();
            let w = e.direction(mu, phi);
            let (p, r) = e.point(&w);
            prop_assert!(approx_eq!(f32, p.distance(&e.f1), r, epsilon = 1e-4));
            let rel = abs(e.path_length(&p) - e.length()) / e.length();
            prop_assert!(rel < 1e-4);
        }

        #[test]
        fn angles_invert_direction(mu in -0.99f32..0.99f32, phi in 0.0f32..6.28f32) {
            let e = test_ellipsoid();
            let (m, ph) = e.angles(&e.direction(mu, phi));
            prop_assert!(approx_eq!(f32, m, mu, epsilon = 1e-4));
            prop_assert!(abs(ph - phi) < 1e-3 || abs(abs(ph - phi) - TWO_PI) < 1e-3);
        }

        #[test]
        fn normal_is_unit_and_outward(mu in -1.0f32..1.0f32, phi in 0.0f32..TWO_PI) {
            let e = test_ellipsoid();
            let w = e.direction(mu, phi);
            let (p, _) = e.point(&w);
            let n = e.normal(&p);
            prop_assert!(approx_eq!(f32, n.length(), 1.0, epsilon = 1e-4));
            prop_assert!(n.dot(&w) > 0.0);
        }
    }
}
