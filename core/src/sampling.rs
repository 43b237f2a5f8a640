//! Sampling Routines

use crate::base::*;
use crate::geometry::*;

/// Uniformly samples a direction on the unit sphere.
///
/// * `u` - Uniform sample in `[0, 1)^2`.
pub fn uniform_sample_sphere(u: &Point2f) -> Vector3f {
    let z = 1.0 - 2.0 * u.x;
    let r = safe_sqrt(1.0 - z * z);
    let phi = TWO_PI * u.y;
    Vector3f::new(r * phi.cos(), r * phi.sin(), z)
}

/// Returns the solid angle density of `uniform_sample_sphere()`.
#[inline]
pub fn uniform_sphere_pdf() -> Float {
    INV_FOUR_PI
}

/// Samples a free-flight distance from an exponential distribution.
///
/// * `sigma_t` - Extinction coefficient. Must be positive.
/// * `u`       - Uniform sample in `[0, 1)`.
pub fn sample_exponential(sigma_t: Float, u: Float) -> Float {
    -(1.0 - u).ln() / sigma_t
}

// ---- Tests ----
