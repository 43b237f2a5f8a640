//! Local Shading Frames

use super::*;
use crate::base::*;

/// An orthonormal basis `(s, t, n)`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Frame {
    /// First tangent.
    pub s: Vector3f,

    /// Second tangent.
    pub t: Vector3f,

    /// Normal (local z-axis).
    pub n: Vector3f,
}

impl Frame {
    /// Builds a frame around a unit vector using the branchless construction
    /// of Duff et al.
    ///
    /// * `n` - The unit vector that becomes the local z-axis.
    pub fn from_normal(n: &Vector3f) -> Self {
        let sign = if n.z >= 0.0 { 1.0 } else { -1.0 };
        let a = -1.0 / (sign + n.z);
        let b = n.x * n.y * a;
        let s = Vector3f::new(1.0 + sign * n.x * n.x * a, sign * b, -sign * n.x);
        let t = Vector3f::new(b, sign + n.y * n.y * a, -n.y);
        Self { s, t, n: *n }
    }

    /// Converts a world space vector into local coordinates.
    ///
    /// * `v` - The world space vector.
    pub fn to_local(&self, v: &Vector3f) -> Vector3f {
        Vector3f::new(v.dot(&self.s), v.dot(&self.t), v.dot(&self.n))
    }

    /// Converts a local vector into world space.
    ///
    /// * `v` - The local vector.
    pub fn to_world(&self, v: &Vector3f) -> Vector3f {
        self.s * v.x + self.t * v.y + self.n * v.z
    }

    /// Returns the local direction for spherical angles about the z-axis.
    ///
    /// * `cos_theta` - Cosine of the polar angle.
    /// * `phi`       - Azimuth.
    pub fn spherical_direction(cos_theta: Float, phi: Float) -> Vector3f {
        let sin_theta = safe_sqrt(1.0 - cos_theta * cos_theta);
        Vector3f::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta)
    }
}

// ---- Tests ----
