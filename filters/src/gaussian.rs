//! Gaussian Filter

use byteorder::{LittleEndian, WriteBytesExt};
use std::io::Write;
use tof_core::base::*;
use tof_core::filter::*;
use tof_core::geometry::*;
use tof_core::paramset::*;

/// Implements a Gaussian filter that is shifted down so it reaches 0 at its radius.
pub struct GaussianFilter {
    /// Filter data.
    pub data: FilterData,

    /// Falloff rate.
    pub alpha: Float,

    /// Value of the Gaussian at the radius in x.
    exp_x: Float,

    /// Value of the Gaussian at the radius in y.
    exp_y: Float,
}

impl GaussianFilter {
    /// Tag identifying the filter in serialized configurations.
    pub const TYPE_TAG: u32 = 2;

    /// Returns a new instance of `GaussianFilter`.
    ///
    /// * `radius` - Radius of the filter in x and y directions.
    /// * `alpha`  - Falloff rate; larger values give a narrower filter.
    pub fn new(radius: Vector2f, alpha: Float) -> Self {
        Self {
            data: FilterData::new(radius),
            alpha,
            exp_x: (-alpha * radius.x * radius.x).exp(),
            exp_y: (-alpha * radius.y * radius.y).exp(),
        }
    }

    /// Evaluates the shifted 1-D Gaussian.
    ///
    /// * `d`    - Distance from the center.
    /// * `expv` - Value at the radius.
    fn gaussian(&self, d: Float, expv: Float) -> Float {
        max(0.0, (-self.alpha * d * d).exp() - expv)
    }
}

impl Filter for GaussianFilter {
    fn get_data(&self) -> &FilterData {
        &self.data
    }

    fn evaluate(&self, p: &Point2f) -> Float {
        self.gaussian(p.x, self.exp_x) * self.gaussian(p.y, self.exp_y)
    }

    fn type_tag(&self) -> u32 {
        Self::TYPE_TAG
    }

    fn serialize(&self, w: &mut dyn Write) -> std::io::Result<()> {
        w.write_f32::<LittleEndian>(self.data.radius.x)?;
        w.write_f32::<LittleEndian>(self.data.radius.y)?;
        w.write_f32::<LittleEndian>(self.alpha)
    }
}

impl From<&ParamSet> for GaussianFilter {
    /// Create a `GaussianFilter` from `ParamSet`.
    ///
    /// * `params` - Parameter set.
    fn from(params: &ParamSet) -> Self {
        let xw = params.find_one_float("xwidth", 2.0);
        let yw = params.find_one_float("ywidth", 2.0);
        let alpha = params.find_one_float("alpha", 2.0);
        Self::new(Vector2f::new(xw, yw), alpha)
    }
}

// ---- Tests ----
#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::*;

    #[test]
    fn vanishes_at_radius() {
        let f = GaussianFilter::from(&ParamSet::new());
        assert_eq!(f.evaluate(&Point2f::new(2.0, 0.0)), 0.0);
        assert_eq!(f.evaluate(&Point2f::new(0.0, 2.5)), 0.0);

        let peak = (1.0 - f.exp_x) * (1.0 - f.exp_y);
        assert!(approx_eq!(f32, f.evaluate(&Point2f::new(0.0, 0.0)), peak, epsilon = 1e-6));
        assert!(f.evaluate(&Point2f::new(0.5, 0.5)) < peak);
    }
}
