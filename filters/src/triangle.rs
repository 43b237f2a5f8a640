//! Triangle Filter

use byteorder::{LittleEndian, WriteBytesExt};
use std::io::Write;
use tof_core::base::*;
use tof_core::filter::*;
use tof_core::geometry::*;
use tof_core::paramset::*;

/// Implements the triangle filter in which the weight falls off linearly from
/// the filter center over the square extent of the filter.
pub struct TriangleFilter {
    /// Filter data.
    pub data: FilterData,
}

impl TriangleFilter {
    /// Tag identifying the filter in serialized configurations.
    pub const TYPE_TAG: u32 = 3;

    /// Returns a new instance of `TriangleFilter`.
    ///
    /// * `radius` - Radius of the filter in x and y directions; beyond this
    ///              filter is 0.
    pub fn new(radius: Vector2f) -> Self {
        Self {
            data: FilterData::new(radius),
        }
    }
}

impl Filter for TriangleFilter {
    /// Return the filter parameters.
    fn get_data(&self) -> &FilterData {
        &self.data
    }

    /// Returns value of the filter at a given point.
    ///
    /// * `p` - The position of the sample point relative to the center of the
    ///         filter.
    fn evaluate(&self, p: &Point2f) -> Float {
        max(0.0, self.data.radius.x - abs(p.x)) * max(0.0, self.data.radius.y - abs(p.y))
    }

    fn type_tag(&self) -> u32 {
        Self::TYPE_TAG
    }

    fn serialize(&self, w: &mut dyn Write) -> std::io::Result<()> {
        w.write_f32::<LittleEndian>(self.data.radius.x)?;
        w.write_f32::<LittleEndian>(self.data.radius.y)
    }
}

impl From<&ParamSet> for TriangleFilter {
    /// Create a `TriangleFilter` from `ParamSet`.
    ///
    /// * `params` - Parameter set.
    fn from(params: &ParamSet) -> Self {
        let xw = params.find_one_float("xwidth", 2.0);
        let yw = params.find_one_float("ywidth", 2.0);
        Self::new(Vector2f::new(xw, yw))
    }
}

// ---- Tests ----
#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn peak_at_center() {
        let f = TriangleFilter::from(&ParamSet::new());
        assert_eq!(f.evaluate(&Point2f::new(0.0, 0.0)), 4.0);
        assert_eq!(f.evaluate(&Point2f::new(2.0, 0.0)), 0.0);
        assert_eq!(f.border_size(), 2);
    }

    proptest! {
        #[test]
        fn falls_off_with_distance(x in 0.0f32..2.0, dx in 0.0f32..1.0) {
            let f = TriangleFilter::new(Vector2f::new(2.0, 2.0));
            let near = f.evaluate(&Point2f::new(x, 0.5));
            let far = f.evaluate(&Point2f::new(x + dx, 0.5));
            prop_assert!(far <= near);
            prop_assert!(far >= 0.0);
        }
    }
}
