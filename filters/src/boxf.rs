//! Box Filter

use byteorder::{LittleEndian, WriteBytesExt};
use std::io::Write;
use tof_core::base::*;
use tof_core::filter::*;
use tof_core::geometry::*;
use tof_core::paramset::*;

/// Implements the box filter which weights every sample within its extent equally.
pub struct BoxFilter {
    /// Filter data.
    pub data: FilterData,
}

impl BoxFilter {
    /// Tag identifying the filter in serialized configurations.
    pub const TYPE_TAG: u32 = 1;

    /// Returns a new instance of `BoxFilter`.
    ///
    /// * `radius` - Radius of the filter in x and y directions.
    pub fn new(radius: Vector2f) -> Self {
        Self {
            data: FilterData::new(radius),
        }
    }
}

impl Filter for BoxFilter {
    fn get_data(&self) -> &FilterData {
        &self.data
    }

    fn evaluate(&self, p: &Point2f) -> Float {
        if abs(p.x) <= self.data.radius.x && abs(p.y) <= self.data.radius.y {
            1.0
        } else {
            0.0
        }
    }

    fn type_tag(&self) -> u32 {
        Self::TYPE_TAG
    }

    fn serialize(&self, w: &mut dyn Write) -> std::io::Result<()> {
        w.write_f32::<LittleEndian>(self.data.radius.x)?;
        w.write_f32::<LittleEndian>(self.data.radius.y)
    }
}

impl From<&ParamSet> for BoxFilter {
    /// Create a `BoxFilter` from `ParamSet`.
    ///
    /// * `params` - Parameter set.
    fn from(params: &ParamSet) -> Self {
        let xw = params.find_one_float("xwidth", 0.5);
        let yw = params.find_one_float("ywidth", 0.5);
        Self::new(Vector2f::new(xw, yw))
    }
}
