//! Reconstruction Filters

use crate::base::*;
use crate::geometry::*;
use std::io::Write;
use std::sync::Arc;

/// Common filter parameters.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FilterData {
    /// Radius of the filter in x and y directions; beyond this filter is 0.
    pub radius: Vector2f,

    /// Reciprocal of radius.
    pub inv_radius: Vector2f,
}

impl FilterData {
    /// Create a new instance of `FilterData`.
    ///
    /// * `radius` - Radius of the filter in x and y directions.
    pub fn new(radius: Vector2f) -> Self {
        Self {
            radius,
            inv_radius: Vector2f::new(1.0 / radius.x, 1.0 / radius.y),
        }
    }
}

/// Interface for reconstruction filters used to splat samples into image blocks.
pub trait Filter: Send + Sync {
    /// Return the filter parameters.
    fn get_data(&self) -> &FilterData;

    /// Returns value of the filter at a given point.
    ///
    /// * `p` - The position of the sample point relative to the center of the filter.
    fn evaluate(&self, p: &Point2f) -> Float;

    /// Returns the tag identifying the filter type in serialized configurations.
    fn type_tag(&self) -> u32;

    /// Writes the filter parameters. The type tag is written by the caller.
    ///
    /// * `w` - Output stream.
    fn serialize(&self, w: &mut dyn Write) -> std::io::Result<()>;

    /// Returns the number of pixels a splat can reach beyond the pixel containing the sample.
    fn border_size(&self) -> Int {
        let r = self.get_data().radius;
        max((r.x.max(r.y) - 0.5).ceil() as Int, 0)
    }
}

/// Atomic reference counted `Filter`.
pub type ArcFilter = Arc<dyn Filter>;
