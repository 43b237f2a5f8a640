//! Filters

#[macro_use]
extern crate log;

mod boxf; // box is reserved keyword
mod gaussian;
mod triangle;

// Re-export.
pub use boxf::*;
pub use gaussian::*;
pub use triangle::*;

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Read;
use std::sync::Arc;
use tof_core::base::*;
use tof_core::filter::*;
use tof_core::geometry::*;
use tof_core::paramset::*;

/// Creates a filter by name.
///
/// * `name`   - One of `box`, `gaussian` or `triangle`.
/// * `params` - Filter parameters.
pub fn create_filter(name: &str, params: &ParamSet) -> Result<ArcFilter, String> {
    let filter: ArcFilter = match name {
        "box" => Arc::new(BoxFilter::from(params)),
        "gaussian" => Arc::new(GaussianFilter::from(params)),
        "triangle" => Arc::new(TriangleFilter::from(params)),
        _ => return Err(format!("Filter '{name}' unknown; expected box, gaussian or triangle")),
    };

    let r = filter.get_data().radius;
    if r.x <= 0.0 || r.y <= 0.0 {
        return Err(format!("Filter '{name}' needs a positive radius; got {}x{}", r.x, r.y));
    }
    debug!("Created {name} filter with radius {}x{}", r.x, r.y);
    Ok(filter)
}

/// Creates the filter named by the `filter` parameter, `gaussian` by default.
///
/// * `params` - Parameter set.
pub fn create_filter_from_params(params: &ParamSet) -> Result<ArcFilter, String> {
    let name = params.find_one_string("filter", String::from("gaussian"));
    create_filter(&name, params)
}

/// Reads a filter written by `Filter::serialize()`.
///
/// * `tag` - Type tag written in front of the parameters.
/// * `r`   - Input stream.
pub fn read_filter(tag: u32, r: &mut dyn Read) -> Result<ArcFilter, String> {
    let mut read_f32 = || {
        r.read_f32::<LittleEndian>()
            .map_err(|e| format!("Error reading filter: {e}"))
    };
    let radius = Vector2f::new(read_f32()?, read_f32()?);
    let filter: ArcFilter = match tag {
        BoxFilter::TYPE_TAG => Arc::new(BoxFilter::new(radius)),
        GaussianFilter::TYPE_TAG => {
            let alpha: Float = read_f32()?;
            Arc::new(GaussianFilter::new(radius, alpha))
        }
        TriangleFilter::TYPE_TAG => Arc::new(TriangleFilter::new(radius)),
        _ => return Err(format!("Unknown filter tag {tag}")),
    };
    Ok(filter)
}

// ---- Tests ----
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_by_name() {
        let ps = ParamSet::new();
        assert_eq!(create_filter("box", &ps).unwrap().type_tag(), BoxFilter::TYPE_TAG);
        assert_eq!(create_filter_from_params(&ps).unwrap().type_tag(), GaussianFilter::TYPE_TAG);
        assert!(create_filter("mitchell", &ps).is_err());

        let mut ps = ParamSet::new();
        ps.add_float("xwidth", &[0.0]);
        assert!(create_filter("triangle", &ps).is_err());
    }

    #[test]
    fn serialized_filters_read_back() {
        let mut ps = ParamSet::new();
        ps.add_float("xwidth", &[1.5]);
        ps.add_float("alpha", &[3.0]);
        for name in ["box", "gaussian", "triangle"] {
            let filter = create_filter(name, &ps).unwrap();
            let mut bytes = vec![];
            filter.serialize(&mut bytes).unwrap();

            let copy = read_filter(filter.type_tag(), &mut bytes.as_slice()).unwrap();
            assert_eq!(copy.type_tag(), filter.type_tag());
            assert_eq!(copy.get_data(), filter.get_data());
            let p = Point2f::new(0.3, -0.2);
            assert_eq!(copy.evaluate(&p), filter.evaluate(&p));
        }

        assert!(read_filter(42, &mut [0u8; 8].as_slice()).is_err());
        assert!(read_filter(GaussianFilter::TYPE_TAG, &mut [0u8; 8].as_slice()).is_err());
    }
}
