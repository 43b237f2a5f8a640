//! Wire Format

use super::*;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

/// Reads a filter given its type tag.
pub type FilterReader<'a> = &'a dyn Fn(u32, &mut dyn Read) -> Result<ArcFilter, String>;

impl DecompositionConfig {
    /// Writes the configuration in little endian byte order.
    ///
    /// The fields follow a fixed order ending with the filter and the path length sampler, each prefixed by its type
    /// tag. The sampling policy (`ld_sampling`, then `adaptive` as a presence flag and its three parameters) comes last.
    ///
    /// * `w` - Output stream.
    pub fn serialize(&self, w: &mut dyn Write) -> Result<(), String> {
        self.write_fields(w)
            .map_err(|e| format!("Error writing decomposition configuration: {e}"))
    }

    /// Reads a configuration written by `serialize()` and validates it.
    ///
    /// * `r`           - Input stream.
    /// * `read_filter` - Creates the filter from its type tag and parameters.
    pub fn deserialize(r: &mut dyn Read, read_filter: FilterReader) -> Result<Self, String> {
        let io_err = |e: std::io::Error| format!("Error reading decomposition configuration: {e}");

        let read_point = |r: &mut dyn Read| -> Result<Point2i, String> {
            let x = r.read_i32::<LittleEndian>().map_err(io_err)?;
            let y = r.read_i32::<LittleEndian>().map_err(io_err)?;
            Ok(Point2i::new(x, y))
        };
        let size = read_point(&mut *r)?;
        let crop_offset = read_point(&mut *r)?;
        let crop_size = read_point(&mut *r)?;

        let high_quality_edges = r.read_u8().map_err(io_err)? != 0;
        let kind = DecompositionKind::from_code(r.read_u32::<LittleEndian>().map_err(io_err)?)?;
        let combine_samplings = r.read_u8().map_err(io_err)? != 0;
        let min_bound = r.read_f32::<LittleEndian>().map_err(io_err)?;
        let max_bound = r.read_f32::<LittleEndian>().map_err(io_err)?;
        let bin_width = r.read_f32::<LittleEndian>().map_err(io_err)?;
        let frames = r.read_u32::<LittleEndian>().map_err(io_err)? as usize;
        let sub_samples = r.read_u32::<LittleEndian>().map_err(io_err)? as usize;
        let force_bounce = r.read_u8().map_err(io_err)? != 0;
        let s_bounce = r.read_u32::<LittleEndian>().map_err(io_err)? as usize;
        let t_bounce = r.read_u32::<LittleEndian>().map_err(io_err)? as usize;

        let filter_tag = r.read_u32::<LittleEndian>().map_err(io_err)?;
        let filter = read_filter(filter_tag, &mut *r)?;

        let sampler_tag = r.read_u32::<LittleEndian>().map_err(io_err)?;
        if sampler_tag != PathLengthSampler::TYPE_TAG {
            return Err(format!("Unknown path length sampler tag {sampler_tag}"));
        }
        let path_length_sampler = PathLengthSampler::deserialize(r)?;

        let ld_sampling = r.read_u8().map_err(io_err)? != 0;
        let adaptive = if r.read_u8().map_err(io_err)? != 0 {
            Some(AdaptiveParams {
                max_error: r.read_f32::<LittleEndian>().map_err(io_err)?,
                p_value: r.read_f32::<LittleEndian>().map_err(io_err)?,
                max_sample_factor: r.read_f32::<LittleEndian>().map_err(io_err)?,
            })
        } else {
            None
        };

        let config = Self {
            size,
            crop_offset,
            crop_size,
            high_quality_edges,
            kind,
            combine_samplings,
            min_bound,
            max_bound,
            bin_width,
            frames,
            sub_samples,
            force_bounce,
            s_bounce,
            t_bounce,
            filter,
            path_length_sampler,
            ld_sampling,
            adaptive,
        };
        config.validate()?;
        Ok(config)
    }

    fn write_fields(&self, w: &mut dyn Write) -> std::io::Result<()> {
        for p in [self.size, self.crop_offset, self.crop_size] {
            w.write_i32::<LittleEndian>(p.x)?;
            w.write_i32::<LittleEndian>(p.y)?;
        }
        w.write_u8(self.high_quality_edges as u8)?;
        w.write_u32::<LittleEndian>(self.kind.code())?;
        w.write_u8(self.combine_samplings as u8)?;
        w.write_f32::<LittleEndian>(self.min_bound)?;
        w.write_f32::<LittleEndian>(self.max_bound)?;
        w.write_f32::<LittleEndian>(self.bin_width)?;
        w.write_u32::<LittleEndian>(self.frames as u32)?;
        w.write_u32::<LittleEndian>(self.sub_samples as u32)?;
        w.write_u8(self.force_bounce as u8)?;
        w.write_u32::<LittleEndian>(self.s_bounce as u32)?;
        w.write_u32::<LittleEndian>(self.t_bounce as u32)?;

        w.write_u32::<LittleEndian>(self.filter.type_tag())?;
        self.filter.serialize(w)?;

        w.write_u32::<LittleEndian>(PathLengthSampler::TYPE_TAG)?;
        self.path_length_sampler.serialize(w)?;

        w.write_u8(self.ld_sampling as u8)?;
        match self.adaptive {
            Some(adaptive) => {
                w.write_u8(1)?;
                w.write_f32::<LittleEndian>(adaptive.max_error)?;
                w.write_f32::<LittleEndian>(adaptive.p_value)?;
                w.write_f32::<LittleEndian>(adaptive.max_sample_factor)
            }
            None => w.write_u8(0),
        }
    }
}

// ---- Tests ----
#[cfg(test)]
mod tests {
    use super::super::tests::*;
    use super::*;

    fn read_test_filter(tag: u32, _r: &mut dyn Read) -> Result<ArcFilter, String> {
        if tag == 99 {
            Ok(TestFilter::arc())
        } else {
            Err(format!("unexpected filter tag {tag}"))
        }
    }

    #[test]
    fn round_trip() {
        let mut ps = transient_params();
        ps.add_string("decomposition", &[String::from("transientellipse")]);
        ps.add_bool("combinesamplings", &[true]);
        ps.add_int("subSamples", &[3]);
        ps.add_bool("forceBounce", &[true]);
        ps.add_int("sBounce", &[2]);
        ps.add_int("tBounce", &[3]);
        ps.add_int("cropOffsetY", &[1]);
        ps.add_int("cropHeight", &[2]);
        let config = DecompositionConfig::try_from((&ps, TestFilter::arc())).unwrap();

        let mut bytes = vec![];
        config.serialize(&mut bytes).unwrap();
        let copy = DecompositionConfig::deserialize(&mut bytes.as_slice(), &read_test_filter).unwrap();

        assert_eq!(copy.size, config.size);
        assert_eq!(copy.crop_offset, config.crop_offset);
        assert_eq!(copy.crop_size, config.crop_size);
        assert_eq!(copy.kind, DecompositionKind::TransientEllipse);
        assert!(copy.combine_samplings);
        assert_eq!(copy.frames, 10);
        assert_eq!(copy.sub_samples, 3);
        assert!(copy.force_bounce);
        assert_eq!((copy.s_bounce, copy.t_bounce), (2, 3));
        assert_eq!(copy.path_length_sampler, config.path_length_sampler);
        assert_eq!(copy.filter.type_tag(), 99);
        assert!(!copy.ld_sampling);
        assert_eq!(copy.adaptive, None);

        let mut again = vec![];
        copy.serialize(&mut again).unwrap();
        assert_eq!(again, bytes);
    }

    /// Serializes and reads back a configuration, checking the bytes are stable.
    fn reread(config: &DecompositionConfig) -> DecompositionConfig {
        let mut bytes = vec![];
        config.serialize(&mut bytes).unwrap();
        let copy = DecompositionConfig::deserialize(&mut bytes.as_slice(), &read_test_filter).unwrap();
        let mut again = vec![];
        copy.serialize(&mut again).unwrap();
        assert_eq!(again, bytes);
        copy
    }

    #[test]
    fn sampling_policy_survives_round_trip() {
        let mut ps = transient_params();
        ps.add_string("decomposition", &[String::from("transientellipse")]);
        ps.add_bool("ldSampling", &[true]);
        let config = DecompositionConfig::try_from((&ps, TestFilter::arc())).unwrap();
        let copy = reread(&config);
        assert!(copy.ld_sampling);
        assert_eq!(copy.adaptive, None);
        assert_eq!(copy.target_range(), config.target_range());
        assert_eq!(copy.sample_target(Some(3), 0.5), config.sample_target(Some(3), 0.5));

        let mut ps = transient_params();
        ps.add_string("decomposition", &[String::from("transientellipse")]);
        ps.add_bool("adapSampling", &[true]);
        ps.add_float("adapMaxError", &[0.1]);
        ps.add_float("adapPValue", &[0.01]);
        ps.add_float("adapMaxSampleFactor", &[-1.0]);
        let config = DecompositionConfig::try_from((&ps, TestFilter::arc())).unwrap();
        let copy = reread(&config);
        assert!(!copy.ld_sampling);
        assert_eq!(
            copy.adaptive,
            Some(AdaptiveParams {
                max_error: 0.1,
                p_value: 0.01,
                max_sample_factor: -1.0,
            })
        );
    }

    #[test]
    fn truncated_and_corrupt_input() {
        let config = DecompositionConfig::try_from((&transient_params(), TestFilter::arc())).unwrap();
        let mut bytes = vec![];
        config.serialize(&mut bytes).unwrap();

        let truncated = &bytes[..bytes.len() - 3];
        assert!(DecompositionConfig::deserialize(&mut &truncated[..], &read_test_filter).is_err());

        // The frame count follows the image window (24 bytes), two flags, the kind and three bounds.
        let mut corrupt = bytes.clone();
        corrupt[24 + 1 + 4 + 1 + 12] = 7;
        let err = DecompositionConfig::deserialize(&mut corrupt.as_slice(), &read_test_filter)
            .err()
            .unwrap();
        assert!(err.contains("Frame count"));
    }
}
