//! Film

use crate::base::*;
use crate::decomposition::*;
use crate::filter::*;
use crate::geometry::*;
use crate::image_io::*;
use crate::spectrum::*;
use crate::{stat_inc, stat_memory_counter, stat_register_fns, stats::*};
use std::sync::RwLock;

mod image_block;

// Re-export.
pub use image_block::*;

stat_memory_counter!("Memory/Film pixels", FILM_PIXEL_MEMORY, film_stats_pixels);

stat_register_fns!(film_stats_pixels);

/// Receives the weighted contributions of one sample.
pub trait SampleSink {
    /// Splats a sample of the pixel being rendered.
    ///
    /// * `pos`    - Raster position.
    /// * `values` - Three values per frame followed by weight and alpha.
    fn splat(&mut self, pos: &Point2f, values: &[Float]) -> bool;

    /// Adds a contribution found by sampling the sensor directly. The raster position may belong to any pixel.
    ///
    /// * `pos`    - Raster position.
    /// * `values` - Three values per frame followed by weight and alpha.
    fn put_direct_sample(&mut self, pos: &Point2f, values: &[Float]) -> bool;
}

/// Sends samples to a tile block and direct sensor samples to a light image.
pub struct BlockSink<'a> {
    /// Receives the samples of the pixel being rendered.
    pub block: &'a mut ImageBlock,

    /// Receives direct sensor samples.
    pub light_image: &'a mut ImageBlock,
}

impl SampleSink for BlockSink<'_> {
    fn splat(&mut self, pos: &Point2f, values: &[Float]) -> bool {
        self.block.put(pos, values)
    }

    fn put_direct_sample(&mut self, pos: &Point2f, values: &[Float]) -> bool {
        self.light_image.put_normalized(pos, values)
    }
}

/// Accumulates the rendered image and the light image of a job.
pub struct Film {
    /// Upper left corner of the rendered window.
    pub crop_offset: Point2i,

    /// Size of the rendered window.
    pub crop_size: Point2i,

    /// Number of frames.
    pub frames: usize,

    /// Reconstruction filter.
    pub filter: ArcFilter,

    /// Filtered samples of every pixel.
    image: RwLock<ImageBlock>,

    /// Direct sensor samples.
    light_image: RwLock<ImageBlock>,
}

impl Film {
    /// Create an empty film for a configuration.
    ///
    /// * `config` - Decomposition configuration.
    pub fn new(config: &DecompositionConfig) -> Self {
        register_stats();

        let block = ImageBlock::new(
            config.crop_offset,
            config.crop_size,
            config.channel_count(),
            config.filter.clone(),
        );
        stat_inc!(FILM_PIXEL_MEMORY, (2 * block.data().len() * std::mem::size_of::<Float>()) as u64);

        Self {
            crop_offset: config.crop_offset,
            crop_size: config.crop_size,
            frames: config.frames,
            filter: config.filter.clone(),
            light_image: RwLock::new(block.clone()),
            image: RwLock::new(block),
        }
    }

    /// Returns the number of values per pixel.
    pub fn channel_count(&self) -> usize {
        self.frames * SPECTRUM_SAMPLES + 2
    }

    /// Returns an empty block for a tile.
    ///
    /// * `bounds` - Raster bounds of the tile.
    pub fn create_block(&self, bounds: &Bounds2i) -> ImageBlock {
        ImageBlock::new(bounds.p_min, bounds.diagonal(), self.channel_count(), self.filter.clone())
    }

    /// Returns an empty light image covering the crop window.
    pub fn create_light_image(&self) -> ImageBlock {
        ImageBlock::new(self.crop_offset, self.crop_size, self.channel_count(), self.filter.clone())
    }

    /// Adds a finished tile.
    ///
    /// * `block` - The tile.
    pub fn merge_block(&self, block: &ImageBlock) {
        let mut image = self.image.write().unwrap();
        image.put_block(block);
    }

    /// Adds a worker's light image.
    ///
    /// * `block` - The light image.
    pub fn merge_light_image(&self, block: &ImageBlock) {
        let mut light_image = self.light_image.write().unwrap();
        light_image.put_block(block);
    }

    /// Sets every pixel to zero.
    pub fn clear(&self) {
        self.image.write().unwrap().clear();
        self.light_image.write().unwrap().clear();
    }

    /// Returns one RGB image per frame. Pixels are normalized by their filter weight and the light image is added
    /// with a scale factor.
    ///
    /// * `light_scale` - Scale of the light image, usually the reciprocal of the samples per pixel.
    pub fn develop(&self, light_scale: Float) -> Vec<Vec<Spectrum>> {
        let image = self.image.read().unwrap();
        let light_image = self.light_image.read().unwrap();
        let bounds = image.bounds();
        let c = image.channels();

        (0..self.frames)
            .map(|frame| {
                bounds
                    .into_iter()
                    .map(|p| {
                        let v = image.pixel(&p);
                        let l = light_image.pixel(&p);
                        let weight = v[c - 2];
                        let mut rgb = Spectrum::ZERO;
                        for i in 0..SPECTRUM_SAMPLES {
                            let value = if weight > 0.0 { v[3 * frame + i] / weight } else { 0.0 };
                            rgb[i] = value + l[3 * frame + i] * light_scale;
                        }
                        rgb
                    })
                    .collect()
            })
            .collect()
    }

    /// Develops the film and writes one image per frame. With more than one frame the frame number is inserted in
    /// front of the extension, e.g. `out_0003.exr`.
    ///
    /// * `filename`    - Output path; the extension selects the format.
    /// * `light_scale` - Scale of the light image.
    pub fn write_images(&self, filename: &str, light_scale: Float) -> Result<Vec<String>, String> {
        let images = self.develop(light_scale);
        let mut written = Vec::with_capacity(images.len());
        for (frame, pixels) in images.iter().enumerate() {
            let path = if self.frames > 1 {
                frame_filename(filename, frame)
            } else {
                filename.to_string()
            };
            let rgb: Vec<Float> = pixels.iter().flat_map(|s| [s[0], s[1], s[2]]).collect();
            write_image(&path, &rgb, &self.crop_size)?;
            written.push(path);
        }
        info!("Wrote {} frame(s) to {filename}", written.len());
        Ok(written)
    }
}

/// Inserts a zero padded frame number in front of the file extension.
///
/// * `filename` - Output path.
/// * `frame`    - Frame number.
pub fn frame_filename(filename: &str, frame: usize) -> String {
    match filename.rfind('.') {
        Some(dot) if !filename[dot..].contains('/') => {
            format!("{}_{frame:04}{}", &filename[..dot], &filename[dot..])
        }
        _ => format!("{filename}_{frame:04}"),
    }
}

// ---- Tests ----
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;

    struct Unit {
        data: FilterData,
    }

    impl Filter for Unit {
        fn get_data(&self) -> &FilterData {
            &self.data
        }

        fn evaluate(&self, _p: &Point2f) -> Float {
            1.0
        }

        fn type_tag(&self) -> u32 {
            0
        }

        fn serialize(&self, _w: &mut dyn Write) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn config(frames: usize) -> DecompositionConfig {
        DecompositionConfig {
            size: Point2i::new(4, 4),
            crop_offset: Point2i::new(1, 1),
            crop_size: Point2i::new(2, 2),
            high_quality_edges: false,
            kind: if frames > 1 {
                DecompositionKind::Transient
            } else {
                DecompositionKind::SteadyState
            },
            combine_samplings: false,
            min_bound: 0.0,
            max_bound: frames as Float,
            bin_width: 1.0,
            frames,
            sub_samples: 1,
            force_bounce: false,
            s_bounce: 0,
            t_bounce: 0,
            filter: Arc::new(Unit {
                data: FilterData::new(Vector2f::new(0.5, 0.5)),
            }),
            path_length_sampler: PathLengthSampler::new(Modulation::None, 1.0, 0.0, 0.0, frames as Float),
            ld_sampling: false,
            adaptive: None,
        }
    }

    #[test]
    fn develop_normalizes_and_adds_light() {
        let config = config(2);
        config.validate().unwrap();
        let film = Film::new(&config);

        let mut tile = film.create_block(&Bounds2i::new(Point2i::new(1, 1), Point2i::new(3, 2)));
        let mut light = film.create_light_image();
        {
            let mut sink = BlockSink {
                block: &mut tile,
                light_image: &mut light,
            };
            assert!(sink.splat(&Point2f::new(1.5, 1.5), &[2.0, 2.0, 2.0, 4.0, 4.0, 4.0, 1.0, 1.0]));
            assert!(sink.splat(&Point2f::new(1.5, 1.5), &[0.0, 0.0, 0.0, 2.0, 2.0, 2.0, 1.0, 1.0]));
            assert!(sink.put_direct_sample(&Point2f::new(2.5, 2.5), &[0.0, 0.0, 0.0, 8.0, 0.0, 0.0, 1.0, 1.0]));
        }
        film.merge_block(&tile);
        film.merge_light_image(&light);

        let frames = film.develop(0.5);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].len(), 4);
        assert_eq!(frames[0][0], Spectrum::new(1.0));
        assert_eq!(frames[1][0], Spectrum::new(3.0));
        assert_eq!(frames[1][3], Spectrum::from_rgb(4.0, 0.0, 0.0));
        assert_eq!(frames[0][3], Spectrum::ZERO);

        film.clear();
        assert!(film.develop(1.0)[1].iter().all(|s| s.is_black()));
    }

    #[test]
    fn frame_filenames() {
        assert_eq!(frame_filename("out.exr", 3), "out_0003.exr");
        assert_eq!(frame_filename("dir.v2/out", 12), "dir.v2/out_0012");
        assert_eq!(frame_filename("out", 0), "out_0000");
    }
}
