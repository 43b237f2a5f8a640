//! Image Block

use crate::base::*;
use crate::filter::*;
use crate::geometry::*;

/// Multi-channel raster of a rectangular region of the film with a border for the filter footprint.
///
/// Pixels hold `channels` values: three per frame followed by the filter weight and alpha. Samples are splatted with
/// the reconstruction filter, which also weights the trailing channels, so dividing by the weight channel yields the
/// filtered estimate.
#[derive(Clone)]
pub struct ImageBlock {
    /// Raster position of the first interior pixel.
    offset: Point2i,

    /// Size of the interior region.
    size: Point2i,

    /// Border width in pixels.
    border: Int,

    /// Values per pixel.
    channels: usize,

    /// Reconstruction filter.
    filter: ArcFilter,

    /// Pixel values in scanline order including the border.
    data: Vec<Float>,

    /// Footprint of the sample being splatted.
    weights: Vec<(Point2i, Float)>,
}

/// Copy of a window of pixels of one frame, used to undo or blend a batch of samples.
#[derive(Clone, Debug)]
pub struct BlockSnapshot {
    /// Raster bounds of the window.
    bounds: Bounds2i,

    /// Frame the snapshot covers.
    frame: usize,

    /// The frame's three values followed by weight and alpha for every pixel of the window.
    values: Vec<Float>,
}

impl ImageBlock {
    /// Create an empty block.
    ///
    /// * `offset`   - Raster position of the first interior pixel.
    /// * `size`     - Size of the interior region.
    /// * `channels` - Values per pixel; at least 2.
    /// * `filter`   - Reconstruction filter.
    pub fn new(offset: Point2i, size: Point2i, channels: usize, filter: ArcFilter) -> Self {
        assert!(channels >= 2, "image blocks need weight and alpha channels");
        let border = filter.border_size();
        let mut block = Self {
            offset,
            size,
            border,
            channels,
            filter,
            data: vec![],
            weights: vec![],
        };
        block.data = vec![0.0; block.width() * block.height() * channels];
        block
    }

    /// Moves the block to a new region and clears it, reusing the allocation when possible.
    ///
    /// * `offset` - Raster position of the first interior pixel.
    /// * `size`   - Size of the interior region.
    pub fn reset(&mut self, offset: Point2i, size: Point2i) {
        self.offset = offset;
        self.size = size;
        let n = self.width() * self.height() * self.channels;
        self.data.clear();
        self.data.resize(n, 0.0);
    }

    /// Sets every value to zero.
    pub fn clear(&mut self) {
        self.data.iter_mut().for_each(|v| *v = 0.0);
    }

    /// Raster position of the first interior pixel.
    pub fn offset(&self) -> Point2i {
        self.offset
    }

    /// Size of the interior region.
    pub fn size(&self) -> Point2i {
        self.size
    }

    /// Border width in pixels.
    pub fn border(&self) -> Int {
        self.border
    }

    /// Values per pixel.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Width including the border.
    pub fn width(&self) -> usize {
        (self.size.x + 2 * self.border) as usize
    }

    /// Height including the border.
    pub fn height(&self) -> usize {
        (self.size.y + 2 * self.border) as usize
    }

    /// Raster bounds of the interior region.
    pub fn bounds(&self) -> Bounds2i {
        Bounds2i::new(self.offset, self.offset + self.size)
    }

    /// Raster bounds including the border.
    pub fn bounds_with_border(&self) -> Bounds2i {
        let b = Vector2i::new(self.border, self.border);
        Bounds2i::new(self.offset - b, self.offset + self.size + b)
    }

    /// Raw pixel values.
    pub fn data(&self) -> &[Float] {
        &self.data
    }

    fn index(&self, p: &Point2i) -> usize {
        let x = (p.x - self.offset.x + self.border) as usize;
        let y = (p.y - self.offset.y + self.border) as usize;
        (y * self.width() + x) * self.channels
    }

    /// Returns the values of a pixel.
    ///
    /// * `p` - Raster position inside `bounds_with_border()`.
    pub fn pixel(&self, p: &Point2i) -> &[Float] {
        let i = self.index(p);
        &self.data[i..i + self.channels]
    }

    /// Returns the values of a pixel for modification.
    ///
    /// * `p` - Raster position inside `bounds_with_border()`.
    pub fn pixel_mut(&mut self, p: &Point2i) -> &mut [Float] {
        let i = self.index(p);
        let n = self.channels;
        &mut self.data[i..i + n]
    }

    /// Returns the pixels covered by the filter centered at a sample position, clipped to the block, together with
    /// their filter weights.
    fn footprint(&self, pos: &Point2f) -> impl Iterator<Item = (Point2i, Float)> + '_ {
        let r = self.filter.get_data().radius;
        let p_min = Point2i::new((pos.x - 0.5 - r.x).ceil() as Int, (pos.y - 0.5 - r.y).ceil() as Int);
        let p_max = Point2i::new(
            (pos.x - 0.5 + r.x).floor() as Int + 1,
            (pos.y - 0.5 + r.y).floor() as Int + 1,
        );
        let pos = *pos;
        Bounds2i::new(p_min, p_max)
            .intersect(&self.bounds_with_border())
            .into_iter()
            .map(move |p| {
                let d = Point2f::new(p.x as Float + 0.5 - pos.x, p.y as Float + 0.5 - pos.y);
                (p, self.filter.evaluate(&d))
            })
    }

    /// Splats a sample with the reconstruction filter. Returns `false` and leaves the block unchanged when the
    /// position or a value is not finite.
    ///
    /// * `pos`    - Raster position.
    /// * `values` - One value per channel.
    pub fn put(&mut self, pos: &Point2f, values: &[Float]) -> bool {
        debug_assert_eq!(values.len(), self.channels);
        if pos.has_nans() || !values.iter().all(|v| v.is_finite()) {
            return false;
        }

        let mut weights = std::mem::take(&mut self.weights);
        weights.clear();
        weights.extend(self.footprint(pos).filter(|(_, w)| *w != 0.0));
        self.add_weighted(&weights, values);
        self.weights = weights;
        true
    }

    /// Splats a sample so that its values are distributed over the filter footprint without changing their sum.
    /// Samples whose footprint has no weight go to the pixel containing them. Returns `false` when the position or a
    /// value is not finite or the sample falls outside the block.
    ///
    /// * `pos`    - Raster position.
    /// * `values` - One value per channel.
    pub fn put_normalized(&mut self, pos: &Point2f, values: &[Float]) -> bool {
        debug_assert_eq!(values.len(), self.channels);
        if pos.has_nans() || !values.iter().all(|v| v.is_finite()) {
            return false;
        }

        let mut weights = std::mem::take(&mut self.weights);
        weights.clear();
        weights.extend(self.footprint(pos).filter(|(_, w)| *w > 0.0));
        let total: Float = weights.iter().map(|(_, w)| w).sum();
        let inside = if total <= 0.0 {
            let p = Point2i::from(pos.floor());
            weights.push((p, 1.0));
            self.bounds_with_border().contains_exclusive(&p)
        } else {
            weights.iter_mut().for_each(|(_, w)| *w /= total);
            true
        };

        if inside {
            self.add_weighted(&weights, values);
        }
        self.weights = weights;
        inside
    }

    fn add_weighted(&mut self, weights: &[(Point2i, Float)], values: &[Float]) {
        for (p, w) in weights {
            for (dst, v) in self.pixel_mut(p).iter_mut().zip(values) {
                *dst += v * w;
            }
        }
    }

    /// Adds the overlapping pixels of another block with the same channel layout.
    ///
    /// * `other` - The block to add.
    pub fn put_block(&mut self, other: &ImageBlock) {
        assert_eq!(self.channels, other.channels, "image blocks have different channel counts");
        for p in self.bounds_with_border().intersect(&other.bounds_with_border()) {
            let src = other.pixel(&p);
            for (dst, v) in self.pixel_mut(&p).iter_mut().zip(src) {
                *dst += v;
            }
        }
    }

    /// Copies one frame and the weight/alpha channels of the pixels within `radius` of `center`.
    ///
    /// * `center` - Raster position of the pixel.
    /// * `radius` - Half width of the window.
    /// * `frame`  - Frame to copy.
    pub fn snapshot(&self, center: &Point2i, radius: Int, frame: usize) -> BlockSnapshot {
        let r = Vector2i::new(radius, radius);
        let bounds = Bounds2i::new(*center - r, *center + r + Vector2i::new(1, 1)).intersect(&self.bounds_with_border());
        let mut values = Vec::with_capacity(bounds.area().max(0) as usize * 5);
        for p in bounds {
            values.extend(self.frame_values(&p, frame));
        }
        BlockSnapshot { bounds, frame, values }
    }

    /// Replaces the pixels of a snapshot window with `snapshot * (1 - factor) + current * factor`.
    ///
    /// * `snapshot` - Values taken before the batch of samples.
    /// * `factor`   - Weight of the current values.
    pub fn blend(&mut self, snapshot: &BlockSnapshot, factor: Float) {
        let frame = snapshot.frame;
        let channels = self.channels;
        for (p, old) in snapshot.bounds.into_iter().zip(snapshot.values.chunks_exact(5)) {
            let pixel = self.pixel_mut(&p);
            let indices = [3 * frame, 3 * frame + 1, 3 * frame + 2, channels - 2, channels - 1];
            for (i, o) in indices.into_iter().zip(old) {
                pixel[i] = o * (1.0 - factor) + pixel[i] * factor;
            }
        }
    }

    fn frame_values(&self, p: &Point2i, frame: usize) -> [Float; 5] {
        let v = self.pixel(p);
        let c = self.channels;
        [v[3 * frame], v[3 * frame + 1], v[3 * frame + 2], v[c - 2], v[c - 1]]
    }
}

// ---- Tests ----
#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::*;
    use std::io::Write;
    use std::sync::Arc;

    /// Tent filter of radius 1.
    struct Tent {
        data: FilterData,
    }

    impl Filter for Tent {
        fn get_data(&self) -> &FilterData {
            &self.data
        }

        fn evaluate(&self, p: &Point2f) -> Float {
            max(0.0, 1.0 - abs(p.x)) * max(0.0, 1.0 - abs(p.y))
        }

        fn type_tag(&self) -> u32 {
            0
        }

        fn serialize(&self, _w: &mut dyn Write) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn tent() -> ArcFilter {
        Arc::new(Tent {
            data: FilterData::new(Vector2f::new(1.0, 1.0)),
        })
    }

    #[test]
    fn splat_weights_trailing_channels() {
        let mut block = ImageBlock::new(Point2i::new(10, 20), Point2i::new(4, 4), 5, tent());
        assert_eq!(block.border(), 1);
        assert_eq!(block.width(), 6);

        // Centered on pixel (11, 21) so only that pixel gets weight.
        assert!(block.put(&Point2f::new(11.5, 21.5), &[2.0, 4.0, 6.0, 1.0, 1.0]));
        assert_eq!(block.pixel(&Point2i::new(11, 21)), &[2.0, 4.0, 6.0, 1.0, 1.0]);
        assert_eq!(block.pixel(&Point2i::new(12, 21))[3], 0.0);

        // Between four pixels every one gets a quarter.
        assert!(block.put(&Point2f::new(13.0, 23.0), &[4.0, 0.0, 0.0, 1.0, 1.0]));
        for p in [(12, 22), (13, 22), (12, 23), (13, 23)] {
            let v = block.pixel(&Point2i::new(p.0, p.1));
            assert!(approx_eq!(f32, v[0], 1.0, epsilon = 1e-6));
            assert!(approx_eq!(f32, v[3], 0.25, epsilon = 1e-6));
        }

        assert!(!block.put(&Point2f::new(11.5, 21.5), &[Float::NAN, 0.0, 0.0, 1.0, 1.0]));
    }

    #[test]
    fn samples_reach_the_border_only() {
        let mut block = ImageBlock::new(Point2i::new(0, 0), Point2i::new(2, 2), 5, tent());
        assert!(block.put(&Point2f::new(-0.5, 0.5), &[1.0, 1.0, 1.0, 1.0, 1.0]));
        assert_eq!(block.pixel(&Point2i::new(-1, 0))[3], 1.0);

        // Entirely outside the border.
        assert!(block.put(&Point2f::new(-5.0, 0.5), &[1.0, 1.0, 1.0, 1.0, 1.0]));
        let sum: Float = block.data().iter().sum();
        assert_eq!(sum, 5.0);
    }

    #[test]
    fn normalized_splat_preserves_sum() {
        let mut block = ImageBlock::new(Point2i::new(0, 0), Point2i::new(8, 8), 5, tent());
        assert!(block.put_normalized(&Point2f::new(3.3, 4.8), &[3.0, 0.0, 0.0, 1.0, 1.0]));
        let sum: Float = block.data().chunks_exact(5).map(|p| p[0]).sum();
        assert!(approx_eq!(f32, sum, 3.0, epsilon = 1e-5));
        assert!(!block.put_normalized(&Point2f::new(30.0, 4.0), &[1.0, 0.0, 0.0, 1.0, 1.0]));
    }

    #[test]
    fn repeated_splats_reuse_the_footprint_buffer() {
        let mut block = ImageBlock::new(Point2i::new(0, 0), Point2i::new(8, 8), 5, tent());
        assert!(block.put_normalized(&Point2f::new(3.3, 4.8), &[1.0, 0.0, 0.0, 1.0, 1.0]));
        let capacity = block.weights.capacity();
        let buffer = block.weights.as_ptr();
        assert!(capacity >= 4);

        for i in 0..100 {
            let pos = Point2f::new(1.0 + 0.05 * i as Float, 6.5 - 0.04 * i as Float);
            assert!(block.put_normalized(&pos, &[1.0, 0.0, 0.0, 1.0, 1.0]));
            assert!(block.put(&pos, &[0.0, 1.0, 0.0, 0.0, 0.0]));
        }
        assert!(!block.put_normalized(&Point2f::new(30.0, 4.0), &[1.0, 0.0, 0.0, 1.0, 1.0]));
        assert_eq!(block.weights.capacity(), capacity);
        assert_eq!(block.weights.as_ptr(), buffer);

        let sum: Float = block.data().chunks_exact(5).map(|p| p[0]).sum();
        assert!(approx_eq!(f32, sum, 101.0, epsilon = 1e-3));
    }

    #[test]
    fn merge_overlapping_blocks() {
        let mut film = ImageBlock::new(Point2i::new(0, 0), Point2i::new(4, 4), 5, tent());
        let mut tile = ImageBlock::new(Point2i::new(2, 2), Point2i::new(2, 2), 5, tent());
        tile.pixel_mut(&Point2i::new(1, 1))[0] = 1.0;
        tile.pixel_mut(&Point2i::new(4, 4))[0] = 2.0;
        film.put_block(&tile);
        film.put_block(&tile);
        assert_eq!(film.pixel(&Point2i::new(1, 1))[0], 2.0);
        assert_eq!(film.pixel(&Point2i::new(4, 4))[0], 4.0);

        tile.reset(Point2i::new(0, 0), Point2i::new(3, 1));
        assert_eq!(tile.width(), 5);
        assert!(tile.data().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn blend_interpolates_one_frame() {
        let mut block = ImageBlock::new(Point2i::new(0, 0), Point2i::new(3, 3), 8, tent());
        let p = Point2i::new(1, 1);
        block.pixel_mut(&p).copy_from_slice(&[1.0, 1.0, 1.0, 5.0, 5.0, 5.0, 2.0, 2.0]);
        let snap = block.snapshot(&p, 1, 1);

        block.pixel_mut(&p).copy_from_slice(&[9.0, 9.0, 9.0, 9.0, 9.0, 9.0, 6.0, 6.0]);
        block.blend(&snap, 0.25);

        // Frame 0 is untouched; frame 1 and the weights move a quarter of the way.
        assert_eq!(block.pixel(&p), &[9.0, 9.0, 9.0, 6.0, 6.0, 6.0, 3.0, 3.0]);
    }
}
