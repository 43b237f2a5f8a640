//! Random Sampler.

use tof_core::base::*;
use tof_core::geometry::*;
use tof_core::paramset::*;
use tof_core::rng::*;
use tof_core::sampler::*;

/// Implements a sampler that uses a PRNG to generate uniformly random samples.
///
/// Every pixel draws from its own stream derived from the seed and the pixel coordinates, so the values a pixel sees
/// do not depend on the order in which tiles are rendered.
#[derive(Clone)]
pub struct RandomSampler {
    /// Number of samples to generate for each pixel.
    samples_per_pixel: usize,

    /// Seed mixed into every pixel stream.
    seed: u64,

    /// The random number generator.
    rng: RNG,
}

impl RandomSampler {
    /// Create a new `RandomSampler`.
    ///
    /// * `samples_per_pixel` - Number of samples to generate for each pixel.
    /// * `seed`              - Seed for the random number generator.
    pub fn new(samples_per_pixel: usize, seed: u64) -> Self {
        Self {
            samples_per_pixel,
            seed,
            rng: RNG::new(seed),
        }
    }
}

/// Mixes a seed and a pixel into a stream index.
///
/// * `seed` - The seed.
/// * `p`    - The pixel.
fn pixel_stream(seed: u64, p: &Point2i) -> u64 {
    let key = ((p.x as u32 as u64) << 32) | (p.y as u32 as u64);
    // splitmix64 finalizer
    let mut z = key ^ seed.wrapping_mul(0x9e3779b97f4a7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
    z ^ (z >> 31)
}

impl Sampler for RandomSampler {
    fn samples_per_pixel(&self) -> usize {
        self.samples_per_pixel
    }

    /// This should be called when the rendering algorithm is ready to start working on a given pixel.
    ///
    /// * `p` - The pixel.
    fn start_pixel(&mut self, p: &Point2i) {
        self.rng = RNG::new(pixel_stream(self.seed, p));
    }

    /// Returns the sample value for the next dimension of the current sample vector.
    fn get_1d(&mut self) -> Float {
        self.rng.uniform_float()
    }

    /// Returns the sample value for the next two dimensions of the current sample vector.
    fn get_2d(&mut self) -> Point2f {
        let x = self.rng.uniform_float();
        Point2f::new(x, self.rng.uniform_float())
    }

    /// Generates a new instance of an initial `Sampler` for use by a rendering thread.
    ///
    /// * `seed` - The seed for the random number generator.
    fn clone_sampler(&self, seed: u64) -> Box<dyn Sampler> {
        Box::new(Self::new(self.samples_per_pixel, self.seed ^ seed))
    }
}

impl From<&ParamSet> for RandomSampler {
    /// Create a `RandomSampler` from a parameter set.
    ///
    /// * `params` - Parameter set with `sampleCount` and `seed`.
    fn from(params: &ParamSet) -> Self {
        let samples_per_pixel = max(params.find_one_int("sampleCount", 16), 1) as usize;
        let seed = params.find_one_int("seed", 0) as u64;
        Self::new(samples_per_pixel, seed)
    }
}

// ---- Tests ----
#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn pixel_streams_are_reproducible() {
        let mut a = RandomSampler::new(4, 7);
        let mut b = a.clone_sampler(0);

        a.start_pixel(&Point2i::new(3, 5));
        b.start_pixel(&Point2i::new(3, 5));
        for _ in 0..16 {
            assert_eq!(a.get_1d(), b.get_1d());
        }

        b.start_pixel(&Point2i::new(5, 3));
        a.start_pixel(&Point2i::new(3, 5));
        let same = (0..8).filter(|_| a.get_1d() == b.get_1d()).count();
        assert!(same < 8);
    }

    #[test]
    fn from_params() {
        let mut ps = ParamSet::new();
        ps.add_int("sampleCount", &[64]);
        assert_eq!(RandomSampler::from(&ps).samples_per_pixel(), 64);
    }

    proptest! {
        #[test]
        fn values_in_unit_interval(seed in 0u64..1000, x in -50i32..50, y in -50i32..50) {
            let mut s = RandomSampler::new(1, seed);
            s.start_pixel(&Point2i::new(x, y));
            for _ in 0..8 {
                let v = s.get_2d();
                prop_assert!((0.0..1.0).contains(&v.x) && (0.0..1.0).contains(&v.y));
            }
        }
    }
}
