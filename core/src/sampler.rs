//! Sampler

use crate::base::*;
use crate::geometry::*;

/// Source of the sample values consumed by random walks and connection
/// strategies. Implementations are deterministic for a given seed so that a
/// tile can be re-rendered bit for bit.
pub trait Sampler: Send + Sync {
    /// Returns the number of samples taken for each pixel.
    fn samples_per_pixel(&self) -> usize;

    /// Called when the renderer starts working on a pixel.
    ///
    /// * `p` - The pixel.
    fn start_pixel(&mut self, p: &Point2i);

    /// Returns the sample value for the next dimension of the current sample vector.
    fn get_1d(&mut self) -> Float;

    /// Returns the sample value for the next two dimensions of the current sample vector.
    fn get_2d(&mut self) -> Point2f;

    /// Returns an independent sampler for a worker, seeded deterministically.
    ///
    /// * `seed` - The seed.
    fn clone_sampler(&self, seed: u64) -> Box<dyn Sampler>;
}
