//! Sub-path Walker

use super::Path;
use crate::base::*;
use crate::geometry::*;
use crate::memory::*;
use crate::sampler::*;

/// Where a random walk starts.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum PathRoot {
    /// Start at the emitter supernode.
    Emitter,

    /// Start at the sensor supernode with a position inside a pixel.
    Sensor {
        /// The pixel being rendered.
        pixel: Point2i,
    },
}

/// Generates sub-paths by random walks.
pub trait SubpathWalker: Send + Sync {
    /// Appends a random walk to an empty path.
    ///
    /// The path starts with the supernode of `root` followed by an endpoint sample. Every vertex stores its forward
    /// density and, where a successor exists, its reverse density in area measure.
    ///
    /// * `sampler`   - Source of random numbers.
    /// * `arena`     - Pool for the vertices and edges.
    /// * `root`      - Side of the walk.
    /// * `max_depth` - Maximum number of scattering events; -1 for unlimited.
    /// * `rr_depth`  - Depth at which Russian roulette starts.
    /// * `path`      - Receives the walk.
    fn walk(
        &self,
        sampler: &mut dyn Sampler,
        arena: &mut PathArena,
        root: PathRoot,
        max_depth: Int,
        rr_depth: Int,
        path: &mut Path,
    );
}

// ---- Tests ----
