//! Sub-path Weights

use tof_core::base::*;
use tof_core::decomposition::*;
use tof_core::memory::*;
use tof_core::path::*;
use tof_core::spectrum::*;

/// Prefix products of the vertex and edge weights of a sub-path, together with the prefix path lengths used for
/// transient binning.
///
/// `weight(i)` is the throughput of the first `i` vertices, i.e. everything that happens before vertex `i` is reached.
/// `length(i)` is the distance travelled from the endpoint sample (vertex 1) to vertex `i`; in bounce mode every edge
/// counts as one.
#[derive(Clone, Debug, Default)]
pub struct SubpathWeights {
    /// Accumulated importance or radiance weights.
    weights: Vec<Spectrum>,

    /// Accumulated path lengths.
    lengths: Vec<Float>,
}

impl SubpathWeights {
    /// Create empty prefix arrays.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recomputes the prefix arrays for a sub-path. The buffers are reused between calls.
    ///
    /// * `arena` - Arena holding the vertices and edges.
    /// * `path`  - The sub-path.
    /// * `mode`  - Side of the sub-path.
    /// * `kind`  - Decomposition kind selecting how lengths accumulate.
    pub fn compute(&mut self, arena: &PathArena, path: &Path, mode: TransportMode, kind: DecompositionKind) {
        let n = path.vertex_count();
        self.weights.clear();
        self.lengths.clear();
        if n == 0 {
            return;
        }

        self.weights.push(Spectrum::ONE);
        self.lengths.push(0.0);
        for i in 1..n {
            let v = arena.vertex(path.vertex(i - 1));
            let e = arena.edge(path.edge(i - 1));
            let w = self.weights[i - 1] * v.weight(mode) * v.rr_weight * e.weight[mode.index()];
            self.weights.push(w);

            // The edge leaving the supernode has no physical extent.
            let step = if i == 1 {
                0.0
            } else {
                match kind {
                    DecompositionKind::Bounce => 1.0,
                    DecompositionKind::Transient | DecompositionKind::TransientEllipse => e.length,
                    DecompositionKind::SteadyState => 0.0,
                }
            };
            self.lengths.push(self.lengths[i - 1] + step);
        }
    }

    /// Returns the number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Returns `true` if no sub-path has been accumulated.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Returns the accumulated weight of the first `i` vertices.
    ///
    /// * `i` - Vertex index.
    #[inline]
    pub fn weight(&self, i: usize) -> Spectrum {
        self.weights[i]
    }

    /// Returns the path length from the endpoint sample to vertex `i`.
    ///
    /// * `i` - Vertex index.
    #[inline]
    pub fn length(&self, i: usize) -> Float {
        self.lengths[i]
    }
}

// ---- Tests ----
