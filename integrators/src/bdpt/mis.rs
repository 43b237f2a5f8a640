//! Multiple Importance Sampling

use tof_core::base::*;

/// Sampling densities of a full path for the balance heuristic.
///
/// The path is flattened to `x[0..n]`, `x[0]` being the emitter sample and `x[n - 1]` the sensor sample. Strategy `s`
/// takes `x[0..s]` from the emitter sub-path and `x[s..n]` from the sensor sub-path.
#[derive(Clone, Debug, Default)]
pub struct MisTerms {
    /// Area density of generating `x[i]` from the emitter side.
    pub p_imp: Vec<Float>,

    /// Area density of generating `x[i]` from the sensor side.
    pub p_rad: Vec<Float>,

    /// Whether a deterministic connection may end at `x[i]`.
    pub connectable: Vec<bool>,

    /// Density of sampling `x[0]` directly from `x[1]`; `None` when emitters are not sampled directly.
    pub direct_emitter: Option<Float>,

    /// Density of sampling `x[n - 1]` directly from `x[n - 2]`; `None` when the sensor is not sampled directly.
    pub direct_sensor: Option<Float>,
}

impl MisTerms {
    /// Create empty terms.
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes every vertex, keeping the buffers.
    pub fn clear(&mut self) {
        self.p_imp.clear();
        self.p_rad.clear();
        self.connectable.clear();
        self.direct_emitter = None;
        self.direct_sensor = None;
    }

    /// Appends a vertex.
    ///
    /// * `p_imp`       - Density from the emitter side.
    /// * `p_rad`       - Density from the sensor side.
    /// * `connectable` - Whether a connection may end at the vertex.
    pub fn push(&mut self, p_imp: Float, p_rad: Float, connectable: bool) {
        self.p_imp.push(p_imp);
        self.p_rad.push(p_rad);
        self.connectable.push(connectable);
    }

    /// Returns the number of vertices.
    #[inline]
    pub fn len(&self) -> usize {
        self.p_imp.len()
    }

    /// Returns `true` if there are no vertices.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.p_imp.is_empty()
    }

    /// Replaces zero densities with one. Degenerate components contribute the same discrete factor to every strategy
    /// that can produce them, so they cancel in the ratios.
    pub fn remap_zeros(&mut self) {
        for p in self.p_imp.iter_mut().chain(self.p_rad.iter_mut()) {
            if *p == 0.0 {
                *p = 1.0;
            }
        }
    }

    /// Returns the factor by which direct endpoint sampling changes the density of strategy `s`.
    fn direct_factor(&self, s: usize) -> Float {
        let n = self.len();
        let t = n - s;
        if s == 1 && t >= 2 {
            self.direct_emitter.map_or(1.0, |p| p / self.p_imp[0])
        } else if t == 1 && s >= 2 {
            self.direct_sensor.map_or(1.0, |p| p / self.p_rad[n - 1])
        } else {
            1.0
        }
    }
}

/// Returns the balance heuristic weight of strategy `s` among all strategies that could have generated the same path.
///
/// Densities of the other strategies are found by walking outwards from `s` and swapping one vertex at a time between
/// the two sides. A strategy counts only when `is_valid(s', t')` holds and both vertices it connects are connectable.
///
/// * `terms`    - Path densities with zeros already remapped.
/// * `s`        - Emitter vertices of the evaluated strategy, in `[1, n - 1]`.
/// * `is_valid` - Filter on `(s', t')`.
pub fn mis_weight<F>(terms: &MisTerms, s: usize, is_valid: F) -> Float
where
    F: Fn(usize, usize) -> bool,
{
    let n = terms.len();
    debug_assert!(s >= 1 && s < n, "strategy s={s} outside a path of {n} vertices");

    let current = terms.direct_factor(s);
    if !(current > 0.0) {
        return 0.0;
    }
    let counts = |k: usize| is_valid(k, n - k) && terms.connectable[k - 1] && terms.connectable[k];

    let mut sum = 1.0;

    let mut r = 1.0;
    for k in (s + 1)..n {
        r *= terms.p_imp[k - 1] / terms.p_rad[k - 1];
        if counts(k) {
            sum += r * terms.direct_factor(k) / current;
        }
    }

    let mut r = 1.0;
    for k in (1..s).rev() {
        r *= terms.p_rad[k] / terms.p_imp[k];
        if counts(k) {
            sum += r * terms.direct_factor(k) / current;
        }
    }

    1.0 / sum
}

/// Returns the weight shared by `count` strategies that sample a path with equal density.
///
/// * `count` - Number of valid strategies.
pub fn uniform_weight(count: usize) -> Float {
    if count == 0 {
        0.0
    } else {
        1.0 / count as Float
    }
}

// ---- Tests ----

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::*;
    use proptest::prelude::*;

    fn terms(p_imp: &[Float], p_rad: &[Float]) -> MisTerms {
        let mut t = MisTerms::new();
        for (a, b) in p_imp.iter().zip(p_rad) {
            t.push(*a, *b, true);
        }
        t
    }

    #[test]
    fn two_vertex_path_has_one_strategy() {
        let t = terms(&[1.0, 0.3], &[0.7, 1.0]);
        assert_eq!(mis_weight(&t, 1, |_, _| true), 1.0);
    }

    #[test]
    fn equal_densities_share_evenly() {
        let t = terms(&[1.0; 5], &[1.0; 5]);
        for s in 1..5 {
            assert!(approx_eq!(f32, mis_weight(&t, s, |_, _| true), 0.25, epsilon = 1e-6));
        }
    }

    #[test]
    fn invalid_strategies_are_skipped() {
        let t = terms(&[1.0; 4], &[1.0; 4]);
        let w = mis_weight(&t, 2, |s, _| s != 1);
        assert!(approx_eq!(f32, w, 0.5, epsilon = 1e-6));
    }

    #[test]
    fn unconnectable_vertices_block_strategies() {
        let mut t = terms(&[1.0; 4], &[1.0; 4]);
        t.connectable[2] = false;
        // Strategies 2 and 3 both connect through x[2].
        assert!(approx_eq!(f32, mis_weight(&t, 1, |_, _| true), 1.0, epsilon = 1e-6));
    }

    #[test]
    fn zeros_are_remapped() {
        let mut t = terms(&[0.0, 2.0], &[1.0, 0.0]);
        t.remap_zeros();
        assert_eq!(t.p_imp[0], 1.0);
        assert_eq!(t.p_rad[1], 1.0);
        assert_eq!(t.p_imp[1], 2.0);
    }

    #[test]
    fn uniform_weights() {
        assert_eq!(uniform_weight(0), 0.0);
        assert_eq!(uniform_weight(4), 0.25);
    }

    proptest! {
        #[test]
        fn weights_partition_unity(
            dens in proptest::collection::vec((0.05f32..5.0, 0.05f32..5.0), 2..9),
            direct in (0.05f32..5.0, 0.05f32..5.0),
            use_direct in proptest::bool::ANY,
        ) {
            let p_imp: Vec<Float> = dens.iter().map(|d| d.0).collect();
            let p_rad: Vec<Float> = dens.iter().map(|d| d.1).collect();
            let mut m = terms(&p_imp, &p_rad);
            if use_direct {
                m.direct_emitter = Some(direct.0);
                m.direct_sensor = Some(direct.1);
            }

            let n = m.len();
            let valid = |s: usize, t: usize| !(s == 1 && t == 1);
            let total: Float = (1..n).filter(|&s| valid(s, n - s)).map(|s| mis_weight(&m, s, valid)).sum();
            if n > 2 {
                prop_assert!((total - 1.0).abs() < 1e-3, "weights sum to {}", total);
            } else {
                prop_assert_eq!(total, 0.0);
            }
        }
    }
}
