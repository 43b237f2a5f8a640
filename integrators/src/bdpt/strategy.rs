//! Connection Strategies

use itertools::Itertools;
use std::collections::BTreeMap;
use tof_core::base::*;
use tof_core::spectrum::*;

/// Decides which `(s, t)` strategies take part in rendering. `s` counts the vertices taken from the emitter sub-path
/// and `t` those from the sensor sub-path, supernodes excluded.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StrategyRules {
    /// Strategies with `t = 1` splat to the light image.
    pub light_image: bool,

    /// Endpoints are sampled directly for `s = 1` or `t = 1`.
    pub sample_direct: bool,

    /// Pure transient decomposition; the emitter-to-sensor strategy `(1, 1)` is excluded.
    pub transient: bool,

    /// The emitter is a laser, so `(2, 1)` is excluded under pure transient decomposition.
    pub laser: bool,
}

impl StrategyRules {
    /// Returns `true` when the unconstrained strategy `(s, t)` may produce a contribution. Strategies that would start
    /// at a supernode are never used.
    ///
    /// * `s` - Emitter vertices.
    /// * `t` - Sensor vertices.
    pub fn allows(&self, s: usize, t: usize) -> bool {
        if s == 0 || t == 0 {
            return false;
        }
        if t == 1 && !self.light_image {
            return false;
        }
        if self.transient && s == 1 && t == 1 {
            return false;
        }
        !(self.transient && self.laser && s == 2 && t == 1)
    }

    /// Returns `true` when an ellipsoidal connection can join `s` emitter and `t` sensor vertices. Connections that
    /// would be handled by direct endpoint sampling are excluded, as are those leaving a laser.
    ///
    /// * `s` - Emitter vertices.
    /// * `t` - Sensor vertices.
    pub fn allows_ellipsoid(&self, s: usize, t: usize) -> bool {
        if s == 0 || t == 0 {
            return false;
        }
        if t == 1 && !self.light_image {
            return false;
        }
        if self.sample_direct && ((s == 1 && t > 1) || (t == 1 && s > 1)) {
            return false;
        }
        !(self.laser && s == 1)
    }
}

/// Per strategy count and summed luminance of accepted contributions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StrategyTally {
    /// `(count, luminance)` keyed by `(s, t)`.
    entries: BTreeMap<(usize, usize), (u64, f64)>,
}

impl StrategyTally {
    /// Create an empty tally.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one contribution.
    ///
    /// * `s`     - Emitter vertices.
    /// * `t`     - Sensor vertices.
    /// * `value` - The weighted contribution.
    pub fn record(&mut self, s: usize, t: usize, value: &Spectrum) {
        let entry = self.entries.entry((s, t)).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += value.y() as f64;
    }

    /// Adds the entries of another tally.
    ///
    /// * `other` - The tally to add.
    pub fn merge(&mut self, other: &StrategyTally) {
        for (key, (count, luminance)) in other.entries.iter() {
            let entry = self.entries.entry(*key).or_insert((0, 0.0));
            entry.0 += count;
            entry.1 += luminance;
        }
    }

    /// Returns the number of contributions recorded for `(s, t)`.
    pub fn count(&self, s: usize, t: usize) -> u64 {
        self.entries.get(&(s, t)).map_or(0, |e| e.0)
    }

    /// Returns the summed luminance recorded for `(s, t)`.
    pub fn luminance(&self, s: usize, t: usize) -> Float {
        self.entries.get(&(s, t)).map_or(0.0, |e| e.1 as Float)
    }

    /// Returns `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `((s, t), count, luminance)` in strategy order.
    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), u64, Float)> + '_ {
        self.entries.iter().map(|(k, (c, l))| (*k, *c, *l as Float))
    }

    /// Logs one line per strategy, brightest first.
    pub fn log(&self) {
        for ((s, t), count, luminance) in self.iter().sorted_by(|a, b| b.2.total_cmp(&a.2)) {
            info!("Strategy (s={s}, t={t}): {count} contributions, luminance {luminance}");
        }
    }
}

// ---- Tests ----

#[cfg(test)]
mod tests {
    use super::*;

    const STEADY: StrategyRules = StrategyRules {
        light_image: true,
        sample_direct: true,
        transient: false,
        laser: false,
    };

    #[test]
    fn supernodes_are_never_endpoints() {
        assert!(!STEADY.allows(0, 3));
        assert!(!STEADY.allows(3, 0));
        assert!(STEADY.allows(1, 1));
        assert!(STEADY.allows(2, 1));
    }

    #[test]
    fn light_image_controls_sensor_connections() {
        let rules = StrategyRules {
            light_image: false,
            ..STEADY
        };
        assert!(!rules.allows(1, 1));
        assert!(!rules.allows(4, 1));
        assert!(rules.allows(1, 2));
    }

    #[test]
    fn transient_excludes_direct_paths() {
        let rules = StrategyRules {
            transient: true,
            ..STEADY
        };
        assert!(!rules.allows(1, 1));
        assert!(rules.allows(2, 1));

        let laser = StrategyRules { laser: true, ..rules };
        assert!(!laser.allows(2, 1));
        assert!(laser.allows(3, 1));
    }

    #[test]
    fn ellipsoid_rules() {
        assert!(STEADY.allows_ellipsoid(1, 1));
        assert!(STEADY.allows_ellipsoid(2, 2));
        assert!(!STEADY.allows_ellipsoid(1, 2));
        assert!(!STEADY.allows_ellipsoid(2, 1));

        let rules = StrategyRules {
            sample_direct: false,
            laser: true,
            ..STEADY
        };
        assert!(rules.allows_ellipsoid(2, 1));
        assert!(!rules.allows_ellipsoid(1, 2));
    }

    #[test]
    fn tally_merges() {
        let mut a = StrategyTally::new();
        a.record(1, 2, &Spectrum::ONE);
        a.record(1, 2, &Spectrum::ONE);
        let mut b = StrategyTally::new();
        b.record(2, 2, &Spectrum::new(0.5));
        b.record(1, 2, &Spectrum::ZERO);

        a.merge(&b);
        assert_eq!(a.count(1, 2), 3);
        assert_eq!(a.count(2, 2), 1);
        assert_eq!(a.count(3, 3), 0);
        assert!((a.luminance(1, 2) - 2.0).abs() < 1e-5);
        assert_eq!(a.iter().count(), 2);
    }
}
