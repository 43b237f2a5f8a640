//! Statistics Accumulator

use std::collections::BTreeMap;
use std::sync::Mutex;

lazy_static! {
    /// The global statistics accumulator.
    static ref STATS_ACCUMULATOR: Mutex<StatsAccumulator> = Mutex::new(StatsAccumulator::new());
}

/// Return the global statistics accumulator.
pub fn stats_accumulator() -> &'static Mutex<StatsAccumulator> {
    &STATS_ACCUMULATOR
}

/// Running summary of a floating point quantity.
#[derive(Default, Clone, Debug)]
pub struct StatsDistribution {
    /// Sum of all values.
    sum: f64,

    /// Count of all values.
    count: u64,

    /// Minimum value.
    min: Option<f64>,

    /// Maximum value.
    max: Option<f64>,
}

impl StatsDistribution {
    /// Fold another distribution into this one.
    ///
    /// * `distrib` - The distribution to merge.
    pub fn accumulate(&mut self, distrib: &Self) {
        self.sum += distrib.sum;
        self.count += distrib.count;
        self.min = match (self.min, distrib.min) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.max = match (self.max, distrib.max) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
    }

    /// Report a sample value.
    ///
    /// * `val` - Sample value.
    pub fn report(&mut self, val: f64) {
        self.sum += val;
        self.count += 1;
        self.min = Some(self.min.map_or(val, |m| m.min(val)));
        self.max = Some(self.max.map_or(val, |m| m.max(val)));
    }

    /// Number of reported values.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Mean of the reported values or 0 if nothing was reported.
    pub fn average(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }

    /// Clear stats.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Aggregate different types of statistics.
#[derive(Default)]
pub struct StatsAccumulator {
    /// Counters.
    counters: BTreeMap<String, i64>,

    /// Memory counters.
    memory_counters: BTreeMap<String, u64>,

    /// Float distributions.
    distributions: BTreeMap<String, StatsDistribution>,

    /// Percentages.
    percentages: BTreeMap<String, (i64, i64)>,

    /// Ratios.
    ratios: BTreeMap<String, (i64, i64)>,
}

impl StatsAccumulator {
    /// Create a new instance of `StatsAccumulator`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulates a counter value.
    ///
    /// * `name` - Statistic name.
    /// * `val`  - Counter value.
    pub fn report_counter(&mut self, name: &str, val: i64) {
        *self.counters.entry(name.to_string()).or_insert(0) += val;
    }

    /// Accumulates a memory counter value.
    ///
    /// * `name` - Statistic name.
    /// * `val`  - Memory counter value in bytes.
    pub fn report_memory_counter(&mut self, name: &str, val: u64) {
        *self.memory_counters.entry(name.to_string()).or_insert(0) += val;
    }

    /// Accumulates floating point distribution samples.
    ///
    /// * `name`    - Statistic name.
    /// * `distrib` - Distribution.
    pub fn report_distribution(&mut self, name: &str, distrib: &StatsDistribution) {
        self.distributions
            .entry(name.to_string())
            .or_default()
            .accumulate(distrib);
    }

    /// Accumulates a percentage value.
    ///
    /// * `name`  - Statistic name.
    /// * `num`   - Numerator (actual count).
    /// * `denom` - Denominator (total count).
    pub fn report_percentage(&mut self, name: &str, num: i64, denom: i64) {
        let v = self.percentages.entry(name.to_string()).or_insert((0, 0));
        v.0 += num;
        v.1 += denom;
    }

    /// Accumulates a ratio value.
    ///
    /// * `name`  - Statistic name.
    /// * `num`   - Numerator.
    /// * `denom` - Denominator.
    pub fn report_ratio(&mut self, name: &str, num: i64, denom: i64) {
        let v = self.ratios.entry(name.to_string()).or_insert((0, 0));
        v.0 += num;
        v.1 += denom;
    }

    /// Returns an accumulated counter.
    ///
    /// * `name` - Statistic name.
    pub fn counter(&self, name: &str) -> Option<i64> {
        self.counters.get(name).copied()
    }

    /// Returns the formatted report grouped by category.
    pub fn report(&self) -> BTreeMap<String, Vec<String>> {
        let mut to_print: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut push = |k: &str, s: String| {
            let (category, _) = get_category_and_title(k);
            to_print.entry(category.to_string()).or_default().push(s);
        };

        for (k, v) in self.counters.iter().filter(|(_, v)| **v != 0) {
            let (_, title) = get_category_and_title(k);
            push(k, format!("{title:-42}               {v:12}"));
        }

        for (k, v) in self.memory_counters.iter().filter(|(_, v)| **v != 0) {
            let (_, title) = get_category_and_title(k);
            let kb = *v as f64 / 1024.0;
            let s = if kb < 1024.0 {
                format!("{title:-42}                  {kb:9.2} kB")
            } else {
                format!("{title:-42}                  {:9.2} MiB", kb / 1024.0)
            };
            push(k, s);
        }

        for (k, v) in self.distributions.iter().filter(|(_, v)| v.count > 0) {
            let (_, title) = get_category_and_title(k);
            let mn = v.min.unwrap_or(f64::MAX);
            let mx = v.max.unwrap_or(f64::MIN);
            push(
                k,
                format!("{title:-42}                      {:.3} avg [range {mn} - {mx}]", v.average()),
            );
        }

        for (k, &(num, denom)) in self.percentages.iter().filter(|(_, v)| v.1 != 0) {
            let (_, title) = get_category_and_title(k);
            push(
                k,
                format!(
                    "{title:-42}{num:12} / {denom:12} ({:.2}%)",
                    (100.0 * num as f64) / denom as f64
                ),
            );
        }

        for (k, &(num, denom)) in self.ratios.iter().filter(|(_, v)| v.1 != 0) {
            let (_, title) = get_category_and_title(k);
            push(
                k,
                format!("{title:-42}{num:12} / {denom:12} ({:.2}x)", num as f64 / denom as f64),
            );
        }

        to_print
    }

    /// Prints the report.
    pub fn print(&self) {
        println!("Statistics:");
        for (category, items) in self.report() {
            println!("  {category}");
            for item in items {
                println!("    {item}");
            }
        }
    }
}

/// Splits a statistic name at the first `/` and returns category and title. If there is no `/`, then category is the
/// empty string.
///
/// * `s` - The statistic name to split.
fn get_category_and_title(s: &str) -> (&str, &str) {
    match s.find('/') {
        Some(slash) => (&s[0..slash], &s[slash + 1..]),
        None => ("", s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distribution_tracks_range() {
        let mut d = StatsDistribution::default();
        d.report(2.0);
        d.report(-1.0);
        d.report(5.0);
        assert_eq!(d.count(), 3);
        assert_eq!(d.average(), 2.0);

        let mut merged = StatsDistribution::default();
        merged.accumulate(&d);
        assert_eq!(merged.min, Some(-1.0));
        assert_eq!(merged.max, Some(5.0));
    }

    #[test]
    fn report_groups_by_category() {
        let mut accum = StatsAccumulator::new();
        accum.report_counter("Paths/Emitter subpaths", 10);
        accum.report_counter("Paths/Emitter subpaths", 5);
        accum.report_ratio("Paths/Vertices per subpath", 30, 15);
        accum.report_counter("Skipped", 0);

        assert_eq!(accum.counter("Paths/Emitter subpaths"), Some(15));
        let report = accum.report();
        assert_eq!(report.len(), 1);
        assert_eq!(report["Paths"].len(), 2);
    }
}
