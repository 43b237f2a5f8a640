//! Macros

/// Create a thread local variable to track an `i64` counter across threads.
///
/// * `$title`     - Descriptive title of the statistic that uses `/` as a separator for categories.
///                  For example: "Paths/Emitter subpaths",
/// * `$var`       - An identifier for the thread local variable.
/// * `stats_func` - An identifier for the callback function used by `StatsRegistrar::call_stats_funcs() to report to
///                 `StatsAccumulator`.
#[macro_export]
macro_rules! stat_counter {
    ($title: expr, $var: ident, $stats_func: ident $(,)?) => {
        thread_local! { pub(crate) static $var: std::cell::RefCell<i64> = std::cell::RefCell::new(0); }

        pub(crate) fn $stats_func(accum: &mut StatsAccumulator) {
            // Report thread stats.
            let val = $var.with(|v| *v.borrow());
            accum.report_counter($title, val);

            // Reset thread stats.
            $var.with(|v| {
                *v.borrow_mut() = 0;
            });
        }
    };
}

/// Create a thread local variable to track memory usage as a counter across threads.
///
/// * `$title`     - Descriptive title of the statistic that uses `/` as a separator for categories.
///                  For example: "Paths/Emitter subpaths",
/// * `$var`       - An identifier for the thread local variable.
/// * `stats_func` - An identifier for the callback function used by `StatsRegistrar::call_stats_funcs() to report to
///                 `StatsAccumulator`.
#[macro_export]
macro_rules! stat_memory_counter {
    ($title: expr, $var: ident, $stats_func: ident $(,)?) => {
        thread_local! { pub(crate) static $var: std::cell::RefCell<u64> = std::cell::RefCell::new(0); }

        pub(crate) fn $stats_func(accum: &mut StatsAccumulator) {
            // Report thread stats.
            let val = $var.with(|v| *v.borrow());
            accum.report_memory_counter($title, val);

            // Reset thread stats.
            $var.with(|v| {
                *v.borrow_mut() = 0;
            });
        }
    };
}

/// Create a thread local variable to track a floating point distribution across threads.
///
/// * `$title`     - Descriptive title of the statistic that uses `/` as a separator for categories.
///                  For example: "Paths/Emitter subpaths",
/// * `$var`       - An identifier for the thread local variable.
/// * `stats_func` - An identifier for the callback function used by `StatsRegistrar::call_stats_funcs() to report to
///                 `StatsAccumulator`.
#[macro_export]
macro_rules! stat_distribution {
    ($title: expr, $var: ident, $stats_func: ident $(,)?) => {
        thread_local! {
            pub(crate) static $var: std::cell::RefCell<StatsDistribution> =
                std::cell::RefCell::new(StatsDistribution::default());
        }

        pub(crate) fn $stats_func(accum: &mut StatsAccumulator) {
            // Report thread stats.
            let val = $var.with(|v| v.borrow().clone());
            accum.report_distribution($title, &val);

            // Reset thread stats.
            $var.with(|v| {
                v.borrow_mut().clear();
            });
        }
    };
}

/// Create thread local variables to track an `i64` values for numerator/denominator as percentage across threads.
///
/// * `$title`     - Descriptive title of the statistic that uses `/` as a separator for categories.
///                  For example: "Paths/Emitter subpaths",
/// * `$var_num`   - An identifier for the thread local variable for numerator (actual count).
/// * `$var_denom` - An identifier for the thread local variable for denominator (total count).
/// * `stats_func` - An identifier for the callback function used by `StatsRegistrar::call_stats_funcs() to report to
///                 `StatsAccumulator`.
#[macro_export]
macro_rules! stat_percent {
    ($title: expr, $var_num: ident, $var_denom: ident, $stats_func: ident $(,)?) => {
        thread_local! {
            pub(crate) static $var_num: std::cell::RefCell<i64> = std::cell::RefCell::new(0);
            pub(crate) static $var_denom: std::cell::RefCell<i64> = std::cell::RefCell::new(0);
        }

        pub(crate) fn $stats_func(accum: &mut StatsAccumulator) {
            // Report thread stats.
            let num = $var_num.with(|v| *v.borrow());
            let denom = $var_denom.with(|v| *v.borrow());
            accum.report_percentage($title, num, denom);

            // Reset thread stats.
            $var_num.with(|v| {
                *v.borrow_mut() = 0;
            });
            $var_denom.with(|v| {
                *v.borrow_mut() = 0;
            });
        }
    };
}

/// Create thread local variables to track an `i64` values for numerator/denominator as ratio across threads.
///
/// * `$title`     - Descriptive title of the statistic that uses `/` as a separator for categories.
///                  For example: "Paths/Emitter subpaths",
/// * `$var_num`   - An identifier for the thread local variable for numerator (actual count).
/// * `$var_denom` - An identifier for the thread local variable for denominator (total count).
/// * `stats_func` - An identifier for the callback function used by `StatsRegistrar::call_stats_funcs() to report to
///                 `StatsAccumulator`.
#[macro_export]
macro_rules! stat_ratio {
    ($title: expr, $var_num: ident, $var_denom: ident, $stats_func: ident $(,)?) => {
        thread_local! {
            pub(crate) static $var_num: std::cell::RefCell<i64> = std::cell::RefCell::new(0);
            pub(crate) static $var_denom: std::cell::RefCell<i64> = std::cell::RefCell::new(0);
        }

        pub(crate) fn $stats_func(accum: &mut StatsAccumulator) {
            // Report thread stats.
            let num = $var_num.with(|v| *v.borrow());
            let denom = $var_denom.with(|v| *v.borrow());
            accum.report_ratio($title, num, denom);

            // Reset thread stats.
            $var_num.with(|v| {
                *v.borrow_mut() = 0;
            });
            $var_denom.with(|v| {
                *v.borrow_mut() = 0;
            });
        }
    };
}

/// Convenience macro to increment a thread local variable for counter/percent statistics.
#[macro_export]
macro_rules! stat_inc {
    ($var: ident, $e: expr) => {
        $var.with(|v| *v.borrow_mut() += $e);
    };
}

/// Convenience macro to report a thread local variable for distribution statistics.
#[macro_export]
macro_rules! stat_dist {
    ($var: ident, $e: expr) => {
        $var.with(|v| v.borrow_mut().report($e));
    };
}

/// Convenience macro to register the callback functions for statistics.
///
/// * `$($func: ident),+` - One or more callback functions created by the `stat_*` macros.
#[macro_export]
macro_rules! stat_register_fns {
    ($($stat_func: ident),+ $(,)?) => {
        /// Return the whether stats are registered.
        pub(crate) fn is_stats_registered() -> &'static std::sync::Mutex<bool> {
            static DATA: std::sync::OnceLock<std::sync::Mutex<bool>> = std::sync::OnceLock::new();
            DATA.get_or_init(|| std::sync::Mutex::new(false))
        }

        /// Registers the statistics of the calling module once. Call it from a long lived constructor such as
        /// `Film::new()` or `BdptIntegrator::new()` rather than per-sample code.
        pub(crate) fn register_stats() {
            let mut is_registered = is_stats_registered().lock().unwrap();
            if !*is_registered  {
                let mut sr = stats_registrar().lock().unwrap();
                $(
                    sr.register_stat_func($stat_func);
                )+
                *is_registered = true;
            }
        }
    };
}

/// Convenience function to accumulate thread local statistics in the global `StatsAccumulator`. This will call the
/// registered callbacks created with `stat_*` macros. This should be called at the end of each spawned thread and at
/// the end of rendering a scene from the main thread.
#[macro_export]
macro_rules! report_stats {
    () => {{
        let mut accum = stats_accumulator().lock().unwrap();
        stats_registrar().lock().unwrap().call_stat_funcs(&mut accum);
    }};
}

/// Convenience function to print accumulated statistic in the global `StatsAccumulator`.
#[macro_export]
macro_rules! print_stats {
    () => {{
        stats_accumulator().lock().unwrap().print();
    }};
}

// ---- Tests ----

#[cfg(test)]
mod tests {
    use crate::stats::*;

    stat_percent!("Connections/Rejected", REJECTED, ATTEMPTED, connection_stats_rejected);
    stat_distribution!("Connections/Samples per pixel", PIXEL_SAMPLES, connection_stats_pixel_samples);

    #[test]
    fn thread_stats_report_and_reset() {
        stat_inc!(ATTEMPTED, 4);
        stat_inc!(REJECTED, 1);
        stat_dist!(PIXEL_SAMPLES, 8.0);
        stat_dist!(PIXEL_SAMPLES, 16.0);

        let mut accum = StatsAccumulator::new();
        connection_stats_rejected(&mut accum);
        connection_stats_pixel_samples(&mut accum);
        let report = accum.report();
        assert_eq!(report["Connections"].len(), 2);
        assert!(report["Connections"].iter().any(|l| l.contains("(25.00%)")));
        assert!(report["Connections"].iter().any(|l| l.contains("12.000 avg [range 8 - 16]")));

        // The thread locals were reset, so reporting again adds nothing.
        connection_stats_rejected(&mut accum);
        connection_stats_pixel_samples(&mut accum);
        assert_eq!(accum.report(), report);
        assert_eq!(ATTEMPTED.with(|v| *v.borrow()), 0);
        assert_eq!(PIXEL_SAMPLES.with(|v| v.borrow().count()), 0);
    }
}
