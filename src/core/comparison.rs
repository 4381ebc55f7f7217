//! Reconciling Monte Carlo and analytical results
//!
//! Both methods are reduced to a relative expanded uncertainty at k=2:
//! `2 · std / |mean| · 100` for the simulation and `2 · u / |value| · 100`
//! for the conventional result, independent of the coverage factor that
//! result was computed with.

use indexmap::IndexMap;
use serde::Serialize;

use crate::core::conventional::ConventionalUncertaintyResult;
use crate::core::statistics::MonteCarloStatistics;

const K: f64 = 2.0;

/// Expanded uncertainty of one output by both methods
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComparisonRow {
    /// Relative expanded uncertainty, analytical (k=2) [%]
    pub conventional_u_percent: f64,

    /// Relative expanded uncertainty, Monte Carlo (k=2) [%]
    pub monte_carlo_u_percent: f64,

    /// monte_carlo - conventional [percentage points]
    pub difference: f64,

    /// 100 · difference / conventional [%]
    pub relative_difference: f64,
}

/// Rows per output name, in the conventional result's output order
pub type ComparisonReport = IndexMap<String, ComparisonRow>;

/// Compare outputs present in both results; outputs found in only one are
/// left out.
pub fn compare_monte_carlo_to_conventional_uncertainty_calculation(
    monte_carlo: &MonteCarloStatistics,
    conventional: &ConventionalUncertaintyResult,
) -> ComparisonReport {
    conventional
        .outputs
        .iter()
        .filter_map(|(name, output)| {
            let stats = monte_carlo.get(name)?;
            let conventional_u_percent = relative_percent(output.u, output.value);
            let monte_carlo_u_percent = relative_percent(stats.std_dev, stats.mean);
            let difference = monte_carlo_u_percent - conventional_u_percent;
            let relative_difference = if conventional_u_percent == 0.0 {
                f64::NAN
            } else {
                100.0 * difference / conventional_u_percent
            };
            Some((
                name.clone(),
                ComparisonRow {
                    conventional_u_percent,
                    monte_carlo_u_percent,
                    difference,
                    relative_difference,
                },
            ))
        })
        .collect()
}

fn relative_percent(standard: f64, center: f64) -> f64 {
    if center == 0.0 {
        f64::NAN
    } else {
        K * standard / center.abs() * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::conventional::calculate_uncertainty;
    use crate::core::error::BoxError;
    use crate::core::function::{values, ValueMap};
    use crate::core::input::InputSpecSet;
    use crate::core::statistics::VariableStatistics;

    fn conventional() -> ConventionalUncertaintyResult {
        let mut set = InputSpecSet::new();
        set.add("x", 10.0).standard_uncertainty(0.5);
        let model = |x: &ValueMap| -> std::result::Result<ValueMap, BoxError> {
            Ok(values([("y", x["x"]), ("z", 2.0 * x["x"])]))
        };
        // k=3 must not leak into the comparison
        calculate_uncertainty(&set, &model, 3.0).unwrap()
    }

    fn stats(mean: f64, std_dev: f64) -> VariableStatistics {
        VariableStatistics {
            mean,
            std_dev,
            std_dev_percent: 100.0 * std_dev / mean.abs(),
            min: mean,
            max: mean,
            percentile_2_5: mean,
            percentile_97_5: mean,
        }
    }

    #[test]
    fn test_rows_use_k2_for_both_methods() {
        let mut mc = MonteCarloStatistics::new();
        mc.insert("y".into(), stats(10.0, 0.55));

        let report =
            compare_monte_carlo_to_conventional_uncertainty_calculation(&mc, &conventional());
        let row = report["y"];
        assert!((row.conventional_u_percent - 10.0).abs() < 1e-6);
        assert!((row.monte_carlo_u_percent - 11.0).abs() < 1e-12);
        assert!((row.difference - 1.0).abs() < 1e-6);
        assert!((row.relative_difference - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_only_shared_outputs_are_reported() {
        let mut mc = MonteCarloStatistics::new();
        mc.insert("z".into(), stats(20.0, 1.0));
        mc.insert("x_used".into(), stats(10.0, 0.5));
        mc.insert("extra".into(), stats(1.0, 0.1));

        let report =
            compare_monte_carlo_to_conventional_uncertainty_calculation(&mc, &conventional());
        let names: Vec<&str> = report.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["z"]);
    }

    #[test]
    fn test_negative_mean_uses_magnitude() {
        let mut mc = MonteCarloStatistics::new();
        mc.insert("y".into(), stats(-10.0, 0.5));
        let report =
            compare_monte_carlo_to_conventional_uncertainty_calculation(&mc, &conventional());
        assert!((report["y"].monte_carlo_u_percent - 10.0).abs() < 1e-12);
    }
}
