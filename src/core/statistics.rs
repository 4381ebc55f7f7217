//! Summary statistics and correlations of Monte Carlo samples

use indexmap::IndexMap;
use serde::Serialize;
use tracing::warn;

use crate::core::monte_carlo::MonteCarloSampleSet;

/// Summary of one sampled variable
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VariableStatistics {
    pub mean: f64,

    /// Sample standard deviation (N−1); NaN for fewer than two trials
    pub std_dev: f64,

    /// 100 · std_dev / |mean|; NaN when the mean is zero
    pub std_dev_percent: f64,

    pub min: f64,
    pub max: f64,

    /// Lower end of the 95 % coverage interval
    pub percentile_2_5: f64,

    /// Upper end of the 95 % coverage interval
    pub percentile_97_5: f64,
}

impl VariableStatistics {
    /// Statistics of a single column; `None` for an empty column
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std_dev = sample_std_dev(values, mean);
        let std_dev_percent = if mean == 0.0 {
            f64::NAN
        } else {
            100.0 * std_dev / mean.abs()
        };

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let min = sorted[0];
        let max = sorted[sorted.len() - 1];
        let p2_5_idx = (n * 0.025) as usize;
        let p97_5_idx = (n * 0.975) as usize;

        Some(Self {
            mean,
            std_dev,
            std_dev_percent,
            min,
            max,
            percentile_2_5: sorted.get(p2_5_idx).copied().unwrap_or(min),
            percentile_97_5: sorted.get(p97_5_idx).copied().unwrap_or(max),
        })
    }
}

/// Statistics keyed by flat column label
pub type MonteCarloStatistics = IndexMap<String, VariableStatistics>;

/// Mean, sample standard deviation and coverage interval per column.
///
/// Input columns are labelled `<name>_used`, outputs by name.
pub fn calculate_monte_carlo_statistics(samples: &MonteCarloSampleSet) -> MonteCarloStatistics {
    samples
        .columns()
        .into_iter()
        .filter_map(|(label, values)| VariableStatistics::from_values(values).map(|s| (label, s)))
        .collect()
}

/// Symmetric Pearson correlation matrix
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub names: Vec<String>,
    /// Row-major, `names.len()` × `names.len()`
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.names.iter().position(|n| n == a)?;
        let j = self.names.iter().position(|n| n == b)?;
        Some(self.values[i][j])
    }
}

/// Pearson correlations between outputs, and optionally the used inputs.
///
/// Pairs involving a zero-variance column are NaN; the diagonal is 1.
pub fn monte_carlo_output_correlations(
    samples: &MonteCarloSampleSet,
    include_inputs: bool,
) -> CorrelationMatrix {
    let columns: Vec<(String, &[f64])> = samples
        .columns()
        .into_iter()
        .filter(|(label, _)| include_inputs || samples.outputs.contains_key(label))
        .collect();

    let size = columns.len();
    let mut values = vec![vec![f64::NAN; size]; size];
    for i in 0..size {
        values[i][i] = 1.0;
        for j in (i + 1)..size {
            let r = pearson(columns[i].1, columns[j].1);
            if r.is_nan() {
                warn!(
                    a = %columns[i].0,
                    b = %columns[j].0,
                    "correlation undefined for zero-variance column"
                );
            }
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    CorrelationMatrix {
        names: columns.into_iter().map(|(name, _)| name).collect(),
        values,
    }
}

fn sample_std_dev(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let ss: f64 = values.iter().map(|x| (x - mean).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n < 2 {
        return f64::NAN;
    }
    let mx = x[..n].iter().sum::<f64>() / n as f64;
    let my = y[..n].iter().sum::<f64>() / n as f64;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (a, b) in x[..n].iter().zip(&y[..n]) {
        let dx = a - mx;
        let dy = b - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return f64::NAN;
    }
    (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples() -> MonteCarloSampleSet {
        let mut set = MonteCarloSampleSet::default();
        set.inputs.insert("x".into(), vec![1.0, 2.0, 3.0, 4.0]);
        set.outputs.insert("double".into(), vec![2.0, 4.0, 6.0, 8.0]);
        set.outputs.insert("neg".into(), vec![-1.0, -2.0, -3.0, -4.0]);
        set.outputs.insert("flat".into(), vec![5.0, 5.0, 5.0, 5.0]);
        set
    }

    #[test]
    fn test_sample_statistics() {
        let stats = calculate_monte_carlo_statistics(&samples());
        let x = stats["x_used"];
        assert_eq!(x.mean, 2.5);
        // var = (2.25 + 0.25 + 0.25 + 2.25) / 3
        assert!((x.std_dev - (5.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert!((x.std_dev_percent - 100.0 * x.std_dev / 2.5).abs() < 1e-12);
        assert_eq!(x.min, 1.0);
        assert_eq!(x.max, 4.0);
        assert!(stats["neg"].std_dev_percent > 0.0);
        assert_eq!(stats["flat"].std_dev, 0.0);
    }

    #[test]
    fn test_single_trial_has_undefined_spread() {
        let stats = VariableStatistics::from_values(&[3.0]).unwrap();
        assert_eq!(stats.mean, 3.0);
        assert!(stats.std_dev.is_nan());
        assert!(VariableStatistics::from_values(&[]).is_none());
    }

    #[test]
    fn test_percentiles_bracket_bulk() {
        let values: Vec<f64> = (0..1000).map(f64::from).collect();
        let stats = VariableStatistics::from_values(&values).unwrap();
        assert_eq!(stats.percentile_2_5, 25.0);
        assert_eq!(stats.percentile_97_5, 975.0);
    }

    #[test]
    fn test_correlation_matrix() {
        let matrix = monte_carlo_output_correlations(&samples(), false);
        assert_eq!(matrix.names, vec!["double", "neg", "flat"]);
        assert_eq!(matrix.get("double", "double"), Some(1.0));
        assert!((matrix.get("double", "neg").unwrap() + 1.0).abs() < 1e-12);
        assert_eq!(matrix.get("neg", "double"), matrix.get("double", "neg"));
        assert!(matrix.get("flat", "double").unwrap().is_nan());
        assert_eq!(matrix.get("x_used", "double"), None);

        let with_inputs = monte_carlo_output_correlations(&samples(), true);
        assert_eq!(with_inputs.names[0], "x_used");
        assert!((with_inputs.get("x_used", "double").unwrap() - 1.0).abs() < 1e-12);
    }
}
