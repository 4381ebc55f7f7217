//! Parallel Monte Carlo in independent batches
//!
//! The trial count is split into near-equal batches. Each batch gets its own
//! `StdRng`, seeded from a master generator, and batches run on the rayon
//! pool. Results are concatenated in batch order, so a given master seed
//! and batch count give the same samples whatever the thread scheduling.

use std::ops::Range;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::debug;

use crate::core::error::{Result, SpecError};
use crate::core::function::CalculationFunction;
use crate::core::input::InputSpecSet;
use crate::core::monte_carlo::{simulate, MonteCarloOptions, MonteCarloSampleSet};

/// Run `n` trials split over `batches` parallel batches
pub fn monte_carlo_in_batches<F>(
    inputs: &InputSpecSet,
    function: &F,
    n: usize,
    batches: usize,
    seed: Option<u64>,
) -> Result<MonteCarloSampleSet>
where
    F: CalculationFunction + Sync + ?Sized,
{
    let options = MonteCarloOptions {
        seed,
        ..MonteCarloOptions::default()
    };
    monte_carlo_in_batches_with(inputs, function, n, batches, &options)
}

/// [`monte_carlo_in_batches`] with explicit sampling settings
pub fn monte_carlo_in_batches_with<F>(
    inputs: &InputSpecSet,
    function: &F,
    n: usize,
    batches: usize,
    options: &MonteCarloOptions,
) -> Result<MonteCarloSampleSet>
where
    F: CalculationFunction + Sync + ?Sized,
{
    let resolved = inputs.resolve()?;
    if n == 0 {
        return Err(SpecError::NoTrials.into());
    }
    if batches == 0 || batches > n {
        return Err(SpecError::InvalidBatchCount { batches, trials: n }.into());
    }

    let mut master = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let mut start = 0;
    let plan: Vec<(Range<usize>, u64)> = batch_sizes(n, batches)
        .into_iter()
        .map(|size| {
            let trials = start..start + size;
            start += size;
            (trials, master.random())
        })
        .collect();
    debug!(batches, trials = n, "running Monte Carlo in batches");

    let max_attempts = options.max_resample_attempts;
    let parts: Vec<MonteCarloSampleSet> = plan
        .par_iter()
        .map(|(trials, batch_seed)| {
            let mut rng = StdRng::seed_from_u64(*batch_seed);
            simulate(&resolved, function, trials.clone(), max_attempts, &mut rng)
        })
        .collect::<Result<_>>()?;

    let mut samples = MonteCarloSampleSet::default();
    for part in parts {
        samples.append(part)?;
    }
    Ok(samples)
}

/// Split `n` into `batches` sizes differing by at most one
fn batch_sizes(n: usize, batches: usize) -> Vec<usize> {
    let base = n / batches;
    let extra = n % batches;
    (0..batches)
        .map(|i| base + usize::from(i < extra))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{BoxError, Stage, UncertaintyError};
    use crate::core::function::{values, ValueMap};
    use crate::core::sampler::{draw_with, DEFAULT_MAX_RESAMPLE_ATTEMPTS};

    fn model(x: &ValueMap) -> std::result::Result<ValueMap, BoxError> {
        Ok(values([("y", x["a"] * 2.0)]))
    }

    fn inputs() -> InputSpecSet {
        let mut set = InputSpecSet::new();
        set.add("a", 1.0).standard_uncertainty(0.1);
        set
    }

    #[test]
    fn test_batch_sizes_cover_all_trials() {
        assert_eq!(batch_sizes(10, 3), vec![4, 3, 3]);
        assert_eq!(batch_sizes(4, 4), vec![1, 1, 1, 1]);
        assert_eq!(batch_sizes(7, 1), vec![7]);
    }

    #[test]
    fn test_batched_run_is_reproducible() {
        let first = monte_carlo_in_batches(&inputs(), &model, 1000, 4, Some(9)).unwrap();
        let second = monte_carlo_in_batches(&inputs(), &model, 1000, 4, Some(9)).unwrap();
        assert_eq!(first.len(), 1000);
        assert_eq!(first, second);
    }

    #[test]
    fn test_failure_reports_global_trial_number() {
        // Replay the seed of the last batch to pick one value it will draw
        let mut master = StdRng::seed_from_u64(1);
        let seeds: Vec<u64> = (0..4).map(|_| master.random()).collect();
        let resolved = inputs().resolve().unwrap();
        let mut rng = StdRng::seed_from_u64(seeds[3]);
        let column = draw_with(&resolved[0], 10, DEFAULT_MAX_RESAMPLE_ATTEMPTS, &mut rng).unwrap();
        let poisoned = column[5];

        let model = |x: &ValueMap| -> std::result::Result<ValueMap, BoxError> {
            if x["a"] == poisoned {
                return Err("poisoned value".into());
            }
            Ok(values([("y", x["a"])]))
        };
        let err = monte_carlo_in_batches(&inputs(), &model, 40, 4, Some(1)).unwrap_err();
        assert!(matches!(
            err,
            UncertaintyError::Evaluation {
                stage: Stage::Trial { index: 35 },
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_batch_count() {
        let err = monte_carlo_in_batches(&inputs(), &model, 10, 0, None).unwrap_err();
        assert!(err.is_spec_error());
        let err = monte_carlo_in_batches(&inputs(), &model, 10, 11, None).unwrap_err();
        assert!(err.is_spec_error());
    }
}
