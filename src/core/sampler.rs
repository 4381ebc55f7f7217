//! Distribution sampler
//!
//! Draws independent values for one resolved input. Bounded normal inputs
//! are truncated by rejection: a draw outside `[min, max]` is discarded and
//! redrawn, which keeps the shape of the distribution inside the window
//! instead of piling probability mass onto the bounds as clipping would.

use rand::Rng;
use rand_distr::StandardNormal;

use crate::core::error::{Result, UncertaintyError};
use crate::core::input::{Distribution, ResolvedInput};

/// Resampling budget per draw for truncated distributions
pub const DEFAULT_MAX_RESAMPLE_ATTEMPTS: usize = 10_000;

/// Draw `n` values for `input` with the default resampling budget
pub fn draw<R: Rng + ?Sized>(input: &ResolvedInput, n: usize, rng: &mut R) -> Result<Vec<f64>> {
    draw_with(input, n, DEFAULT_MAX_RESAMPLE_ATTEMPTS, rng)
}

/// Draw `n` values for `input`, giving up after `max_attempts` rejected
/// draws for a single value
pub fn draw_with<R: Rng + ?Sized>(
    input: &ResolvedInput,
    n: usize,
    max_attempts: usize,
    rng: &mut R,
) -> Result<Vec<f64>> {
    let mut values = Vec::with_capacity(n);

    match input.distribution {
        Distribution::Constant => values.resize(n, input.mean),
        Distribution::Normal if input.standard_uncertainty == 0.0 => values.resize(n, input.mean),
        Distribution::Normal => {
            let mean = input.mean;
            let sigma = input.standard_uncertainty;
            for _ in 0..n {
                values.push(truncated(input, max_attempts, || {
                    let z: f64 = rng.sample(StandardNormal);
                    mean + sigma * z
                })?);
            }
        }
        Distribution::Uniform => {
            let (min, max) = bounds(input);
            for _ in 0..n {
                values.push(rng.random_range(min..=max));
            }
        }
        Distribution::Triangular => {
            // Inverse transform with the mode at the mean
            let (min, max) = bounds(input);
            let mode = input.mean;
            let fc = (mode - min) / (max - min);
            for _ in 0..n {
                let u: f64 = rng.random();
                let value = if u < fc {
                    min + (u * (max - min) * (mode - min)).sqrt()
                } else {
                    max - ((1.0 - u) * (max - min) * (max - mode)).sqrt()
                };
                values.push(value);
            }
        }
    }

    Ok(values)
}

/// Repeat `next` until it yields a value inside the input's bounds
fn truncated(
    input: &ResolvedInput,
    max_attempts: usize,
    mut next: impl FnMut() -> f64,
) -> Result<f64> {
    for _ in 0..max_attempts.max(1) {
        let value = next();
        if input.within_bounds(value) {
            return Ok(value);
        }
    }
    Err(UncertaintyError::Sampling {
        input: input.name.clone(),
        min: input.min.unwrap_or(f64::NEG_INFINITY),
        max: input.max.unwrap_or(f64::INFINITY),
        attempts: max_attempts,
    })
}

/// Bounds of a uniform or triangular input; presence is checked at resolution
fn bounds(input: &ResolvedInput) -> (f64, f64) {
    (
        input.min.unwrap_or(input.mean),
        input.max.unwrap_or(input.mean),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::input::InputSpecSet;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn resolved(set: &InputSpecSet) -> ResolvedInput {
        set.resolve().unwrap().remove(0)
    }

    fn mean_and_std(values: &[f64]) -> (f64, f64) {
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
        (mean, var.sqrt())
    }

    #[test]
    fn test_normal_moments() {
        let mut set = InputSpecSet::new();
        set.add("x", 10.0).standard_uncertainty(0.5);
        let mut rng = StdRng::seed_from_u64(7);

        let values = draw(&resolved(&set), 50_000, &mut rng).unwrap();
        let (mean, std) = mean_and_std(&values);
        assert!((mean - 10.0).abs() < 0.02);
        assert!((std - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_truncated_normal_never_leaves_bounds() {
        // Mean one sigma above zero: ~16 % of raw draws would be negative
        let mut set = InputSpecSet::new();
        set.add("flow", 1.0).standard_uncertainty(1.0).min(0.0);
        let mut rng = StdRng::seed_from_u64(11);

        let values = draw(&resolved(&set), 20_000, &mut rng).unwrap();
        assert_eq!(values.len(), 20_000);
        assert!(values.iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn test_exhausted_resampling_budget() {
        // Window far out in the tail: essentially never hit
        let mut set = InputSpecSet::new();
        set.add("x", 0.0).standard_uncertainty(1.0).bounds(0.0, 1e-12);
        let mut rng = StdRng::seed_from_u64(3);

        let err = draw_with(&resolved(&set), 10, 50, &mut rng).unwrap_err();
        assert!(matches!(err, UncertaintyError::Sampling { attempts: 50, .. }));
    }

    #[test]
    fn test_uniform_stays_in_range() {
        let mut set = InputSpecSet::new();
        set.add("x", 5.0)
            .distribution(Distribution::Uniform)
            .bounds(4.0, 6.0);
        let mut rng = StdRng::seed_from_u64(5);

        let values = draw(&resolved(&set), 20_000, &mut rng).unwrap();
        assert!(values.iter().all(|&v| (4.0..=6.0).contains(&v)));
        let (mean, std) = mean_and_std(&values);
        assert!((mean - 5.0).abs() < 0.02);
        assert!((std - 2.0 / 12f64.sqrt()).abs() < 0.01);
    }

    #[test]
    fn test_triangular_stays_in_range() {
        let mut set = InputSpecSet::new();
        set.add("x", 1.0)
            .distribution(Distribution::Triangular)
            .bounds(0.0, 3.0);
        let mut rng = StdRng::seed_from_u64(9);

        let values = draw(&resolved(&set), 20_000, &mut rng).unwrap();
        assert!(values.iter().all(|&v| (0.0..=3.0).contains(&v)));
        let (mean, _) = mean_and_std(&values);
        // mean of a triangle is (a + b + c) / 3
        assert!((mean - 4.0 / 3.0).abs() < 0.03);
    }

    #[test]
    fn test_constant_is_exact() {
        let mut set = InputSpecSet::new();
        set.add("setting", 0.25)
            .standard_uncertainty(1.0)
            .distribution(Distribution::Constant);
        let mut rng = StdRng::seed_from_u64(1);

        let values = draw(&resolved(&set), 100, &mut rng).unwrap();
        assert!(values.iter().all(|&v| v == 0.25));
    }
}
