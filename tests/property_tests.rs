//! Property tests for the propagation invariants

use indexmap::IndexMap;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use uncertaintylib::core::input::effective_standard_uncertainty;
use uncertaintylib::core::sampler::draw;
use uncertaintylib::core::{
    calculate_uncertainty, combined_standard_uncertainty, values, BoxError, Distribution,
    InputSpecSet, ValueMap,
};

fn budget(u: &[f64]) -> IndexMap<String, f64> {
    u.iter()
        .enumerate()
        .map(|(i, &v)| (format!("u{i}"), v))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // --- Larger of absolute and percentage ---
    #[test]
    fn larger_of_rule(
        mean in -1e4_f64..1e4,
        absolute in 0.0_f64..100.0,
        percent in 0.0_f64..50.0,
    ) {
        let u = effective_standard_uncertainty(mean, Some(absolute), Some(percent)).unwrap();
        let from_percent = mean.abs() * percent / 100.0;
        prop_assert_eq!(u, absolute.max(from_percent));
        prop_assert!(u >= absolute);
    }

    // --- Unit coefficients give the root sum of squares ---
    #[test]
    fn budget_is_root_sum_of_squares(u in proptest::collection::vec(0.0_f64..10.0, 1..20)) {
        let combined = combined_standard_uncertainty(&budget(&u), None).unwrap();
        let expected = u.iter().map(|v| v * v).sum::<f64>().sqrt();
        prop_assert!((combined - expected).abs() <= 1e-12 * expected.max(1.0));
    }

    // --- Scaling every coefficient scales the result ---
    #[test]
    fn budget_scales_with_coefficients(
        u in proptest::collection::vec(0.0_f64..10.0, 1..20),
        scale in -5.0_f64..5.0,
    ) {
        let entries = budget(&u);
        let ci: IndexMap<String, f64> = entries.keys().map(|k| (k.clone(), scale)).collect();
        let scaled = combined_standard_uncertainty(&entries, Some(&ci)).unwrap();
        let unit = combined_standard_uncertainty(&entries, None).unwrap();
        prop_assert!((scaled - scale.abs() * unit).abs() <= 1e-9 * unit.max(1.0));
    }

    // --- Linear models: analytical result is exact and contributions sum to 100 ---
    #[test]
    fn linear_model_budget(
        a in -10.0_f64..10.0,
        b in -10.0_f64..10.0,
        ua in 0.01_f64..2.0,
        ub in 0.01_f64..2.0,
    ) {
        prop_assume!(a.abs() > 0.1 && b.abs() > 0.1);
        let mut inputs = InputSpecSet::new();
        inputs.add("x", 3.0).standard_uncertainty(ua);
        inputs.add("y", -7.0).standard_uncertainty(ub);
        let linear = move |v: &ValueMap| -> Result<ValueMap, BoxError> {
            Ok(values([("z", a * v["x"] + b * v["y"])]))
        };

        let result = calculate_uncertainty(&inputs, &linear, 2.0).unwrap();
        let out = &result.outputs["z"];
        let expected = ((a * ua).powi(2) + (b * ub).powi(2)).sqrt();
        prop_assert!((out.u - expected).abs() < 1e-6 * expected.max(1.0));
        prop_assert!((out.expanded - 2.0 * out.u).abs() < 1e-12);
        let total: f64 = out.contribution.values().sum();
        prop_assert!((total - 100.0).abs() < 1e-6);
    }

    // --- Bounded inputs stay inside their bounds ---
    #[test]
    fn truncated_draws_respect_bounds(
        mean in -5.0_f64..5.0,
        u in 0.1_f64..5.0,
        width in 0.5_f64..5.0,
        seed in any::<u64>(),
    ) {
        let (min, max) = (mean - width, mean + width);
        let mut inputs = InputSpecSet::new();
        inputs.add("x", mean).standard_uncertainty(u).bounds(min, max);
        let resolved = inputs.resolve().unwrap();

        let mut rng = StdRng::seed_from_u64(seed);
        let drawn = draw(&resolved[0], 500, &mut rng).unwrap();
        prop_assert!(drawn.iter().all(|&v| (min..=max).contains(&v)));
    }

    // --- Uniform inputs without an explicit u take it from the bounds ---
    #[test]
    fn uniform_uncertainty_from_bounds(min in -100.0_f64..0.0, width in 0.1_f64..100.0) {
        let max = min + width;
        let mut inputs = InputSpecSet::new();
        inputs
            .add("x", min + width / 2.0)
            .distribution(Distribution::Uniform)
            .bounds(min, max);
        let resolved = inputs.resolve().unwrap();
        let expected = width / 12f64.sqrt();
        let u = resolved[0].standard_uncertainty;
        prop_assert!((u - expected).abs() < 1e-12 * expected.max(1.0));
    }
}
