//! Sensitivity coefficients by central differences
//!
//! For every varied input `i` with mean `m`, the calculation function is
//! evaluated at `m + h` and `m - h` with all other inputs at their means,
//! giving `c = (f(m+h) - f(m-h)) / 2h` for every output. Constant inputs
//! (distribution `none`) are held fixed and left out of the result.

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, warn};

use crate::core::error::{Result, Stage};
use crate::core::function::{check_outputs, evaluate_at, CalculationFunction, ValueMap};
use crate::core::input::{mean_values, InputSpecSet, ResolvedInput};

/// Step-size settings for numerical differentiation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifferentiationOptions {
    /// Step as a fraction of |mean|
    pub relative_step: f64,
    /// Smallest step used, for means at or near zero
    pub absolute_step: f64,
}

impl Default for DifferentiationOptions {
    fn default() -> Self {
        Self {
            relative_step: 1e-6,
            absolute_step: 1e-9,
        }
    }
}

impl DifferentiationOptions {
    /// Perturbation step for an input with the given mean
    pub fn step_for(&self, mean: f64) -> f64 {
        (self.relative_step * mean.abs()).max(self.absolute_step)
    }
}

/// Coefficients per output, then per input
pub type CoefficientMatrix = IndexMap<String, IndexMap<String, f64>>;

/// Absolute and relative sensitivity coefficients
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensitivityResult {
    /// Outputs with every input at its mean
    pub baseline: ValueMap,

    /// ∂output/∂input
    pub absolute: CoefficientMatrix,

    /// (∂output/∂input) · mean_input / baseline_output; NaN for a zero baseline
    pub relative: CoefficientMatrix,
}

impl SensitivityResult {
    /// Absolute coefficient of `output` with respect to `input`
    pub fn coefficient(&self, output: &str, input: &str) -> Option<f64> {
        self.absolute.get(output)?.get(input).copied()
    }
}

/// Compute sensitivity coefficients with the default step sizes
pub fn compute_sensitivities<F>(inputs: &InputSpecSet, function: &F) -> Result<SensitivityResult>
where
    F: CalculationFunction + ?Sized,
{
    compute_sensitivities_with(inputs, function, &DifferentiationOptions::default())
}

/// Compute sensitivity coefficients with explicit step sizes
pub fn compute_sensitivities_with<F>(
    inputs: &InputSpecSet,
    function: &F,
    options: &DifferentiationOptions,
) -> Result<SensitivityResult>
where
    F: CalculationFunction + ?Sized,
{
    let resolved = inputs.resolve()?;
    sensitivities_for(&resolved, function, options)
}

pub(crate) fn sensitivities_for<F>(
    inputs: &[ResolvedInput],
    function: &F,
    options: &DifferentiationOptions,
) -> Result<SensitivityResult>
where
    F: CalculationFunction + ?Sized,
{
    let means = mean_values(inputs);
    let baseline = evaluate_at(function, &means, Stage::Baseline)?;

    let mut absolute: CoefficientMatrix = baseline
        .keys()
        .map(|k| (k.clone(), IndexMap::new()))
        .collect();
    let mut relative = absolute.clone();

    for input in inputs.iter().filter(|i| i.is_varied()) {
        let h = options.step_for(input.mean);
        let upper = input.mean + h;
        let lower = input.mean - h;
        // Use the representable span rather than 2h
        let span = upper - lower;
        debug!(input = %input.name, step = h, "central difference");

        let stage = Stage::Perturbation {
            input: input.name.clone(),
        };
        let mut point = means.clone();
        point.insert(input.name.clone(), upper);
        let f_upper = evaluate_at(function, &point, stage.clone())?;
        check_outputs(&baseline, &f_upper, stage.clone())?;

        point.insert(input.name.clone(), lower);
        let f_lower = evaluate_at(function, &point, stage.clone())?;
        check_outputs(&baseline, &f_lower, stage)?;

        for (output, &base) in &baseline {
            let c = (f_upper[output] - f_lower[output]) / span;
            let rel = if base == 0.0 {
                warn!(
                    output = %output,
                    input = %input.name,
                    "zero baseline output, relative sensitivity undefined"
                );
                f64::NAN
            } else {
                c * input.mean / base
            };
            absolute[output].insert(input.name.clone(), c);
            relative[output].insert(input.name.clone(), rel);
        }
    }

    Ok(SensitivityResult {
        baseline,
        absolute,
        relative,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{BoxError, UncertaintyError};
    use crate::core::function::values;
    use crate::core::input::Distribution;

    fn box_model(x: &ValueMap) -> std::result::Result<ValueMap, BoxError> {
        Ok(values([
            ("volume", x["L"] * x["W"] * x["D"]),
            ("area", x["L"] * x["W"]),
        ]))
    }

    fn box_inputs() -> InputSpecSet {
        let mut set = InputSpecSet::new();
        set.add("L", 2.0).standard_uncertainty(0.3);
        set.add("W", 2.0).standard_uncertainty(0.1);
        set.add("D", 2.0).standard_uncertainty(0.2);
        set
    }

    #[test]
    fn test_product_derivatives() {
        let result = compute_sensitivities(&box_inputs(), &box_model).unwrap();
        assert!((result.coefficient("volume", "L").unwrap() - 4.0).abs() < 1e-6);
        assert!((result.coefficient("area", "W").unwrap() - 2.0).abs() < 1e-6);
        assert!(result.coefficient("area", "D").unwrap().abs() < 1e-6);
        // volume is homogeneous of degree one in each input
        assert!((result.relative["volume"]["D"] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_constant_inputs_are_omitted() {
        let mut set = box_inputs();
        set.add("setting", 1.0).distribution(Distribution::Constant);

        let model = |x: &ValueMap| -> std::result::Result<ValueMap, BoxError> {
            Ok(values([("y", x["L"] * x["setting"])]))
        };
        let result = compute_sensitivities(&set, &model).unwrap();
        assert!(result.absolute["y"].contains_key("L"));
        assert!(!result.absolute["y"].contains_key("setting"));
    }

    #[test]
    fn test_zero_baseline_gives_nan_relative() {
        let mut set = InputSpecSet::new();
        set.add("x", 0.0).standard_uncertainty(0.1);
        let model = |x: &ValueMap| -> std::result::Result<ValueMap, BoxError> {
            Ok(values([("y", 3.0 * x["x"])]))
        };
        let result = compute_sensitivities(&set, &model).unwrap();
        assert!((result.absolute["y"]["x"] - 3.0).abs() < 1e-6);
        assert!(result.relative["y"]["x"].is_nan());
    }

    #[test]
    fn test_failure_at_perturbed_point_propagates() {
        let mut set = InputSpecSet::new();
        set.add("x", 0.0).standard_uncertainty(0.1);
        let model = |x: &ValueMap| -> std::result::Result<ValueMap, BoxError> {
            if x["x"] < 0.0 {
                return Err("square root of negative number".into());
            }
            Ok(values([("y", x["x"].sqrt())]))
        };
        let err = compute_sensitivities(&set, &model).unwrap_err();
        match err {
            UncertaintyError::Evaluation { stage, source } => {
                assert_eq!(
                    stage,
                    Stage::Perturbation {
                        input: "x".to_string()
                    }
                );
                assert_eq!(source.to_string(), "square root of negative number");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_spec_error_before_any_evaluation() {
        let mut set = InputSpecSet::new();
        set.add("x", 1.0);
        let model = |_: &ValueMap| -> std::result::Result<ValueMap, BoxError> {
            panic!("must not be called")
        };
        let err = compute_sensitivities(&set, &model).unwrap_err();
        assert!(err.is_spec_error());
    }

    #[test]
    fn test_step_floor_for_zero_mean() {
        let options = DifferentiationOptions::default();
        assert_eq!(options.step_for(0.0), 1e-9);
        assert!((options.step_for(-2000.0) - 2e-3).abs() < 1e-15);
    }
}
