//! Law of propagation of uncertainty (GUM, uncorrelated inputs)
//!
//! For each output y with sensitivity coefficients c_i and input standard
//! uncertainties u_i:
//!
//! ```text
//! u_y² = Σ (c_i · u_i)²        U = k · u_y        U% = 100 · U / |y|
//! contribution_i = 100 · (c_i · u_i)² / u_y²
//! ```

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, warn};

use crate::core::error::{Result, SpecError};
use crate::core::function::CalculationFunction;
use crate::core::input::InputSpecSet;
use crate::core::sensitivity::{sensitivities_for, DifferentiationOptions, SensitivityResult};

/// Default coverage factor (≈95 % under normality)
pub const DEFAULT_COVERAGE_FACTOR: f64 = 2.0;

/// Propagated uncertainty of one output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputUncertainty {
    /// Output at nominal inputs
    pub value: f64,

    /// Combined standard uncertainty (k=1)
    pub u: f64,

    /// Expanded uncertainty
    #[serde(rename = "U")]
    pub expanded: f64,

    /// Relative expanded uncertainty [%]
    #[serde(rename = "U_perc")]
    pub expanded_percent: f64,

    /// Share of the combined variance per input [%]
    pub contribution: IndexMap<String, f64>,
}

/// Result of the analytical (conventional) method
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConventionalUncertaintyResult {
    /// Coverage factor used for `U`
    pub coverage_factor: f64,

    /// Effective standard uncertainty used per varied input
    pub input_uncertainty: IndexMap<String, f64>,

    pub outputs: IndexMap<String, OutputUncertainty>,

    pub sensitivity: SensitivityResult,
}

impl ConventionalUncertaintyResult {
    pub fn output(&self, name: &str) -> Option<&OutputUncertainty> {
        self.outputs.get(name)
    }
}

/// Propagate uncertainty analytically with default step sizes
pub fn calculate_uncertainty<F>(
    inputs: &InputSpecSet,
    function: &F,
    coverage_factor: f64,
) -> Result<ConventionalUncertaintyResult>
where
    F: CalculationFunction + ?Sized,
{
    calculate_uncertainty_with(
        inputs,
        function,
        coverage_factor,
        &DifferentiationOptions::default(),
    )
}

/// Propagate uncertainty analytically with explicit step sizes
pub fn calculate_uncertainty_with<F>(
    inputs: &InputSpecSet,
    function: &F,
    coverage_factor: f64,
    options: &DifferentiationOptions,
) -> Result<ConventionalUncertaintyResult>
where
    F: CalculationFunction + ?Sized,
{
    if !coverage_factor.is_finite() || coverage_factor <= 0.0 {
        return Err(SpecError::InvalidCoverageFactor(coverage_factor).into());
    }

    let resolved = inputs.resolve()?;
    let input_uncertainty: IndexMap<String, f64> = resolved
        .iter()
        .filter(|i| i.is_varied())
        .map(|i| (i.name.clone(), i.standard_uncertainty))
        .collect();
    debug!(inputs = input_uncertainty.len(), "resolved input uncertainties");

    let sensitivity = sensitivities_for(&resolved, function, options)?;

    let outputs = sensitivity
        .absolute
        .iter()
        .map(|(name, coefficients)| {
            let value = sensitivity.baseline[name];
            let terms: IndexMap<String, f64> = coefficients
                .iter()
                .map(|(input, c)| {
                    let cu = c * input_uncertainty[input];
                    (input.clone(), cu * cu)
                })
                .collect();
            let result = combine(name, value, &terms, coverage_factor);
            (name.clone(), result)
        })
        .collect();

    Ok(ConventionalUncertaintyResult {
        coverage_factor,
        input_uncertainty,
        outputs,
        sensitivity,
    })
}

/// Combine variance terms (c_i·u_i)² of a single output
fn combine(
    output: &str,
    value: f64,
    terms: &IndexMap<String, f64>,
    coverage_factor: f64,
) -> OutputUncertainty {
    let variance: f64 = terms.values().sum();
    let u = variance.sqrt();
    let expanded = coverage_factor * u;

    let (expanded_percent, contribution) = if variance > 0.0 {
        let percent = if value == 0.0 {
            warn!(output, "zero output value, relative uncertainty undefined");
            f64::NAN
        } else {
            100.0 * expanded / value.abs()
        };
        let contribution = terms
            .iter()
            .map(|(k, v)| (k.clone(), 100.0 * v / variance))
            .collect();
        (percent, contribution)
    } else {
        warn!(output, "zero combined variance");
        (0.0, terms.keys().map(|k| (k.clone(), 0.0)).collect())
    };

    OutputUncertainty {
        value,
        u,
        expanded,
        expanded_percent,
        contribution,
    }
}

/// Combined standard uncertainty of a simple budget: sqrt(Σ (c_i·u_i)²)
///
/// Without `ci`, every sensitivity coefficient is 1.0. With `ci`, every key
/// of `u` needs a coefficient; extra coefficients are ignored.
pub fn combined_standard_uncertainty(
    u: &IndexMap<String, f64>,
    ci: Option<&IndexMap<String, f64>>,
) -> std::result::Result<f64, SpecError> {
    let mut sum = 0.0;
    for (name, &value) in u {
        if value.is_nan() {
            return Err(SpecError::InvalidBudgetEntry { name: name.clone() });
        }
        let c = match ci {
            None => 1.0,
            Some(ci) => match ci.get(name) {
                Some(c) if !c.is_nan() => *c,
                _ => return Err(SpecError::MissingCoefficient { name: name.clone() }),
            },
        };
        sum += (c * value).powi(2);
    }
    Ok(sum.sqrt())
}
