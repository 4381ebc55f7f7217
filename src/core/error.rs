//! Error taxonomy for the propagation engine
//!
//! Two kinds of failure are kept apart so callers can tell a setup mistake
//! from a numerically fragile calculation function:
//!
//! - [`SpecError`] - the input description is unusable. Raised before any
//!   sampling or differentiation begins.
//! - [`UncertaintyError::Evaluation`] - the calculation function failed for
//!   some input vector (baseline, perturbed, or sampled).

use std::fmt;

use thiserror::Error;

/// Error type returned by calculation functions.
///
/// Any `std::error::Error` converts into it with `?`, and plain strings work
/// through `.into()`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Configuration errors in an input description or engine setting
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpecError {
    #[error("Input '{input}' has no mean value")]
    MissingMean { input: String },

    #[error("Input '{input}' has no resolvable standard uncertainty (set standard_uncertainty, standard_uncertainty_percent, or distribution 'none')")]
    MissingUncertainty { input: String },

    #[error("Input '{input}' uses a {distribution} distribution, which requires both min and max")]
    MissingBounds { input: String, distribution: String },

    #[error("Input '{input}' has min ({min}) not below max ({max})")]
    InvalidBounds { input: String, min: f64, max: f64 },

    #[error("Input '{input}' has mean {mean} outside its bounds [{min}, {max}]")]
    MeanOutOfBounds {
        input: String,
        mean: f64,
        min: f64,
        max: f64,
    },

    #[error("Input '{input}' has an invalid standard uncertainty ({value}); it must be finite and non-negative")]
    InvalidUncertainty { input: String, value: f64 },

    #[error("Input '{input}' has unknown distribution '{value}' (expected normal, uniform, triangular or none)")]
    UnknownDistribution { input: String, value: String },

    #[error("Coverage factor must be finite and positive, got {0}")]
    InvalidCoverageFactor(f64),

    #[error("Monte Carlo simulation needs at least one trial")]
    NoTrials,

    #[error("Batch count must be between 1 and the number of trials ({trials}), got {batches}")]
    InvalidBatchCount { batches: usize, trials: usize },

    #[error("Uncertainty budget entry '{name}' has no sensitivity coefficient")]
    MissingCoefficient { name: String },

    #[error("Uncertainty budget entry '{name}' is not a number")]
    InvalidBudgetEntry { name: String },

    #[error("Unsupported component(s): {}", .components.join(", "))]
    UnsupportedComponents { components: Vec<String> },

    #[error("Composition is empty or sums to zero")]
    EmptyComposition,
}

/// Where in a computation the calculation function failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    /// Evaluation at all inputs held at their means
    Baseline,
    /// Central-difference evaluation with one input perturbed
    Perturbation { input: String },
    /// Monte Carlo trial (zero-based)
    Trial { index: usize },
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Baseline => write!(f, "baseline evaluation"),
            Stage::Perturbation { input } => write!(f, "perturbation of input '{}'", input),
            Stage::Trial { index } => write!(f, "Monte Carlo trial {}", index),
        }
    }
}

/// Top-level error for every engine operation
#[derive(Debug, Error)]
pub enum UncertaintyError {
    #[error(transparent)]
    Spec(#[from] SpecError),

    #[error("Calculation function failed during {stage}: {source}")]
    Evaluation {
        stage: Stage,
        #[source]
        source: BoxError,
    },

    #[error("Calculation function returned outputs [{}] during {stage}, expected [{}]", .found.join(", "), .expected.join(", "))]
    InconsistentOutputs {
        stage: Stage,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("Cannot append samples with columns [{}] to samples with columns [{}]", .found.join(", "), .expected.join(", "))]
    IncompatibleSamples {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("Could not draw a value for input '{input}' within [{min}, {max}] after {attempts} attempts")]
    Sampling {
        input: String,
        min: f64,
        max: f64,
        attempts: usize,
    },
}

impl UncertaintyError {
    /// True for setup mistakes that were caught before any evaluation
    pub fn is_spec_error(&self) -> bool {
        matches!(self, UncertaintyError::Spec(_))
    }

    /// True when the calculation function itself failed or misbehaved
    pub fn is_evaluation_error(&self) -> bool {
        matches!(
            self,
            UncertaintyError::Evaluation { .. } | UncertaintyError::InconsistentOutputs { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, UncertaintyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_components_lists_keys() {
        let err = SpecError::UnsupportedComponents {
            components: vec!["H2S".to_string(), "Ar".to_string()],
        };
        assert_eq!(err.to_string(), "Unsupported component(s): H2S, Ar");
    }

    #[test]
    fn test_error_kinds_are_distinguishable() {
        let spec: UncertaintyError = SpecError::NoTrials.into();
        assert!(spec.is_spec_error());
        assert!(!spec.is_evaluation_error());

        let eval = UncertaintyError::Evaluation {
            stage: Stage::Perturbation {
                input: "dP".to_string(),
            },
            source: "negative square root".into(),
        };
        assert!(eval.is_evaluation_error());
        assert!(eval.to_string().contains("perturbation of input 'dP'"));
        assert!(eval.to_string().contains("negative square root"));
    }
}
