//! Calculation function seam
//!
//! The engine treats a calculation as an opaque mapping from named scalar
//! inputs to named scalar outputs. Any closure with the right signature
//! qualifies; expensive resources (an equation-of-state handle, lookup
//! tables) are owned by the caller and captured by the closure.

use indexmap::IndexMap;

use crate::core::error::{BoxError, Result, Stage, UncertaintyError};

/// Named scalar values, in insertion order
pub type ValueMap = IndexMap<String, f64>;

/// A pure, deterministic calculation from named inputs to named outputs
pub trait CalculationFunction {
    fn evaluate(&self, inputs: &ValueMap) -> std::result::Result<ValueMap, BoxError>;
}

impl<F> CalculationFunction for F
where
    F: Fn(&ValueMap) -> std::result::Result<ValueMap, BoxError>,
{
    fn evaluate(&self, inputs: &ValueMap) -> std::result::Result<ValueMap, BoxError> {
        self(inputs)
    }
}

/// Evaluate `function`, tagging failures with the stage they happened in
pub(crate) fn evaluate_at<F>(function: &F, inputs: &ValueMap, stage: Stage) -> Result<ValueMap>
where
    F: CalculationFunction + ?Sized,
{
    function
        .evaluate(inputs)
        .map_err(|source| UncertaintyError::Evaluation { stage, source })
}

/// Check that a call returned exactly the output names of the baseline call
pub(crate) fn check_outputs(expected: &ValueMap, found: &ValueMap, stage: Stage) -> Result<()> {
    let same = expected.len() == found.len() && expected.keys().all(|k| found.contains_key(k));
    if same {
        Ok(())
    } else {
        Err(UncertaintyError::InconsistentOutputs {
            stage,
            expected: expected.keys().cloned().collect(),
            found: found.keys().cloned().collect(),
        })
    }
}

/// Build a [`ValueMap`] from `(name, value)` pairs
pub fn values<I, S>(pairs: I) -> ValueMap
where
    I: IntoIterator<Item = (S, f64)>,
    S: Into<String>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}
