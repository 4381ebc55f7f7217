//! Monte Carlo propagation
//!
//! Every varied input gets its own column of `n` independent draws; the
//! calculation function is then evaluated once per trial and the used input
//! values are recorded next to the outputs.

use std::ops::Range;

use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info};

use crate::core::error::{Result, SpecError, Stage, UncertaintyError};
use crate::core::function::{check_outputs, evaluate_at, CalculationFunction, ValueMap};
use crate::core::input::{InputSpecSet, ResolvedInput};
use crate::core::sampler::{draw_with, DEFAULT_MAX_RESAMPLE_ATTEMPTS};

/// Suffix marking recorded input columns in flat views
pub const USED_SUFFIX: &str = "_used";

/// Random-number and sampling settings for a simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonteCarloOptions {
    /// Fixed seed for a reproducible run; OS entropy when `None`
    pub seed: Option<u64>,
    /// Resampling budget per draw for truncated inputs
    pub max_resample_attempts: usize,
}

impl Default for MonteCarloOptions {
    fn default() -> Self {
        Self {
            seed: None,
            max_resample_attempts: DEFAULT_MAX_RESAMPLE_ATTEMPTS,
        }
    }
}

impl MonteCarloOptions {
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}

/// Recorded trials of a simulation
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonteCarloSampleSet {
    /// Input values used per trial, keyed by input name
    pub inputs: IndexMap<String, Vec<f64>>,
    /// Outputs per trial, keyed by output name
    pub outputs: IndexMap<String, Vec<f64>>,
}

impl MonteCarloSampleSet {
    /// Number of trials
    pub fn len(&self) -> usize {
        self.inputs
            .values()
            .chain(self.outputs.values())
            .next()
            .map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append the trials of `other`, which must have the same columns
    pub fn append(&mut self, other: MonteCarloSampleSet) -> Result<()> {
        if self.inputs.is_empty() && self.outputs.is_empty() {
            *self = other;
            return Ok(());
        }
        let expected = self.columns().keys().cloned().collect::<Vec<_>>();
        let found = other.columns().keys().cloned().collect::<Vec<_>>();
        if expected != found {
            return Err(UncertaintyError::IncompatibleSamples { expected, found });
        }
        for (name, mut column) in other.inputs {
            self.inputs.entry(name).or_default().append(&mut column);
        }
        for (name, mut column) in other.outputs {
            self.outputs.entry(name).or_default().append(&mut column);
        }
        Ok(())
    }

    /// Look up a column by its flat label (`<input>_used` or output name)
    pub fn column(&self, label: &str) -> Option<&[f64]> {
        if let Some(values) = self.outputs.get(label) {
            return Some(values);
        }
        label
            .strip_suffix(USED_SUFFIX)
            .and_then(|name| self.inputs.get(name))
            .map(Vec::as_slice)
    }

    /// Flat view of every column: inputs first as `<name>_used`, then
    /// outputs. An output sharing a label with an input column replaces it.
    pub fn columns(&self) -> IndexMap<String, &[f64]> {
        let mut columns: IndexMap<String, &[f64]> = self
            .inputs
            .iter()
            .map(|(name, values)| (format!("{name}{USED_SUFFIX}"), values.as_slice()))
            .collect();
        for (name, values) in &self.outputs {
            columns.insert(name.clone(), values.as_slice());
        }
        columns
    }
}

/// Run `n` trials with OS-seeded randomness
pub fn monte_carlo_simulation<F>(
    inputs: &InputSpecSet,
    function: &F,
    n: usize,
) -> Result<MonteCarloSampleSet>
where
    F: CalculationFunction + ?Sized,
{
    monte_carlo_simulation_with(inputs, function, n, &MonteCarloOptions::default())
}

/// Run `n` trials with explicit seed and sampling settings
pub fn monte_carlo_simulation_with<F>(
    inputs: &InputSpecSet,
    function: &F,
    n: usize,
    options: &MonteCarloOptions,
) -> Result<MonteCarloSampleSet>
where
    F: CalculationFunction + ?Sized,
{
    let resolved = inputs.resolve()?;
    if n == 0 {
        return Err(SpecError::NoTrials.into());
    }
    let mut rng = options.rng();
    simulate(&resolved, function, 0..n, options.max_resample_attempts, &mut rng)
}

/// Run the trials numbered `trials`; the numbers only label failures
pub(crate) fn simulate<F, R>(
    inputs: &[ResolvedInput],
    function: &F,
    trials: Range<usize>,
    max_attempts: usize,
    rng: &mut R,
) -> Result<MonteCarloSampleSet>
where
    F: CalculationFunction + ?Sized,
    R: Rng + ?Sized,
{
    let n = trials.len();
    info!(trials = n, inputs = inputs.len(), "running Monte Carlo simulation");

    let mut drawn: IndexMap<String, Vec<f64>> = IndexMap::with_capacity(inputs.len());
    for input in inputs {
        debug!(
            input = %input.name,
            distribution = %input.distribution,
            u = input.standard_uncertainty,
            "sampling"
        );
        drawn.insert(input.name.clone(), draw_with(input, n, max_attempts, rng)?);
    }

    let mut outputs: IndexMap<String, Vec<f64>> = IndexMap::new();
    let mut first: Option<ValueMap> = None;
    let mut point: ValueMap = inputs.iter().map(|i| (i.name.clone(), i.mean)).collect();

    for (row, index) in trials.enumerate() {
        for (name, column) in &drawn {
            point.insert(name.clone(), column[row]);
        }
        let stage = Stage::Trial { index };
        let result = evaluate_at(function, &point, stage.clone())?;

        match &first {
            Some(expected) => check_outputs(expected, &result, stage)?,
            None => {
                outputs = result
                    .keys()
                    .map(|k| (k.clone(), Vec::with_capacity(n)))
                    .collect();
                first = Some(result.clone());
            }
        }
        for (name, value) in result {
            if let Some(column) = outputs.get_mut(&name) {
                column.push(value);
            }
        }
    }

    Ok(MonteCarloSampleSet {
        inputs: drawn,
        outputs,
    })
}
