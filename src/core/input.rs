//! Uncertainty input model
//!
//! An [`InputSpecSet`] describes every input of a calculation function in
//! columnar form: one map per field, keyed by input name. This is the shape
//! produced by CSV tables and by the gas-composition estimators.
//!
//! Before the engine touches a calculation function, the set is resolved
//! into one [`ResolvedInput`] per input. Resolution applies the business
//! rules:
//!
//! - missing and NaN entries count as absent
//! - if both an absolute and a percentage uncertainty are given, the larger
//!   one (after converting the percentage via the mean) wins
//! - the distribution defaults to normal once an uncertainty resolves
//! - `none` marks a constant input that is never varied

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use crate::core::error::SpecError;
use crate::core::function::ValueMap;

/// Probability distribution of an input
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Distribution {
    /// Normal (Gaussian), optionally truncated to [min, max]
    #[default]
    Normal,
    /// Uniform between min and max
    Uniform,
    /// Triangular between min and max, with the mode at the mean
    Triangular,
    /// Constant setting, held at the mean
    #[serde(rename = "none")]
    Constant,
}

impl Distribution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Distribution::Normal => "normal",
            Distribution::Uniform => "uniform",
            Distribution::Triangular => "triangular",
            Distribution::Constant => "none",
        }
    }

    /// Whether sampling needs both bounds
    pub fn requires_bounds(&self) -> bool {
        matches!(self, Distribution::Uniform | Distribution::Triangular)
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Distribution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "normal" | "gaussian" => Ok(Distribution::Normal),
            "uniform" | "rectangular" => Ok(Distribution::Uniform),
            "triangular" => Ok(Distribution::Triangular),
            "none" | "constant" => Ok(Distribution::Constant),
            other => Err(other.to_string()),
        }
    }
}

/// Columnar description of all inputs to a calculation function
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputSpecSet {
    /// Nominal value (required for every input)
    #[serde(default, deserialize_with = "skip_nulls")]
    pub mean: IndexMap<String, f64>,

    /// Absolute standard uncertainty (k=1)
    #[serde(default, deserialize_with = "skip_nulls", skip_serializing_if = "IndexMap::is_empty")]
    pub standard_uncertainty: IndexMap<String, f64>,

    /// Standard uncertainty (k=1) as a percentage of the mean
    #[serde(default, deserialize_with = "skip_nulls", skip_serializing_if = "IndexMap::is_empty")]
    pub standard_uncertainty_percent: IndexMap<String, f64>,

    /// Distribution name; kept as text so unknown names can be reported per input
    #[serde(default, deserialize_with = "skip_nulls", skip_serializing_if = "IndexMap::is_empty")]
    pub distribution: IndexMap<String, String>,

    /// Lower truncation bound
    #[serde(default, deserialize_with = "skip_nulls", skip_serializing_if = "IndexMap::is_empty")]
    pub min: IndexMap<String, f64>,

    /// Upper truncation bound
    #[serde(default, deserialize_with = "skip_nulls", skip_serializing_if = "IndexMap::is_empty")]
    pub max: IndexMap<String, f64>,
}

/// Read a keyed column where `null` marks an absent entry. A column that is
/// itself `null` reads as empty.
pub(crate) fn skip_nulls<'de, D, T>(deserializer: D) -> Result<IndexMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let column = Option::<IndexMap<String, Option<T>>>::deserialize(deserializer)?;
    Ok(column
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name, v)))
        .collect())
}

/// Builder handle for one input of an [`InputSpecSet`]
pub struct InputEntry<'a> {
    set: &'a mut InputSpecSet,
    name: String,
}

impl InputEntry<'_> {
    pub fn standard_uncertainty(self, value: f64) -> Self {
        self.set
            .standard_uncertainty
            .insert(self.name.clone(), value);
        self
    }

    pub fn standard_uncertainty_percent(self, value: f64) -> Self {
        self.set
            .standard_uncertainty_percent
            .insert(self.name.clone(), value);
        self
    }

    pub fn distribution(self, distribution: Distribution) -> Self {
        self.set
            .distribution
            .insert(self.name.clone(), distribution.as_str().to_string());
        self
    }

    pub fn min(self, value: f64) -> Self {
        self.set.min.insert(self.name.clone(), value);
        self
    }

    pub fn max(self, value: f64) -> Self {
        self.set.max.insert(self.name.clone(), value);
        self
    }

    pub fn bounds(self, min: f64, max: f64) -> Self {
        self.min(min).max(max)
    }
}

impl InputSpecSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) an input with its mean and return a builder for the rest
    pub fn add(&mut self, name: impl Into<String>, mean: f64) -> InputEntry<'_> {
        let name = name.into();
        self.mean.insert(name.clone(), mean);
        InputEntry { set: self, name }
    }

    /// Every input name mentioned in any column, means first
    pub fn names(&self) -> Vec<String> {
        let mut names: IndexMap<&str, ()> = IndexMap::new();
        let columns = [
            self.mean.keys().collect::<Vec<_>>(),
            self.standard_uncertainty.keys().collect(),
            self.standard_uncertainty_percent.keys().collect(),
            self.distribution.keys().collect(),
            self.min.keys().collect(),
            self.max.keys().collect(),
        ];
        for key in columns.into_iter().flatten() {
            names.insert(key.as_str(), ());
        }
        names.keys().map(|k| k.to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.names().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Merge another set into this one; entries in `other` win
    pub fn extend(&mut self, other: InputSpecSet) {
        self.mean.extend(other.mean);
        self.standard_uncertainty.extend(other.standard_uncertainty);
        self.standard_uncertainty_percent
            .extend(other.standard_uncertainty_percent);
        self.distribution.extend(other.distribution);
        self.min.extend(other.min);
        self.max.extend(other.max);
    }

    /// Resolve every input, failing on the first unusable one
    pub fn resolve(&self) -> Result<Vec<ResolvedInput>, SpecError> {
        self.names()
            .into_iter()
            .map(|name| self.resolve_one(&name))
            .collect()
    }

    fn resolve_one(&self, name: &str) -> Result<ResolvedInput, SpecError> {
        let mean = present(self.mean.get(name).copied()).ok_or_else(|| SpecError::MissingMean {
            input: name.to_string(),
        })?;

        let declared = self
            .distribution
            .get(name)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("nan"));
        let declared = declared
            .map(|s| {
                s.parse::<Distribution>()
                    .map_err(|value| SpecError::UnknownDistribution {
                        input: name.to_string(),
                        value,
                    })
            })
            .transpose()?;

        let min = present(self.min.get(name).copied());
        let max = present(self.max.get(name).copied());
        let absolute = present(self.standard_uncertainty.get(name).copied());
        let percent = present(self.standard_uncertainty_percent.get(name).copied());

        for value in [absolute, percent].into_iter().flatten() {
            if value < 0.0 || !value.is_finite() {
                return Err(SpecError::InvalidUncertainty {
                    input: name.to_string(),
                    value,
                });
            }
        }

        if declared == Some(Distribution::Constant) {
            return Ok(ResolvedInput {
                name: name.to_string(),
                mean,
                standard_uncertainty: 0.0,
                distribution: Distribution::Constant,
                min,
                max,
            });
        }

        let distribution = declared.unwrap_or_default();
        check_bounds(name, distribution, mean, min, max)?;

        let standard_uncertainty = effective_standard_uncertainty(mean, absolute, percent)
            .or_else(|| match (distribution, min, max) {
                (Distribution::Uniform, Some(a), Some(b)) => {
                    Some(uniform_standard_uncertainty(a, b))
                }
                (Distribution::Triangular, Some(a), Some(b)) => {
                    Some(triangular_standard_uncertainty(a, b, mean))
                }
                _ => None,
            })
            .ok_or_else(|| SpecError::MissingUncertainty {
                input: name.to_string(),
            })?;

        Ok(ResolvedInput {
            name: name.to_string(),
            mean,
            standard_uncertainty,
            distribution,
            min,
            max,
        })
    }
}

/// A single input after validation and uncertainty resolution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedInput {
    pub name: String,
    pub mean: f64,
    /// Effective standard uncertainty (k=1); zero for constants
    pub standard_uncertainty: f64,
    pub distribution: Distribution,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl ResolvedInput {
    /// Whether the input takes part in differentiation and sampling
    pub fn is_varied(&self) -> bool {
        self.distribution != Distribution::Constant
    }

    /// Whether a value respects the stated bounds
    pub fn within_bounds(&self, value: f64) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }
}

/// All inputs held at their means
pub fn mean_values(inputs: &[ResolvedInput]) -> ValueMap {
    inputs.iter().map(|i| (i.name.clone(), i.mean)).collect()
}

/// Treat NaN as absent
fn present(value: Option<f64>) -> Option<f64> {
    value.filter(|v| !v.is_nan())
}

/// Effective standard uncertainty from an absolute and a percentage value
///
/// NaN entries count as absent. When both are present the larger wins, the
/// percentage being converted with `|mean|`.
pub fn effective_standard_uncertainty(
    mean: f64,
    absolute: Option<f64>,
    percent: Option<f64>,
) -> Option<f64> {
    let absolute = present(absolute);
    let from_percent = present(percent).map(|p| mean.abs() * p / 100.0);
    match (absolute, from_percent) {
        (Some(a), Some(p)) => Some(a.max(p)),
        (a, p) => a.or(p),
    }
}

/// Standard deviation of a uniform distribution on [min, max]
pub fn uniform_standard_uncertainty(min: f64, max: f64) -> f64 {
    (max - min) / 12f64.sqrt()
}

/// Standard deviation of a triangular distribution on [min, max] with the given mode
pub fn triangular_standard_uncertainty(min: f64, max: f64, mode: f64) -> f64 {
    let (a, b, c) = (min, max, mode);
    ((a * a + b * b + c * c - a * b - a * c - b * c) / 18.0).sqrt()
}

fn check_bounds(
    name: &str,
    distribution: Distribution,
    mean: f64,
    min: Option<f64>,
    max: Option<f64>,
) -> Result<(), SpecError> {
    if distribution.requires_bounds() && (min.is_none() || max.is_none()) {
        return Err(SpecError::MissingBounds {
            input: name.to_string(),
            distribution: distribution.to_string(),
        });
    }

    if let (Some(min), Some(max)) = (min, max) {
        let unbounded_window =
            distribution.requires_bounds() && !(min.is_finite() && max.is_finite());
        if min >= max || unbounded_window {
            return Err(SpecError::InvalidBounds {
                input: name.to_string(),
                min,
                max,
            });
        }
    }

    let below = min.is_some_and(|min| mean < min);
    let above = max.is_some_and(|max| mean > max);
    if below || above {
        return Err(SpecError::MeanOutOfBounds {
            input: name.to_string(),
            mean,
            min: min.unwrap_or(f64::NEG_INFINITY),
            max: max.unwrap_or(f64::INFINITY),
        });
    }

    Ok(())
}
