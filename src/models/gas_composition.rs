//! Uncertainty estimates for gas compositions measured by gas chromatography
//!
//! Each estimator takes a composition in mole percent and returns an
//! [`InputSpecSet`] fragment: the concentration as mean, an estimated
//! standard uncertainty, a normal distribution and bounds `[0, 100]`.

use indexmap::IndexMap;
use tracing::debug;

use crate::core::error::SpecError;
use crate::core::input::{Distribution, InputSpecSet};

/// Composition keyed by component name, in mole percent
pub type Composition = IndexMap<String, f64>;

/// Components every estimator accepts
pub const SUPPORTED_COMPONENTS: [&str; 14] = [
    "N2", "CO2", "C1", "C2", "C3", "iC4", "nC4", "iC5", "nC5", "nC6", "nC7", "nC8", "nC9", "nC10",
];

/// Lumped hexanes-plus, accepted by the Hagenvik regressions only
const HEXANES_PLUS: &str = "C6";

/// Which published method to estimate component uncertainties with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Estimator {
    /// ASTM D1945 reproducibility bands
    Astm,
    /// NORSOK I-106 molar-mass scaling
    Norsok,
    /// Hagenvik et al. (2024) power regressions
    Hagenvik,
}

/// Molar mass [g/mol]
pub fn molar_mass(component: &str) -> Option<f64> {
    let m = match component {
        "N2" => 28.0134,
        "CO2" => 44.0095,
        "C1" => 16.04246,
        "C2" => 30.06904,
        "C3" => 44.09562,
        "iC4" | "nC4" => 58.1222,
        "iC5" | "nC5" => 72.14878,
        "nC6" | "C6" => 86.17536,
        "nC7" => 100.20194,
        "nC8" => 114.22852,
        "nC9" => 128.2551,
        "nC10" => 142.28168,
        _ => return None,
    };
    Some(m)
}

/// Estimate with `estimator`; `lower_limit` only applies to Hagenvik
pub fn estimate(
    estimator: Estimator,
    composition: &Composition,
    lower_limit: Option<f64>,
) -> Result<InputSpecSet, SpecError> {
    match estimator {
        Estimator::Astm => component_uncertainty_from_astm_d1945(composition),
        Estimator::Norsok => component_uncertainty_from_norsok_i106(composition),
        Estimator::Hagenvik => component_uncertainty_from_hagenvik2024(composition, lower_limit),
    }
}

/// ASTM D1945 reproducibility (section 10.1.2), read as an expanded
/// uncertainty at 95 % in mol %.
pub fn component_uncertainty_from_astm_d1945(
    composition: &Composition,
) -> Result<InputSpecSet, SpecError> {
    check_components(composition, &[])?;

    let estimates = composition.iter().map(|(name, &x)| {
        let expanded = if x < 0.1 {
            0.02
        } else if x < 1.0 {
            0.07
        } else if x < 5.0 {
            0.10
        } else if x < 10.0 {
            0.12
        } else {
            0.15
        };
        (name.clone(), x, expanded / 2.0)
    });
    Ok(build(estimates))
}

/// NORSOK I-106: `U_i = f · M_avg / M_i` with `f` set by concentration.
///
/// The composition is normalised to 100 mol % first.
pub fn component_uncertainty_from_norsok_i106(
    composition: &Composition,
) -> Result<InputSpecSet, SpecError> {
    check_components(composition, &[])?;

    let total: f64 = composition.values().sum();
    if composition.is_empty() || total <= 0.0 {
        return Err(SpecError::EmptyComposition);
    }

    let normalised: Vec<(String, f64, f64)> = composition
        .iter()
        .filter_map(|(name, &x)| {
            molar_mass(name).map(|m| (name.clone(), 100.0 * x / total, m))
        })
        .collect();
    let average_molar_mass: f64 = normalised.iter().map(|(_, x, m)| x * m).sum::<f64>() / 100.0;
    debug!(average_molar_mass, "NORSOK I-106");

    let estimates = normalised.into_iter().map(|(name, x, m)| {
        let factor = if x < 20.0 {
            0.15
        } else if x < 50.0 {
            0.3
        } else {
            0.6
        };
        let expanded = factor * average_molar_mass / m;
        (name, x, expanded / 2.0)
    });
    Ok(build(estimates))
}

/// Power regression `u = a · x^b` from the K-lab parallel sampling test
/// (Hagenvik et al., 2024). Meant for methane-rich gas (> 60 mol % C1).
///
/// Methane is given zero uncertainty since after normalisation it absorbs
/// the error of every other component. C6 and heavier share the C6+
/// regression. `lower_limit` floors every estimate.
pub fn component_uncertainty_from_hagenvik2024(
    composition: &Composition,
    lower_limit: Option<f64>,
) -> Result<InputSpecSet, SpecError> {
    check_components(composition, &[HEXANES_PLUS])?;

    let estimates = composition.iter().map(|(name, &x)| {
        let mut u = if x == 0.0 || name == "C1" {
            0.0
        } else {
            power_model(name).map_or(0.0, |(a, b)| a * x.powf(b))
        };
        if let Some(limit) = lower_limit {
            u = u.max(limit);
        }
        (name.clone(), x, u)
    });
    Ok(build(estimates))
}

fn power_model(component: &str) -> Option<(f64, f64)> {
    let coefficients = match component {
        "N2" => (0.034440251394188715, 1.0046922246848706),
        "CO2" => (0.013364503829208868, 0.5141391394943381),
        "C2" => (0.04091428801120496, -0.1182080701200473),
        "C3" => (0.024688223069947505, 0.9704611942408041),
        "iC4" => (0.017659329050531938, 0.6349129977823975),
        "nC4" => (0.02655802473313954, 0.7930216437166208),
        "iC5" => (0.01637327039238961, 0.3827312747755224),
        "nC5" => (0.02294449038272855, 0.46972041893882455),
        "C6" | "nC6" | "nC7" | "nC8" | "nC9" | "nC10" => (0.10298556404738195, 0.6828380441670838),
        _ => return None,
    };
    Some(coefficients)
}

/// Reject any key outside the supported set, listing all of them
fn check_components(composition: &Composition, extra: &[&str]) -> Result<(), SpecError> {
    let unsupported: Vec<String> = composition
        .keys()
        .filter(|k| !SUPPORTED_COMPONENTS.contains(&k.as_str()) && !extra.contains(&k.as_str()))
        .cloned()
        .collect();
    if unsupported.is_empty() {
        Ok(())
    } else {
        Err(SpecError::UnsupportedComponents {
            components: unsupported,
        })
    }
}

fn build(estimates: impl Iterator<Item = (String, f64, f64)>) -> InputSpecSet {
    let mut set = InputSpecSet::new();
    for (name, x, u) in estimates {
        set.add(name, x)
            .standard_uncertainty(u)
            .distribution(Distribution::Normal)
            .bounds(0.0, 100.0);
    }
    set
}
