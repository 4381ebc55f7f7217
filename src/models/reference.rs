//! Built-in calculation functions
//!
//! Small, well-known models used by the command line and as reference cases
//! for the engine.

use std::f64::consts::PI;

use crate::core::error::BoxError;
use crate::core::function::{values, ValueMap};

/// Signature shared by every built-in model
pub type ModelFn = fn(&ValueMap) -> Result<ValueMap, BoxError>;

/// Registry entry for a built-in model
#[derive(Debug, Clone, Copy)]
pub struct Model {
    pub name: &'static str,
    pub description: &'static str,
    pub inputs: &'static [&'static str],
    pub outputs: &'static [&'static str],
    pub function: ModelFn,
}

const MODELS: &[Model] = &[
    Model {
        name: "volume",
        description: "Box volume and base area",
        inputs: &["L", "W", "D"],
        outputs: &["volume", "area"],
        function: volume,
    },
    Model {
        name: "orifice",
        description: "ISO 5167 orifice mass flow (dP in mbar, rho in kg/m3, MassFlow in kg/h)",
        inputs: &["C", "D", "d", "epsilon", "dP", "rho"],
        outputs: &["MassFlow", "VolFlow", "beta"],
        function: orifice,
    },
];

/// Every built-in model, in display order
pub fn models() -> &'static [Model] {
    MODELS
}

/// Look up a built-in model by name (case-insensitive)
pub fn lookup(name: &str) -> Option<&'static Model> {
    MODELS.iter().find(|m| m.name.eq_ignore_ascii_case(name))
}

fn input(x: &ValueMap, name: &str) -> Result<f64, BoxError> {
    x.get(name)
        .copied()
        .ok_or_else(|| format!("missing input '{name}'").into())
}

/// `volume = L·W·D`, `area = L·W`
pub fn volume(x: &ValueMap) -> Result<ValueMap, BoxError> {
    let l = input(x, "L")?;
    let w = input(x, "W")?;
    let d = input(x, "D")?;
    Ok(values([("volume", l * w * d), ("area", l * w)]))
}

/// Orifice plate flow:
///
/// ```text
/// qm = C / sqrt(1 - β⁴) · ε · π/4 · d² · sqrt(2 · ΔP · ρ),   β = d / D
/// ```
///
/// `dP` is in mbar, `D` and `d` in metres. Outputs mass flow in kg/h,
/// volume flow at line conditions in m3/h, and β.
pub fn orifice(x: &ValueMap) -> Result<ValueMap, BoxError> {
    let c = input(x, "C")?;
    let pipe = input(x, "D")?;
    let bore = input(x, "d")?;
    let epsilon = input(x, "epsilon")?;
    let dp_mbar = input(x, "dP")?;
    let rho = input(x, "rho")?;

    if pipe <= 0.0 || bore <= 0.0 {
        return Err(format!("diameters must be positive (D={pipe}, d={bore})").into());
    }
    let beta = bore / pipe;
    if beta >= 1.0 {
        return Err(format!("beta ratio {beta} must be below 1").into());
    }
    if dp_mbar < 0.0 {
        return Err(format!("negative differential pressure {dp_mbar} mbar").into());
    }
    if rho <= 0.0 {
        return Err(format!("density must be positive, got {rho}").into());
    }

    let dp = dp_mbar * 100.0;
    let velocity_of_approach = 1.0 / (1.0 - beta.powi(4)).sqrt();
    let mass_flow_si =
        c * velocity_of_approach * epsilon * PI / 4.0 * bore.powi(2) * (2.0 * dp * rho).sqrt();
    let mass_flow = mass_flow_si * 3600.0;

    Ok(values([
        ("MassFlow", mass_flow),
        ("VolFlow", mass_flow / rho),
        ("beta", beta),
    ]))
}
