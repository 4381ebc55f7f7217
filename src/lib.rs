//! uncertaintylib: measurement uncertainty propagation
//!
//! Propagates input uncertainties through arbitrary calculation functions
//! with the GUM law of propagation (finite-difference sensitivities) and
//! with Monte Carlo simulation, and compares the two.
//!
//! ```no_run
//! use uncertaintylib::core::{calculate_uncertainty, values, BoxError, InputSpecSet, ValueMap};
//!
//! let mut inputs = InputSpecSet::new();
//! inputs.add("L", 2.0).standard_uncertainty(0.3);
//! inputs.add("W", 2.0).standard_uncertainty_percent(5.0);
//!
//! let area = |x: &ValueMap| -> Result<ValueMap, BoxError> {
//!     Ok(values([("area", x["L"] * x["W"])]))
//! };
//! let result = calculate_uncertainty(&inputs, &area, 2.0)?;
//! println!("U = {}", result.outputs["area"].expanded);
//! # Ok::<(), uncertaintylib::core::UncertaintyError>(())
//! ```

pub mod cli;
pub mod core;
pub mod io;
pub mod models;
