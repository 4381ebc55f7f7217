//! Domain models built on the core engine

pub mod gas_composition;
pub mod reference;

pub use gas_composition::{estimate, Composition, Estimator};
pub use reference::{lookup, models, Model, ModelFn};
