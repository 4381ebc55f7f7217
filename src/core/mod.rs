//! Core module - uncertainty propagation engine

pub mod batch;
pub mod comparison;
pub mod config;
pub mod conventional;
pub mod error;
pub mod function;
pub mod input;
pub mod monte_carlo;
pub mod sampler;
pub mod sensitivity;
pub mod statistics;

pub use batch::{monte_carlo_in_batches, monte_carlo_in_batches_with};
pub use comparison::{
    compare_monte_carlo_to_conventional_uncertainty_calculation, ComparisonReport, ComparisonRow,
};
pub use config::{Config, ConfigError};
pub use conventional::{
    calculate_uncertainty, calculate_uncertainty_with, combined_standard_uncertainty,
    ConventionalUncertaintyResult, OutputUncertainty, DEFAULT_COVERAGE_FACTOR,
};
pub use error::{BoxError, SpecError, Stage, UncertaintyError};
pub use function::{values, CalculationFunction, ValueMap};
pub use input::{Distribution, InputSpecSet, ResolvedInput};
pub use monte_carlo::{
    monte_carlo_simulation, monte_carlo_simulation_with, MonteCarloOptions, MonteCarloSampleSet,
};
pub use sensitivity::{
    compute_sensitivities, compute_sensitivities_with, DifferentiationOptions, SensitivityResult,
};
pub use statistics::{
    calculate_monte_carlo_statistics, monte_carlo_output_correlations, CorrelationMatrix,
    MonteCarloStatistics, VariableStatistics,
};
