//! Command implementations

pub mod analyze;
pub mod budget;
pub mod completions;
pub mod gas;
pub mod models;
