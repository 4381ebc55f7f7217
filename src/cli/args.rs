//! Command-line arguments

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::cli::commands::{
    analyze::AnalyzeArgs, budget::BudgetArgs, completions::CompletionsArgs, gas::GasArgs,
};

#[derive(Parser, Debug)]
#[command(
    name = "ulib",
    version,
    about = "Measurement uncertainty propagation (GUM and Monte Carlo)",
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command
#[derive(Args, Debug, Clone)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, value_enum, default_value_t = OutputFormat::Auto)]
    pub format: OutputFormat,

    /// Extra config file layered over the user config
    #[arg(long, global = true, env = "ULIB_CONFIG")]
    pub config: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only print errors
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Propagate input uncertainties through a built-in model
    Analyze(AnalyzeArgs),

    /// Combine an uncertainty budget into one standard uncertainty
    Budget(BudgetArgs),

    /// Estimate gas-composition uncertainties
    Gas(GasArgs),

    /// List built-in models
    Models,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Table on a terminal
    Auto,
    Table,
    Json,
    Yaml,
    Csv,
}
