//! CLI module - argument parsing and command dispatch

pub mod args;
pub mod commands;
pub mod helpers;
pub mod output;

pub use args::{Cli, Commands, GlobalOpts, OutputFormat};

use miette::{IntoDiagnostic, Result};
use tracing_subscriber::EnvFilter;

use crate::core::Config;

/// Defaults, user config, then `--config` if given
pub fn load_config(global: &GlobalOpts) -> Result<Config> {
    Config::load_with(global.config.as_deref()).into_diagnostic()
}

/// Log to stderr so stdout stays machine-readable. `RUST_LOG` wins over
/// the verbosity flags.
pub fn init_logging(global: &GlobalOpts) {
    let level = if global.quiet {
        "error"
    } else {
        match global.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("uncertaintylib={level},ulib={level}")));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Run the parsed command line
pub fn dispatch(cli: Cli) -> Result<()> {
    let global = cli.global;
    match cli.command {
        Commands::Analyze(args) => commands::analyze::run(args, &global),
        Commands::Budget(args) => commands::budget::run(args, &global),
        Commands::Gas(args) => commands::gas::run(args, &global),
        Commands::Models => commands::models::run(&global),
        Commands::Completions(args) => commands::completions::run(args),
    }
}
