//! `ulib gas` - composition uncertainty estimates

use std::path::PathBuf;

use clap::ValueEnum;
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{format_percent, format_sig};
use crate::cli::output::{effective_format, print_document, render_table};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::io::{load_composition, save_input_spec, write_input_spec_csv};
use crate::models::gas_composition::{estimate, Estimator};

/// Estimation method
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GasMethod {
    /// ASTM D1945 reproducibility
    Astm,
    /// NORSOK I-106
    Norsok,
    /// Hagenvik et al. (2024) regressions
    Hagenvik,
}

impl From<GasMethod> for Estimator {
    fn from(method: GasMethod) -> Self {
        match method {
            GasMethod::Astm => Estimator::Astm,
            GasMethod::Norsok => Estimator::Norsok,
            GasMethod::Hagenvik => Estimator::Hagenvik,
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct GasArgs {
    /// Estimation method
    #[arg(value_enum)]
    pub method: GasMethod,

    /// Composition in mole percent (CSV `component, mole_percent`, or YAML/JSON map)
    pub file: PathBuf,

    /// Floor for every estimated standard uncertainty (Hagenvik only)
    #[arg(long)]
    pub lower_limit: Option<f64>,

    /// Save the estimates as an input description (.csv, .yaml or .json)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

pub fn run(args: GasArgs, global: &GlobalOpts) -> Result<()> {
    if args.lower_limit.is_some() && args.method != GasMethod::Hagenvik {
        tracing::warn!("--lower-limit only applies to the hagenvik method");
    }

    let composition = load_composition(&args.file).into_diagnostic()?;
    let set = estimate(args.method.into(), &composition, args.lower_limit).into_diagnostic()?;

    if let Some(path) = &args.output {
        save_input_spec(&set, path).into_diagnostic()?;
        if !global.quiet {
            eprintln!(
                "{} Saved estimates to {}",
                style("✓").green(),
                style(path.display()).cyan()
            );
        }
    }

    match effective_format(global.format) {
        OutputFormat::Json | OutputFormat::Yaml => print_document(&set, global.format),
        OutputFormat::Csv => write_input_spec_csv(&set, std::io::stdout()).into_diagnostic(),
        _ => {
            let rows = set.mean.iter().map(|(name, &x)| {
                let u = set.standard_uncertainty.get(name).copied().unwrap_or(0.0);
                let relative = if x == 0.0 { f64::NAN } else { 200.0 * u / x };
                vec![
                    name.clone(),
                    format_sig(x, 4),
                    format_sig(u, 3),
                    format_sig(2.0 * u, 3),
                    format_percent(relative),
                ]
            });
            println!(
                "{}",
                render_table(&["Component", "mol%", "u", "U (k=2)", "U% (k=2)"], rows)
            );
            Ok(())
        }
    }
}
