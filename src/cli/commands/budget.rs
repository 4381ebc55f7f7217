//! `ulib budget` - combine a simple uncertainty budget

use std::path::PathBuf;

use console::style;
use indexmap::IndexMap;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::helpers::{format_value, share_bar};
use crate::cli::output::{effective_format, print_csv, print_document, render_table};
use crate::cli::{load_config, GlobalOpts, OutputFormat};
use crate::core::{combined_standard_uncertainty, SpecError};
use crate::io::load_budget;

#[derive(clap::Args, Debug)]
pub struct BudgetArgs {
    /// Budget file: CSV with `name, u[, ci]`, or YAML/JSON with `u` and `ci` maps
    pub file: PathBuf,

    /// Coverage factor for the expanded uncertainty
    #[arg(long, short = 'k', env = "ULIB_COVERAGE")]
    pub coverage: Option<f64>,
}

#[derive(Debug, Serialize)]
struct BudgetReport {
    u: f64,
    coverage_factor: f64,
    #[serde(rename = "U")]
    expanded: f64,
    /// Share of the combined variance per entry [%]
    contribution: IndexMap<String, f64>,
}

pub fn run(args: BudgetArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global)?;
    let k = args.coverage.unwrap_or(config.coverage_factor);
    if !k.is_finite() || k <= 0.0 {
        return Err(SpecError::InvalidCoverageFactor(k)).into_diagnostic();
    }

    let budget = load_budget(&args.file).into_diagnostic()?;
    let u = combined_standard_uncertainty(&budget.u, budget.ci.as_ref()).into_diagnostic()?;

    let variance = u * u;
    let contribution = budget
        .u
        .iter()
        .map(|(name, &ui)| {
            let c = budget
                .ci
                .as_ref()
                .and_then(|ci| ci.get(name))
                .copied()
                .unwrap_or(1.0);
            let share = if variance > 0.0 {
                100.0 * (c * ui).powi(2) / variance
            } else {
                0.0
            };
            (name.clone(), share)
        })
        .collect();

    let report = BudgetReport {
        u,
        coverage_factor: k,
        expanded: k * u,
        contribution,
    };

    match effective_format(global.format) {
        OutputFormat::Json | OutputFormat::Yaml => print_document(&report, global.format),
        OutputFormat::Csv => print_csv(
            &["name", "contribution_percent"],
            report
                .contribution
                .iter()
                .map(|(name, pct)| vec![name.clone(), pct.to_string()]),
        ),
        _ => {
            println!(
                "   {} u = {}, U = {} (k={})",
                style("Combined:").bold(),
                style(format_value(report.u)).green(),
                style(format_value(report.expanded)).green(),
                k
            );
            println!();
            let rows = report.contribution.iter().map(|(name, &pct)| {
                vec![
                    name.clone(),
                    format!("{:.1}%", pct),
                    share_bar(pct),
                ]
            });
            println!("{}", render_table(&["Entry", "Share", ""], rows));
            Ok(())
        }
    }
}
