//! `ulib analyze` - conventional and Monte Carlo propagation side by side

use std::path::PathBuf;

use console::style;
use indexmap::IndexMap;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::helpers::{format_percent, format_value, share_bar, styled_share};
use crate::cli::output::{effective_format, print_csv, print_document, render_table};
use crate::cli::{load_config, GlobalOpts, OutputFormat};
use crate::core::{
    calculate_monte_carlo_statistics, calculate_uncertainty_with,
    compare_monte_carlo_to_conventional_uncertainty_calculation, monte_carlo_in_batches_with,
    monte_carlo_output_correlations, monte_carlo_simulation_with, ComparisonReport,
    ConventionalUncertaintyResult, CorrelationMatrix, MonteCarloStatistics, SensitivityResult,
};
use crate::io::{load_input_spec, save_samples};
use crate::models::reference;

#[derive(clap::Args, Debug)]
pub struct AnalyzeArgs {
    /// Built-in model name (see `ulib models`)
    pub model: String,

    /// Input description (.csv, .yaml or .json)
    #[arg(long, short = 'i')]
    pub inputs: PathBuf,

    /// Number of Monte Carlo trials
    #[arg(long, short = 'n', env = "ULIB_ITERATIONS")]
    pub iterations: Option<usize>,

    /// Seed for a reproducible Monte Carlo run
    #[arg(long, env = "ULIB_SEED")]
    pub seed: Option<u64>,

    /// Coverage factor for the expanded uncertainty
    #[arg(long, short = 'k', env = "ULIB_COVERAGE")]
    pub coverage: Option<f64>,

    /// Split the simulation over this many parallel batches
    #[arg(long, env = "ULIB_BATCHES")]
    pub batches: Option<usize>,

    /// Show sensitivity coefficients
    #[arg(long, short = 's')]
    pub sensitivity: bool,

    /// Show correlations between outputs and sampled inputs
    #[arg(long)]
    pub correlations: bool,

    /// Write every Monte Carlo trial to this CSV file
    #[arg(long)]
    pub samples: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct AnalysisReport {
    model: String,
    iterations: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    conventional: ConventionalUncertaintyResult,
    monte_carlo: MonteCarloStatistics,
    comparison: ComparisonReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    correlations: Option<CorrelationMatrix>,
}

pub fn run(args: AnalyzeArgs, global: &GlobalOpts) -> Result<()> {
    let mut config = load_config(global)?;
    if let Some(n) = args.iterations {
        config.iterations = n;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if let Some(k) = args.coverage {
        config.coverage_factor = k;
    }
    if let Some(b) = args.batches {
        config.batches = b;
    }

    let model = reference::lookup(&args.model).ok_or_else(|| {
        let names: Vec<&str> = reference::models().iter().map(|m| m.name).collect();
        miette::miette!(
            "Unknown model '{}'. Available: {}",
            args.model,
            names.join(", ")
        )
    })?;
    let inputs = load_input_spec(&args.inputs).into_diagnostic()?;
    let function = model.function;

    info!(model = model.name, inputs = inputs.len(), "analyzing");
    let conventional = calculate_uncertainty_with(
        &inputs,
        &function,
        config.coverage_factor,
        &config.differentiation(),
    )
    .into_diagnostic()?;

    let options = config.monte_carlo();
    let samples = if config.batches > 1 {
        monte_carlo_in_batches_with(&inputs, &function, config.iterations, config.batches, &options)
    } else {
        monte_carlo_simulation_with(&inputs, &function, config.iterations, &options)
    }
    .into_diagnostic()?;

    if let Some(path) = &args.samples {
        save_samples(&samples, path).into_diagnostic()?;
        info!(path = %path.display(), "wrote samples");
    }

    let statistics = calculate_monte_carlo_statistics(&samples);
    let comparison =
        compare_monte_carlo_to_conventional_uncertainty_calculation(&statistics, &conventional);
    let correlations = args
        .correlations
        .then(|| monte_carlo_output_correlations(&samples, true));

    let report = AnalysisReport {
        model: model.name.to_string(),
        iterations: samples.len(),
        seed: config.seed,
        conventional,
        monte_carlo: statistics,
        comparison,
        correlations,
    };

    match effective_format(global.format) {
        OutputFormat::Json | OutputFormat::Yaml => print_document(&report, global.format),
        OutputFormat::Csv => print_comparison_csv(&report),
        _ => {
            print_report(&report, args.sensitivity, global.quiet);
            Ok(())
        }
    }
}

fn print_comparison_csv(report: &AnalysisReport) -> Result<()> {
    let rows = report.conventional.outputs.iter().map(|(name, out)| {
        let row = report.comparison.get(name);
        vec![
            name.clone(),
            out.value.to_string(),
            out.u.to_string(),
            out.expanded.to_string(),
            out.expanded_percent.to_string(),
            row.map(|r| r.monte_carlo_u_percent.to_string())
                .unwrap_or_default(),
            row.map(|r| r.difference.to_string()).unwrap_or_default(),
        ]
    });
    print_csv(
        &[
            "output",
            "value",
            "u",
            "U",
            "U_perc",
            "mc_U_perc_k2",
            "difference",
        ],
        rows,
    )
}

fn print_report(report: &AnalysisReport, show_sensitivity: bool, quiet: bool) {
    let conv = &report.conventional;

    if !quiet {
        println!(
            "{} Model {} with {} trials{}",
            style("⚙").cyan(),
            style(&report.model).cyan(),
            report.iterations,
            report
                .seed
                .map(|s| format!(" (seed {})", s))
                .unwrap_or_default()
        );
        println!();
    }

    println!(
        "   {} (k={}):",
        style("Conventional (GUM)").bold(),
        conv.coverage_factor
    );
    let rows = conv.outputs.iter().map(|(name, out)| {
        vec![
            name.clone(),
            format_value(out.value),
            format_value(out.u),
            format_value(out.expanded),
            format_percent(out.expanded_percent),
        ]
    });
    println!("{}", render_table(&["Output", "Value", "u", "U", "U [%]"], rows));

    println!();
    println!("   {} (variance contribution):", style("Uncertainty Budget").bold());
    for (name, out) in &conv.outputs {
        println!("     {}", style(name).yellow());
        for (input, &pct) in &out.contribution {
            println!("       {} {} {}", styled_share(pct), share_bar(pct), input);
        }
    }

    if show_sensitivity {
        println!();
        print_sensitivity(&conv.sensitivity);
    }

    println!();
    println!(
        "   {} ({} iterations):",
        style("Monte Carlo").bold(),
        report.iterations
    );
    let rows = report.monte_carlo.iter().map(|(name, s)| {
        vec![
            name.clone(),
            format_value(s.mean),
            format_value(s.std_dev),
            format_percent(s.std_dev_percent),
            format!(
                "{} to {}",
                format_value(s.percentile_2_5),
                format_value(s.percentile_97_5)
            ),
        ]
    });
    println!(
        "{}",
        render_table(&["Variable", "Mean", "Std Dev", "Std Dev [%]", "95% CI"], rows)
    );

    println!();
    println!("   {}:", style("Comparison (k=2)").bold());
    let rows = report.comparison.iter().map(|(name, row)| {
        vec![
            name.clone(),
            format_percent(row.conventional_u_percent),
            format_percent(row.monte_carlo_u_percent),
            format!("{:+.3}", row.difference),
            format_percent(row.relative_difference),
        ]
    });
    println!(
        "{}",
        render_table(
            &["Output", "Conventional U", "Monte Carlo U", "Diff [pp]", "Rel. Diff"],
            rows
        )
    );

    if let Some(matrix) = &report.correlations {
        println!();
        println!("   {}:", style("Correlations").bold());
        let mut header = vec![""];
        header.extend(matrix.names.iter().map(String::as_str));
        let rows = matrix.names.iter().zip(&matrix.values).map(|(name, row)| {
            std::iter::once(name.clone())
                .chain(row.iter().map(|r| {
                    if r.is_nan() {
                        "n/a".to_string()
                    } else {
                        format!("{:+.3}", r)
                    }
                }))
                .collect::<Vec<_>>()
        });
        println!("{}", render_table(&header, rows));
    }
}

fn print_sensitivity(sensitivity: &SensitivityResult) {
    println!("   {}:", style("Sensitivity Coefficients").bold());
    let mut rows: Vec<Vec<String>> = Vec::new();
    for (output, coefficients) in &sensitivity.absolute {
        let relative: Option<&IndexMap<String, f64>> = sensitivity.relative.get(output);
        for (input, &c) in coefficients {
            let rel = relative
                .and_then(|r| r.get(input))
                .copied()
                .unwrap_or(f64::NAN);
            rows.push(vec![
                output.clone(),
                input.clone(),
                format_value(c),
                format_value(rel),
            ]);
        }
    }
    println!(
        "{}",
        render_table(&["Output", "Input", "∂y/∂x", "Relative"], rows)
    );
}
