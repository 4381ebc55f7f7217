//! CSV tables
//!
//! Empty cells and `nan` (any case) mean "not given".

use std::io::{Read, Write};

use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use indexmap::IndexMap;

use crate::core::input::InputSpecSet;
use crate::core::monte_carlo::MonteCarloSampleSet;
use crate::io::{Budget, IoError};
use crate::models::gas_composition::Composition;

const INPUT_COLUMNS: [&str; 7] = [
    "input_name",
    "mean",
    "standard_uncertainty",
    "standard_uncertainty_percent",
    "distribution",
    "min",
    "max",
];

/// Header lookup for one table
struct Columns {
    index: IndexMap<String, usize>,
}

impl Columns {
    fn new(headers: &StringRecord) -> Self {
        let index = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_ascii_lowercase(), i))
            .collect();
        Self { index }
    }

    /// Position of the first present alias
    fn find(&self, aliases: &[&str]) -> Option<usize> {
        aliases.iter().find_map(|a| self.index.get(*a).copied())
    }

    fn require(&self, aliases: &[&str]) -> Result<usize, IoError> {
        self.find(aliases)
            .ok_or_else(|| IoError::MissingColumn(aliases[0].to_string()))
    }
}

fn cell<'r>(record: &'r StringRecord, column: Option<usize>) -> Option<&'r str> {
    let value = record.get(column?)?.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("nan") {
        None
    } else {
        Some(value)
    }
}

fn number(
    record: &StringRecord,
    column: Option<usize>,
    name: &str,
    row: usize,
) -> Result<Option<f64>, IoError> {
    match cell(record, column) {
        None => Ok(None),
        Some(text) => text.parse().map(Some).map_err(|_| IoError::InvalidNumber {
            row,
            column: name.to_string(),
            value: text.to_string(),
        }),
    }
}

fn reader<R: Read>(input: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .comment(Some(b'#'))
        .from_reader(input)
}

/// Read a row-per-input table with columns `input_name, mean,
/// standard_uncertainty, standard_uncertainty_percent, distribution, min,
/// max`. Only `input_name` (or `name`) is required.
pub fn read_input_spec_csv<R: Read>(input: R) -> Result<InputSpecSet, IoError> {
    let mut rdr = reader(input);
    let columns = Columns::new(rdr.headers()?);
    let name_col = columns.require(&["input_name", "name", "input"])?;
    let mean_col = columns.find(&["mean"]);
    let u_col = columns.find(&["standard_uncertainty", "u"]);
    let pct_col = columns.find(&["standard_uncertainty_percent", "u_percent"]);
    let dist_col = columns.find(&["distribution"]);
    let min_col = columns.find(&["min"]);
    let max_col = columns.find(&["max"]);

    let mut set = InputSpecSet::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let row = i + 1;
        let Some(name) = cell(&record, Some(name_col)) else {
            continue;
        };
        let name = name.to_string();

        if let Some(v) = number(&record, mean_col, "mean", row)? {
            set.mean.insert(name.clone(), v);
        }
        if let Some(v) = number(&record, u_col, "standard_uncertainty", row)? {
            set.standard_uncertainty.insert(name.clone(), v);
        }
        if let Some(v) = number(&record, pct_col, "standard_uncertainty_percent", row)? {
            set.standard_uncertainty_percent.insert(name.clone(), v);
        }
        if let Some(d) = cell(&record, dist_col) {
            set.distribution.insert(name.clone(), d.to_string());
        }
        if let Some(v) = number(&record, min_col, "min", row)? {
            set.min.insert(name.clone(), v);
        }
        if let Some(v) = number(&record, max_col, "max", row)? {
            set.max.insert(name, v);
        }
    }
    Ok(set)
}

/// Write an input description as a row-per-input table
pub fn write_input_spec_csv<W: Write>(set: &InputSpecSet, output: W) -> Result<(), IoError> {
    let mut wtr = WriterBuilder::new().from_writer(output);
    wtr.write_record(INPUT_COLUMNS)?;

    let fmt = |v: Option<&f64>| v.map(f64::to_string).unwrap_or_default();
    for name in set.names() {
        wtr.write_record([
            name.clone(),
            fmt(set.mean.get(&name)),
            fmt(set.standard_uncertainty.get(&name)),
            fmt(set.standard_uncertainty_percent.get(&name)),
            set.distribution.get(&name).cloned().unwrap_or_default(),
            fmt(set.min.get(&name)),
            fmt(set.max.get(&name)),
        ])?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Read a budget table `name, u[, ci]`. Without a `ci` column every
/// coefficient defaults to 1; with one, empty cells are left out so the
/// combiner can report them.
pub fn read_budget_csv<R: Read>(input: R) -> Result<Budget, IoError> {
    let mut rdr = reader(input);
    let columns = Columns::new(rdr.headers()?);
    let name_col = columns.require(&["name", "source", "input_name"])?;
    let u_col = columns.require(&["u", "standard_uncertainty"])?;
    let ci_col = columns.find(&["ci", "sensitivity"]);

    let mut budget = Budget {
        ci: ci_col.map(|_| IndexMap::new()),
        ..Budget::default()
    };
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let row = i + 1;
        let Some(name) = cell(&record, Some(name_col)) else {
            continue;
        };
        let u = number(&record, Some(u_col), "u", row)?.unwrap_or(f64::NAN);
        budget.u.insert(name.to_string(), u);

        if let (Some(ci), Some(c)) = (budget.ci.as_mut(), number(&record, ci_col, "ci", row)?) {
            ci.insert(name.to_string(), c);
        }
    }
    Ok(budget)
}

/// Read a composition table `component, mole_percent`
pub fn read_composition_csv<R: Read>(input: R) -> Result<Composition, IoError> {
    let mut rdr = reader(input);
    let columns = Columns::new(rdr.headers()?);
    let name_col = columns.require(&["component", "name"])?;
    let value_col = columns.require(&["mole_percent", "moleperc", "mol%", "value"])?;

    let mut composition = Composition::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let Some(name) = cell(&record, Some(name_col)) else {
            continue;
        };
        let x = number(&record, Some(value_col), "mole_percent", i + 1)?.unwrap_or(0.0);
        composition.insert(name.to_string(), x);
    }
    Ok(composition)
}

/// Write Monte Carlo trials, one row per trial, `<input>_used` columns first
pub fn write_samples_csv<W: Write>(
    samples: &MonteCarloSampleSet,
    output: W,
) -> Result<(), IoError> {
    let mut wtr = WriterBuilder::new().from_writer(output);
    let columns = samples.columns();
    let trials = samples.len();
    if let Some((name, column)) = columns.iter().find(|(_, col)| col.len() != trials) {
        return Err(IoError::RaggedSamples {
            column: name.clone(),
            expected: trials,
            found: column.len(),
        });
    }
    wtr.write_record(columns.keys())?;

    for trial in 0..samples.len() {
        wtr.write_record(columns.values().map(|col| col[trial].to_string()))?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}
