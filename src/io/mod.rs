//! Loading and saving inputs and results
//!
//! Input descriptions, uncertainty budgets and gas compositions can be read
//! from CSV tables or from YAML/JSON documents; the format is picked from
//! the file extension.

pub mod tables;

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::core::input::InputSpecSet;
use crate::core::monte_carlo::MonteCarloSampleSet;
use crate::models::gas_composition::Composition;

pub use tables::{
    read_budget_csv, read_composition_csv, read_input_spec_csv, write_input_spec_csv,
    write_samples_csv,
};

#[derive(Debug, Error)]
pub enum IoError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid YAML in {path}: {message}")]
    Yaml { path: PathBuf, message: String },

    #[error("Invalid JSON in {path}: {message}")]
    Json { path: PathBuf, message: String },

    #[error("Table is missing required column '{0}'")]
    MissingColumn(String),

    #[error("Row {row}, column '{column}': '{value}' is not a number")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Sample column '{column}' has {found} values, expected {expected}")]
    RaggedSamples {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("Unsupported file type for {0} (expected .csv, .yaml, .yml or .json)")]
    UnsupportedFormat(PathBuf),
}

/// File formats understood by the loaders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Yaml,
    Json,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Result<Self, IoError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("csv") => Ok(FileFormat::Csv),
            Some("yaml") | Some("yml") => Ok(FileFormat::Yaml),
            Some("json") => Ok(FileFormat::Json),
            _ => Err(IoError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// Simple uncertainty budget: standard uncertainties and optional
/// sensitivity coefficients, keyed by contribution name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    /// A `null` entry reads as NaN so the combiner can name it
    #[serde(deserialize_with = "nulls_as_nan")]
    pub u: IndexMap<String, f64>,
    /// `null` entries are left out and reported as missing coefficients
    #[serde(default, deserialize_with = "coefficients", skip_serializing_if = "Option::is_none")]
    pub ci: Option<IndexMap<String, f64>>,
}

fn nulls_as_nan<'de, D>(deserializer: D) -> Result<IndexMap<String, f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let column = IndexMap::<String, Option<f64>>::deserialize(deserializer)?;
    Ok(column
        .into_iter()
        .map(|(name, value)| (name, value.unwrap_or(f64::NAN)))
        .collect())
}

fn coefficients<'de, D>(deserializer: D) -> Result<Option<IndexMap<String, f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    let column = Option::<IndexMap<String, Option<f64>>>::deserialize(deserializer)?;
    Ok(column.map(|ci| {
        ci.into_iter()
            .filter_map(|(name, value)| value.map(|c| (name, c)))
            .collect()
    }))
}

/// Load an input description from CSV, YAML or JSON
pub fn load_input_spec(path: &Path) -> Result<InputSpecSet, IoError> {
    match FileFormat::from_path(path)? {
        FileFormat::Csv => read_input_spec_csv(open(path)?),
        format => parse_document(path, format),
    }
}

/// Load an uncertainty budget from CSV (`name, u, ci`), YAML or JSON
pub fn load_budget(path: &Path) -> Result<Budget, IoError> {
    match FileFormat::from_path(path)? {
        FileFormat::Csv => read_budget_csv(open(path)?),
        format => parse_document(path, format),
    }
}

/// Load a composition in mole percent from CSV (`component, mole_percent`),
/// or from a YAML/JSON mapping
pub fn load_composition(path: &Path) -> Result<Composition, IoError> {
    match FileFormat::from_path(path)? {
        FileFormat::Csv => read_composition_csv(open(path)?),
        format => parse_document(path, format),
    }
}

/// Write every Monte Carlo trial as one CSV row
pub fn save_samples(samples: &MonteCarloSampleSet, path: &Path) -> Result<(), IoError> {
    let file = File::create(path).map_err(|source| IoError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    write_samples_csv(samples, BufWriter::new(file))
}

/// Save an input description; CSV as a row-per-input table
pub fn save_input_spec(set: &InputSpecSet, path: &Path) -> Result<(), IoError> {
    let write_err = |source: std::io::Error| IoError::Write {
        path: path.to_path_buf(),
        source,
    };
    match FileFormat::from_path(path)? {
        FileFormat::Csv => {
            let file = File::create(path).map_err(write_err)?;
            write_input_spec_csv(set, BufWriter::new(file))
        }
        FileFormat::Yaml => {
            let text = serde_yml::to_string(set).map_err(|e| IoError::Yaml {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
            fs::write(path, text).map_err(write_err)
        }
        FileFormat::Json => {
            let text = serde_json::to_string_pretty(set).map_err(|e| IoError::Json {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
            fs::write(path, text).map_err(write_err)
        }
    }
}

fn open(path: &Path) -> Result<File, IoError> {
    File::open(path).map_err(|source| IoError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_document<T>(path: &Path, format: FileFormat) -> Result<T, IoError>
where
    T: DeserializeOwned + 'static,
{
    let content = fs::read_to_string(path).map_err(|source| IoError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    match format {
        FileFormat::Json => serde_json::from_str(&content).map_err(|e| IoError::Json {
            path: path.to_path_buf(),
            message: e.to_string(),
        }),
        _ => serde_yml::from_str(&content).map_err(|e| IoError::Yaml {
            path: path.to_path_buf(),
            message: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(FileFormat::from_path(Path::new("a.CSV")).unwrap(), FileFormat::Csv);
        assert_eq!(FileFormat::from_path(Path::new("a.yml")).unwrap(), FileFormat::Yaml);
        assert_eq!(FileFormat::from_path(Path::new("a.json")).unwrap(), FileFormat::Json);
        assert!(matches!(
            FileFormat::from_path(Path::new("a.xlsx")),
            Err(IoError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_yaml_input_spec() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("inputs.yaml");
        fs::write(
            &path,
            "mean:\n  L: 2.0\n  W: 2.0\n\
             standard_uncertainty:\n  L: 0.3\n\
             standard_uncertainty_percent:\n  W: 5.0\n",
        )
        .unwrap();

        let set = load_input_spec(&path).unwrap();
        let resolved = set.resolve().unwrap();
        assert_eq!(resolved[0].standard_uncertainty, 0.3);
        assert!((resolved[1].standard_uncertainty - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_json_budget_and_composition() {
        let tmp = TempDir::new().unwrap();
        let budget_path = tmp.path().join("budget.json");
        fs::write(
            &budget_path,
            r#"{"u": {"a": 0.1, "b": 0.2}, "ci": {"a": 2.0, "b": 1.0}}"#,
        )
        .unwrap();
        let budget = load_budget(&budget_path).unwrap();
        assert_eq!(budget.u["b"], 0.2);
        assert_eq!(budget.ci.unwrap()["a"], 2.0);

        let gas_path = tmp.path().join("gas.yaml");
        fs::write(&gas_path, "C1: 90.0\nC2: 10.0\n").unwrap();
        let gas = load_composition(&gas_path).unwrap();
        assert_eq!(gas.keys().collect::<Vec<_>>(), vec!["C1", "C2"]);
    }

    #[test]
    fn test_null_entries_in_documents() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("inputs.json");
        fs::write(
            &path,
            r#"{"mean": {"Q": 370.0, "rho": 1.2}, "standard_uncertainty": {"Q": 3.0, "rho": 0.01},
                "max": {"Q": null, "rho": null}}"#,
        )
        .unwrap();
        let set = load_input_spec(&path).unwrap();
        assert!(set.max.is_empty());
        assert_eq!(set.resolve().unwrap().len(), 2);

        let budget_path = tmp.path().join("budget.yaml");
        fs::write(&budget_path, "u:\n  a: 0.1\n  b: ~\nci:\n  a: 2.0\n  b: ~\n").unwrap();
        let budget = load_budget(&budget_path).unwrap();
        assert!(budget.u["b"].is_nan());
        assert!(!budget.ci.as_ref().unwrap().contains_key("b"));
    }

    #[test]
    fn test_input_spec_save_and_load_csv() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("inputs.csv");
        let mut set = InputSpecSet::new();
        set.add("flow", 10.0).standard_uncertainty_percent(1.0).min(0.0);
        set.add("k", 2.0).distribution(crate::core::input::Distribution::Constant);

        save_input_spec(&set, &path).unwrap();
        let loaded = load_input_spec(&path).unwrap();
        assert_eq!(loaded, set);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = load_input_spec(Path::new("/nonexistent/inputs.csv")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/inputs.csv"));
    }
}
