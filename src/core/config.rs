//! Engine configuration
//!
//! Settings are layered: built-in defaults, then the user config file
//! (`<config dir>/uncertaintylib/config.yaml`), then an explicit file passed
//! on the command line. CLI flags and `ULIB_*` environment variables are
//! applied on top by the front-end.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::monte_carlo::MonteCarloOptions;
use crate::core::sensitivity::DifferentiationOptions;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yml::Error,
    },
}

/// Tunable numerical settings shared by every command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Coverage factor for expanded uncertainty
    pub coverage_factor: f64,

    /// Monte Carlo trial count
    pub iterations: usize,

    /// Seed for reproducible Monte Carlo runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Central-difference step relative to |mean|
    pub relative_step: f64,

    /// Step floor for inputs with a (near) zero mean
    pub absolute_step: f64,

    /// Resampling budget per draw for truncated distributions
    pub max_resample_attempts: usize,

    /// Number of parallel Monte Carlo batches
    pub batches: usize,
}

impl Default for Config {
    fn default() -> Self {
        let diff = DifferentiationOptions::default();
        let mc = MonteCarloOptions::default();
        Self {
            coverage_factor: 2.0,
            iterations: 10_000,
            seed: None,
            relative_step: diff.relative_step,
            absolute_step: diff.absolute_step,
            max_resample_attempts: mc.max_resample_attempts,
            batches: 1,
        }
    }
}

/// Partial config as found in a file; absent keys leave the lower layer alone
#[derive(Debug, Default, Deserialize)]
struct ConfigLayer {
    coverage_factor: Option<f64>,
    iterations: Option<usize>,
    seed: Option<u64>,
    relative_step: Option<f64>,
    absolute_step: Option<f64>,
    max_resample_attempts: Option<usize>,
    batches: Option<usize>,
}

impl Config {
    /// Defaults plus the user config file, if any
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Config::default();
        if let Some(path) = Self::user_config_path() {
            if path.exists() {
                config.merge_file(&path)?;
            }
        }
        Ok(config)
    }

    /// [`Config::load`] followed by an explicit file
    pub fn load_with(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::load()?;
        if let Some(path) = path {
            config.merge_file(path)?;
        }
        Ok(config)
    }

    /// Location of the per-user config file
    pub fn user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "uncertaintylib")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Overlay the keys present in a YAML file
    pub fn merge_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        self.merge_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// An empty or comment-only document is an empty layer
    fn merge_str(&mut self, content: &str) -> Result<(), serde_yml::Error> {
        if content.trim().is_empty() {
            return Ok(());
        }
        let Some(layer) = serde_yml::from_str::<Option<ConfigLayer>>(content)? else {
            return Ok(());
        };
        if let Some(v) = layer.coverage_factor {
            self.coverage_factor = v;
        }
        if let Some(v) = layer.iterations {
            self.iterations = v;
        }
        if layer.seed.is_some() {
            self.seed = layer.seed;
        }
        if let Some(v) = layer.relative_step {
            self.relative_step = v;
        }
        if let Some(v) = layer.absolute_step {
            self.absolute_step = v;
        }
        if let Some(v) = layer.max_resample_attempts {
            self.max_resample_attempts = v;
        }
        if let Some(v) = layer.batches {
            self.batches = v;
        }
        Ok(())
    }

    pub fn differentiation(&self) -> DifferentiationOptions {
        DifferentiationOptions {
            relative_step: self.relative_step,
            absolute_step: self.absolute_step,
        }
    }

    pub fn monte_carlo(&self) -> MonteCarloOptions {
        MonteCarloOptions {
            seed: self.seed,
            max_resample_attempts: self.max_resample_attempts,
        }
    }
}
