//! Shared test helpers for integration tests
//!
//! This module provides common utilities used across all test files.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo;
use assert_cmd::Command;
use tempfile::TempDir;
use uncertaintylib::core::InputSpecSet;

/// Empty home directory so a developer's own config never leaks into tests
pub fn isolated_home() -> PathBuf {
    Path::new(env!("CARGO_TARGET_TMPDIR")).join("ulib-home")
}

/// Helper to get a ulib command with the user's config and env kept out
pub fn ulib() -> Command {
    ulib_with_config_home(&isolated_home().join(".config"))
}

/// ulib command whose per-user config directory is `config_home`
pub fn ulib_with_config_home(config_home: &Path) -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("ulib"));
    cmd.env("HOME", isolated_home())
        .env("XDG_CONFIG_HOME", config_home)
        .env("APPDATA", config_home);
    for var in [
        "ULIB_CONFIG",
        "ULIB_ITERATIONS",
        "ULIB_SEED",
        "ULIB_COVERAGE",
        "ULIB_BATCHES",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

/// Write `content` to `name` inside `tmp`
pub fn write_file(tmp: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = tmp.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

/// Box example from the GUM worked case: L, W, D = 2 with u = 0.3, 0.1, 0.2
pub fn volume_inputs() -> InputSpecSet {
    let mut set = InputSpecSet::new();
    set.add("L", 2.0).standard_uncertainty(0.3);
    set.add("W", 2.0).standard_uncertainty(0.1);
    set.add("D", 2.0).standard_uncertainty(0.2);
    set
}

pub const VOLUME_CSV: &str = "\
input_name,mean,standard_uncertainty,standard_uncertainty_percent,distribution,min,max
L,2.0,0.3,,normal,,
W,2.0,,5,normal,,
D,2.0,0.2,,normal,,
";

/// Orifice case from the NFOGM GasMet app default setup
pub fn orifice_inputs() -> InputSpecSet {
    let mut set = InputSpecSet::new();
    set.add("C", 0.6021).standard_uncertainty(0.00151);
    set.add("D", 0.3).standard_uncertainty(0.0006);
    set.add("d", 0.15).standard_uncertainty(0.0000525);
    set.add("epsilon", 0.9993).standard_uncertainty(0.0000309783);
    set.add("dP", 249.5).standard_uncertainty(0.075);
    set.add("rho", 86.376).standard_uncertainty(0.13);
    set
}

pub const ORIFICE_CSV: &str = "\
input_name,mean,standard_uncertainty
C,0.6021,0.00151
D,0.3,0.0006
d,0.15,0.0000525
epsilon,0.9993,0.0000309783
dP,249.5,0.075
rho,86.376,0.13
";

pub const NFOGM_GAS_CSV: &str = "\
component,mole_percent
C1,86.3
C2,6.01
C3,3.0
iC4,1.1
nC4,0.9
iC5,0.35
nC5,0.35
N2,1.0
CO2,1.0
";
