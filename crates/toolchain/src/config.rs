//! Project layout and tool locations.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ToolchainError;

/// Prefix of the environment variables that override config fields.
pub const ENV_PREFIX: &str = "CAIRO_DEV_";

/// Where sources, artifacts and tools live.
///
/// Missing fields in a config file fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    /// Directory holding `*.cairo` sources; also the compiler's import path.
    pub contracts_dir: PathBuf,
    /// Directory receiving compiled artifacts.
    pub build_dir: PathBuf,
    /// Directory receiving extracted ABIs.
    pub abis_dir: PathBuf,
    /// Scratch directory for downloads.
    pub temp_dir: PathBuf,
    /// Compiler command, optionally with leading arguments.
    pub compiler: String,
    /// Python interpreter used to run pip.
    pub python: String,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            contracts_dir: PathBuf::from("contracts"),
            build_dir: PathBuf::from("artifacts"),
            abis_dir: PathBuf::from("artifacts/abis"),
            temp_dir: PathBuf::from(".temp"),
            compiler: "starknet-compile".into(),
            python: "python3".into(),
        }
    }
}

impl ToolchainConfig {
    /// Reads a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ToolchainError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ToolchainError::Config(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&content)
            .map_err(|e| ToolchainError::Config(format!("{}: {e}", path.display())))
    }

    /// Reads `path` when given, otherwise returns the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ToolchainError> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    /// Applies `CAIRO_DEV_*` overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides looked up by full variable name, e.g.
    /// `CAIRO_DEV_BUILD_DIR`. Empty values are ignored.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |field: &str| {
            lookup(&format!("{ENV_PREFIX}{field}")).filter(|value| !value.trim().is_empty())
        };

        if let Some(value) = get("CONTRACTS_DIR") {
            self.contracts_dir = value.into();
        }
        if let Some(value) = get("BUILD_DIR") {
            self.build_dir = value.into();
        }
        if let Some(value) = get("ABIS_DIR") {
            self.abis_dir = value.into();
        }
        if let Some(value) = get("TEMP_DIR") {
            self.temp_dir = value.into();
        }
        if let Some(value) = get("COMPILER") {
            self.compiler = value;
        }
        if let Some(value) = get("PYTHON") {
            self.python = value;
        }

        self
    }
}
