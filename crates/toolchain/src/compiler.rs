//! Driving the Cairo compiler.
//!
//! Each source `contracts/<name>.cairo` produces a compiled artifact
//! `<build_dir>/<name>.json` and an ABI `<abis_dir>/<name>.json`.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use stark_signer::felt::parse_felt;
use stark_signer::Felt;
use tracing::{debug, info};

use crate::config::ToolchainConfig;
use crate::error::ToolchainError;
use crate::process::{run, stderr_text};

/// Extension of Cairo source files.
pub const CAIRO_EXTENSION: &str = "cairo";

/// A successfully compiled contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledContract {
    /// Source file stem.
    pub name: String,
    pub abi: Vec<Value>,
    /// The program's `data` section.
    pub bytecode: Vec<Felt>,
    pub artifact_path: PathBuf,
    pub abi_path: PathBuf,
}

/// Runs `starknet-compile` with the configured project layout.
#[derive(Debug, Clone)]
pub struct StarknetCompiler {
    config: ToolchainConfig,
}

impl StarknetCompiler {
    pub fn new(config: ToolchainConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ToolchainConfig {
        &self.config
    }

    /// Compiles one source file and loads the resulting artifact.
    ///
    /// A non-zero compiler exit is reported as
    /// [`ToolchainError::Compilation`] carrying the compiler's stderr.
    pub fn compile(&self, path: &Path, debug_info: bool) -> Result<CompiledContract, ToolchainError> {
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .filter(|stem| !stem.is_empty())
            .ok_or_else(|| {
                ToolchainError::Config(format!("no file name in {}", path.display()))
            })?
            .to_string();

        fs::create_dir_all(&self.config.build_dir)?;
        fs::create_dir_all(&self.config.abis_dir)?;

        let artifact_path = self.config.build_dir.join(format!("{name}.json"));
        let abi_path = self.config.abis_dir.join(format!("{name}.json"));

        let mut args: Vec<OsString> = vec![
            path.into(),
            "--cairo_path".into(),
            self.config.contracts_dir.clone().into(),
            "--output".into(),
            artifact_path.clone().into(),
            "--abi".into(),
            abi_path.clone().into(),
        ];
        if debug_info {
            args.push("--debug_info_with_source".into());
        }

        info!(path = %path.display(), "compiling");
        let output = run(&self.config.compiler, args)?;
        if !output.status.success() {
            return Err(ToolchainError::Compilation {
                path: path.to_path_buf(),
                stderr: stderr_text(&output),
            });
        }

        let bytecode = read_bytecode(&artifact_path)?;
        let abi = read_abi(&abi_path)?;
        debug!(
            name = %name,
            bytecode_len = bytecode.len(),
            abi_entries = abi.len(),
            "loaded artifact"
        );

        Ok(CompiledContract {
            name,
            abi,
            bytecode,
            artifact_path,
            abi_path,
        })
    }

    /// Compiles `paths` in order, or every contract under the contracts
    /// directory when `paths` is empty. Stops at the first failure.
    pub fn compile_all(
        &self,
        paths: &[PathBuf],
        debug_info: bool,
    ) -> Result<Vec<CompiledContract>, ToolchainError> {
        let discovered;
        let paths: &[PathBuf] = if paths.is_empty() {
            discovered = find_contracts(&self.config.contracts_dir)?;
            info!(
                dir = %self.config.contracts_dir.display(),
                count = discovered.len(),
                "compiling all contracts"
            );
            discovered.as_slice()
        } else {
            paths
        };

        paths
            .iter()
            .map(|path| self.compile(path, debug_info))
            .collect()
    }
}

/// All `*.cairo` files below `dir`, recursively, in sorted order.
/// Symlinked directories are not descended into.
pub fn find_contracts(dir: &Path) -> Result<Vec<PathBuf>, ToolchainError> {
    let mut found = Vec::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        for entry in fs::read_dir(&current)? {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                pending.push(path);
            } else if path.extension().is_some_and(|ext| ext == CAIRO_EXTENSION) {
                found.push(path);
            }
        }
    }

    found.sort();
    Ok(found)
}

fn read_json(path: &Path) -> Result<Value, ToolchainError> {
    let content = fs::read_to_string(path)
        .map_err(|e| ToolchainError::Artifact(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&content)
        .map_err(|e| ToolchainError::Artifact(format!("{}: {e}", path.display())))
}

fn read_bytecode(artifact_path: &Path) -> Result<Vec<Felt>, ToolchainError> {
    let artifact = read_json(artifact_path)?;
    let data = artifact
        .pointer("/program/data")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            ToolchainError::Artifact(format!(
                "{}: missing program.data",
                artifact_path.display()
            ))
        })?;

    data.iter()
        .map(|word| {
            word.as_str()
                .ok_or_else(|| ToolchainError::Artifact(format!("non-string program word {word}")))
                .and_then(|word| {
                    parse_felt(word).map_err(|e| ToolchainError::Artifact(e.to_string()))
                })
        })
        .collect()
}

fn read_abi(abi_path: &Path) -> Result<Vec<Value>, ToolchainError> {
    match read_json(abi_path)? {
        Value::Array(entries) => Ok(entries),
        _ => Err(ToolchainError::Artifact(format!(
            "{}: ABI is not a JSON array",
            abi_path.display()
        ))),
    }
}
