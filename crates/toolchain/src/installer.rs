//! Installing a `cairo-lang` release with pip.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::ToolchainConfig;
use crate::error::ToolchainError;
use crate::process::{run, stderr_text};

pub const RELEASE_BASE_URL: &str = "https://github.com/starkware-libs/cairo-lang/releases/download";

/// Checks that `version` is `major.minor.patch` with numeric parts.
pub fn validate_version(version: &str) -> Result<(), ToolchainError> {
    let parts: Vec<&str> = version.split('.').collect();
    let valid = parts.len() == 3
        && parts
            .iter()
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()));

    if valid {
        Ok(())
    } else {
        Err(ToolchainError::InvalidVersion(format!(
            "{version:?} is not of the form major.minor.patch"
        )))
    }
}

/// Download URL of the `cairo-lang` release archive for `version`.
pub fn release_url(version: &str) -> String {
    format!("{RELEASE_BASE_URL}/v{version}/cairo-lang-{version}.zip")
}

pub struct Installer {
    config: ToolchainConfig,
}

impl Installer {
    pub fn new(config: ToolchainConfig) -> Self {
        Self { config }
    }

    /// Downloads the release archive for `version` into a fresh directory
    /// under the temp directory and installs it with pip. Only that
    /// directory is removed afterwards.
    pub fn install(&self, version: &str) -> Result<(), ToolchainError> {
        self.install_with(version, download)
    }

    fn install_with<F>(&self, version: &str, fetch: F) -> Result<(), ToolchainError>
    where
        F: FnOnce(&str, &Path) -> Result<(), ToolchainError>,
    {
        validate_version(version)?;

        fs::create_dir_all(&self.config.temp_dir)?;
        let scratch = tempfile::Builder::new()
            .prefix("cairo-lang-")
            .tempdir_in(&self.config.temp_dir)?;
        debug!(dir = %scratch.path().display(), "created download dir");

        let archive = archive_path(scratch.path(), version);
        fetch(&release_url(version), &archive)?;
        self.pip_install(&archive)?;

        info!(version, "cairo-lang installed");
        Ok(())
    }

    /// Runs `<python> -m pip install <archive>`.
    pub fn pip_install(&self, archive: &Path) -> Result<(), ToolchainError> {
        let args: Vec<OsString> = vec!["-m".into(), "pip".into(), "install".into(), archive.into()];

        info!(archive = %archive.display(), "installing with pip");
        let output = run(&self.config.python, args)?;
        if !output.status.success() {
            return Err(ToolchainError::Subprocess {
                command: format!("{} -m pip install", self.config.python),
                status: output.status,
                stderr: stderr_text(&output),
            });
        }
        Ok(())
    }

}

fn archive_path(dir: &Path, version: &str) -> PathBuf {
    dir.join(format!("cairo-lang-{version}.zip"))
}

fn download(url: &str, dest: &Path) -> Result<(), ToolchainError> {
    info!(url, "downloading");

    let response = reqwest::blocking::get(url)
        .and_then(|response| response.error_for_status())
        .map_err(|e| ToolchainError::Download(format!("{url}: {e}")))?;
    let bytes = response
        .bytes()
        .map_err(|e| ToolchainError::Download(format!("{url}: {e}")))?;

    fs::write(dest, &bytes)?;
    Ok(())
}
