use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::info;

use crate::error::ToolchainError;

/// Removes the build directory and everything in it.
///
/// Returns whether anything was removed; a missing directory is not an
/// error.
pub fn clean(build_dir: &Path) -> Result<bool, ToolchainError> {
    match fs::remove_dir_all(build_dir) {
        Ok(()) => {
            info!(dir = %build_dir.display(), "removed build directory");
            Ok(true)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}
