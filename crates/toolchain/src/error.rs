use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolchainError {
    #[error("compilation of {} failed: {stderr}", .path.display())]
    Compilation { path: PathBuf, stderr: String },

    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr}")]
    Subprocess {
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("download failed: {0}")]
    Download(String),

    #[error("invalid version: {0}")]
    InvalidVersion(String),

    #[error("invalid compiler artifact: {0}")]
    Artifact(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_compilation() {
        let err = ToolchainError::Compilation {
            path: PathBuf::from("contracts/Ownable.cairo"),
            stderr: "Unexpected token".into(),
        };
        assert_eq!(
            err.to_string(),
            "compilation of contracts/Ownable.cairo failed: Unexpected token"
        );
    }

    #[test]
    fn display_spawn() {
        let err = ToolchainError::Spawn {
            command: "starknet-compile".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert_eq!(err.to_string(), "failed to start `starknet-compile`: not found");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn display_invalid_version() {
        let err = ToolchainError::InvalidVersion("0.4".into());
        assert_eq!(err.to_string(), "invalid version: 0.4");
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ToolchainError = io.into();
        assert!(matches!(err, ToolchainError::Io(_)));
        assert_eq!(err.to_string(), "I/O error: denied");
    }
}
