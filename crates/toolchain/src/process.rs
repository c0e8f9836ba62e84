use std::ffi::OsString;
use std::process::{Command, Output};

use tracing::debug;

use crate::error::ToolchainError;

/// Runs `command_line` (a program followed by optional fixed arguments,
/// separated by whitespace) with `args` appended, capturing its output.
///
/// A program that cannot be started is a [`ToolchainError::Spawn`]; the
/// exit status is left to the caller.
pub(crate) fn run<I>(command_line: &str, args: I) -> Result<Output, ToolchainError>
where
    I: IntoIterator<Item = OsString>,
{
    let mut parts = command_line.split_whitespace();
    let program = parts.next().ok_or_else(|| {
        ToolchainError::Config(format!("empty command line: {command_line:?}"))
    })?;

    let mut command = Command::new(program);
    command.args(parts).args(args);
    debug!(?command, "running");

    command.output().map_err(|source| ToolchainError::Spawn {
        command: command_line.to_string(),
        source,
    })
}

/// Trimmed, lossily decoded stderr of a finished process.
pub(crate) fn stderr_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}
