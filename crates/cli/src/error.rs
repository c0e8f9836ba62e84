use stark_signer::SignerError;
use thiserror::Error;
use toolchain::ToolchainError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0} is not set")]
    MissingKey(&'static str),

    #[error(transparent)]
    Signer(#[from] SignerError),

    #[error(transparent)]
    Toolchain(#[from] ToolchainError),

    #[error("failed to encode output: {0}")]
    Json(#[from] serde_json::Error),
}
