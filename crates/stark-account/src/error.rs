use stark_signer::{Felt, SignerError};
use thiserror::Error;

/// Failures reported by an execution environment.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("transaction reverted: {reason}")]
    Reverted { reason: String },

    #[error("stale nonce: expected {expected:#x}, got {actual:#x}")]
    StaleNonce { expected: Felt, actual: Felt },

    #[error("invalid signature")]
    InvalidSignature,

    #[error("unknown account: {0:#x}")]
    UnknownAccount(Felt),

    #[error("unknown contract: {0:#x}")]
    UnknownContract(Felt),

    #[error("transport error: {0}")]
    Transport(String),
}

/// Failures while signing and submitting a transaction.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("signing failed: {0}")]
    Signer(#[from] SignerError),

    #[error("execution failed: {0}")]
    Execution(#[from] ExecutionError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_reverted() {
        let err = ExecutionError::Reverted {
            reason: "caller is not the owner".into(),
        };
        assert_eq!(err.to_string(), "transaction reverted: caller is not the owner");
    }

    #[test]
    fn display_stale_nonce() {
        let err = ExecutionError::StaleNonce {
            expected: Felt::from(2u8),
            actual: Felt::ZERO,
        };
        assert_eq!(err.to_string(), "stale nonce: expected 0x2, got 0x0");
    }

    #[test]
    fn display_unknown_account() {
        let err = ExecutionError::UnknownAccount(Felt::from(0x456u64));
        assert_eq!(err.to_string(), "unknown account: 0x456");
    }

    #[test]
    fn send_error_from_signer_error() {
        let err: SendError = SignerError::EmptyBatch.into();
        assert!(matches!(err, SendError::Signer(SignerError::EmptyBatch)));
        assert_eq!(
            err.to_string(),
            "signing failed: multicall batch contains no calls"
        );
    }

    #[test]
    fn send_error_from_execution_error() {
        let err: SendError = ExecutionError::InvalidSignature.into();
        assert_eq!(err.to_string(), "execution failed: invalid signature");
    }

    #[test]
    fn error_trait_is_implemented() {
        let err = ExecutionError::Transport("connection reset".into());
        let _: &dyn std::error::Error = &err;
    }
}
