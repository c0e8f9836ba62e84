use thiserror::Error;

/// Hashing and signing errors.
#[derive(Debug, Error)]
pub enum SignerError {
    #[error("invalid private key: {0}")]
    InvalidKey(String),

    #[error("invalid message hash: {0}")]
    InvalidMessage(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("multicall batch contains no calls")]
    EmptyBatch,

    #[error("invalid selector name: {0}")]
    InvalidSelector(String),

    #[error("invalid field element: {0}")]
    InvalidFelt(String),

    #[error("signing error: {0}")]
    SigningFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid_key() {
        let err = SignerError::InvalidKey("zero is not a valid scalar".into());
        assert_eq!(err.to_string(), "invalid private key: zero is not a valid scalar");
    }

    #[test]
    fn display_invalid_message() {
        let err = SignerError::InvalidMessage("hash >= 2^251".into());
        assert_eq!(err.to_string(), "invalid message hash: hash >= 2^251");
    }

    #[test]
    fn display_invalid_signature() {
        let err = SignerError::InvalidSignature("signature v must be 0 or 1".into());
        assert_eq!(err.to_string(), "invalid signature: signature v must be 0 or 1");
    }

    #[test]
    fn display_empty_batch() {
        let err = SignerError::EmptyBatch;
        assert_eq!(err.to_string(), "multicall batch contains no calls");
    }

    #[test]
    fn display_invalid_selector() {
        let err = SignerError::InvalidSelector("transfér".into());
        assert_eq!(err.to_string(), "invalid selector name: transfér");
    }

    #[test]
    fn display_invalid_felt() {
        let err = SignerError::InvalidFelt("0xzz".into());
        assert_eq!(err.to_string(), "invalid field element: 0xzz");
    }

    #[test]
    fn display_signing_failed() {
        let err = SignerError::SigningFailed("prehash rejected".into());
        assert_eq!(err.to_string(), "signing error: prehash rejected");
    }

    #[test]
    fn error_trait_is_implemented() {
        let err: Box<dyn std::error::Error> = Box::new(SignerError::InvalidKey("test".into()));
        assert!(err.to_string().contains("test"));
    }

    #[test]
    fn debug_format_works() {
        let err = SignerError::EmptyBatch;
        let debug = format!("{:?}", err);
        assert!(debug.contains("EmptyBatch"));
    }
}
