use sha3::{Digest, Keccak256};

use crate::error::SignerError;
use crate::felt::Felt;

const DEFAULT_ENTRY_POINT_NAME: &str = "__default__";
const DEFAULT_L1_ENTRY_POINT_NAME: &str = "__l1_default__";

/// Name of the account entry point that dispatches a multicall.
pub const EXECUTE_ENTRY_POINT_NAME: &str = "__execute__";

/// Keccak-256 of `data` truncated to 250 bits, as a felt.
pub fn starknet_keccak(data: &[u8]) -> Felt {
    let mut hash: [u8; 32] = Keccak256::digest(data).into();

    // Drop the top 6 bits so the value always fits the field.
    hash[0] &= 0b0000_0011;

    Felt::from_bytes_be(&hash).unwrap_or(Felt::ZERO)
}

/// Derives the entry-point selector for a contract method name.
///
/// The fallback entry points `__default__` and `__l1_default__` map to zero.
/// Only ASCII names are accepted.
pub fn selector_from_name(name: &str) -> Result<Felt, SignerError> {
    if name == DEFAULT_ENTRY_POINT_NAME || name == DEFAULT_L1_ENTRY_POINT_NAME {
        return Ok(Felt::ZERO);
    }
    if name.is_empty() || !name.is_ascii() {
        return Err(SignerError::InvalidSelector(name.to_string()));
    }

    Ok(starknet_keccak(name.as_bytes()))
}
