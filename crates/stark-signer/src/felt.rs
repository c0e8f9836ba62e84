//! Field element helpers: parsing, Cairo short strings and the two-felt
//! `Uint256` representation used by Cairo contracts.

use starknet_ff::FieldElement;

use crate::error::SignerError;

/// An element of the Stark prime field `p = 2^251 + 17 * 2^192 + 1`.
pub type Felt = FieldElement;

/// The largest `Uint256` as a `(low, high)` pair.
pub const MAX_UINT256: (u128, u128) = (u128::MAX, u128::MAX);

/// Longest string that fits in a single felt.
pub const SHORT_STRING_MAX_LEN: usize = 31;

/// Parses a felt from a decimal string or a `0x`-prefixed hex string.
pub fn parse_felt(value: &str) -> Result<Felt, SignerError> {
    let value = value.trim();
    let parsed = if let Some(hex_part) = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Felt::from_hex_be(hex_part)
    } else {
        Felt::from_dec_str(value)
    };

    parsed.map_err(|e| SignerError::InvalidFelt(format!("{value}: {e}")))
}

/// Formats a felt as a minimal `0x`-prefixed hex string.
pub fn felt_to_hex(value: &Felt) -> String {
    format!("{value:#x}")
}

/// Encodes an ASCII string of at most 31 characters as a big-endian felt.
pub fn short_string_to_felt(text: &str) -> Result<Felt, SignerError> {
    if !text.is_ascii() {
        return Err(SignerError::InvalidFelt(format!(
            "short string must be ASCII: {text:?}"
        )));
    }
    if text.len() > SHORT_STRING_MAX_LEN {
        return Err(SignerError::InvalidFelt(format!(
            "short string longer than {SHORT_STRING_MAX_LEN} characters: {text:?}"
        )));
    }

    let mut buffer = [0u8; 32];
    buffer[32 - text.len()..].copy_from_slice(text.as_bytes());

    // 31 bytes are always below the modulus.
    Felt::from_bytes_be(&buffer).map_err(|e| SignerError::InvalidFelt(e.to_string()))
}

/// Decodes a felt produced by [`short_string_to_felt`].
pub fn felt_to_short_string(value: &Felt) -> Result<String, SignerError> {
    let bytes = value.to_bytes_be();
    if bytes[0] != 0 {
        return Err(SignerError::InvalidFelt(
            "value does not fit in 31 bytes".into(),
        ));
    }

    let start = bytes.iter().position(|&b| b != 0).unwrap_or(32);
    let text = &bytes[start..];
    if !text.is_ascii() {
        return Err(SignerError::InvalidFelt(
            "value contains non-ASCII bytes".into(),
        ));
    }

    Ok(text.iter().map(|&b| b as char).collect())
}

/// Splits a 256-bit big-endian integer into `(low, high)` 128-bit felts.
pub fn split_u256(value: &[u8; 32]) -> (Felt, Felt) {
    let mut high = [0u8; 16];
    let mut low = [0u8; 16];
    high.copy_from_slice(&value[..16]);
    low.copy_from_slice(&value[16..]);

    (
        Felt::from(u128::from_be_bytes(low)),
        Felt::from(u128::from_be_bytes(high)),
    )
}

/// Joins a `(low, high)` pair back into a 256-bit big-endian integer.
///
/// Fails when either half does not fit in 128 bits.
pub fn join_u256(low: &Felt, high: &Felt) -> Result<[u8; 32], SignerError> {
    let low = u128::try_from(*low)
        .map_err(|_| SignerError::InvalidFelt("uint256 low part exceeds 128 bits".into()))?;
    let high = u128::try_from(*high)
        .map_err(|_| SignerError::InvalidFelt("uint256 high part exceeds 128 bits".into()))?;

    let mut out = [0u8; 32];
    out[..16].copy_from_slice(&high.to_be_bytes());
    out[16..].copy_from_slice(&low.to_be_bytes());
    Ok(out)
}
