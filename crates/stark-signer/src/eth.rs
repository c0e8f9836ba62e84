//! secp256k1 signing for Ethereum-keyed Starknet accounts.
//!
//! The account stores the signer's Ethereum address. A signature is the
//! felt list `[v, r.low, r.high, s.low, s.high]` over the 32-byte
//! big-endian transaction hash.

use k256::ecdsa::signature::hazmat::PrehashSigner;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use k256::FieldBytes;
use sha3::{Digest, Keccak256};
use zeroize::Zeroize;

use crate::error::SignerError;
use crate::felt::{join_u256, split_u256, Felt};
use crate::signer::TransactionSigner;

/// Number of felts in an Ethereum-style signature.
pub const ETH_SIGNATURE_LEN: usize = 5;

/// A secp256k1 key pair with its Ethereum address.
pub struct EthKeyPair {
    signing_key: SigningKey,
    address: [u8; 20],
}

impl EthKeyPair {
    /// Creates a key pair from a 32-byte big-endian secp256k1 scalar.
    pub fn from_bytes_be(private_key: &[u8; 32]) -> Result<Self, SignerError> {
        let mut key_bytes = *private_key;
        let signing_key = SigningKey::from_bytes((&key_bytes).into())
            .map_err(|e| SignerError::InvalidKey(e.to_string()));
        key_bytes.zeroize();
        let signing_key = signing_key?;

        let address = verifying_key_to_address(signing_key.verifying_key())?;

        Ok(Self {
            signing_key,
            address,
        })
    }

    /// Creates a key pair from a 64-character hex string, with or without `0x`.
    pub fn from_hex(key_hex: &str) -> Result<Self, SignerError> {
        let key_hex = key_hex.trim();
        let key_hex = key_hex.strip_prefix("0x").unwrap_or(key_hex);

        if key_hex.len() != 64 {
            return Err(SignerError::InvalidKey(format!(
                "expected 64 hex characters, got {}",
                key_hex.len()
            )));
        }

        let mut bytes = [0u8; 32];
        hex::decode_to_slice(key_hex, &mut bytes)
            .map_err(|e| SignerError::InvalidKey(format!("invalid hex: {e}")))?;
        let result = Self::from_bytes_be(&bytes);
        bytes.zeroize();
        result
    }

    /// The 20-byte Ethereum address as a felt.
    pub fn eth_address(&self) -> Felt {
        address_to_felt(&self.address)
    }

    /// The EIP-55 checksummed address string.
    pub fn eth_address_checksummed(&self) -> Result<String, SignerError> {
        checksum_address(&format!("0x{}", hex::encode(self.address)))
    }

    /// Signs a transaction hash with RFC 6979 deterministic ECDSA.
    ///
    /// Returns `[v, r.low, r.high, s.low, s.high]` where `v` is the y-parity.
    pub fn sign(&self, message_hash: &Felt) -> Result<Vec<Felt>, SignerError> {
        let prehash = message_hash.to_bytes_be();

        let (signature, recovery_id): (Signature, RecoveryId) = self
            .signing_key
            .sign_prehash(&prehash)
            .map_err(|e| SignerError::SigningFailed(e.to_string()))?;

        let mut r_bytes = [0u8; 32];
        let mut s_bytes = [0u8; 32];
        r_bytes.copy_from_slice(&signature.r().to_bytes());
        s_bytes.copy_from_slice(&signature.s().to_bytes());

        let (r_low, r_high) = split_u256(&r_bytes);
        let (s_low, s_high) = split_u256(&s_bytes);
        let v = Felt::from(recovery_id.is_y_odd() as u8);

        Ok(vec![v, r_low, r_high, s_low, s_high])
    }
}

impl TransactionSigner for EthKeyPair {
    fn public_identity(&self) -> Felt {
        self.eth_address()
    }

    fn sign_transaction_hash(&self, hash: &Felt) -> Result<Vec<Felt>, SignerError> {
        self.sign(hash)
    }
}

impl std::fmt::Debug for EthKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EthKeyPair")
            .field("address", &format_args!("0x{}", hex::encode(self.address)))
            .field("signing_key", &"[REDACTED]")
            .finish()
    }
}

/// Recovers the Ethereum address that produced an `[v, r.low, r.high, s.low,
/// s.high]` signature over `message_hash`.
pub fn recover_eth_address(message_hash: &Felt, signature: &[Felt]) -> Result<Felt, SignerError> {
    let [v, r_low, r_high, s_low, s_high] = signature else {
        return Err(SignerError::InvalidSignature(format!(
            "expected {ETH_SIGNATURE_LEN} signature felts, got {}",
            signature.len()
        )));
    };

    let v = u8::try_from(*v)
        .ok()
        .and_then(RecoveryId::from_byte)
        .ok_or_else(|| SignerError::InvalidSignature("signature v must be 0 or 1".into()))?;
    let r = join_u256(r_low, r_high).map_err(|e| SignerError::InvalidSignature(format!("r: {e}")))?;
    let s = join_u256(s_low, s_high).map_err(|e| SignerError::InvalidSignature(format!("s: {e}")))?;

    let signature = Signature::from_scalars(FieldBytes::from(r), FieldBytes::from(s))
        .map_err(|e| SignerError::InvalidSignature(format!("malformed signature: {e}")))?;

    let verifying_key =
        VerifyingKey::recover_from_prehash(&message_hash.to_bytes_be(), &signature, v)
            .map_err(|e| SignerError::InvalidSignature(format!("recovery failed: {e}")))?;

    Ok(address_to_felt(&verifying_key_to_address(&verifying_key)?))
}

/// Derives the Ethereum address of a secp256k1 verifying key: the last 20
/// bytes of the Keccak-256 of the 64-byte uncompressed key.
fn verifying_key_to_address(verifying_key: &VerifyingKey) -> Result<[u8; 20], SignerError> {
    let uncompressed = verifying_key.to_encoded_point(false);
    let uncompressed_bytes: &[u8] = uncompressed.as_bytes();

    if uncompressed_bytes.len() != 65 || uncompressed_bytes[0] != 0x04 {
        return Err(SignerError::InvalidKey(
            "uncompressed key must be 65 bytes starting with 0x04".into(),
        ));
    }

    // Keccak-256 of the 64-byte key (skip the 0x04 prefix).
    let hash = Keccak256::digest(&uncompressed_bytes[1..]);

    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    Ok(address)
}

fn address_to_felt(address: &[u8; 20]) -> Felt {
    let mut buffer = [0u8; 32];
    buffer[12..].copy_from_slice(address);
    // 160-bit values are always canonical.
    Felt::from_bytes_be(&buffer).unwrap_or(Felt::ZERO)
}

/// Applies EIP-55 mixed-case checksum encoding to a `0x`-prefixed address.
pub fn checksum_address(address: &str) -> Result<String, SignerError> {
    let hex_part = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .ok_or_else(|| SignerError::InvalidFelt("address must start with 0x".into()))?
        .to_lowercase();

    if hex_part.len() != 40 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(SignerError::InvalidFelt(format!(
            "expected 40 hex characters, got {address:?}"
        )));
    }

    let hash = hex::encode(Keccak256::digest(hex_part.as_bytes()));

    let mut checksummed = String::with_capacity(42);
    checksummed.push_str("0x");

    for (c, h) in hex_part.chars().zip(hash.chars()) {
        // Letters whose hash nibble is >= 8 are uppercased.
        if c.is_ascii_alphabetic() && h.to_digit(16).unwrap_or(0) >= 8 {
            checksummed.push(c.to_ascii_uppercase());
        } else {
            checksummed.push(c);
        }
    }

    Ok(checksummed)
}
