use serde::{Deserialize, Serialize};
use starknet_crypto::{
    get_public_key, rfc6979_generate_k, sign as ecdsa_sign, verify as ecdsa_verify, SignError,
    VerifyError,
};
use zeroize::Zeroizing;

use crate::error::SignerError;
use crate::felt::Felt;
use crate::signer::TransactionSigner;

/// Order `n` of the Stark curve generator, big-endian.
pub const CURVE_ORDER_BE: [u8; 32] = [
    0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x10, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xb7, 0x81, 0x12, 0x6d, 0xca, 0xe7, 0xb2, 0x32, 0x1e, 0x66, 0xa2, 0x41, 0xad, 0xc6, 0x4d, 0x2f,
];

/// Exclusive upper bound `2^251` for signable message hashes, big-endian.
pub const MESSAGE_UPPER_BOUND_BE: [u8; 32] = {
    let mut bound = [0u8; 32];
    bound[0] = 0x08;
    bound
};

/// A Stark ECDSA signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub r: Felt,
    pub s: Felt,
}

impl Signature {
    /// The signature as the `[r, s]` felt list accounts expect.
    pub fn to_vec(&self) -> Vec<Felt> {
        vec![self.r, self.s]
    }
}

/// A Stark curve key pair.
///
/// The private scalar lives in a buffer that is wiped on drop and is never
/// exposed; only the public key and signing operations are available.
pub struct StarkKeyPair {
    private_key: Zeroizing<[u8; 32]>,
    public_key: Felt,
}

impl StarkKeyPair {
    /// Creates a key pair from a private scalar in `[1, n)`.
    pub fn new(private_key: Felt) -> Result<Self, SignerError> {
        Self::from_bytes_be(&private_key.to_bytes_be())
    }

    /// Creates a key pair from a big-endian 32-byte private scalar.
    pub fn from_bytes_be(bytes: &[u8; 32]) -> Result<Self, SignerError> {
        let private_key = Zeroizing::new(*bytes);

        if private_key.iter().all(|&b| b == 0) {
            return Err(SignerError::InvalidKey("private key must be non-zero".into()));
        }
        if *private_key >= CURVE_ORDER_BE {
            return Err(SignerError::InvalidKey(
                "private key must be below the curve order".into(),
            ));
        }

        let scalar = Felt::from_bytes_be(&private_key)
            .map_err(|e| SignerError::InvalidKey(e.to_string()))?;
        let public_key = get_public_key(&scalar);

        Ok(Self {
            private_key,
            public_key,
        })
    }

    /// Creates a key pair from a hex string, with or without `0x`.
    pub fn from_hex(key_hex: &str) -> Result<Self, SignerError> {
        let key_hex = key_hex.trim();
        let key_hex = key_hex
            .strip_prefix("0x")
            .or_else(|| key_hex.strip_prefix("0X"))
            .unwrap_or(key_hex);

        if key_hex.is_empty() || key_hex.len() > 64 {
            return Err(SignerError::InvalidKey(format!(
                "expected 1 to 64 hex characters, got {}",
                key_hex.len()
            )));
        }

        let padded = Zeroizing::new(format!("{key_hex:0>64}"));
        let mut bytes = Zeroizing::new([0u8; 32]);
        hex::decode_to_slice(padded.as_str(), bytes.as_mut_slice())
            .map_err(|e| SignerError::InvalidKey(format!("invalid hex: {e}")))?;

        Self::from_bytes_be(&bytes)
    }

    /// Creates a key pair from a decimal string.
    pub fn from_dec_str(key_dec: &str) -> Result<Self, SignerError> {
        let scalar = Felt::from_dec_str(key_dec.trim())
            .map_err(|e| SignerError::InvalidKey(format!("invalid decimal key: {e}")))?;
        Self::new(scalar)
    }

    /// Creates a key pair from a small integer key, as used by test fixtures.
    pub fn from_u128(private_key: u128) -> Result<Self, SignerError> {
        Self::new(Felt::from(private_key))
    }

    /// The public key: the x-coordinate of `private_key * G`.
    pub fn public_key(&self) -> Felt {
        self.public_key
    }

    /// Signs a message hash.
    ///
    /// The ECDSA nonce is derived with RFC 6979 from the key and the hash, so
    /// the same inputs always produce the same signature. When the curve
    /// rejects a derived nonce the seed is bumped and derivation repeated.
    pub fn sign(&self, message_hash: &Felt) -> Result<Signature, SignerError> {
        if message_hash.to_bytes_be() >= MESSAGE_UPPER_BOUND_BE {
            return Err(SignerError::InvalidMessage(format!(
                "{message_hash:#x} is not below 2^251"
            )));
        }

        let scalar = self.scalar()?;
        let mut seed: Option<Felt> = None;

        loop {
            let k = rfc6979_generate_k(message_hash, &scalar, seed.as_ref());

            match ecdsa_sign(&scalar, message_hash, &k) {
                Ok(signature) => {
                    return Ok(Signature {
                        r: signature.r,
                        s: signature.s,
                    })
                }
                Err(SignError::InvalidMessageHash) => {
                    return Err(SignerError::InvalidMessage(format!(
                        "{message_hash:#x} rejected by the curve"
                    )))
                }
                Err(SignError::InvalidK) => {
                    seed = Some(seed.map_or(Felt::ONE, |prev| prev + Felt::ONE));
                }
            }
        }
    }

    /// Verifies a signature against this key pair's public key.
    pub fn verify(&self, message_hash: &Felt, signature: &Signature) -> Result<bool, SignerError> {
        verify_signature(&self.public_key, message_hash, signature)
    }

    fn scalar(&self) -> Result<Felt, SignerError> {
        Felt::from_bytes_be(&self.private_key).map_err(|e| SignerError::InvalidKey(e.to_string()))
    }
}

impl TransactionSigner for StarkKeyPair {
    fn public_identity(&self) -> Felt {
        self.public_key
    }

    fn sign_transaction_hash(&self, hash: &Felt) -> Result<Vec<Felt>, SignerError> {
        self.sign(hash).map(|signature| signature.to_vec())
    }
}

impl std::fmt::Debug for StarkKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StarkKeyPair")
            .field("public_key", &format_args!("{:#x}", self.public_key))
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

/// Verifies a Stark ECDSA signature over `message_hash`.
///
/// Out-of-range `r`/`s` values verify as `false`; an invalid public key or
/// message hash is an error.
pub fn verify_signature(
    public_key: &Felt,
    message_hash: &Felt,
    signature: &Signature,
) -> Result<bool, SignerError> {
    match ecdsa_verify(public_key, message_hash, &signature.r, &signature.s) {
        Ok(valid) => Ok(valid),
        Err(VerifyError::InvalidPublicKey) => Err(SignerError::InvalidKey(format!(
            "{public_key:#x} is not a curve point"
        ))),
        Err(VerifyError::InvalidMessageHash) => Err(SignerError::InvalidMessage(format!(
            "{message_hash:#x} is not below 2^251"
        ))),
        Err(VerifyError::InvalidR) | Err(VerifyError::InvalidS) => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE_PRIVATE_KEY: u128 = 123456789987654321;

    fn felt(hex: &str) -> Felt {
        Felt::from_hex_be(hex).unwrap()
    }

    #[test]
    fn fixture_public_key() {
        let key = StarkKeyPair::from_u128(FIXTURE_PRIVATE_KEY).unwrap();
        assert_eq!(
            key.public_key(),
            felt("0x4024999b9574cb7623679ce049a609db62a95098982c5b28ac61abdebd1c82b")
        );
    }

    #[test]
    fn known_public_key_vectors() {
        let key = StarkKeyPair::from_hex(
            "0x03c1e9550e66958296d11b60f8e8e7a7ad990d07fa65d5f7652c4a6c87d4e3cc",
        )
        .unwrap();
        assert_eq!(
            key.public_key(),
            felt("0x077a3b314db07c45076d11f62b6f9e748a39790441823307743cf00d6597ea43")
        );

        let key = StarkKeyPair::from_hex("12").unwrap();
        assert_eq!(
            key.public_key(),
            felt("0x019661066e96a8b9f06a1d136881ee924dfb6a885239caa5fd3f87a54c6b25c4")
        );
    }

    #[test]
    fn key_one_maps_to_generator_x() {
        let key = StarkKeyPair::from_u128(1).unwrap();
        assert_eq!(
            key.public_key(),
            felt("0x01ef15c18599971b7beced415a40f0c7deacfd9b0d1819e03d723d8bc943cfca")
        );
    }

    #[test]
    fn derivation_is_deterministic() {
        let a = StarkKeyPair::from_u128(FIXTURE_PRIVATE_KEY).unwrap();
        let b = StarkKeyPair::from_dec_str("123456789987654321").unwrap();
        let c = StarkKeyPair::from_hex(&format!("{:x}", FIXTURE_PRIVATE_KEY)).unwrap();
        assert_eq!(a.public_key(), b.public_key());
        assert_eq!(a.public_key(), c.public_key());
    }

    #[test]
    fn zero_key_rejected() {
        assert!(matches!(
            StarkKeyPair::from_u128(0),
            Err(SignerError::InvalidKey(_))
        ));
        assert!(StarkKeyPair::from_bytes_be(&[0u8; 32]).is_err());
    }

    #[test]
    fn curve_order_and_above_rejected() {
        assert!(StarkKeyPair::from_bytes_be(&CURVE_ORDER_BE).is_err());

        let mut above = CURVE_ORDER_BE;
        above[31] += 1;
        assert!(StarkKeyPair::from_bytes_be(&above).is_err());

        assert!(StarkKeyPair::from_bytes_be(&[0xff; 32]).is_err());
    }

    #[test]
    fn largest_valid_key_accepted() {
        let mut below = CURVE_ORDER_BE;
        below[31] -= 1;
        assert!(StarkKeyPair::from_bytes_be(&below).is_ok());
    }

    #[test]
    fn malformed_text_keys_rejected() {
        assert!(StarkKeyPair::from_hex("").is_err());
        assert!(StarkKeyPair::from_hex("0xnothex").is_err());
        assert!(StarkKeyPair::from_hex(&"1".repeat(65)).is_err());
        assert!(StarkKeyPair::from_dec_str("-5").is_err());
    }

    #[test]
    fn signing_is_reproducible() {
        let key = StarkKeyPair::from_u128(FIXTURE_PRIVATE_KEY).unwrap();
        let hash = felt("0x1632270af3505a397ddc5c7e6e7d545715622ca66e8911f5dc9919caaec41a2");

        let first = key.sign(&hash).unwrap();
        let second = key.sign(&hash).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn signature_verifies_against_public_key() {
        let key = StarkKeyPair::from_u128(FIXTURE_PRIVATE_KEY).unwrap();
        let hash = Felt::from(0xdead_beef_u64);
        let signature = key.sign(&hash).unwrap();

        assert!(key.verify(&hash, &signature).unwrap());
        assert!(!key.verify(&(hash + Felt::ONE), &signature).unwrap());
    }

    #[test]
    fn signature_does_not_verify_for_other_key() {
        let key = StarkKeyPair::from_u128(FIXTURE_PRIVATE_KEY).unwrap();
        let other = StarkKeyPair::from_u128(987654321123456789).unwrap();
        let hash = Felt::from(42u64);
        let signature = key.sign(&hash).unwrap();

        assert!(!verify_signature(&other.public_key(), &hash, &signature).unwrap());
    }

    #[test]
    fn different_messages_produce_different_signatures() {
        let key = StarkKeyPair::from_u128(FIXTURE_PRIVATE_KEY).unwrap();
        let a = key.sign(&Felt::from(1u64)).unwrap();
        let b = key.sign(&Felt::from(2u64)).unwrap();
        assert_ne!(a.r, b.r);
    }

    #[test]
    fn out_of_range_message_rejected() {
        let key = StarkKeyPair::from_u128(FIXTURE_PRIVATE_KEY).unwrap();
        let too_big = Felt::from_bytes_be(&MESSAGE_UPPER_BOUND_BE).unwrap();
        assert!(matches!(
            key.sign(&too_big),
            Err(SignerError::InvalidMessage(_))
        ));
    }

    #[test]
    fn random_keys_roundtrip() {
        use rand::RngCore;

        let mut rng = rand::thread_rng();
        for _ in 0..8 {
            let mut bytes = [0u8; 32];
            rng.fill_bytes(&mut bytes);
            // Clear the top bits so the scalar lands below the curve order.
            bytes[0] &= 0x07;

            let Ok(key) = StarkKeyPair::from_bytes_be(&bytes) else {
                continue;
            };
            let again = StarkKeyPair::from_bytes_be(&bytes).unwrap();
            assert_eq!(key.public_key(), again.public_key());

            let hash = Felt::from(rng.next_u64());
            let signature = key.sign(&hash).unwrap();
            assert!(key.verify(&hash, &signature).unwrap());
        }
    }

    #[test]
    fn key_pair_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<StarkKeyPair>();

        let key = std::sync::Arc::new(StarkKeyPair::from_u128(FIXTURE_PRIVATE_KEY).unwrap());
        let handles: Vec<_> = (0..4u64)
            .map(|i| {
                let key = std::sync::Arc::clone(&key);
                std::thread::spawn(move || key.sign(&Felt::from(i)).unwrap())
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let signature = handle.join().unwrap();
            assert_eq!(signature, key.sign(&Felt::from(i as u64)).unwrap());
        }
    }

    #[test]
    fn debug_output_redacts_private_key() {
        let key = StarkKeyPair::from_u128(FIXTURE_PRIVATE_KEY).unwrap();
        let debug = format!("{:?}", key);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("123456789987654321"));
    }

    #[test]
    fn signer_trait_returns_r_and_s() {
        let key = StarkKeyPair::from_u128(FIXTURE_PRIVATE_KEY).unwrap();
        let hash = Felt::from(7u64);
        let felts = key.sign_transaction_hash(&hash).unwrap();
        let signature = key.sign(&hash).unwrap();
        assert_eq!(felts, vec![signature.r, signature.s]);
        assert_eq!(key.public_identity(), key.public_key());
    }
}
