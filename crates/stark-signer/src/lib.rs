//! Starknet transaction hashing and signing.
//!
//! This crate provides:
//! - Field element helpers (parsing, short strings, uint256 halves)
//! - Entry-point selectors from method names (`starknet_keccak`)
//! - Pedersen hash chains over call data and transactions
//! - Stark curve key pairs with deterministic RFC 6979 signing
//! - secp256k1 signing for Ethereum-keyed accounts
//! - Single-call and multicall transaction building

pub mod call;
pub mod error;
pub mod eth;
pub mod felt;
pub mod hash;
pub mod key_pair;
pub mod selector;
pub mod signer;
pub mod transaction;

pub use call::{Call, CallArrayEntry};
pub use error::SignerError;
pub use eth::EthKeyPair;
pub use felt::Felt;
pub use key_pair::{Signature, StarkKeyPair};
pub use signer::TransactionSigner;
pub use transaction::{
    ChainId, SignedCall, SignedDeclare, SignedDeployAccount, SignedMultiCall, TransactionEncoder,
    TransactionHashPrefix,
};
