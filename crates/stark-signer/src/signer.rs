use crate::error::SignerError;
use crate::felt::Felt;

/// Anything that can authorize a transaction hash for an account.
///
/// Stark accounts identify their owner by the Stark public key; Ethereum
/// accounts by the 160-bit address of the secp256k1 key.
pub trait TransactionSigner {
    /// The value an account contract stores to recognise this signer.
    fn public_identity(&self) -> Felt;

    /// Signs a transaction hash, returning the felts placed in the
    /// transaction's signature field.
    fn sign_transaction_hash(&self, hash: &Felt) -> Result<Vec<Felt>, SignerError>;
}
