use stark_signer::{Felt, SignedCall, SignedMultiCall};

use crate::error::ExecutionError;

/// An environment that holds account nonces and executes signed
/// transactions.
///
/// Implementations check the signature and nonce before running anything.
/// On success the account nonce advances by one and the concatenated call
/// results are returned.
pub trait Executor {
    /// The nonce the next transaction from `account` must carry.
    fn get_nonce(&self, account: &Felt) -> Result<Felt, ExecutionError>;

    /// Executes a single call authenticated by its message hash.
    fn execute(&self, call: &SignedCall) -> Result<Vec<Felt>, ExecutionError>;

    /// Executes a batch of calls through the account's `__execute__`.
    fn execute_multicall(&self, transaction: &SignedMultiCall)
        -> Result<Vec<Felt>, ExecutionError>;
}

impl<E: Executor + ?Sized> Executor for &E {
    fn get_nonce(&self, account: &Felt) -> Result<Felt, ExecutionError> {
        (**self).get_nonce(account)
    }

    fn execute(&self, call: &SignedCall) -> Result<Vec<Felt>, ExecutionError> {
        (**self).execute(call)
    }

    fn execute_multicall(
        &self,
        transaction: &SignedMultiCall,
    ) -> Result<Vec<Felt>, ExecutionError> {
        (**self).execute_multicall(transaction)
    }
}
