use serde::Serialize;
use stark_signer::felt::felt_to_hex;
use stark_signer::{Call, Felt, SignerError, StarkKeyPair, TransactionEncoder, TransactionSigner};
use tracing::{debug, info};

use crate::error::SendError;
use crate::executor::Executor;

/// Outcome of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Receipt {
    /// The signed digest: the invoke hash, or the message hash for single calls.
    pub transaction_hash: Felt,
    pub nonce: Felt,
    pub result: Vec<Felt>,
}

/// Signs transactions for one account and submits them to an executor.
pub struct AccountSender<'a, S: ?Sized, E: ?Sized> {
    signer: &'a S,
    executor: &'a E,
    account: Felt,
    encoder: TransactionEncoder,
}

impl<'a, S, E> AccountSender<'a, S, E>
where
    S: TransactionSigner + ?Sized,
    E: Executor + ?Sized,
{
    pub fn new(signer: &'a S, executor: &'a E, account: Felt, encoder: TransactionEncoder) -> Self {
        Self {
            signer,
            executor,
            account,
            encoder,
        }
    }

    pub fn account(&self) -> Felt {
        self.account
    }

    /// Sends one call to method `method` of `to` as a single-call batch.
    pub fn send_transaction(
        &self,
        to: Felt,
        method: &str,
        calldata: Vec<Felt>,
        nonce: Option<Felt>,
        max_fee: Felt,
    ) -> Result<Receipt, SendError> {
        let call = Call::new(to, method, calldata)?;
        self.send_transactions(&[call], nonce, max_fee)
    }

    /// Signs `calls` as one multicall and submits it.
    ///
    /// Without an explicit nonce the account's current nonce is fetched
    /// from the executor first. Nothing is retried.
    pub fn send_transactions(
        &self,
        calls: &[Call],
        nonce: Option<Felt>,
        max_fee: Felt,
    ) -> Result<Receipt, SendError> {
        if calls.is_empty() {
            return Err(SignerError::EmptyBatch.into());
        }
        let nonce = self.resolve_nonce(nonce)?;
        let transaction =
            self.encoder
                .build_multicall(self.signer, self.account, calls, nonce, max_fee)?;

        let result = self.executor.execute_multicall(&transaction)?;

        info!(
            account = %felt_to_hex(&self.account),
            calls = calls.len(),
            transaction_hash = %felt_to_hex(&transaction.transaction_hash),
            "multicall accepted"
        );

        Ok(Receipt {
            transaction_hash: transaction.transaction_hash,
            nonce,
            result,
        })
    }

    fn resolve_nonce(&self, nonce: Option<Felt>) -> Result<Felt, SendError> {
        match nonce {
            Some(nonce) => Ok(nonce),
            None => {
                let nonce = self.executor.get_nonce(&self.account)?;
                debug!(
                    account = %felt_to_hex(&self.account),
                    nonce = %felt_to_hex(&nonce),
                    "fetched nonce"
                );
                Ok(nonce)
            }
        }
    }
}

impl<'a, E> AccountSender<'a, StarkKeyPair, E>
where
    E: Executor + ?Sized,
{
    /// Signs a single call by its message hash and submits it with
    /// [`Executor::execute`].
    pub fn send_legacy_call(
        &self,
        to: Felt,
        method: &str,
        calldata: &[Felt],
        nonce: Option<Felt>,
    ) -> Result<Receipt, SendError> {
        let nonce = self.resolve_nonce(nonce)?;
        let call = self
            .encoder
            .build_transaction(self.signer, self.account, to, method, calldata, nonce)?;

        let result = self.executor.execute(&call)?;

        info!(
            account = %felt_to_hex(&self.account),
            method,
            message_hash = %felt_to_hex(&call.message_hash),
            "call accepted"
        );

        Ok(Receipt {
            transaction_hash: call.message_hash,
            nonce,
            result,
        })
    }
}
