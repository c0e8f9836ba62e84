//! An in-process execution environment.
//!
//! Accounts and contracts live in a map keyed by address. Contracts are
//! plain Rust values implementing [`ContractHandler`]; they own their state
//! and see the calling account for every invocation.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use stark_signer::call::unflatten_calls;
use stark_signer::eth::recover_eth_address;
use stark_signer::felt::felt_to_hex;
use stark_signer::hash::hash_message;
use stark_signer::key_pair::verify_signature;
use stark_signer::{
    Call, ChainId, Felt, Signature, SignedCall, SignedMultiCall, TransactionEncoder,
};
use tracing::{debug, info, warn};

use crate::error::ExecutionError;
use crate::executor::Executor;

/// First address handed out by [`MemoryExecutor`].
const FIRST_ADDRESS: u64 = 0x1000;

/// A deployed contract.
pub trait ContractHandler: Send {
    /// Runs the entry point `selector`. An `Err` reverts with that reason.
    fn call(&mut self, caller: Felt, selector: Felt, calldata: &[Felt]) -> Result<Vec<Felt>, String>;
}

/// How an account authenticates its transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountAuth {
    /// Stark ECDSA against a stored public key.
    Stark(Felt),
    /// secp256k1 ECDSA against a stored Ethereum address.
    Eth(Felt),
}

#[derive(Debug)]
struct Account {
    auth: AccountAuth,
    nonce: Felt,
}

#[derive(Default)]
struct State {
    accounts: HashMap<Felt, Account>,
    contracts: HashMap<Felt, Box<dyn ContractHandler>>,
    next_address: u64,
}

impl State {
    fn allocate_address(&mut self) -> Felt {
        let address = Felt::from(FIRST_ADDRESS + self.next_address);
        self.next_address += 1;
        address
    }

    fn account(&self, address: &Felt) -> Result<&Account, ExecutionError> {
        self.accounts
            .get(address)
            .ok_or(ExecutionError::UnknownAccount(*address))
    }

    fn check_nonce(&self, address: &Felt, actual: &Felt) -> Result<(), ExecutionError> {
        let expected = self.account(address)?.nonce;
        if expected != *actual {
            warn!(
                account = %felt_to_hex(address),
                expected = %felt_to_hex(&expected),
                actual = %felt_to_hex(actual),
                "rejected stale nonce"
            );
            return Err(ExecutionError::StaleNonce {
                expected,
                actual: *actual,
            });
        }
        Ok(())
    }

    fn bump_nonce(&mut self, address: &Felt) {
        if let Some(account) = self.accounts.get_mut(address) {
            account.nonce += Felt::ONE;
        }
    }

    /// Consumes the nonce of a transaction that passed validation, whether
    /// or not it executed.
    fn settle<T>(
        &mut self,
        address: &Felt,
        result: Result<T, ExecutionError>,
    ) -> Result<T, ExecutionError> {
        self.bump_nonce(address);
        if let Err(e) = &result {
            warn!(account = %felt_to_hex(address), error = %e, "reverted transaction consumed nonce");
        }
        result
    }

    fn dispatch(
        &mut self,
        caller: Felt,
        to: Felt,
        selector: Felt,
        calldata: &[Felt],
    ) -> Result<Vec<Felt>, ExecutionError> {
        let contract = self
            .contracts
            .get_mut(&to)
            .ok_or(ExecutionError::UnknownContract(to))?;

        contract.call(caller, selector, calldata).map_err(|reason| {
            warn!(
                contract = %felt_to_hex(&to),
                selector = %felt_to_hex(&selector),
                %reason,
                "call reverted"
            );
            ExecutionError::Reverted { reason }
        })
    }

    fn dispatch_all(&mut self, caller: Felt, calls: &[Call]) -> Result<Vec<Felt>, ExecutionError> {
        let mut result = Vec::new();
        for call in calls {
            result.extend(self.dispatch(caller, call.to, call.selector, &call.calldata)?);
        }
        Ok(result)
    }
}

/// A simulated chain holding accounts, nonces and contracts in memory.
///
/// All state sits behind a mutex so one executor can be shared across
/// threads.
pub struct MemoryExecutor {
    encoder: TransactionEncoder,
    state: Mutex<State>,
}

impl MemoryExecutor {
    /// Creates an empty chain identified by `chain_id`.
    pub fn new(chain_id: ChainId) -> Self {
        Self {
            encoder: TransactionEncoder::new(chain_id),
            state: Mutex::new(State::default()),
        }
    }

    pub fn chain_id(&self) -> ChainId {
        self.encoder.chain_id()
    }

    /// Deploys an account controlled by a Stark public key.
    pub fn deploy_account(&self, public_key: Felt) -> Result<Felt, ExecutionError> {
        self.insert_account(AccountAuth::Stark(public_key))
    }

    /// Deploys an account controlled by an Ethereum address.
    pub fn deploy_eth_account(&self, eth_address: Felt) -> Result<Felt, ExecutionError> {
        self.insert_account(AccountAuth::Eth(eth_address))
    }

    /// Deploys a contract and returns its address.
    pub fn deploy_contract<H>(&self, handler: H) -> Result<Felt, ExecutionError>
    where
        H: ContractHandler + 'static,
    {
        let mut state = self.state()?;
        let address = state.allocate_address();
        state.contracts.insert(address, Box::new(handler));

        info!(address = %felt_to_hex(&address), "deployed contract");
        Ok(address)
    }

    /// The current nonce of `account`.
    pub fn nonce_of(&self, account: &Felt) -> Result<Felt, ExecutionError> {
        Ok(self.state()?.account(account)?.nonce)
    }

    /// How `account` authenticates transactions.
    pub fn auth_of(&self, account: &Felt) -> Result<AccountAuth, ExecutionError> {
        Ok(self.state()?.account(account)?.auth)
    }

    fn insert_account(&self, auth: AccountAuth) -> Result<Felt, ExecutionError> {
        let mut state = self.state()?;
        let address = state.allocate_address();
        state.accounts.insert(
            address,
            Account {
                auth,
                nonce: Felt::ZERO,
            },
        );

        info!(address = %felt_to_hex(&address), ?auth, "deployed account");
        Ok(address)
    }

    fn state(&self) -> Result<MutexGuard<'_, State>, ExecutionError> {
        self.state
            .lock()
            .map_err(|_| ExecutionError::Transport("executor state lock poisoned".into()))
    }
}

impl Default for MemoryExecutor {
    fn default() -> Self {
        Self::new(ChainId::default())
    }
}

impl Executor for MemoryExecutor {
    fn get_nonce(&self, account: &Felt) -> Result<Felt, ExecutionError> {
        self.nonce_of(account)
    }

    fn execute(&self, call: &SignedCall) -> Result<Vec<Felt>, ExecutionError> {
        let mut state = self.state()?;

        let AccountAuth::Stark(public_key) = state.account(&call.sender)?.auth else {
            return Err(ExecutionError::InvalidSignature);
        };

        let expected_hash = hash_message(
            &call.to,
            &call.selector,
            &call.calldata,
            &call.sender,
            &call.nonce,
        );
        if expected_hash != call.message_hash
            || !verify_stark(&public_key, &expected_hash, &call.signature)
        {
            return Err(ExecutionError::InvalidSignature);
        }

        state.check_nonce(&call.sender, &call.nonce)?;

        debug!(
            account = %felt_to_hex(&call.sender),
            message_hash = %felt_to_hex(&call.message_hash),
            "executing call"
        );
        let result = state.dispatch(call.sender, call.to, call.selector, &call.calldata);
        state.settle(&call.sender, result)
    }

    fn execute_multicall(
        &self,
        transaction: &SignedMultiCall,
    ) -> Result<Vec<Felt>, ExecutionError> {
        let mut state = self.state()?;
        let auth = state.account(&transaction.sender)?.auth;

        let expected_hash = self
            .encoder
            .transaction_hash(
                &transaction.sender,
                &transaction.call_array,
                &transaction.calldata,
                &transaction.nonce,
                &transaction.max_fee,
            )
            .map_err(|e| ExecutionError::Reverted {
                reason: e.to_string(),
            })?;

        let authorized = expected_hash == transaction.transaction_hash
            && match auth {
                AccountAuth::Stark(public_key) => match transaction.signature.as_slice() {
                    [r, s] => verify_stark(&public_key, &expected_hash, &Signature { r: *r, s: *s }),
                    _ => false,
                },
                AccountAuth::Eth(address) => {
                    recover_eth_address(&expected_hash, &transaction.signature)
                        .is_ok_and(|recovered| recovered == address)
                }
            };
        if !authorized {
            return Err(ExecutionError::InvalidSignature);
        }

        state.check_nonce(&transaction.sender, &transaction.nonce)?;

        let result = unflatten_calls(&transaction.call_array, &transaction.calldata)
            .map_err(|e| ExecutionError::Reverted {
                reason: e.to_string(),
            })
            .and_then(|calls| {
                debug!(
                    account = %felt_to_hex(&transaction.sender),
                    calls = calls.len(),
                    transaction_hash = %felt_to_hex(&transaction.transaction_hash),
                    "executing multicall"
                );
                state.dispatch_all(transaction.sender, &calls)
            });
        state.settle(&transaction.sender, result)
    }
}

fn verify_stark(public_key: &Felt, hash: &Felt, signature: &Signature) -> bool {
    verify_signature(public_key, hash, signature).unwrap_or(false)
}
