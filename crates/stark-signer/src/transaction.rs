//! Building signed transactions.
//!
//! - a single call authenticated by [`hash_message`], signed with a Stark key
//!   ([`TransactionEncoder::build_transaction`])
//! - a version 0 invoke of the account's `__execute__` entry point carrying a
//!   batch of calls ([`TransactionEncoder::build_multicall`])
//! - a version 1 declare of a contract class
//!   ([`TransactionEncoder::build_declare`])
//! - a version 1 deploy-account of an account class
//!   ([`TransactionEncoder::build_deploy_account`])
//!
//! All but the first are signed by any [`TransactionSigner`] over a hash
//! built by [`TransactionEncoder::hash_with_prefix`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::call::{execute_calldata, flatten_calls, Call, CallArrayEntry};
use crate::error::SignerError;
use crate::felt::{felt_to_hex, parse_felt, short_string_to_felt, Felt};
use crate::hash::{hash_message, hash_on_elements};
use crate::key_pair::{Signature, StarkKeyPair};
use crate::selector::{selector_from_name, EXECUTE_ENTRY_POINT_NAME};
use crate::signer::TransactionSigner;

/// Invoke transaction version covered by [`TransactionEncoder::transaction_hash`].
pub const TRANSACTION_VERSION: u64 = 0;

/// Version of declare and deploy-account transactions, which carry a nonce.
pub const NONCE_TRANSACTION_VERSION: u64 = 1;

/// Short-string prefix of invoke transaction hashes.
pub const INVOKE_PREFIX: &str = "invoke";

/// Kind of transaction a hash commits to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionHashPrefix {
    Invoke,
    Declare,
    DeployAccount,
}

impl TransactionHashPrefix {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionHashPrefix::Invoke => INVOKE_PREFIX,
            TransactionHashPrefix::Declare => "declare",
            TransactionHashPrefix::DeployAccount => "deploy_account",
        }
    }

    pub fn as_felt(&self) -> Result<Felt, SignerError> {
        short_string_to_felt(self.as_str())
    }

    /// Transaction version hashed under this prefix.
    pub fn version(&self) -> u64 {
        match self {
            TransactionHashPrefix::Invoke => TRANSACTION_VERSION,
            TransactionHashPrefix::Declare | TransactionHashPrefix::DeployAccount => {
                NONCE_TRANSACTION_VERSION
            }
        }
    }
}

/// Network a multicall transaction is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChainId {
    /// `SN_MAIN`
    Mainnet,
    /// `SN_GOERLI`
    #[default]
    Testnet,
    /// Any other chain identifier.
    Custom(Felt),
}

impl ChainId {
    pub fn as_felt(&self) -> Result<Felt, SignerError> {
        match self {
            ChainId::Mainnet => short_string_to_felt("SN_MAIN"),
            ChainId::Testnet => short_string_to_felt("SN_GOERLI"),
            ChainId::Custom(id) => Ok(*id),
        }
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainId::Mainnet => f.write_str("mainnet"),
            ChainId::Testnet => f.write_str("testnet"),
            ChainId::Custom(id) => write!(f, "{id:#x}"),
        }
    }
}

impl FromStr for ChainId {
    type Err = SignerError;

    /// Accepts `mainnet`, `testnet`, the `SN_*` names, a numeric felt or any
    /// other short string.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "mainnet" | "SN_MAIN" => Ok(ChainId::Mainnet),
            "testnet" | "goerli" | "SN_GOERLI" => Ok(ChainId::Testnet),
            _ if s.starts_with("0x") || s.chars().all(|c| c.is_ascii_digit()) => {
                parse_felt(s).map(ChainId::Custom)
            }
            _ => short_string_to_felt(s).map(ChainId::Custom),
        }
    }
}

/// A single call signed with a Stark key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedCall {
    pub sender: Felt,
    pub to: Felt,
    pub selector: Felt,
    pub calldata: Vec<Felt>,
    pub nonce: Felt,
    pub message_hash: Felt,
    pub signature: Signature,
}

/// A batch of calls executed through an account's `__execute__`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedMultiCall {
    pub sender: Felt,
    pub call_array: Vec<CallArrayEntry>,
    pub calldata: Vec<Felt>,
    pub nonce: Felt,
    pub max_fee: Felt,
    pub transaction_hash: Felt,
    pub signature: Vec<Felt>,
}

impl SignedMultiCall {
    /// Arguments passed to the account's `__execute__` entry point.
    pub fn execute_calldata(&self) -> Vec<Felt> {
        execute_calldata(&self.call_array, &self.calldata, &self.nonce)
    }
}

/// A signed declaration of a contract class by `sender`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedDeclare {
    pub sender: Felt,
    pub class_hash: Felt,
    pub nonce: Felt,
    pub max_fee: Felt,
    pub transaction_hash: Felt,
    pub signature: Vec<Felt>,
}

/// A signed deployment of an account contract at `contract_address`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedDeployAccount {
    pub contract_address: Felt,
    pub class_hash: Felt,
    pub salt: Felt,
    pub constructor_calldata: Vec<Felt>,
    pub nonce: Felt,
    pub max_fee: Felt,
    pub transaction_hash: Felt,
    pub signature: Vec<Felt>,
}

/// Hashes and signs transactions for one network.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionEncoder {
    chain_id: ChainId,
}

impl TransactionEncoder {
    pub fn new(chain_id: ChainId) -> Self {
        Self { chain_id }
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    /// Resolves `selector_name`, hashes the call with [`hash_message`] and
    /// signs the digest.
    ///
    /// The chain id does not take part in this digest.
    pub fn build_transaction(
        &self,
        key_pair: &StarkKeyPair,
        account: Felt,
        to: Felt,
        selector_name: &str,
        calldata: &[Felt],
        nonce: Felt,
    ) -> Result<SignedCall, SignerError> {
        let selector = selector_from_name(selector_name)?;
        let message_hash = hash_message(&to, &selector, calldata, &account, &nonce);
        let signature = key_pair.sign(&message_hash)?;

        debug!(
            account = %felt_to_hex(&account),
            to = %felt_to_hex(&to),
            selector = selector_name,
            nonce = %felt_to_hex(&nonce),
            message_hash = %felt_to_hex(&message_hash),
            "signed call"
        );

        Ok(SignedCall {
            sender: account,
            to,
            selector,
            calldata: calldata.to_vec(),
            nonce,
            message_hash,
            signature,
        })
    }

    /// The common transaction hash:
    ///
    /// `hash_on_elements([prefix, version, address, entry_point_selector,
    /// hash_on_elements(calldata), max_fee, chain_id, ...additional_data])`
    pub fn hash_with_prefix(
        &self,
        prefix: TransactionHashPrefix,
        address: &Felt,
        entry_point_selector: &Felt,
        calldata: &[Felt],
        max_fee: &Felt,
        additional_data: &[Felt],
    ) -> Result<Felt, SignerError> {
        let mut elements = vec![
            prefix.as_felt()?,
            Felt::from(prefix.version()),
            *address,
            *entry_point_selector,
            hash_on_elements(calldata),
            *max_fee,
            self.chain_id.as_felt()?,
        ];
        elements.extend_from_slice(additional_data);

        Ok(hash_on_elements(&elements))
    }

    /// The version 0 invoke hash of an `__execute__` call. The nonce is
    /// the last element of the execute calldata.
    pub fn transaction_hash(
        &self,
        account: &Felt,
        call_array: &[CallArrayEntry],
        calldata: &[Felt],
        nonce: &Felt,
        max_fee: &Felt,
    ) -> Result<Felt, SignerError> {
        self.hash_with_prefix(
            TransactionHashPrefix::Invoke,
            account,
            &selector_from_name(EXECUTE_ENTRY_POINT_NAME)?,
            &execute_calldata(call_array, calldata, nonce),
            max_fee,
            &[],
        )
    }

    /// Hash of declaring `class_hash` from `sender`: calldata `[class_hash]`,
    /// nonce as additional data.
    pub fn declare_hash(
        &self,
        sender: &Felt,
        class_hash: &Felt,
        nonce: &Felt,
        max_fee: &Felt,
    ) -> Result<Felt, SignerError> {
        self.hash_with_prefix(
            TransactionHashPrefix::Declare,
            sender,
            &Felt::ZERO,
            &[*class_hash],
            max_fee,
            &[*nonce],
        )
    }

    /// Hash of deploying an account at `contract_address`: calldata
    /// `[class_hash, salt, ...constructor_calldata]`, nonce as additional
    /// data.
    pub fn deploy_account_hash(
        &self,
        contract_address: &Felt,
        class_hash: &Felt,
        salt: &Felt,
        constructor_calldata: &[Felt],
        nonce: &Felt,
        max_fee: &Felt,
    ) -> Result<Felt, SignerError> {
        let mut calldata = Vec::with_capacity(2 + constructor_calldata.len());
        calldata.push(*class_hash);
        calldata.push(*salt);
        calldata.extend_from_slice(constructor_calldata);

        self.hash_with_prefix(
            TransactionHashPrefix::DeployAccount,
            contract_address,
            &Felt::ZERO,
            &calldata,
            max_fee,
            &[*nonce],
        )
    }

    /// Signs the declaration of `class_hash` by `sender`.
    pub fn build_declare<S>(
        &self,
        signer: &S,
        sender: Felt,
        class_hash: Felt,
        nonce: Felt,
        max_fee: Felt,
    ) -> Result<SignedDeclare, SignerError>
    where
        S: TransactionSigner + ?Sized,
    {
        let transaction_hash = self.declare_hash(&sender, &class_hash, &nonce, &max_fee)?;
        let signature = signer.sign_transaction_hash(&transaction_hash)?;

        debug!(
            sender = %felt_to_hex(&sender),
            class_hash = %felt_to_hex(&class_hash),
            transaction_hash = %felt_to_hex(&transaction_hash),
            "signed declare"
        );

        Ok(SignedDeclare {
            sender,
            class_hash,
            nonce,
            max_fee,
            transaction_hash,
            signature,
        })
    }

    /// Signs the deployment of an account of class `class_hash` at
    /// `contract_address`.
    #[allow(clippy::too_many_arguments)]
    pub fn build_deploy_account<S>(
        &self,
        signer: &S,
        contract_address: Felt,
        class_hash: Felt,
        salt: Felt,
        constructor_calldata: &[Felt],
        nonce: Felt,
        max_fee: Felt,
    ) -> Result<SignedDeployAccount, SignerError>
    where
        S: TransactionSigner + ?Sized,
    {
        let transaction_hash = self.deploy_account_hash(
            &contract_address,
            &class_hash,
            &salt,
            constructor_calldata,
            &nonce,
            &max_fee,
        )?;
        let signature = signer.sign_transaction_hash(&transaction_hash)?;

        debug!(
            contract_address = %felt_to_hex(&contract_address),
            class_hash = %felt_to_hex(&class_hash),
            transaction_hash = %felt_to_hex(&transaction_hash),
            "signed deploy account"
        );

        Ok(SignedDeployAccount {
            contract_address,
            class_hash,
            salt,
            constructor_calldata: constructor_calldata.to_vec(),
            nonce,
            max_fee,
            transaction_hash,
            signature,
        })
    }

    /// Flattens `calls`, hashes the resulting invoke and signs it.
    ///
    /// An empty batch is rejected before anything is hashed.
    pub fn build_multicall<S>(
        &self,
        signer: &S,
        account: Felt,
        calls: &[Call],
        nonce: Felt,
        max_fee: Felt,
    ) -> Result<SignedMultiCall, SignerError>
    where
        S: TransactionSigner + ?Sized,
    {
        if calls.is_empty() {
            return Err(SignerError::EmptyBatch);
        }

        let (call_array, calldata) = flatten_calls(calls);
        let transaction_hash =
            self.transaction_hash(&account, &call_array, &calldata, &nonce, &max_fee)?;
        let signature = signer.sign_transaction_hash(&transaction_hash)?;

        debug!(
            account = %felt_to_hex(&account),
            calls = calls.len(),
            nonce = %felt_to_hex(&nonce),
            chain_id = %self.chain_id,
            transaction_hash = %felt_to_hex(&transaction_hash),
            "signed multicall"
        );

        Ok(SignedMultiCall {
            sender: account,
            call_array,
            calldata,
            nonce,
            max_fee,
            transaction_hash,
            signature,
        })
    }
}
