//! Account-level transaction submission.
//!
//! [`AccountSender`] signs calls for an account and hands them to an
//! [`Executor`]. [`MemoryExecutor`] is an in-memory chain that checks
//! signatures and nonces before dispatching to Rust contract handlers.

pub mod error;
pub mod executor;
pub mod memory;
pub mod sender;

pub use error::{ExecutionError, SendError};
pub use executor::Executor;
pub use memory::{AccountAuth, ContractHandler, MemoryExecutor};
pub use sender::{AccountSender, Receipt};
