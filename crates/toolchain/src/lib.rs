//! Cairo project tooling: installing the compiler, compiling contracts and
//! cleaning build output.

pub mod clean;
pub mod compiler;
pub mod config;
pub mod error;
pub mod installer;
mod process;

pub use clean::clean;
pub use compiler::{CompiledContract, StarknetCompiler};
pub use config::ToolchainConfig;
pub use error::ToolchainError;
pub use installer::Installer;
