//! cairo-dev CLI
//!
//! Installs the Cairo compiler, compiles contracts and signs Starknet
//! transactions from the command line.

mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use secrecy::{ExposeSecret, SecretString};
use stark_signer::felt::{felt_to_hex, parse_felt};
use stark_signer::selector::selector_from_name;
use stark_signer::{Call, ChainId, Felt, StarkKeyPair, TransactionEncoder};
use toolchain::{Installer, StarknetCompiler, ToolchainConfig};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::CliError;

/// Environment variable holding the Stark private key.
const PRIVATE_KEY_VAR: &str = "STARK_PRIVATE_KEY";

#[derive(Parser)]
#[command(name = "cairo-dev")]
#[command(about = "Compile Cairo contracts and sign Starknet transactions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a JSON config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Install a cairo-lang release with pip
    Install {
        /// Release version, e.g. 0.4.0
        version: String,
    },

    /// Compile contracts (all contracts when no path is given)
    Compile {
        paths: Vec<PathBuf>,

        /// Include debug info with source in the artifacts
        #[arg(long)]
        debug: bool,
    },

    /// Remove the build directory
    Clean,

    /// Print the selector of an entry point name
    Selector { name: String },

    /// Print the public key of STARK_PRIVATE_KEY
    Pubkey,

    /// Sign a single call by its message hash
    Sign {
        #[command(flatten)]
        call: CallArgs,
    },

    /// Sign a single call as an `__execute__` invoke transaction
    Invoke {
        #[command(flatten)]
        call: CallArgs,

        /// Maximum fee
        #[arg(long, default_value = "0")]
        max_fee: String,

        /// Network: mainnet, testnet or a custom chain id
        #[arg(short, long, default_value = "testnet")]
        network: String,
    },

    /// Sign the declaration of a contract class
    Declare {
        /// Declaring account address
        #[arg(long)]
        account: String,

        /// Hash of the class to declare
        #[arg(long)]
        class_hash: String,

        #[command(flatten)]
        tx: TxArgs,
    },

    /// Sign the deployment of an account contract
    DeployAccount {
        /// Address the account will be deployed at
        #[arg(long)]
        address: String,

        /// Hash of the account class
        #[arg(long)]
        class_hash: String,

        /// Address salt
        #[arg(long, default_value = "0")]
        salt: String,

        /// Constructor arguments (decimal or 0x hex)
        #[arg(long, num_args = 0.., value_delimiter = ',')]
        constructor_calldata: Vec<String>,

        #[command(flatten)]
        tx: TxArgs,
    },
}

#[derive(clap::Args)]
struct TxArgs {
    /// Account nonce
    #[arg(long, default_value = "0")]
    nonce: String,

    /// Maximum fee
    #[arg(long, default_value = "0")]
    max_fee: String,

    /// Network: mainnet, testnet or a custom chain id
    #[arg(short, long, default_value = "testnet")]
    network: String,
}

impl TxArgs {
    fn encoder(&self) -> Result<TransactionEncoder, CliError> {
        Ok(TransactionEncoder::new(self.network.parse()?))
    }
}

#[derive(clap::Args)]
struct CallArgs {
    /// Sending account address
    #[arg(long)]
    account: String,

    /// Target contract address
    #[arg(long)]
    to: String,

    /// Entry point name
    #[arg(long)]
    method: String,

    /// Call arguments (decimal or 0x hex)
    #[arg(long, num_args = 0.., value_delimiter = ',')]
    calldata: Vec<String>,

    /// Account nonce
    #[arg(long, default_value = "0")]
    nonce: String,
}

struct ParsedCall {
    account: Felt,
    to: Felt,
    calldata: Vec<Felt>,
    nonce: Felt,
}

impl CallArgs {
    fn parse(&self) -> Result<ParsedCall, CliError> {
        Ok(ParsedCall {
            account: parse_felt(&self.account)?,
            to: parse_felt(&self.to)?,
            calldata: self
                .calldata
                .iter()
                .map(|value| parse_felt(value))
                .collect::<Result<_, _>>()?,
            nonce: parse_felt(&self.nonce)?,
        })
    }
}

fn main() -> ExitCode {
    // Load .env file if present (ignore if not found)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = ToolchainConfig::load_or_default(cli.config.as_deref())?.with_env_overrides();

    match cli.command {
        Commands::Install { version } => {
            Installer::new(config).install(&version)?;
        }
        Commands::Compile { paths, debug } => {
            let compiled = StarknetCompiler::new(config).compile_all(&paths, debug)?;
            for contract in &compiled {
                println!("{} -> {}", contract.name, contract.artifact_path.display());
            }
        }
        Commands::Clean => {
            if !toolchain::clean(&config.build_dir)? {
                tracing::info!(dir = %config.build_dir.display(), "nothing to clean");
            }
        }
        Commands::Selector { name } => {
            println!("{}", felt_to_hex(&selector_from_name(&name)?));
        }
        Commands::Pubkey => {
            let key_pair = load_key_pair()?;
            println!("{}", felt_to_hex(&key_pair.public_key()));
        }
        Commands::Sign { call } => {
            let key_pair = load_key_pair()?;
            let parsed = call.parse()?;
            let signed = TransactionEncoder::default().build_transaction(
                &key_pair,
                parsed.account,
                parsed.to,
                &call.method,
                &parsed.calldata,
                parsed.nonce,
            )?;
            println!("{}", serde_json::to_string_pretty(&signed)?);
        }
        Commands::Invoke {
            call,
            max_fee,
            network,
        } => {
            let key_pair = load_key_pair()?;
            let parsed = call.parse()?;
            let chain_id: ChainId = network.parse()?;
            let calls = [Call::new(parsed.to, &call.method, parsed.calldata)?];
            let signed = TransactionEncoder::new(chain_id).build_multicall(
                &key_pair,
                parsed.account,
                &calls,
                parsed.nonce,
                parse_felt(&max_fee)?,
            )?;
            println!("{}", serde_json::to_string_pretty(&signed)?);
        }
        Commands::Declare {
            account,
            class_hash,
            tx,
        } => {
            let key_pair = load_key_pair()?;
            let signed = tx.encoder()?.build_declare(
                &key_pair,
                parse_felt(&account)?,
                parse_felt(&class_hash)?,
                parse_felt(&tx.nonce)?,
                parse_felt(&tx.max_fee)?,
            )?;
            println!("{}", serde_json::to_string_pretty(&signed)?);
        }
        Commands::DeployAccount {
            address,
            class_hash,
            salt,
            constructor_calldata,
            tx,
        } => {
            let key_pair = load_key_pair()?;
            let constructor_calldata = constructor_calldata
                .iter()
                .map(|value| parse_felt(value))
                .collect::<Result<Vec<_>, _>>()?;
            let signed = tx.encoder()?.build_deploy_account(
                &key_pair,
                parse_felt(&address)?,
                parse_felt(&class_hash)?,
                parse_felt(&salt)?,
                &constructor_calldata,
                parse_felt(&tx.nonce)?,
                parse_felt(&tx.max_fee)?,
            )?;
            println!("{}", serde_json::to_string_pretty(&signed)?);
        }
    }

    Ok(())
}

fn load_key_pair() -> Result<StarkKeyPair, CliError> {
    let secret = std::env::var(PRIVATE_KEY_VAR)
        .map(SecretString::from)
        .map_err(|_| CliError::MissingKey(PRIVATE_KEY_VAR))?;

    let value = secret.expose_secret().trim();
    let key_pair = if value.starts_with("0x") || value.starts_with("0X") {
        StarkKeyPair::from_hex(value)?
    } else {
        StarkKeyPair::from_dec_str(value)?
    };

    tracing::debug!(public_key = %felt_to_hex(&key_pair.public_key()), "loaded key");
    Ok(key_pair)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_sign_arguments() {
        let cli = Cli::try_parse_from([
            "cairo-dev",
            "sign",
            "--account",
            "0x456",
            "--to",
            "0x123",
            "--method",
            "transfer_ownership",
            "--calldata",
            "123",
        ])
        .unwrap();

        let Commands::Sign { call } = cli.command else {
            panic!("expected sign command");
        };
        let parsed = call.parse().unwrap();
        assert_eq!(parsed.account, Felt::from(0x456u64));
        assert_eq!(parsed.calldata, vec![Felt::from(123u8)]);
        assert_eq!(parsed.nonce, Felt::ZERO);
    }

    #[test]
    fn parses_compile_paths_and_flags() {
        let cli = Cli::try_parse_from([
            "cairo-dev",
            "-v",
            "compile",
            "contracts/Account.cairo",
            "contracts/ERC20.cairo",
            "--debug",
        ])
        .unwrap();

        assert!(cli.verbose);
        let Commands::Compile { paths, debug } = cli.command else {
            panic!("expected compile command");
        };
        assert_eq!(paths.len(), 2);
        assert!(debug);
    }

    #[test]
    fn parses_deploy_account_arguments() {
        let cli = Cli::try_parse_from([
            "cairo-dev",
            "deploy-account",
            "--address",
            "0x789",
            "--class-hash",
            "0x1234",
            "--salt",
            "5",
            "--constructor-calldata",
            "0xabc,7",
            "--nonce",
            "3",
            "-n",
            "mainnet",
        ])
        .unwrap();

        let Commands::DeployAccount {
            constructor_calldata,
            tx,
            ..
        } = cli.command
        else {
            panic!("expected deploy-account command");
        };
        assert_eq!(constructor_calldata, vec!["0xabc", "7"]);
        assert_eq!(tx.nonce, "3");
        assert_eq!(tx.encoder().unwrap().chain_id(), ChainId::Mainnet);
    }

    #[test]
    fn rejects_bad_calldata() {
        let cli = Cli::try_parse_from([
            "cairo-dev", "sign", "--account", "1", "--to", "2", "--method", "f", "--calldata",
            "not-a-number",
        ])
        .unwrap();

        let Commands::Sign { call } = cli.command else {
            panic!("expected sign command");
        };
        assert!(call.parse().is_err());
    }
}
