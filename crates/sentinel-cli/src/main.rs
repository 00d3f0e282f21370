//! CryptoSentinel CLI - connect a wallet, track its fiat balance and move funds
//!
//! The session is persisted to a JSON file, so every invocation picks up
//! where the last one left off.
//!
//! # Quick Start
//!
//! ```bash
//! # Create a key and point the config at it
//! sentinel wallet keygen --output ~/.sentinel/account.key
//! export SENTINEL__WALLET__KEY_FILE=~/.sentinel/account.key
//!
//! sentinel wallet connect
//! sentinel wallet status
//! sentinel wallet withdraw --amount 100
//! sentinel watch --interval 30
//! ```

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod display;

use crate::commands::{wallet, watch};
use crate::config::{LoggingConfig, SentinelConfig};

/// CryptoSentinel CLI - wallet session for the dashboard
#[derive(Parser)]
#[command(name = "sentinel")]
#[command(author = "CryptoSentinel Contributors")]
#[command(version)]
#[command(about = "Connect an Aptos wallet, track its USD balance, deposit and withdraw", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, env = "SENTINEL_CONFIG")]
    config: Option<PathBuf>,

    /// Session file (overrides storage.state_file)
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    /// Approve wallet prompts without asking
    #[arg(short, long, global = true)]
    yes: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the wallet session
    Wallet {
        #[command(subcommand)]
        action: WalletCommands,
    },

    /// Refresh on an interval and print session events
    Watch {
        /// Seconds between balance refreshes
        #[arg(short, long, default_value = "30")]
        interval: u64,
    },
}

#[derive(Subcommand)]
enum WalletCommands {
    /// Connect the configured wallet and fetch its balance
    Connect,

    /// Disconnect and clear the stored session
    Disconnect,

    /// Show the cached session
    Status,

    /// Fetch fresh balances
    Refresh,

    /// Move funds from the treasury into the wallet
    Deposit {
        /// Amount in USD
        #[arg(short, long)]
        amount: Decimal,
    },

    /// Move funds from the wallet to the treasury
    Withdraw {
        /// Amount in USD
        #[arg(short, long)]
        amount: Decimal,
    },

    /// Generate a new account key
    Keygen {
        /// Write the private key to this file instead of printing it
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite an existing key file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        display::error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = SentinelConfig::load(cli.config.as_deref())?;
    init_logging(&config.logging)?;

    // Key generation needs no session
    if let Commands::Wallet {
        action: WalletCommands::Keygen { output, force },
    } = &cli.command
    {
        return wallet::keygen(output.as_deref(), *force);
    }

    let session = commands::build_session(&config, cli.state, cli.yes)?;

    match cli.command {
        Commands::Wallet { action } => match action {
            WalletCommands::Connect => wallet::connect(&session).await?,
            WalletCommands::Disconnect => wallet::disconnect(&session).await?,
            WalletCommands::Status => wallet::status(&session)?,
            WalletCommands::Refresh => wallet::refresh(&session).await?,
            WalletCommands::Deposit { amount } => wallet::deposit(&session, amount).await?,
            WalletCommands::Withdraw { amount } => wallet::withdraw(&session, amount).await?,
            WalletCommands::Keygen { .. } => {}
        },
        Commands::Watch { interval } => watch::run(&session, interval).await?,
    }

    Ok(())
}

/// Initialize tracing/logging
fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    match config.format.as_str() {
        "json" => {
            subscriber
                .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
                .try_init()?;
        }
        _ => {
            subscriber
                .with(fmt::layer().pretty().with_target(true).with_writer(std::io::stderr))
                .try_init()?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_withdraw() {
        let cli = Cli::try_parse_from(["sentinel", "--yes", "wallet", "withdraw", "--amount", "3800"])
            .unwrap();
        assert!(cli.yes);
        match cli.command {
            Commands::Wallet {
                action: WalletCommands::Withdraw { amount },
            } => assert_eq!(amount, dec!(3800)),
            _ => panic!("expected withdraw"),
        }
    }

    #[test]
    fn test_parse_rejects_non_numeric_amount() {
        assert!(Cli::try_parse_from(["sentinel", "wallet", "deposit", "--amount", "lots"]).is_err());
    }

    #[test]
    fn test_parse_watch_default_interval() {
        let cli = Cli::try_parse_from(["sentinel", "watch"]).unwrap();
        assert!(matches!(cli.command, Commands::Watch { interval: 30 }));
    }
}
