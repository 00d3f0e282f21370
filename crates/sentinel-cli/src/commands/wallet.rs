//! Wallet commands - connect, inspect and move funds

use anyhow::Context;
use colored::*;
use rust_decimal::Decimal;
use std::path::Path;

use sentinel_types::{octas_to_coins, FiatBalance};
use sentinel_wallet::{AccountKey, SessionState, Settlement, TransferReceipt, WalletSession};

use super::dollars;
use crate::display;

/// Connect the configured wallet
pub async fn connect(session: &WalletSession) -> anyhow::Result<()> {
    display::section("Connect Wallet");

    let address = session.connect().await?;
    display::success(&format!("Connected {}", address.to_string().bright_cyan()));

    let (total, available) = session.balances();
    if total.is_known() {
        display::kv("Total", &total.to_string());
        display::kv("Available", &available.to_string());
    } else {
        display::warning("Balance unavailable; run `sentinel wallet refresh` to retry");
    }
    Ok(())
}

/// Disconnect and clear the stored session
pub async fn disconnect(session: &WalletSession) -> anyhow::Result<()> {
    display::section("Disconnect Wallet");

    let was = session.address();
    session.disconnect().await?;

    match was {
        Some(address) => display::success(&format!("Disconnected {}", address.short())),
        None => display::info("No wallet was connected"),
    }
    display::note("Stored session cleared");
    Ok(())
}

/// Show the cached session without touching the network
pub fn status(session: &WalletSession) -> anyhow::Result<()> {
    display::section("Wallet Status");

    match session.state() {
        SessionState::Disconnected => {
            display::labeled("State", "disconnected");
            display::note("Run `sentinel wallet connect` to start a session");
        }
        SessionState::Connected { balance_known } => {
            let (total, available) = session.balances();
            display::labeled("State", "connected");
            if let Some(address) = session.address() {
                display::labeled("Address", address.as_str());
            }
            display::labeled("Total Balance", &total.to_string());
            display::labeled("Available", &available.to_string());
            if !balance_known {
                display::note("Balance not fetched yet");
            }
        }
    }

    display::labeled("Dashboard Balance", &dollars(session.dashboard_balance()?));
    Ok(())
}

/// Fetch fresh balances for the connected wallet
pub async fn refresh(session: &WalletSession) -> anyhow::Result<()> {
    display::section("Refresh Balance");

    let snapshot = session.refresh().await.context("Balance refresh failed")?;
    display::success("Balance updated");
    display::kv(
        "On-chain",
        &format!("{} APT", octas_to_coins(snapshot.raw_octas).normalize()),
    );
    display::kv("Price", &format!("${} / APT", snapshot.usd_rate.normalize()));
    display::kv("Total", &FiatBalance::Known(snapshot.total).to_string());
    display::kv("Available", &FiatBalance::Known(snapshot.available).to_string());
    Ok(())
}

/// Deposit from the treasury into the connected wallet
pub async fn deposit(session: &WalletSession, amount: Decimal) -> anyhow::Result<()> {
    display::section("Deposit");

    let receipt = session.deposit(amount).await?;
    print_receipt(&receipt);
    Ok(())
}

/// Withdraw from the connected wallet to the treasury
pub async fn withdraw(session: &WalletSession, amount: Decimal) -> anyhow::Result<()> {
    display::section("Withdraw");

    let receipt = session.withdraw(amount).await?;
    print_receipt(&receipt);
    Ok(())
}

fn print_receipt(receipt: &TransferReceipt) {
    let verb = match receipt.intent.direction {
        sentinel_types::TransferDirection::Deposit => "Deposited",
        sentinel_types::TransferDirection::Withdraw => "Withdrew",
    };
    display::success(&format!("{} {}", verb, dollars(receipt.intent.amount)));
    if let Some(payload) = &receipt.payload {
        display::kv("Payload", &display::payload_summary(payload));
    }
    display::kv(
        "Dashboard",
        &format!(
            "{} → {}",
            dollars(receipt.previous_balance),
            dollars(receipt.new_balance)
        ),
    );

    match (&receipt.settlement, &receipt.tx_hash) {
        (Settlement::Confirmed, Some(hash)) => display::kv("Transaction", hash),
        _ => display::note("Simulated: no treasury key configured, nothing was sent on-chain"),
    }
}

/// Generate a new account key
pub fn keygen(output: Option<&Path>, force: bool) -> anyhow::Result<()> {
    display::section("Generate Account Key");

    let key = AccountKey::generate();

    match output {
        Some(path) => {
            if path.exists() && !force {
                anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
            }
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, format!("{}\n", key.private_key_hex()))
                .with_context(|| format!("Failed to write {}", path.display()))?;
            display::success(&format!("Key written to {}", path.display()));
            display::note("Set wallet.key_file to this path to use it");
        }
        None => {
            display::warning("Private key printed below; store it somewhere safe");
            display::kv("Private Key", &key.private_key_hex());
        }
    }

    display::kv("Address", key.address().as_str());
    display::kv("Public Key", &key.public_key_hex());
    Ok(())
}
