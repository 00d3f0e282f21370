//! Display utilities for the CLI

use colored::*;

use sentinel_types::{octas_to_coins, EntryFunctionPayload};
use sentinel_wallet::WalletEvent;

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", "━".repeat(60).bright_black());
    println!(" {}", title.bright_white().bold());
    println!("{}", "━".repeat(60).bright_black());
}

/// Print a success message
pub fn success(message: &str) {
    println!("  {} {}", "✓".bright_green(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("  {} {}", "✗".bright_red(), message.bright_red());
}

/// Print an info message
pub fn info(message: &str) {
    println!("  {} {}", "→".bright_blue(), message);
}

/// Print a warning message
pub fn warning(message: &str) {
    println!("  {} {}", "⚠".yellow(), message.yellow());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("      {}: {}", key, value.bright_cyan());
}

/// Print a labeled value
pub fn labeled(label: &str, value: &str) {
    println!("  {}: {}", label.bright_white(), value.bright_cyan());
}

/// Print a dimmed note
pub fn note(message: &str) {
    println!("  {}", message.bright_black());
}

/// One-line summary of a coin transfer payload
pub fn payload_summary(payload: &EntryFunctionPayload) -> String {
    let recipient = payload
        .arguments
        .first()
        .and_then(|v| v.as_str())
        .unwrap_or("?");
    let coins = payload
        .arguments
        .get(1)
        .and_then(|v| v.as_str())
        .and_then(|octas| octas.parse::<u64>().ok())
        .map(|octas| octas_to_coins(octas).normalize().to_string())
        .unwrap_or_else(|| "?".to_string());
    format!("{} {} → {}", payload.function, coins, recipient)
}

/// Print a wallet event as one timestamped line
pub fn event(event: &WalletEvent) {
    let time = event.timestamp().format("%H:%M:%S").to_string();
    let detail = match event {
        WalletEvent::Connected { address, .. } => format!("connected {}", address.short()),
        WalletEvent::Disconnected { .. } => "disconnected".to_string(),
        WalletEvent::BalanceRefreshed {
            total, available, ..
        } => format!(
            "balance ${} (available ${})",
            sentinel_types::format_fiat(*total),
            sentinel_types::format_fiat(*available)
        ),
        WalletEvent::DashboardBalanceUpdated {
            previous,
            new_balance,
            reason,
            ..
        } => format!(
            "{} ${} → ${}",
            reason,
            sentinel_types::format_fiat(*previous),
            sentinel_types::format_fiat(*new_balance)
        ),
        WalletEvent::TransferSubmitted {
            direction, hash, ..
        } => format!("{} submitted {}", direction, hash),
    };
    println!(
        "  {} {} {}",
        time.bright_black(),
        format!("[{}]", event.kind()).bright_blue(),
        detail
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_types::AccountAddress;

    #[test]
    fn test_payload_summary() {
        let payload = EntryFunctionPayload::coin_transfer(&AccountAddress::default_treasury(), 150_000_000);
        let summary = payload_summary(&payload);
        assert!(summary.starts_with("0x1::coin::transfer 1.5 → 0x9c20"));
    }
}
