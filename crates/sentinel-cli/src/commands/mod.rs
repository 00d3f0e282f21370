//! Command implementations and the session wiring they share

pub mod wallet;
pub mod watch;

use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;

use sentinel_aptos::{AptosClient, CoinGeckoFeed};
use sentinel_types::format_fiat;
use sentinel_wallet::{
    ApprovalRequest, Approver, AutoApprove, FileStore, KeyfileWallet, WalletSession,
};

use crate::config::SentinelConfig;
use crate::display;

/// Asks on the terminal before a wallet connects or signs
pub struct PromptApprover;

impl Approver for PromptApprover {
    fn approve(&self, request: &ApprovalRequest) -> bool {
        let prompt = match request {
            ApprovalRequest::Connect { address } => {
                format!("Connect wallet {} to CryptoSentinel?", address.short())
            }
            ApprovalRequest::Transaction { sender, payload } => format!(
                "Sign {} from {}?",
                display::payload_summary(payload),
                sender.short()
            ),
        };

        dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .unwrap_or(false)
    }
}

/// Build the wallet session described by the configuration
pub fn build_session(
    config: &SentinelConfig,
    state_override: Option<PathBuf>,
    assume_yes: bool,
) -> anyhow::Result<WalletSession> {
    let chain = Arc::new(AptosClient::new(config.chain.clone()).context("Invalid chain settings")?);
    let prices =
        Arc::new(CoinGeckoFeed::new(config.price.clone()).context("Invalid price settings")?);

    let state_path = state_override.unwrap_or_else(|| config.storage.state_path());
    let store = FileStore::open(&state_path)
        .with_context(|| format!("Failed to open session file {}", state_path.display()))?;
    tracing::debug!(path = %state_path.display(), "Using session store");

    let session_config = config.wallet.session_config(&config.price.asset_id)?;
    let treasury_address = session_config.treasury_address.clone();

    let approver: Arc<dyn Approver> = if assume_yes || !config.wallet.confirm {
        Arc::new(AutoApprove)
    } else {
        Arc::new(PromptApprover)
    };

    let mut builder = WalletSession::builder(chain.clone(), prices)
        .store(Arc::new(store))
        .config(session_config);

    if let Some(key) = config.wallet.signer_key()? {
        builder = builder.provider(Arc::new(
            KeyfileWallet::new(key, chain.clone()).with_approver(approver),
        ));
    }

    if let Some(key) = config.wallet.treasury_key()? {
        if key.address() != &treasury_address {
            tracing::warn!(
                key_address = %key.address(),
                treasury = %treasury_address,
                "Treasury key does not match the configured treasury address"
            );
        }
        builder = builder.treasury(Arc::new(
            KeyfileWallet::new(key, chain).with_label("treasury"),
        ));
    }

    Ok(builder.build()?)
}

/// Render a fiat amount with a leading `$`
pub fn dollars(value: rust_decimal::Decimal) -> String {
    format!("${}", format_fiat(value))
}
