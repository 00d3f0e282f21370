//! CLI Configuration
//!
//! Sources, lowest to highest precedence: built-in defaults, the file given
//! with `--config`, `config/default`, `config/local`, then `SENTINEL__*`
//! environment variables (`SENTINEL__CHAIN__NODE_URL`, ...).

use anyhow::Context;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use sentinel_aptos::{ChainConfig, PriceConfig};
use sentinel_types::{
    AccountAddress, AVAILABLE_RATIO, DEFAULT_DASHBOARD_BALANCE, DEFAULT_TREASURY_ADDRESS,
    MIN_BALANCE,
};
use sentinel_wallet::{AccountKey, FileStore, SessionConfig, DEFAULT_BUS_CAPACITY};

/// Full CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SentinelConfig {
    #[serde(default)]
    pub chain: ChainConfig,

    #[serde(default)]
    pub price: PriceConfig,

    #[serde(default)]
    pub wallet: WalletSettings,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Wallet session policy and signing keys
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletSettings {
    #[serde(default = "default_treasury_address")]
    pub treasury_address: String,

    #[serde(default = "default_min_balance")]
    pub min_balance: Decimal,

    #[serde(default = "default_available_ratio")]
    pub available_ratio: Decimal,

    #[serde(default = "default_dashboard_balance")]
    pub default_dashboard_balance: Decimal,

    /// File holding the user's hex private key
    #[serde(default)]
    pub key_file: Option<PathBuf>,

    /// User's hex private key (takes precedence over `key_file`)
    #[serde(default)]
    pub private_key: Option<String>,

    /// File holding the treasury's hex private key; enables real deposits
    #[serde(default)]
    pub treasury_key_file: Option<PathBuf>,

    #[serde(default)]
    pub treasury_private_key: Option<String>,

    /// Ask before connecting or signing
    #[serde(default = "default_true")]
    pub confirm: bool,

    #[serde(default = "default_bus_capacity")]
    pub bus_capacity: usize,
}

impl Default for WalletSettings {
    fn default() -> Self {
        Self {
            treasury_address: default_treasury_address(),
            min_balance: default_min_balance(),
            available_ratio: default_available_ratio(),
            default_dashboard_balance: default_dashboard_balance(),
            key_file: None,
            private_key: None,
            treasury_key_file: None,
            treasury_private_key: None,
            confirm: true,
            bus_capacity: default_bus_capacity(),
        }
    }
}

impl WalletSettings {
    /// The user's signing key, if configured
    pub fn signer_key(&self) -> anyhow::Result<Option<AccountKey>> {
        load_key(self.private_key.as_deref(), self.key_file.as_deref())
            .context("Failed to load wallet key")
    }

    /// The treasury's signing key, if configured
    pub fn treasury_key(&self) -> anyhow::Result<Option<AccountKey>> {
        load_key(
            self.treasury_private_key.as_deref(),
            self.treasury_key_file.as_deref(),
        )
        .context("Failed to load treasury key")
    }

    /// Session policy derived from these settings
    pub fn session_config(&self, asset_id: &str) -> anyhow::Result<SessionConfig> {
        let treasury_address = AccountAddress::parse(&self.treasury_address)
            .context("Invalid wallet.treasury_address")?;
        if self.min_balance.is_sign_negative() {
            anyhow::bail!("wallet.min_balance must not be negative");
        }
        if self.available_ratio.is_sign_negative() || self.available_ratio > Decimal::ONE {
            anyhow::bail!("wallet.available_ratio must be between 0 and 1");
        }

        Ok(SessionConfig {
            asset_id: asset_id.to_string(),
            treasury_address,
            min_balance: self.min_balance,
            available_ratio: self.available_ratio,
            default_dashboard_balance: self.default_dashboard_balance,
            bus_capacity: self.bus_capacity,
        })
    }
}

fn load_key(inline: Option<&str>, file: Option<&Path>) -> anyhow::Result<Option<AccountKey>> {
    if let Some(hex) = inline.filter(|s| !s.trim().is_empty()) {
        return Ok(Some(AccountKey::from_hex(hex)?));
    }
    match file {
        Some(path) => Ok(Some(AccountKey::from_file(&expand_home(path))?)),
        None => Ok(None),
    }
}

/// Expand a leading `~` to the home directory
pub fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

/// Session store location
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Session file (defaults to `<data dir>/cryptosentinel/session.json`)
    #[serde(default)]
    pub state_file: Option<PathBuf>,
}

impl StorageConfig {
    pub fn state_path(&self) -> PathBuf {
        match &self.state_file {
            Some(path) => expand_home(path),
            None => {
                let data_dir = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
                FileStore::default_path(&data_dir)
            }
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (pretty, json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// =============================================================================
// Default Functions
// =============================================================================

fn default_treasury_address() -> String {
    DEFAULT_TREASURY_ADDRESS.to_string()
}

fn default_min_balance() -> Decimal {
    MIN_BALANCE
}

fn default_available_ratio() -> Decimal {
    AVAILABLE_RATIO
}

fn default_dashboard_balance() -> Decimal {
    DEFAULT_DASHBOARD_BALANCE
}

fn default_bus_capacity() -> usize {
    DEFAULT_BUS_CAPACITY
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    // Command output goes to stdout; keep logs quiet unless asked
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

// =============================================================================
// Configuration Loading
// =============================================================================

impl SentinelConfig {
    /// Load configuration from files and environment
    pub fn load(config_path: Option<&Path>) -> anyhow::Result<Self> {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        let mut builder = config::Config::builder();

        if let Some(path) = config_path {
            let name = path.to_string_lossy();
            builder = builder.add_source(config::File::with_name(&name).required(true));
        }

        builder = builder
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false));

        // Values stay strings so hex keys are never read as numbers
        builder = builder.add_source(
            config::Environment::with_prefix("SENTINEL")
                .prefix_separator("__")
                .separator("__"),
        );

        let config = builder.build().context("Failed to read configuration")?;
        let sentinel_config: SentinelConfig = config
            .try_deserialize()
            .context("Invalid configuration")?;

        Ok(sentinel_config)
    }
}
