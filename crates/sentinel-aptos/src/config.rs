//! Endpoint configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fullnode REST endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Fullnode base URL (without the `/v1` suffix)
    #[serde(default = "default_node_url")]
    pub node_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Gas limit for submitted transfers
    #[serde(default = "default_max_gas_amount")]
    pub max_gas_amount: u64,

    /// Gas price in octas per unit
    #[serde(default = "default_gas_unit_price")]
    pub gas_unit_price: u64,

    /// Seconds until a submitted transaction expires
    #[serde(default = "default_txn_ttl")]
    pub txn_ttl_secs: u64,

    /// How long to wait for a submitted transaction to commit
    #[serde(default = "default_confirmation_timeout")]
    pub confirmation_timeout_secs: u64,

    /// Delay between confirmation polls in milliseconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            node_url: default_node_url(),
            request_timeout_secs: default_request_timeout(),
            max_gas_amount: default_max_gas_amount(),
            gas_unit_price: default_gas_unit_price(),
            txn_ttl_secs: default_txn_ttl(),
            confirmation_timeout_secs: default_confirmation_timeout(),
            poll_interval_ms: default_poll_interval(),
        }
    }
}

impl ChainConfig {
    /// Config pointing at a specific node
    pub fn with_node(node_url: impl Into<String>) -> Self {
        Self {
            node_url: node_url.into(),
            ..Default::default()
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Price endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceConfig {
    /// Price API base URL
    #[serde(default = "default_price_api_url")]
    pub api_url: String,

    /// Asset id queried for the coin price
    #[serde(default = "default_asset_id")]
    pub asset_id: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for PriceConfig {
    fn default() -> Self {
        Self {
            api_url: default_price_api_url(),
            asset_id: default_asset_id(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl PriceConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_node_url() -> String {
    "https://fullnode.testnet.aptoslabs.com".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_gas_amount() -> u64 {
    2_000
}

fn default_gas_unit_price() -> u64 {
    100
}

fn default_txn_ttl() -> u64 {
    600
}

fn default_confirmation_timeout() -> u64 {
    20
}

fn default_poll_interval() -> u64 {
    1_000
}

fn default_price_api_url() -> String {
    "https://api.coingecko.com/api/v3".to_string()
}

fn default_asset_id() -> String {
    "aptos".to_string()
}
