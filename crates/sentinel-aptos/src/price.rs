//! USD price feed (CoinGecko-compatible `simple/price` endpoint)

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

use crate::{ChainError, ChainResult, PriceConfig};

/// Source of fiat conversion rates
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Price of one unit of `asset_id` in USD
    async fn usd_price(&self, asset_id: &str) -> ChainResult<Decimal>;
}

/// Convert a JSON number to a Decimal without going through f64 arithmetic
fn number_to_decimal(number: &serde_json::Number) -> Option<Decimal> {
    if let Some(u) = number.as_u64() {
        return Some(Decimal::from(u));
    }
    if let Some(i) = number.as_i64() {
        return Some(Decimal::from(i));
    }
    let text = number.to_string();
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

/// Extract `{ <asset>: { usd: number } }`
pub fn parse_simple_price(body: &Value, asset_id: &str) -> ChainResult<Decimal> {
    let price = body
        .get(asset_id)
        .and_then(|asset| asset.get("usd"))
        .and_then(|usd| match usd {
            Value::Number(n) => number_to_decimal(n),
            _ => None,
        })
        .ok_or_else(|| ChainError::malformed(format!("no usd price for {}", asset_id)))?;

    if price.is_sign_negative() {
        return Err(ChainError::malformed(format!(
            "negative usd price for {}: {}",
            asset_id, price
        )));
    }
    Ok(price)
}

/// HTTP price feed client
#[derive(Debug, Clone)]
pub struct CoinGeckoFeed {
    config: PriceConfig,
    client: reqwest::Client,
}

impl CoinGeckoFeed {
    pub fn new(config: PriceConfig) -> ChainResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &PriceConfig {
        &self.config
    }
}

#[async_trait]
impl PriceFeed for CoinGeckoFeed {
    async fn usd_price(&self, asset_id: &str) -> ChainResult<Decimal> {
        let url = format!(
            "{}/simple/price",
            self.config.api_url.trim_end_matches('/')
        );
        let resp = self
            .client
            .get(&url)
            .query(&[("ids", asset_id), ("vs_currencies", "usd")])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(ChainError::Api {
                status: resp.status().as_u16(),
                message: format!("price request for {} failed", asset_id),
            });
        }

        let body: Value = resp.json().await?;
        let price = parse_simple_price(&body, asset_id)?;
        tracing::debug!(asset = %asset_id, usd = %price, "Fetched price");
        Ok(price)
    }
}
