//! Fullnode REST client
//!
//! Reads the coin store resource, submits JSON-encoded user transactions and
//! polls for their confirmation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use tokio::time::Instant;

use sentinel_types::{AccountAddress, EntryFunctionPayload, PendingTransaction, NATIVE_COIN_TYPE};

use crate::{ChainConfig, ChainError, ChainResult};

/// Read/confirm surface the wallet session needs from the chain
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Raw native coin balance of an account, in octas
    async fn coin_balance(&self, address: &AccountAddress) -> ChainResult<u64>;

    /// Block until a submitted transaction commits successfully
    async fn wait_for_transaction(&self, hash: &str) -> ChainResult<CommittedTransaction>;
}

// ============================================================================
// API Types
// ============================================================================

/// Unsigned user transaction in the node's JSON format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserTransactionRequest {
    pub sender: String,
    pub sequence_number: String,
    pub max_gas_amount: String,
    pub gas_unit_price: String,
    pub expiration_timestamp_secs: String,
    pub payload: EntryFunctionPayload,
}

/// Single-key ed25519 signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSignature {
    #[serde(rename = "type")]
    pub signature_type: String,
    pub public_key: String,
    pub signature: String,
}

impl TransactionSignature {
    pub fn ed25519(public_key: &[u8], signature: &[u8]) -> Self {
        Self {
            signature_type: "ed25519_signature".to_string(),
            public_key: format!("0x{}", hex::encode(public_key)),
            signature: format!("0x{}", hex::encode(signature)),
        }
    }
}

/// User transaction plus its signature, ready for submission
#[derive(Debug, Clone, Serialize)]
pub struct SignedTransactionRequest {
    #[serde(flatten)]
    pub transaction: UserTransactionRequest,
    pub signature: TransactionSignature,
}

/// A transaction that has been committed to the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommittedTransaction {
    pub hash: String,
    pub version: Option<String>,
    pub success: bool,
    pub vm_status: String,
}

/// Lookup state of a transaction hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionState {
    /// Unknown to the node yet, or still in the mempool
    Pending,
    /// Executed, successfully or not
    Committed(CommittedTransaction),
}

// ============================================================================
// Response parsing
// ============================================================================

/// Coin store resource path for the native coin
pub fn coin_store_resource() -> String {
    format!("0x1::coin::CoinStore<{}>", NATIVE_COIN_TYPE)
}

/// Read a u64 that the node may encode as a string or a number
fn u64_field(value: &Value) -> Option<u64> {
    match value {
        Value::String(s) => u64::from_str(s).ok(),
        Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

/// Extract `data.coin.value` from a coin store resource
pub fn parse_coin_store(resource: &Value) -> ChainResult<u64> {
    resource
        .pointer("/data/coin/value")
        .and_then(u64_field)
        .ok_or_else(|| ChainError::malformed("coin store resource has no data.coin.value"))
}

/// Extract `sequence_number` from an account resource
pub fn parse_sequence_number(account: &Value) -> ChainResult<u64> {
    account
        .get("sequence_number")
        .and_then(u64_field)
        .ok_or_else(|| ChainError::malformed("account has no sequence_number"))
}

/// Interpret a transaction-by-hash response
pub fn parse_transaction(hash: &str, body: &Value) -> ChainResult<TransactionState> {
    let kind = body
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| ChainError::malformed("transaction has no type"))?;

    if kind == "pending_transaction" {
        return Ok(TransactionState::Pending);
    }

    let success = body
        .get("success")
        .and_then(Value::as_bool)
        .ok_or_else(|| ChainError::malformed("committed transaction has no success flag"))?;

    Ok(TransactionState::Committed(CommittedTransaction {
        hash: body
            .get("hash")
            .and_then(Value::as_str)
            .unwrap_or(hash)
            .to_string(),
        version: body.get("version").and_then(Value::as_str).map(str::to_string),
        success,
        vm_status: body
            .get("vm_status")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    }))
}

/// Decode the hex signing message returned by `encode_submission`
pub fn parse_signing_message(body: &Value) -> ChainResult<Vec<u8>> {
    let encoded = body
        .as_str()
        .ok_or_else(|| ChainError::malformed("signing message is not a string"))?;
    hex::decode(encoded.trim_start_matches("0x"))
        .map_err(|e| ChainError::malformed(format!("signing message is not hex: {}", e)))
}

// ============================================================================
// Client
// ============================================================================

/// HTTP client for a fullnode REST API
#[derive(Debug, Clone)]
pub struct AptosClient {
    config: ChainConfig,
    base_url: String,
    client: reqwest::Client,
}

impl AptosClient {
    /// Create a client for the configured node
    pub fn new(config: ChainConfig) -> ChainResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        let base_url = config.node_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ChainError::Config("node_url is empty".to_string()));
        }
        Ok(Self {
            config,
            base_url,
            client,
        })
    }

    /// Get the client configuration
    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1{}", self.base_url, path)
    }

    /// Turn a non-success response into an API error carrying the node's message
    async fn error_from(resp: reqwest::Response) -> ChainError {
        let status = resp.status().as_u16();
        let body: Value = resp.json().await.unwrap_or_default();
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Unknown error")
            .to_string();
        ChainError::Api { status, message }
    }

    async fn get_json(&self, path: &str) -> ChainResult<Value> {
        let resp = self.client.get(self.url(path)).send().await?;
        if !resp.status().is_success() {
            return Err(Self::error_from(resp).await);
        }
        Ok(resp.json().await?)
    }

    async fn post_json<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> ChainResult<Value> {
        let resp = self.client.post(self.url(path)).json(body).send().await?;
        if !resp.status().is_success() {
            return Err(Self::error_from(resp).await);
        }
        Ok(resp.json().await?)
    }

    /// Fetch an account resource by its type tag
    pub async fn account_resource(
        &self,
        address: &AccountAddress,
        resource_type: &str,
    ) -> ChainResult<Value> {
        self.get_json(&format!("/accounts/{}/resource/{}", address, resource_type))
            .await
    }

    /// Current sequence number of an account
    pub async fn sequence_number(&self, address: &AccountAddress) -> ChainResult<u64> {
        let account = self.get_json(&format!("/accounts/{}", address)).await?;
        parse_sequence_number(&account)
    }

    /// Ask the node for the bytes that must be signed for a transaction
    pub async fn encode_submission(
        &self,
        transaction: &UserTransactionRequest,
    ) -> ChainResult<Vec<u8>> {
        let body = self
            .post_json("/transactions/encode_submission", transaction)
            .await?;
        parse_signing_message(&body)
    }

    /// Submit a signed transaction to the mempool
    pub async fn submit_transaction(
        &self,
        signed: &SignedTransactionRequest,
    ) -> ChainResult<PendingTransaction> {
        let body = self.post_json("/transactions", signed).await?;
        let hash = body
            .get("hash")
            .and_then(Value::as_str)
            .ok_or_else(|| ChainError::malformed("submission response has no hash"))?;

        tracing::info!(hash = %hash, sender = %signed.transaction.sender, "Transaction submitted");

        Ok(PendingTransaction {
            hash: hash.to_string(),
            sender: Some(signed.transaction.sender.clone()),
            sequence_number: Some(signed.transaction.sequence_number.clone()),
        })
    }

    /// Look up a transaction; a 404 means the node has not seen it yet
    pub async fn transaction_by_hash(&self, hash: &str) -> ChainResult<TransactionState> {
        let resp = self
            .client
            .get(self.url(&format!("/transactions/by_hash/{}", hash)))
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(TransactionState::Pending);
        }
        if !resp.status().is_success() {
            return Err(Self::error_from(resp).await);
        }

        let body: Value = resp.json().await?;
        parse_transaction(hash, &body)
    }
}

#[async_trait]
impl ChainClient for AptosClient {
    async fn coin_balance(&self, address: &AccountAddress) -> ChainResult<u64> {
        let resource = self
            .account_resource(address, &coin_store_resource())
            .await?;
        let octas = parse_coin_store(&resource)?;
        tracing::debug!(address = %address, octas, "Fetched coin balance");
        Ok(octas)
    }

    async fn wait_for_transaction(&self, hash: &str) -> ChainResult<CommittedTransaction> {
        let timeout = self.config.confirmation_timeout();
        let deadline = Instant::now().checked_add(timeout).ok_or_else(|| {
            ChainError::Config(format!("confirmation timeout {:?} is out of range", timeout))
        })?;

        loop {
            if let TransactionState::Committed(tx) = self.transaction_by_hash(hash).await? {
                if !tx.success {
                    return Err(ChainError::TransactionFailed {
                        hash: hash.to_string(),
                        vm_status: tx.vm_status,
                    });
                }
                tracing::info!(hash = %hash, version = ?tx.version, "Transaction committed");
                return Ok(tx);
            }

            if Instant::now() >= deadline {
                return Err(ChainError::ConfirmationTimeout {
                    hash: hash.to_string(),
                    waited_secs: timeout.as_secs(),
                });
            }
            tokio::time::sleep(self.config.poll_interval()).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coin_store_resource_path() {
        assert_eq!(
            coin_store_resource(),
            "0x1::coin::CoinStore<0x1::aptos_coin::AptosCoin>"
        );
    }

    #[test]
    fn test_parse_coin_store() {
        let resource = json!({
            "type": "0x1::coin::CoinStore<0x1::aptos_coin::AptosCoin>",
            "data": { "coin": { "value": "250000000" }, "frozen": false }
        });
        assert_eq!(parse_coin_store(&resource).unwrap(), 250_000_000);

        let numeric = json!({ "data": { "coin": { "value": 42 } } });
        assert_eq!(parse_coin_store(&numeric).unwrap(), 42);
    }

    #[test]
    fn test_parse_coin_store_rejects_missing_value() {
        let resource = json!({ "data": { "coin": {} } });
        assert!(matches!(
            parse_coin_store(&resource),
            Err(ChainError::MalformedResponse(_))
        ));

        let error_body = json!({ "message": "Resource not found", "error_code": "resource_not_found" });
        assert!(parse_coin_store(&error_body).is_err());
    }

    #[test]
    fn test_parse_sequence_number() {
        let account = json!({ "sequence_number": "17", "authentication_key": "0xabc" });
        assert_eq!(parse_sequence_number(&account).unwrap(), 17);
    }

    #[test]
    fn test_parse_pending_transaction() {
        let body = json!({ "type": "pending_transaction", "hash": "0xabc" });
        assert_eq!(parse_transaction("0xabc", &body).unwrap(), TransactionState::Pending);
    }

    #[test]
    fn test_parse_committed_transaction() {
        let body = json!({
            "type": "user_transaction",
            "hash": "0xabc",
            "version": "1234",
            "success": false,
            "vm_status": "Move abort: EINSUFFICIENT_BALANCE"
        });
        match parse_transaction("0xabc", &body).unwrap() {
            TransactionState::Committed(tx) => {
                assert!(!tx.success);
                assert_eq!(tx.version.as_deref(), Some("1234"));
                assert!(tx.vm_status.contains("EINSUFFICIENT_BALANCE"));
            }
            TransactionState::Pending => panic!("expected committed transaction"),
        }
    }

    #[test]
    fn test_parse_signing_message() {
        let body = json!("0x0a0b0c");
        assert_eq!(parse_signing_message(&body).unwrap(), vec![0x0a, 0x0b, 0x0c]);
        assert!(parse_signing_message(&json!({})).is_err());
    }

    #[test]
    fn test_signed_request_flattens_transaction() {
        let signed = SignedTransactionRequest {
            transaction: UserTransactionRequest {
                sender: "0x1".to_string(),
                sequence_number: "0".to_string(),
                max_gas_amount: "2000".to_string(),
                gas_unit_price: "100".to_string(),
                expiration_timestamp_secs: "1700000000".to_string(),
                payload: EntryFunctionPayload::coin_transfer(
                    &AccountAddress::parse("0x2").unwrap(),
                    1,
                ),
            },
            signature: TransactionSignature::ed25519(&[1, 2], &[3, 4]),
        };
        let json = serde_json::to_value(&signed).unwrap();
        assert_eq!(json["sender"], "0x1");
        assert_eq!(json["signature"]["type"], "ed25519_signature");
        assert_eq!(json["signature"]["public_key"], "0x0102");
    }

    #[test]
    fn test_client_rejects_empty_node_url() {
        assert!(AptosClient::new(ChainConfig::with_node("/")).is_err());
    }
}
