//! Keyfile wallet: a local ed25519 account that signs and submits transfers
//! through the fullnode REST API.
//!
//! The account address is the single-key ed25519 authentication key:
//! `sha3_256(public_key || 0x00)`.
//!
//! Submission goes through the node's JSON encoding endpoint, so no
//! client-side BCS serialization is needed:
//!
//! ```text
//! sequence_number ─▶ encode_submission ─▶ sign ─▶ submit ─▶ PendingTransaction
//! ```

use async_trait::async_trait;
use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use sha3::{Digest, Sha3_256};
use std::path::Path;
use std::sync::Arc;

use sentinel_aptos::{
    AptosClient, SignedTransactionRequest, TransactionSignature, UserTransactionRequest,
};
use sentinel_types::{
    AccountAddress, EntryFunctionPayload, PendingTransaction, Result, WalletError,
};

use crate::provider::{ApprovalRequest, Approver, AutoApprove, WalletProvider};

/// Authentication key scheme byte for single-key ed25519 accounts
const ED25519_SCHEME: u8 = 0x00;

// ── Account key ───────────────────────────────────────────────────────────────

/// An ed25519 account key and its derived address
pub struct AccountKey {
    signing_key: SigningKey,
    address: AccountAddress,
}

impl AccountKey {
    /// Generate a fresh random key
    pub fn generate() -> Self {
        Self::from_signing_key(SigningKey::generate(&mut OsRng))
    }

    /// Load a key from 32 bytes of hex (optionally `0x`-prefixed)
    pub fn from_hex(private_key_hex: &str) -> Result<Self> {
        let trimmed = private_key_hex.trim();
        let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes = hex::decode(digits)
            .map_err(|e| WalletError::invalid_key(format!("private key is not hex: {}", e)))?;
        let seed: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            WalletError::invalid_key(format!("private key must be 32 bytes, got {}", bytes.len()))
        })?;
        Ok(Self::from_signing_key(SigningKey::from_bytes(&seed)))
    }

    /// Load a key from a file holding the hex private key
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            WalletError::invalid_key(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_hex(&content)
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let address = derive_address(&signing_key.verifying_key());
        Self {
            signing_key,
            address,
        }
    }

    /// Account address derived from the public key
    pub fn address(&self) -> &AccountAddress {
        &self.address
    }

    pub fn public_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// `0x`-prefixed public key hex
    pub fn public_key_hex(&self) -> String {
        format!("0x{}", hex::encode(self.public_key().to_bytes()))
    }

    /// `0x`-prefixed private key hex, for exporting a freshly generated key
    pub fn private_key_hex(&self) -> String {
        format!("0x{}", hex::encode(self.signing_key.to_bytes()))
    }

    /// Sign arbitrary bytes
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }

    /// Verify a signature produced by this key
    pub fn verify(&self, message: &[u8], signature: &[u8; 64]) -> bool {
        let signature = ed25519_dalek::Signature::from_bytes(signature);
        self.public_key().verify(message, &signature).is_ok()
    }
}

impl std::fmt::Debug for AccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountKey")
            .field("address", &self.address)
            .field("public_key", &self.public_key_hex())
            .finish_non_exhaustive()
    }
}

/// `sha3_256(public_key || 0x00)`
pub fn derive_address(public_key: &VerifyingKey) -> AccountAddress {
    let mut hasher = Sha3_256::new();
    hasher.update(public_key.to_bytes());
    hasher.update([ED25519_SCHEME]);
    let auth_key: [u8; 32] = hasher.finalize().into();
    AccountAddress::from_bytes(&auth_key)
}

// ── Wallet provider ───────────────────────────────────────────────────────────

/// Wallet provider backed by a local key
pub struct KeyfileWallet {
    label: String,
    key: AccountKey,
    chain: Arc<AptosClient>,
    approver: Arc<dyn Approver>,
}

impl KeyfileWallet {
    pub fn new(key: AccountKey, chain: Arc<AptosClient>) -> Self {
        Self {
            label: "keyfile".to_string(),
            key,
            chain,
            approver: Arc::new(AutoApprove),
        }
    }

    /// Ask `approver` before connecting or signing
    pub fn with_approver(mut self, approver: Arc<dyn Approver>) -> Self {
        self.approver = approver;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn address(&self) -> &AccountAddress {
        self.key.address()
    }

    /// Build the unsigned transaction for a payload
    async fn build_transaction(
        &self,
        payload: &EntryFunctionPayload,
    ) -> Result<UserTransactionRequest> {
        let config = self.chain.config();
        let sequence_number = self.chain.sequence_number(self.key.address()).await?;
        let now = chrono::Utc::now().timestamp().max(0) as u64;
        let expiration = now.saturating_add(config.txn_ttl_secs);

        Ok(UserTransactionRequest {
            sender: self.key.address().to_string(),
            sequence_number: sequence_number.to_string(),
            max_gas_amount: config.max_gas_amount.to_string(),
            gas_unit_price: config.gas_unit_price.to_string(),
            expiration_timestamp_secs: expiration.to_string(),
            payload: payload.clone(),
        })
    }
}

#[async_trait]
impl WalletProvider for KeyfileWallet {
    fn name(&self) -> &str {
        &self.label
    }

    async fn connect(&self) -> Result<AccountAddress> {
        let request = ApprovalRequest::Connect {
            address: self.key.address().clone(),
        };
        if !self.approver.approve(&request) {
            return Err(WalletError::UserRejected);
        }
        tracing::info!(wallet = %self.label, address = %self.key.address(), "Wallet connected");
        Ok(self.key.address().clone())
    }

    async fn disconnect(&self) -> Result<()> {
        tracing::info!(wallet = %self.label, "Wallet disconnected");
        Ok(())
    }

    async fn sign_and_submit_transaction(
        &self,
        payload: &EntryFunctionPayload,
    ) -> Result<PendingTransaction> {
        let request = ApprovalRequest::Transaction {
            sender: self.key.address().clone(),
            payload: payload.clone(),
        };
        if !self.approver.approve(&request) {
            return Err(WalletError::UserRejected);
        }

        let transaction = self.build_transaction(payload).await?;
        let message = self.chain.encode_submission(&transaction).await?;
        let signature = self.key.sign(&message);

        let signed = SignedTransactionRequest {
            transaction,
            signature: TransactionSignature::ed25519(&self.key.public_key().to_bytes(), &signature),
        };
        Ok(self.chain.submit_transaction(&signed).await?)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_aptos::ChainConfig;

    struct DenyAll;

    impl Approver for DenyAll {
        fn approve(&self, _request: &ApprovalRequest) -> bool {
            false
        }
    }

    fn test_key() -> AccountKey {
        AccountKey::from_hex(&format!("0x{}", "11".repeat(32))).unwrap()
    }

    fn test_chain() -> Arc<AptosClient> {
        // Never contacted: only connect and rejected signing are exercised
        Arc::new(AptosClient::new(ChainConfig::with_node("http://127.0.0.1:9")).unwrap())
    }

    #[test]
    fn address_is_full_length_hex() {
        let key = test_key();
        assert!(key.address().as_str().starts_with("0x"));
        assert_eq!(key.address().as_str().len(), 66);
    }

    #[test]
    fn same_key_same_address() {
        let a = test_key();
        let b = AccountKey::from_hex(&a.private_key_hex()).unwrap();
        assert_eq!(a.address(), b.address());
        assert_eq!(a.public_key_hex(), b.public_key_hex());
    }

    #[test]
    fn generated_keys_differ() {
        assert_ne!(AccountKey::generate().address(), AccountKey::generate().address());
    }

    #[test]
    fn address_commits_to_scheme_byte() {
        let key = test_key();
        let plain: [u8; 32] = Sha3_256::digest(key.public_key().to_bytes()).into();
        assert_ne!(key.address(), &AccountAddress::from_bytes(&plain));
    }

    #[test]
    fn sign_verify_roundtrip() {
        let key = test_key();
        let sig = key.sign(b"signing message");
        assert!(key.verify(b"signing message", &sig));
        assert!(!key.verify(b"tampered", &sig));
    }

    #[test]
    fn rejects_bad_key_material() {
        assert!(matches!(
            AccountKey::from_hex("0xzz"),
            Err(WalletError::InvalidKey { .. })
        ));
        assert!(matches!(
            AccountKey::from_hex("0x1234"),
            Err(WalletError::InvalidKey { .. })
        ));
    }

    #[test]
    fn loads_key_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("account.key");
        std::fs::write(&path, format!("{}\n", test_key().private_key_hex())).unwrap();
        let key = AccountKey::from_file(&path).unwrap();
        assert_eq!(key.address(), test_key().address());
    }

    #[tokio::test]
    async fn connect_returns_derived_address() {
        let wallet = KeyfileWallet::new(test_key(), test_chain());
        assert_eq!(wallet.connect().await.unwrap(), *test_key().address());
    }

    #[tokio::test]
    async fn denied_approval_is_user_rejected() {
        let wallet =
            KeyfileWallet::new(test_key(), test_chain()).with_approver(Arc::new(DenyAll));
        assert_eq!(wallet.connect().await, Err(WalletError::UserRejected));

        let payload = EntryFunctionPayload::coin_transfer(&AccountAddress::default_treasury(), 1);
        assert_eq!(
            wallet.sign_and_submit_transaction(&payload).await,
            Err(WalletError::UserRejected)
        );
    }
}
