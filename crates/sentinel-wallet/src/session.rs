//! Wallet session
//!
//! Owns the connected address and cached fiat balances, mediates deposits
//! and withdrawals, and persists everything through a [`SessionStore`].
//!
//! ```text
//! Disconnected ──connect──▶ Connected{balance unknown} ──refresh──▶ Connected{balance known}
//!      ▲                                                                   │
//!      └──────────────────────────── disconnect ◀──────────────────────────┘
//! ```
//!
//! State lives behind a `parking_lot::RwLock` that is only taken between
//! awaits. Mutations write the store and publish their event under the
//! write guard, so events follow store order.

use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

use sentinel_aptos::{ChainClient, PriceFeed};
use sentinel_types::{
    format_fiat, parse_fiat, validate_amount, AccountAddress, BalanceSnapshot,
    EntryFunctionPayload, FiatBalance, Result, TransferDirection, TransferIntent, WalletError,
    AVAILABLE_RATIO, DEFAULT_DASHBOARD_BALANCE, MIN_BALANCE,
};

use crate::events::{WalletBus, WalletEvent, DEFAULT_BUS_CAPACITY};
use crate::provider::WalletProvider;
use crate::store::{keys, MemoryStore, SessionStore};

// ============================================================================
// Configuration
// ============================================================================

/// Session policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Price feed asset id of the native coin
    pub asset_id: String,
    /// Counterparty of deposits and withdrawals
    pub treasury_address: AccountAddress,
    /// Dashboard balance a withdrawal must leave behind
    pub min_balance: Decimal,
    /// Share of the total reported as available
    pub available_ratio: Decimal,
    /// Dashboard balance assumed when nothing is cached
    pub default_dashboard_balance: Decimal,
    /// Events buffered per subscriber
    pub bus_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            asset_id: "aptos".to_string(),
            treasury_address: AccountAddress::default_treasury(),
            min_balance: MIN_BALANCE,
            available_ratio: AVAILABLE_RATIO,
            default_dashboard_balance: DEFAULT_DASHBOARD_BALANCE,
            bus_capacity: DEFAULT_BUS_CAPACITY,
        }
    }
}

// ============================================================================
// State and receipts
// ============================================================================

/// Top-level session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    Disconnected,
    Connected { balance_known: bool },
}

/// How a transfer was settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Settlement {
    /// No transaction was sent; only the dashboard balance moved
    Simulated,
    /// The transaction committed on-chain
    Confirmed,
}

/// Outcome of a deposit or withdrawal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub intent: TransferIntent,
    /// Coin transfer payload; absent for a simulated deposit whose amount
    /// has no octa representation
    pub payload: Option<EntryFunctionPayload>,
    pub previous_balance: Decimal,
    pub new_balance: Decimal,
    pub tx_hash: Option<String>,
    pub settlement: Settlement,
}

#[derive(Debug, Clone, Default)]
struct SessionData {
    address: Option<AccountAddress>,
    total: FiatBalance,
    available: FiatBalance,
    /// Ticket of the last refresh written to the store
    applied_refresh: u64,
}

impl SessionData {
    fn state(&self) -> SessionState {
        match self.address {
            None => SessionState::Disconnected,
            Some(_) => SessionState::Connected {
                balance_known: self.total.is_known(),
            },
        }
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Assembles a [`WalletSession`] from its collaborators
pub struct WalletSessionBuilder {
    chain: Arc<dyn ChainClient>,
    prices: Arc<dyn PriceFeed>,
    store: Option<Arc<dyn SessionStore>>,
    provider: Option<Arc<dyn WalletProvider>>,
    treasury: Option<Arc<dyn WalletProvider>>,
    config: SessionConfig,
}

impl WalletSessionBuilder {
    /// Persistence backend (defaults to an in-memory store)
    pub fn store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Wallet the user connects and signs withdrawals with
    pub fn provider(mut self, provider: Arc<dyn WalletProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Wallet holding the treasury account; deposits are simulated without one
    pub fn treasury(mut self, treasury: Arc<dyn WalletProvider>) -> Self {
        self.treasury = Some(treasury);
        self
    }

    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Load persisted state and build the session
    pub fn build(self) -> Result<WalletSession> {
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()) as Arc<dyn SessionStore>);
        let data = load_state(store.as_ref())?;

        if let Some(address) = &data.address {
            tracing::info!(address = %address, total = %data.total, "Restored wallet session");
        }

        Ok(WalletSession {
            bus: WalletBus::new(self.config.bus_capacity),
            config: self.config,
            chain: self.chain,
            prices: self.prices,
            provider: self.provider,
            treasury: self.treasury,
            store,
            data: RwLock::new(data),
            refresh_seq: AtomicU64::new(0),
        })
    }
}

/// Read the session from the store. Unparseable values are treated as absent.
fn load_state(store: &dyn SessionStore) -> Result<SessionData> {
    let address = match store.get(keys::WALLET_ADDRESS)? {
        Some(raw) => match AccountAddress::parse(&raw) {
            Ok(address) => Some(address),
            Err(e) => {
                tracing::warn!(value = %raw, error = %e, "Ignoring stored wallet address");
                None
            }
        },
        None => None,
    };

    if address.is_none() {
        return Ok(SessionData::default());
    }

    let load_fiat = |key: &str| -> Result<FiatBalance> {
        Ok(match store.get(key)? {
            Some(raw) => FiatBalance::from_stored(&raw).unwrap_or_else(|| {
                tracing::warn!(key, value = %raw, "Ignoring stored balance");
                FiatBalance::Unknown
            }),
            None => FiatBalance::Unknown,
        })
    };

    Ok(SessionData {
        address,
        total: load_fiat(keys::TOTAL_BALANCE)?,
        available: load_fiat(keys::AVAILABLE_BALANCE)?,
        applied_refresh: 0,
    })
}

// ============================================================================
// Session
// ============================================================================

/// Connected-wallet session
pub struct WalletSession {
    config: SessionConfig,
    chain: Arc<dyn ChainClient>,
    prices: Arc<dyn PriceFeed>,
    provider: Option<Arc<dyn WalletProvider>>,
    treasury: Option<Arc<dyn WalletProvider>>,
    store: Arc<dyn SessionStore>,
    data: RwLock<SessionData>,
    bus: WalletBus,
    refresh_seq: AtomicU64,
}

impl WalletSession {
    pub fn builder(chain: Arc<dyn ChainClient>, prices: Arc<dyn PriceFeed>) -> WalletSessionBuilder {
        WalletSessionBuilder {
            chain,
            prices,
            store: None,
            provider: None,
            treasury: None,
            config: SessionConfig::default(),
        }
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.data.read().state()
    }

    /// Connected address, if any
    pub fn address(&self) -> Option<AccountAddress> {
        self.data.read().address.clone()
    }

    /// Cached `(total, available)` fiat balances
    pub fn balances(&self) -> (FiatBalance, FiatBalance) {
        let data = self.data.read();
        (data.total, data.available)
    }

    /// Cached dashboard balance, falling back to the configured default
    pub fn dashboard_balance(&self) -> Result<Decimal> {
        Ok(match self.store.get(keys::DASHBOARD_BALANCE)? {
            Some(raw) => parse_fiat(&raw).unwrap_or_else(|| {
                tracing::warn!(value = %raw, "Ignoring stored dashboard balance");
                self.config.default_dashboard_balance
            }),
            None => self.config.default_dashboard_balance,
        })
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.bus.subscribe()
    }

    fn provider(&self) -> Result<&Arc<dyn WalletProvider>> {
        self.provider
            .as_ref()
            .ok_or_else(|| WalletError::unavailable("no wallet provider configured"))
    }

    // ------------------------------------------------------------------------
    // Connection
    // ------------------------------------------------------------------------

    /// Connect the wallet, persist its address and refresh balances
    pub async fn connect(&self) -> Result<AccountAddress> {
        let provider = self.provider()?;
        let address = provider.connect().await?;

        {
            let mut data = self.data.write();
            if data.address.as_ref() != Some(&address) {
                self.store.remove(keys::TOTAL_BALANCE)?;
                self.store.remove(keys::AVAILABLE_BALANCE)?;
                data.total = FiatBalance::Unknown;
                data.available = FiatBalance::Unknown;
            }
            self.store.set(keys::WALLET_ADDRESS, address.as_str())?;
            data.address = Some(address.clone());
            self.bus.publish(WalletEvent::Connected {
                address: address.clone(),
                timestamp: chrono::Utc::now(),
            });
        }

        tracing::info!(wallet = provider.name(), address = %address, "Wallet session connected");
        self.refresh_balance(&address).await;
        Ok(address)
    }

    /// Disconnect the wallet and clear every stored key.
    ///
    /// The provider's failure to disconnect is logged and does not stop the
    /// local session from being cleared.
    pub async fn disconnect(&self) -> Result<()> {
        if let Some(provider) = &self.provider {
            if let Err(e) = provider.disconnect().await {
                tracing::warn!(wallet = provider.name(), error = %e, "Provider disconnect failed");
            }
        }

        let mut data = self.data.write();
        let mut first_error = None;
        for key in keys::ALL {
            if let Err(e) = self.store.remove(key) {
                tracing::warn!(key, error = %e, "Failed to clear stored value");
                first_error.get_or_insert(e);
            }
        }
        let applied_refresh = data.applied_refresh;
        *data = SessionData {
            applied_refresh,
            ..SessionData::default()
        };
        self.bus.publish(WalletEvent::Disconnected {
            timestamp: chrono::Utc::now(),
        });
        drop(data);

        tracing::info!("Wallet session disconnected");
        first_error.map_or(Ok(()), Err)
    }

    /// Refresh the restored session, if any
    pub async fn resume(&self) -> Option<BalanceSnapshot> {
        let address = self.address()?;
        self.refresh_balance(&address).await
    }

    // ------------------------------------------------------------------------
    // Balances
    // ------------------------------------------------------------------------

    /// Refresh balances for `address`, logging and swallowing failures
    pub async fn refresh_balance(&self, address: &AccountAddress) -> Option<BalanceSnapshot> {
        match self.try_refresh_balance(address).await {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!(address = %address, error = %e, "Balance refresh failed");
                None
            }
        }
    }

    /// Refresh balances for the connected address
    pub async fn refresh(&self) -> Result<BalanceSnapshot> {
        let address = self.address().ok_or(WalletError::NoActiveSession)?;
        self.try_refresh_balance(&address).await
    }

    /// Fetch the raw balance, then the price, and persist fiat values.
    ///
    /// The snapshot is returned even when it is not persisted: a newer
    /// refresh already landed, or the session moved to another address.
    pub async fn try_refresh_balance(&self, address: &AccountAddress) -> Result<BalanceSnapshot> {
        let ticket = self.refresh_seq.fetch_add(1, Ordering::SeqCst) + 1;

        let raw_octas = self.chain.coin_balance(address).await?;
        let usd_rate = self.prices.usd_price(&self.config.asset_id).await?;
        let snapshot = BalanceSnapshot::compute(raw_octas, usd_rate, self.config.available_ratio)
            .ok_or_else(|| {
                WalletError::malformed(format!(
                    "price {} overflows a balance of {} octas",
                    usd_rate, raw_octas
                ))
            })?;

        self.apply_snapshot(ticket, address, &snapshot)?;
        Ok(snapshot)
    }

    fn apply_snapshot(
        &self,
        ticket: u64,
        address: &AccountAddress,
        snapshot: &BalanceSnapshot,
    ) -> Result<bool> {
        let mut data = self.data.write();

        if data.address.as_ref() != Some(address) {
            tracing::debug!(address = %address, "Discarding refresh for inactive address");
            return Ok(false);
        }
        if ticket < data.applied_refresh {
            tracing::debug!(ticket, applied = data.applied_refresh, "Discarding stale refresh");
            return Ok(false);
        }

        let total = FiatBalance::Known(snapshot.total);
        let available = FiatBalance::Known(snapshot.available);
        self.store.set(keys::TOTAL_BALANCE, &total.to_stored())?;
        self.store.set(keys::AVAILABLE_BALANCE, &available.to_stored())?;

        data.total = total;
        data.available = available;
        data.applied_refresh = ticket;

        self.bus.publish(WalletEvent::BalanceRefreshed {
            address: address.clone(),
            total: snapshot.total,
            available: snapshot.available,
            timestamp: snapshot.fetched_at,
        });
        tracing::info!(
            address = %address,
            octas = snapshot.raw_octas,
            total = %total,
            available = %available,
            "Balance refreshed"
        );
        Ok(true)
    }

    // ------------------------------------------------------------------------
    // Transfers
    // ------------------------------------------------------------------------

    /// Validate the amount, then require a session
    fn prepare(
        &self,
        direction: TransferDirection,
        amount: Decimal,
    ) -> Result<(TransferIntent, AccountAddress)> {
        validate_amount(amount)?;
        let owner = self.address().ok_or(WalletError::NoActiveSession)?;
        let intent = TransferIntent::new(direction, amount, self.config.treasury_address.clone())?;
        Ok((intent, owner))
    }

    /// Move funds from the treasury to the wallet.
    ///
    /// With a treasury provider the transfer is signed and confirmed on-chain;
    /// without one it is simulated and only the dashboard balance moves.
    pub async fn deposit(&self, amount: Decimal) -> Result<TransferReceipt> {
        let (intent, owner) = self.prepare(TransferDirection::Deposit, amount)?;
        settled_balance(self.dashboard_balance()?, &intent)?;

        let (payload, tx_hash, settlement) = match &self.treasury {
            Some(treasury) => {
                let payload = intent.payload(&owner)?;
                let hash = self
                    .submit_and_confirm(treasury.as_ref(), intent.direction, &payload)
                    .await?;
                (Some(payload), Some(hash), Settlement::Confirmed)
            }
            None => {
                // Octa bounds only matter once a transaction is sent
                let payload = intent.payload(&owner).ok();
                tracing::info!(
                    amount = %amount,
                    recipient = %owner,
                    payload = %payload
                        .as_ref()
                        .and_then(|p| serde_json::to_string(p).ok())
                        .unwrap_or_default(),
                    "Simulated deposit"
                );
                (payload, None, Settlement::Simulated)
            }
        };

        let receipt = self.apply_transfer(intent, payload, tx_hash, settlement)?;
        self.refresh_balance(&owner).await;
        Ok(receipt)
    }

    /// Move funds from the wallet to the treasury, keeping the dashboard
    /// balance at or above the minimum
    pub async fn withdraw(&self, amount: Decimal) -> Result<TransferReceipt> {
        let (intent, owner) = self.prepare(TransferDirection::Withdraw, amount)?;

        let current = self.dashboard_balance()?;
        let remaining = current.checked_sub(amount);
        if remaining.map_or(true, |rest| rest < self.config.min_balance) {
            let max_allowed = current
                .checked_sub(self.config.min_balance)
                .unwrap_or(Decimal::ZERO)
                .max(Decimal::ZERO);
            tracing::info!(
                requested = %amount,
                max_allowed = %max_allowed,
                "Withdrawal rejected below minimum balance"
            );
            return Err(WalletError::BelowMinimum {
                requested: amount,
                minimum: self.config.min_balance,
                max_allowed,
            });
        }

        let payload = intent.payload(&owner)?;
        let provider = self.provider()?;
        let hash = self
            .submit_and_confirm(provider.as_ref(), intent.direction, &payload)
            .await?;

        let receipt =
            self.apply_transfer(intent, Some(payload), Some(hash), Settlement::Confirmed)?;
        self.refresh_balance(&owner).await;
        Ok(receipt)
    }

    /// Sign, submit and wait for commit; any failure is a `TransferFailed`
    async fn submit_and_confirm(
        &self,
        signer: &dyn WalletProvider,
        direction: TransferDirection,
        payload: &EntryFunctionPayload,
    ) -> Result<String> {
        tracing::debug!(wallet = signer.name(), %direction, ?payload, "Submitting transfer");

        let pending = signer
            .sign_and_submit_transaction(payload)
            .await
            .map_err(|e| WalletError::transfer_failed(e.to_string()))?;

        self.bus.publish(WalletEvent::TransferSubmitted {
            direction,
            hash: pending.hash.clone(),
            timestamp: chrono::Utc::now(),
        });
        tracing::info!(%direction, hash = %pending.hash, "Transfer submitted");

        let committed = self
            .chain
            .wait_for_transaction(&pending.hash)
            .await
            .map_err(|e| WalletError::transfer_failed(e.to_string()))?;

        tracing::info!(
            %direction,
            hash = %committed.hash,
            version = committed.version.as_deref().unwrap_or("-"),
            "Transfer confirmed"
        );
        Ok(committed.hash)
    }

    fn apply_transfer(
        &self,
        intent: TransferIntent,
        payload: Option<EntryFunctionPayload>,
        tx_hash: Option<String>,
        settlement: Settlement,
    ) -> Result<TransferReceipt> {
        let _data = self.data.write();

        let previous_balance = self.dashboard_balance()?;
        let new_balance = settled_balance(previous_balance, &intent)?;
        self.store
            .set(keys::DASHBOARD_BALANCE, &format_fiat(new_balance))?;

        self.bus.publish(WalletEvent::DashboardBalanceUpdated {
            previous: previous_balance,
            new_balance,
            reason: intent.direction,
            timestamp: chrono::Utc::now(),
        });
        tracing::info!(
            direction = %intent.direction,
            amount = %intent.amount,
            previous = %format_fiat(previous_balance),
            new_balance = %format_fiat(new_balance),
            ?settlement,
            "Dashboard balance updated"
        );

        Ok(TransferReceipt {
            intent,
            payload,
            previous_balance,
            new_balance,
            tx_hash,
            settlement,
        })
    }
}

/// Dashboard balance after `intent` settles
fn settled_balance(previous: Decimal, intent: &TransferIntent) -> Result<Decimal> {
    match intent.direction {
        TransferDirection::Deposit => previous.checked_add(intent.amount),
        TransferDirection::Withdraw => previous.checked_sub(intent.amount),
    }
    .ok_or(WalletError::InvalidAmount {
        amount: intent.amount,
    })
}

impl std::fmt::Debug for WalletSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let data = self.data.read();
        f.debug_struct("WalletSession")
            .field("address", &data.address)
            .field("total", &data.total)
            .field("available", &data.available)
            .field("provider", &self.provider.as_ref().map(|p| p.name().to_string()))
            .field("treasury", &self.treasury.as_ref().map(|p| p.name().to_string()))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use sentinel_aptos::{ChainResult, CommittedTransaction};
    use sentinel_types::PendingTransaction;

    struct FixedChain(u64);

    #[async_trait]
    impl ChainClient for FixedChain {
        async fn coin_balance(&self, _address: &AccountAddress) -> ChainResult<u64> {
            Ok(self.0)
        }

        async fn wait_for_transaction(&self, hash: &str) -> ChainResult<CommittedTransaction> {
            Ok(CommittedTransaction {
                hash: hash.to_string(),
                version: Some("1".to_string()),
                success: true,
                vm_status: "Executed successfully".to_string(),
            })
        }
    }

    struct FixedPrice(Decimal);

    #[async_trait]
    impl PriceFeed for FixedPrice {
        async fn usd_price(&self, _asset_id: &str) -> ChainResult<Decimal> {
            Ok(self.0)
        }
    }

    struct StaticWallet(AccountAddress);

    #[async_trait]
    impl WalletProvider for StaticWallet {
        fn name(&self) -> &str {
            "static"
        }

        async fn connect(&self) -> Result<AccountAddress> {
            Ok(self.0.clone())
        }

        async fn disconnect(&self) -> Result<()> {
            Ok(())
        }

        async fn sign_and_submit_transaction(
            &self,
            _payload: &EntryFunctionPayload,
        ) -> Result<PendingTransaction> {
            Ok(PendingTransaction::new("0xfeed"))
        }
    }

    fn user() -> AccountAddress {
        AccountAddress::parse("0xabc").unwrap()
    }

    fn session_with(store: Arc<MemoryStore>) -> WalletSession {
        WalletSession::builder(
            Arc::new(FixedChain(250_000_000)),
            Arc::new(FixedPrice(dec!(8.42))),
        )
        .store(store)
        .provider(Arc::new(StaticWallet(user())))
        .build()
        .unwrap()
    }

    #[tokio::test]
    async fn test_state_transitions() {
        let session = session_with(Arc::new(MemoryStore::new()));
        assert_eq!(session.state(), SessionState::Disconnected);

        session.connect().await.unwrap();
        assert_eq!(session.state(), SessionState::Connected { balance_known: true });

        session.disconnect().await.unwrap();
        assert_eq!(session.state(), SessionState::Disconnected);
    }

    #[test]
    fn test_restores_from_store() {
        let store = Arc::new(MemoryStore::with_entries([
            (keys::WALLET_ADDRESS, "0xabc"),
            (keys::TOTAL_BALANCE, "$21.05"),
            (keys::AVAILABLE_BALANCE, "garbage"),
        ]));
        let session = session_with(store);

        assert_eq!(session.address(), Some(user()));
        assert_eq!(
            session.balances(),
            (FiatBalance::Known(dec!(21.05)), FiatBalance::Unknown)
        );
    }

    #[test]
    fn test_invalid_stored_address_is_ignored() {
        let store = Arc::new(MemoryStore::with_entries([
            (keys::WALLET_ADDRESS, "not-an-address"),
            (keys::TOTAL_BALANCE, "$21.05"),
        ]));
        let session = session_with(store);
        assert_eq!(session.state(), SessionState::Disconnected);
        assert_eq!(session.balances().0, FiatBalance::Unknown);
    }

    #[test]
    fn test_dashboard_balance_default() {
        let store = Arc::new(MemoryStore::new());
        let session = session_with(store.clone());
        assert_eq!(session.dashboard_balance().unwrap(), dec!(4231.89));

        store.set(keys::DASHBOARD_BALANCE, "1000.50").unwrap();
        assert_eq!(session.dashboard_balance().unwrap(), dec!(1000.50));
    }

    #[tokio::test]
    async fn test_stale_refresh_is_discarded() {
        let store = Arc::new(MemoryStore::new());
        let session = session_with(store.clone());
        session.connect().await.unwrap();

        let newer = BalanceSnapshot::compute(100_000_000, dec!(10), AVAILABLE_RATIO).unwrap();
        let older = BalanceSnapshot::compute(300_000_000, dec!(10), AVAILABLE_RATIO).unwrap();
        assert!(session.apply_snapshot(100, &user(), &newer).unwrap());
        assert!(!session.apply_snapshot(99, &user(), &older).unwrap());

        assert_eq!(session.balances().0, FiatBalance::Known(dec!(10)));
        assert_eq!(store.get(keys::TOTAL_BALANCE).unwrap().as_deref(), Some("$10.00"));
    }

    #[tokio::test]
    async fn test_refresh_for_other_address_is_not_persisted() {
        let store = Arc::new(MemoryStore::new());
        let session = session_with(store.clone());
        session.connect().await.unwrap();
        store.remove(keys::TOTAL_BALANCE).unwrap();

        let other = AccountAddress::parse("0xdef").unwrap();
        let snapshot = session.try_refresh_balance(&other).await.unwrap();
        assert_eq!(snapshot.total, dec!(21.05));
        assert_eq!(store.get(keys::TOTAL_BALANCE).unwrap(), None);
    }

    #[tokio::test]
    async fn test_withdraw_keeps_minimum() {
        let store = Arc::new(MemoryStore::new());
        let session = session_with(store.clone());
        session.connect().await.unwrap();

        let receipt = session.withdraw(dec!(3731.89)).await.unwrap();
        assert_eq!(receipt.new_balance, dec!(500.00));
        assert_eq!(receipt.settlement, Settlement::Confirmed);
        assert_eq!(receipt.tx_hash.as_deref(), Some("0xfeed"));
        assert_eq!(store.get(keys::DASHBOARD_BALANCE).unwrap().as_deref(), Some("500.00"));
    }

    #[tokio::test]
    async fn test_max_allowed_never_negative() {
        let store = Arc::new(MemoryStore::with_entries([(keys::DASHBOARD_BALANCE, "200.00")]));
        let session = session_with(store);
        session.connect().await.unwrap();

        let err = session.withdraw(dec!(1)).await.unwrap_err();
        assert_eq!(
            err,
            WalletError::BelowMinimum {
                requested: dec!(1),
                minimum: dec!(500),
                max_allowed: Decimal::ZERO,
            }
        );
    }

    #[tokio::test]
    async fn test_huge_withdraw_is_below_minimum() {
        let store = Arc::new(MemoryStore::new());
        let session = session_with(store.clone());
        session.connect().await.unwrap();

        for amount in [dec!(1000000000000000000000), Decimal::MAX] {
            let err = session.withdraw(amount).await.unwrap_err();
            assert_eq!(
                err,
                WalletError::BelowMinimum {
                    requested: amount,
                    minimum: dec!(500),
                    max_allowed: dec!(3731.89),
                }
            );
        }
        assert_eq!(store.get(keys::DASHBOARD_BALANCE).unwrap(), None);
    }

    #[tokio::test]
    async fn test_huge_simulated_deposit() {
        let store = Arc::new(MemoryStore::new());
        let session = session_with(store.clone());
        session.connect().await.unwrap();

        // Past u64 octas: no payload, but the dashboard still moves
        let receipt = session.deposit(dec!(1000000000000000000000)).await.unwrap();
        assert_eq!(receipt.settlement, Settlement::Simulated);
        assert_eq!(receipt.payload, None);
        assert_eq!(receipt.new_balance, dec!(1000000000000000004231.89));

        // Sub-octa amounts are accepted the same way
        let receipt = session.deposit(dec!(0.000000001)).await.unwrap();
        assert_eq!(receipt.payload, None);
    }

    #[tokio::test]
    async fn test_overflowing_deposit_is_invalid() {
        let store = Arc::new(MemoryStore::new());
        let session = session_with(store.clone());
        session.connect().await.unwrap();

        let err = session.deposit(Decimal::MAX).await.unwrap_err();
        assert_eq!(err, WalletError::InvalidAmount { amount: Decimal::MAX });
        assert_eq!(store.get(keys::DASHBOARD_BALANCE).unwrap(), None);
    }

    #[tokio::test]
    async fn test_overflowing_price_is_malformed() {
        let session = WalletSession::builder(
            Arc::new(FixedChain(u64::MAX)),
            Arc::new(FixedPrice(Decimal::from(10_000_000_000_000_000_000u64))),
        )
        .provider(Arc::new(StaticWallet(user())))
        .build()
        .unwrap();

        session.connect().await.unwrap();
        assert_eq!(session.balances(), (FiatBalance::Unknown, FiatBalance::Unknown));
        assert!(matches!(
            session.refresh().await,
            Err(WalletError::MalformedResponse { .. })
        ));
    }
}
