//! Wallet events and the broadcast bus that carries them
//!
//! Events from one session are published in the order of the store writes
//! they describe, and always after the write has happened.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use sentinel_types::{AccountAddress, TransferDirection};

/// Default number of events buffered per subscriber
pub const DEFAULT_BUS_CAPACITY: usize = 256;

/// Events emitted by a wallet session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WalletEvent {
    /// A wallet connected and its address was persisted
    Connected {
        address: AccountAddress,
        timestamp: DateTime<Utc>,
    },

    /// The session was cleared
    Disconnected {
        timestamp: DateTime<Utc>,
    },

    /// Fresh fiat balances were persisted
    BalanceRefreshed {
        address: AccountAddress,
        total: Decimal,
        available: Decimal,
        timestamp: DateTime<Utc>,
    },

    /// The cached dashboard balance changed
    DashboardBalanceUpdated {
        previous: Decimal,
        new_balance: Decimal,
        reason: TransferDirection,
        timestamp: DateTime<Utc>,
    },

    /// A transfer reached the node
    TransferSubmitted {
        direction: TransferDirection,
        hash: String,
        timestamp: DateTime<Utc>,
    },
}

impl WalletEvent {
    /// Event name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "connected",
            Self::Disconnected { .. } => "disconnected",
            Self::BalanceRefreshed { .. } => "balance_refreshed",
            Self::DashboardBalanceUpdated { .. } => "dashboard_balance_updated",
            Self::TransferSubmitted { .. } => "transfer_submitted",
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Connected { timestamp, .. }
            | Self::Disconnected { timestamp }
            | Self::BalanceRefreshed { timestamp, .. }
            | Self::DashboardBalanceUpdated { timestamp, .. }
            | Self::TransferSubmitted { timestamp, .. } => *timestamp,
        }
    }
}

/// Publish/subscribe channel shared by every view of a session
#[derive(Debug, Clone)]
pub struct WalletBus {
    sender: broadcast::Sender<WalletEvent>,
}

impl WalletBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Broadcast an event
    pub fn publish(&self, event: WalletEvent) {
        tracing::debug!(event = event.kind(), "Publishing wallet event");
        // No subscribers is fine
        let _ = self.sender.send(event);
    }

    /// Subscribe to events published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for WalletBus {
    fn default() -> Self {
        Self::new(DEFAULT_BUS_CAPACITY)
    }
}
