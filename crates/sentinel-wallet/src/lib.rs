//! CryptoSentinel Wallet - the connected-wallet session
//!
//! A [`WalletSession`] ties together:
//!
//! - a [`WalletProvider`] that connects accounts and signs transfers
//! - a [`ChainClient`](sentinel_aptos::ChainClient) and
//!   [`PriceFeed`](sentinel_aptos::PriceFeed) for balances
//! - a [`SessionStore`] holding `walletAddress`, `totalBalance`,
//!   `availableBalance` and `dashboardBalance`
//! - a [`WalletBus`] broadcasting [`WalletEvent`]s to every view
//!
//! [`KeyfileWallet`] is the bundled provider: a local ed25519 key that
//! submits through the fullnode REST API.
//!
//! # Example
//!
//! ```ignore
//! let session = WalletSession::builder(chain, prices)
//!     .store(Arc::new(FileStore::open(path)?))
//!     .provider(Arc::new(KeyfileWallet::new(key, client)))
//!     .build()?;
//!
//! session.connect().await?;
//! session.withdraw(dec!(100)).await?;
//! ```

pub mod events;
pub mod keyfile;
pub mod provider;
pub mod session;
pub mod store;

pub use events::{WalletBus, WalletEvent, DEFAULT_BUS_CAPACITY};
pub use keyfile::{derive_address, AccountKey, KeyfileWallet};
pub use provider::{ApprovalRequest, Approver, AutoApprove, WalletProvider};
pub use session::{
    SessionConfig, SessionState, Settlement, TransferReceipt, WalletSession,
    WalletSessionBuilder,
};
pub use store::{keys, FileStore, MemoryStore, SessionStore};
