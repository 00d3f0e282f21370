//! CryptoSentinel Types - Canonical domain types for the wallet session
//!
//! This crate contains the foundational types shared by every sentinel crate,
//! with zero dependencies on other sentinel crates:
//!
//! - Account addresses
//! - Fiat balances and balance snapshots
//! - Transfer intents and entry-function payloads
//! - The wallet error taxonomy
//!
//! # Units
//!
//! ```text
//! on-chain balance (octas) ──÷10^8──▶ coins ──×usd rate──▶ total fiat ──×0.8──▶ available fiat
//! ```

pub mod address;
pub mod balance;
pub mod transfer;
pub mod error;

pub use address::*;
pub use balance::*;
pub use transfer::*;
pub use error::*;

/// Version of the sentinel types schema
pub const TYPES_VERSION: &str = "0.1.0";
