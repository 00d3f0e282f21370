//! CryptoSentinel Aptos - Chain and price access for the wallet session
//!
//! Two narrow traits are what the wallet session consumes:
//!
//! - [`ChainClient`]: raw coin balance lookup and transaction confirmation
//! - [`PriceFeed`]: USD conversion rate for the native coin
//!
//! [`AptosClient`] and [`CoinGeckoFeed`] implement them over HTTP with
//! `reqwest`. `AptosClient` also exposes the submission primitives
//! (sequence number, signing-message encoding, submit) that a local signer
//! uses to send transfers.
//!
//! # Endpoints
//!
//! | Call | Endpoint |
//! |------|----------|
//! | coin balance | `GET /v1/accounts/{address}/resource/0x1::coin::CoinStore<0x1::aptos_coin::AptosCoin>` |
//! | sequence number | `GET /v1/accounts/{address}` |
//! | encode | `POST /v1/transactions/encode_submission` |
//! | submit | `POST /v1/transactions` |
//! | confirm | `GET /v1/transactions/by_hash/{hash}` |
//! | price | `GET /simple/price?ids=<asset>&vs_currencies=usd` |

pub mod client;
pub mod config;
pub mod error;
pub mod price;

pub use client::{
    AptosClient, ChainClient, CommittedTransaction, SignedTransactionRequest,
    TransactionSignature, TransactionState, UserTransactionRequest,
};
pub use config::{ChainConfig, PriceConfig};
pub use error::{ChainError, ChainResult};
pub use price::{CoinGeckoFeed, PriceFeed};
