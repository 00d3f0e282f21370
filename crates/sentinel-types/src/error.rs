//! Error types for the wallet session
//!
//! Every failure is handled at the call site that triggered it; none is fatal.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::balance::format_fiat;

/// Result type for wallet operations
pub type Result<T> = std::result::Result<T, WalletError>;

/// Wallet error taxonomy
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    // ========================================================================
    // Provider Errors
    // ========================================================================

    /// No wallet provider is installed or configured
    #[error("Wallet provider is not available: {reason}")]
    ExtensionUnavailable { reason: String },

    /// The user declined the request in the wallet
    #[error("Request rejected by the user")]
    UserRejected,

    // ========================================================================
    // Validation Errors
    // ========================================================================

    /// Amount is zero, negative or not representable on-chain
    #[error("Invalid amount: {amount}")]
    InvalidAmount { amount: Decimal },

    /// Operation requires a connected wallet
    #[error("No active wallet session. Connect a wallet first")]
    NoActiveSession,

    /// Withdrawal would take the dashboard balance under the minimum
    #[error(
        "Cannot withdraw ${}. Balance would drop below minimum ${}. Maximum withdrawal: ${}",
        format_fiat(*requested),
        format_fiat(*minimum),
        format_fiat(*max_allowed)
    )]
    BelowMinimum {
        requested: Decimal,
        minimum: Decimal,
        max_allowed: Decimal,
    },

    /// Address is not a valid hex account address
    #[error("Invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    /// Private key material could not be decoded
    #[error("Invalid key: {reason}")]
    InvalidKey { reason: String },

    // ========================================================================
    // Transfer Errors
    // ========================================================================

    /// Signing, submission or confirmation failed
    #[error("Transfer failed: {message}")]
    TransferFailed { message: String },

    // ========================================================================
    // I/O Errors
    // ========================================================================

    /// Chain or price endpoint could not be reached
    #[error("Network error: {message}")]
    NetworkError { message: String },

    /// Endpoint answered with an unexpected shape
    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },

    /// Session store could not be read or written
    #[error("Storage error: {message}")]
    Storage { message: String },
}

impl WalletError {
    /// Create an extension-unavailable error
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::ExtensionUnavailable {
            reason: reason.into(),
        }
    }

    /// Create a transfer-failed error
    pub fn transfer_failed(message: impl Into<String>) -> Self {
        Self::TransferFailed {
            message: message.into(),
        }
    }

    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkError {
            message: message.into(),
        }
    }

    /// Create a malformed-response error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create an invalid-key error
    pub fn invalid_key(reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            reason: reason.into(),
        }
    }

    /// Whether the error came from user input rather than the environment
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidAmount { .. }
                | Self::NoActiveSession
                | Self::BelowMinimum { .. }
                | Self::InvalidAddress { .. }
                | Self::UserRejected
        )
    }

    /// Get a stable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ExtensionUnavailable { .. } => "EXTENSION_UNAVAILABLE",
            Self::UserRejected => "USER_REJECTED",
            Self::InvalidAmount { .. } => "INVALID_AMOUNT",
            Self::NoActiveSession => "NO_ACTIVE_SESSION",
            Self::BelowMinimum { .. } => "BELOW_MINIMUM",
            Self::InvalidAddress { .. } => "INVALID_ADDRESS",
            Self::InvalidKey { .. } => "INVALID_KEY",
            Self::TransferFailed { .. } => "TRANSFER_FAILED",
            Self::NetworkError { .. } => "NETWORK_ERROR",
            Self::MalformedResponse { .. } => "MALFORMED_RESPONSE",
            Self::Storage { .. } => "STORAGE_ERROR",
        }
    }
}

impl From<serde_json::Error> for WalletError {
    fn from(e: serde_json::Error) -> Self {
        WalletError::storage(e.to_string())
    }
}

impl From<std::io::Error> for WalletError {
    fn from(e: std::io::Error) -> Self {
        WalletError::storage(e.to_string())
    }
}
