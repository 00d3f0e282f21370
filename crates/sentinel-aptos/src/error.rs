//! Chain and price endpoint errors

use sentinel_types::WalletError;
use thiserror::Error;

/// Chain client errors
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Transaction {hash} failed: {vm_status}")]
    TransactionFailed { hash: String, vm_status: String },

    #[error("Transaction {hash} not confirmed after {waited_secs}s")]
    ConfirmationTimeout { hash: String, waited_secs: u64 },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type for chain operations
pub type ChainResult<T> = Result<T, ChainError>;

impl ChainError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }

    /// Whether the failure happened after the transaction reached the node
    pub fn is_post_submission(&self) -> bool {
        matches!(
            self,
            Self::TransactionFailed { .. } | Self::ConfirmationTimeout { .. }
        )
    }
}

impl From<ChainError> for WalletError {
    fn from(e: ChainError) -> Self {
        match e {
            ChainError::MalformedResponse(message) => WalletError::malformed(message),
            ChainError::TransactionFailed { .. } | ChainError::ConfirmationTimeout { .. } => {
                WalletError::transfer_failed(e.to_string())
            }
            other => WalletError::network(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wallet_error_mapping() {
        let malformed: WalletError = ChainError::malformed("no coin.value").into();
        assert_eq!(malformed, WalletError::malformed("no coin.value"));

        let api: WalletError = ChainError::Api {
            status: 503,
            message: "unavailable".to_string(),
        }
        .into();
        assert_eq!(api.error_code(), "NETWORK_ERROR");

        let timeout: WalletError = ChainError::ConfirmationTimeout {
            hash: "0xabc".to_string(),
            waited_secs: 20,
        }
        .into();
        assert_eq!(timeout.error_code(), "TRANSFER_FAILED");
    }
}
