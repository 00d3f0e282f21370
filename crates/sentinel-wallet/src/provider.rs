//! Wallet provider: the signing capability a session talks to

use async_trait::async_trait;

use sentinel_types::{AccountAddress, EntryFunctionPayload, PendingTransaction, Result};

/// Connect/disconnect/sign surface of a wallet.
///
/// `connect` fails with `UserRejected` when the user declines and with
/// `ExtensionUnavailable` when the wallet cannot be reached at all.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Wallet name for logs
    fn name(&self) -> &str;

    /// Request the account address
    async fn connect(&self) -> Result<AccountAddress>;

    /// Drop the connection
    async fn disconnect(&self) -> Result<()>;

    /// Sign a payload with the connected account and submit it
    async fn sign_and_submit_transaction(
        &self,
        payload: &EntryFunctionPayload,
    ) -> Result<PendingTransaction>;
}

/// What the user is asked to approve
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalRequest {
    /// Share the account address with the app
    Connect { address: AccountAddress },
    /// Sign and submit a transaction
    Transaction {
        sender: AccountAddress,
        payload: EntryFunctionPayload,
    },
}

/// User confirmation hook, the equivalent of a wallet's approval popup
pub trait Approver: Send + Sync {
    fn approve(&self, request: &ApprovalRequest) -> bool;
}

/// Approves everything
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprove;

impl Approver for AutoApprove {
    fn approve(&self, _request: &ApprovalRequest) -> bool {
        true
    }
}
