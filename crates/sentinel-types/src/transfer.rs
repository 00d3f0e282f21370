//! Transfer intents and entry-function payloads

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{AccountAddress, Result, WalletError, OCTAS_PER_COIN};

/// Entry-function payload type tag
pub const ENTRY_FUNCTION_PAYLOAD: &str = "entry_function_payload";

/// Coin transfer entry function
pub const COIN_TRANSFER_FUNCTION: &str = "0x1::coin::transfer";

/// Native coin type
pub const NATIVE_COIN_TYPE: &str = "0x1::aptos_coin::AptosCoin";

/// Direction of a transfer relative to the connected wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferDirection {
    /// Treasury to wallet
    Deposit,
    /// Wallet to treasury
    Withdraw,
}

impl fmt::Display for TransferDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deposit => write!(f, "deposit"),
            Self::Withdraw => write!(f, "withdraw"),
        }
    }
}

/// Ephemeral description of one user-requested transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferIntent {
    /// Deposit or withdraw
    pub direction: TransferDirection,
    /// Positive amount in dashboard units
    pub amount: Decimal,
    /// The other side of the transfer (the treasury)
    pub counterparty: AccountAddress,
}

impl TransferIntent {
    /// Create an intent, rejecting non-positive amounts
    pub fn new(
        direction: TransferDirection,
        amount: Decimal,
        counterparty: AccountAddress,
    ) -> Result<Self> {
        validate_amount(amount)?;
        Ok(Self {
            direction,
            amount,
            counterparty,
        })
    }

    /// Amount in octas, truncated toward zero.
    ///
    /// Fails with `InvalidAmount` when the amount is below one octa or does
    /// not fit in a `u64`.
    pub fn octas(&self) -> Result<u64> {
        self.amount
            .checked_mul(Decimal::from(OCTAS_PER_COIN))
            .and_then(|octas| octas.floor().to_u64())
            .filter(|octas| *octas > 0)
            .ok_or(WalletError::InvalidAmount {
                amount: self.amount,
            })
    }

    /// Who receives the coins, given the connected wallet address
    pub fn recipient<'a>(&'a self, owner: &'a AccountAddress) -> &'a AccountAddress {
        match self.direction {
            TransferDirection::Deposit => owner,
            TransferDirection::Withdraw => &self.counterparty,
        }
    }

    /// Who signs and pays, given the connected wallet address
    pub fn sender<'a>(&'a self, owner: &'a AccountAddress) -> &'a AccountAddress {
        match self.direction {
            TransferDirection::Deposit => &self.counterparty,
            TransferDirection::Withdraw => owner,
        }
    }

    /// Build the coin transfer payload for this intent
    pub fn payload(&self, owner: &AccountAddress) -> Result<EntryFunctionPayload> {
        Ok(EntryFunctionPayload::coin_transfer(
            self.recipient(owner),
            self.octas()?,
        ))
    }
}

/// Reject zero and negative amounts
pub fn validate_amount(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(WalletError::InvalidAmount { amount });
    }
    Ok(())
}

/// JSON entry-function payload, as accepted by wallets and the REST API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryFunctionPayload {
    #[serde(rename = "type")]
    pub payload_type: String,
    pub function: String,
    pub type_arguments: Vec<String>,
    pub arguments: Vec<serde_json::Value>,
}

impl EntryFunctionPayload {
    /// `0x1::coin::transfer<AptosCoin>(recipient, octas)`
    pub fn coin_transfer(recipient: &AccountAddress, octas: u64) -> Self {
        Self {
            payload_type: ENTRY_FUNCTION_PAYLOAD.to_string(),
            function: COIN_TRANSFER_FUNCTION.to_string(),
            type_arguments: vec![NATIVE_COIN_TYPE.to_string()],
            arguments: vec![
                serde_json::Value::String(recipient.to_string()),
                // u64 arguments travel as strings
                serde_json::Value::String(octas.to_string()),
            ],
        }
    }
}

/// A transaction accepted by the node but not yet committed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTransaction {
    /// Transaction hash
    pub hash: String,
    /// Sender account, when the wallet reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    /// Sender sequence number, when the wallet reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<String>,
}

impl PendingTransaction {
    pub fn new(hash: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            sender: None,
            sequence_number: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn user() -> AccountAddress {
        AccountAddress::parse("0xabc").unwrap()
    }

    #[test]
    fn test_withdraw_payload_targets_treasury() {
        let intent = TransferIntent::new(
            TransferDirection::Withdraw,
            dec!(1.5),
            AccountAddress::default_treasury(),
        )
        .unwrap();
        let payload = intent.payload(&user()).unwrap();

        assert_eq!(payload.function, "0x1::coin::transfer");
        assert_eq!(payload.type_arguments, vec!["0x1::aptos_coin::AptosCoin"]);
        assert_eq!(payload.arguments[0], AccountAddress::default_treasury().as_str());
        assert_eq!(payload.arguments[1], "150000000");
        assert_eq!(intent.sender(&user()), &user());
    }

    #[test]
    fn test_deposit_payload_targets_wallet() {
        let intent = TransferIntent::new(
            TransferDirection::Deposit,
            dec!(100),
            AccountAddress::default_treasury(),
        )
        .unwrap();
        let payload = intent.payload(&user()).unwrap();
        assert_eq!(payload.arguments[0], "0xabc");
        assert_eq!(intent.sender(&user()), &AccountAddress::default_treasury());
    }

    #[test]
    fn test_octas_truncate() {
        let intent = TransferIntent::new(
            TransferDirection::Withdraw,
            dec!(0.123456789),
            AccountAddress::default_treasury(),
        )
        .unwrap();
        assert_eq!(intent.octas().unwrap(), 12_345_678);
    }

    #[test]
    fn test_sub_octa_amount_is_invalid() {
        let intent = TransferIntent::new(
            TransferDirection::Withdraw,
            dec!(0.000000001),
            AccountAddress::default_treasury(),
        )
        .unwrap();
        assert!(matches!(intent.octas(), Err(WalletError::InvalidAmount { .. })));
    }

    #[test]
    fn test_oversized_amount_is_invalid() {
        for amount in [dec!(1000000000000000000000), Decimal::MAX, dec!(184467440738)] {
            let intent =
                TransferIntent::new(TransferDirection::Deposit, amount, AccountAddress::default_treasury())
                    .unwrap();
            assert!(matches!(intent.payload(&user()), Err(WalletError::InvalidAmount { .. })));
        }
    }

    #[test]
    fn test_largest_u64_amount() {
        // u64::MAX octas
        let intent = TransferIntent::new(
            TransferDirection::Deposit,
            dec!(184467440737.09551615),
            AccountAddress::default_treasury(),
        )
        .unwrap();
        assert_eq!(intent.octas().unwrap(), u64::MAX);
    }

    #[test]
    fn test_payload_serializes_with_type_tag() {
        let payload = EntryFunctionPayload::coin_transfer(&user(), 42);
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "entry_function_payload");
        assert_eq!(json["arguments"][1], "42");
    }

    proptest! {
        #[test]
        fn prop_non_positive_amounts_rejected(cents in -1_000_000_000i64..=0) {
            let amount = Decimal::new(cents, 2);
            let result = TransferIntent::new(
                TransferDirection::Deposit,
                amount,
                AccountAddress::default_treasury(),
            );
            let is_invalid_amount = matches!(result, Err(WalletError::InvalidAmount { .. }));
            prop_assert!(is_invalid_amount);
        }

        #[test]
        fn prop_octas_never_panics(
            lo in any::<u32>(),
            mid in any::<u32>(),
            hi in any::<u32>(),
            scale in 0u32..=28,
        ) {
            let amount = Decimal::from_parts(lo, mid, hi, false, scale);
            if let Ok(intent) = TransferIntent::new(
                TransferDirection::Withdraw,
                amount,
                AccountAddress::default_treasury(),
            ) {
                let _ = intent.octas();
            }
        }
    }
}
