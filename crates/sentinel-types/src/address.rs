//! Account addresses
//!
//! Addresses are 32-byte account identifiers written as `0x`-prefixed hex.
//! Short forms (`0x1`) are accepted as-is; the hex digits are lower-cased so
//! that two spellings of the same address compare equal.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Result, WalletError};

/// Maximum number of hex digits in an address (32 bytes)
pub const ADDRESS_HEX_LEN: usize = 64;

/// Treasury account that receives withdrawals and funds deposits
pub const DEFAULT_TREASURY_ADDRESS: &str =
    "0x9c206f7c7f9e3e345695e3f32bef3d27a7667080d6e8efaa2a056d003b150684";

/// A normalized `0x`-prefixed account address
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountAddress(String);

impl AccountAddress {
    /// Parse and normalize an address string
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        let invalid = |reason: &str| WalletError::InvalidAddress {
            address: input.to_string(),
            reason: reason.to_string(),
        };

        if digits.is_empty() {
            return Err(invalid("address is empty"));
        }
        if digits.len() > ADDRESS_HEX_LEN {
            return Err(invalid("address is longer than 32 bytes"));
        }
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid("address contains non-hex characters"));
        }

        Ok(Self(format!("0x{}", digits.to_ascii_lowercase())))
    }

    /// Build an address from a 32-byte authentication key
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
        Self(format!("0x{}", hex))
    }

    /// The treasury address used when none is configured
    pub fn default_treasury() -> Self {
        Self(DEFAULT_TREASURY_ADDRESS.to_string())
    }

    /// Get the address string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short display form (`0x9c20…0684`)
    pub fn short(&self) -> String {
        if self.0.len() <= 12 {
            return self.0.clone();
        }
        format!("{}…{}", &self.0[..6], &self.0[self.0.len() - 4..])
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AccountAddress {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AccountAddress {
    type Error = WalletError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<AccountAddress> for String {
    fn from(address: AccountAddress) -> Self {
        address.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes_case_and_prefix() {
        let a = AccountAddress::parse("0xABCDEF").unwrap();
        let b = AccountAddress::parse("abcdef").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "0xabcdef");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(AccountAddress::parse("").is_err());
        assert!(AccountAddress::parse("0x").is_err());
        assert!(AccountAddress::parse("0xnothex").is_err());
        assert!(AccountAddress::parse(&format!("0x{}", "a".repeat(65))).is_err());
    }

    #[test]
    fn test_default_treasury_is_valid() {
        let treasury = AccountAddress::default_treasury();
        assert_eq!(AccountAddress::parse(treasury.as_str()).unwrap(), treasury);
    }

    #[test]
    fn test_from_bytes() {
        let address = AccountAddress::from_bytes(&[0xab; 32]);
        assert_eq!(address.as_str().len(), 2 + ADDRESS_HEX_LEN);
        assert!(address.as_str().starts_with("0xabab"));
    }

    #[test]
    fn test_short() {
        let treasury = AccountAddress::default_treasury();
        assert_eq!(treasury.short(), "0x9c20…0684");
    }

    #[test]
    fn test_serde_roundtrip_validates() {
        let json = serde_json::to_string(&AccountAddress::parse("0x1").unwrap()).unwrap();
        assert_eq!(json, "\"0x1\"");
        assert!(serde_json::from_str::<AccountAddress>("\"zz\"").is_err());
    }
}
