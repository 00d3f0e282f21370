//! Fiat balances and balance snapshots

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Decimal places of the native coin (1 coin = 10^8 octas)
pub const COIN_DECIMALS: u32 = 8;

/// Octas per coin
pub const OCTAS_PER_COIN: u64 = 100_000_000;

/// Decimal places shown for fiat values
pub const FIAT_DECIMALS: u32 = 2;

/// Minimum dashboard balance a withdrawal must leave behind
pub const MIN_BALANCE: Decimal = Decimal::from_parts(500, 0, 0, false, 0);

/// Share of the total balance reported as available (80%)
pub const AVAILABLE_RATIO: Decimal = Decimal::from_parts(8, 0, 0, false, 1);

/// Dashboard balance assumed when nothing has been cached yet
pub const DEFAULT_DASHBOARD_BALANCE: Decimal = Decimal::from_parts(423_189, 0, 0, false, 2);

/// Placeholder shown when a fiat value is unknown
pub const FIAT_PLACEHOLDER: &str = "$ --";

/// Round a fiat value to cents, half away from zero
pub fn round_fiat(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(FIAT_DECIMALS, RoundingStrategy::MidpointAwayFromZero)
}

/// Render a fiat value with exactly two decimals (`3731.89`, `500.00`)
pub fn format_fiat(value: Decimal) -> String {
    let mut rounded = round_fiat(value);
    rounded.rescale(FIAT_DECIMALS);
    rounded.to_string()
}

/// Parse a stored fiat string, tolerating a leading `$`
pub fn parse_fiat(input: &str) -> Option<Decimal> {
    let trimmed = input.trim();
    let digits = trimmed.strip_prefix('$').unwrap_or(trimmed).trim();
    digits.parse::<Decimal>().ok()
}

/// Convert octas to whole coins
pub fn octas_to_coins(octas: u64) -> Decimal {
    Decimal::from(octas) / Decimal::from(OCTAS_PER_COIN)
}

/// A fiat value that may not have been fetched yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum FiatBalance {
    /// Value has not been fetched (or was cleared)
    #[default]
    Unknown,
    /// Value in USD
    Known(Decimal),
}

impl FiatBalance {
    /// Parse a stored value (`"$1234.56"`); the placeholder maps to `Unknown`
    pub fn from_stored(input: &str) -> Option<Self> {
        if input.trim() == FIAT_PLACEHOLDER {
            return Some(Self::Unknown);
        }
        parse_fiat(input).map(Self::Known)
    }

    /// String form written to the session store
    pub fn to_stored(&self) -> String {
        self.to_string()
    }

    /// Get the value if known
    pub fn value(&self) -> Option<Decimal> {
        match self {
            Self::Known(v) => Some(*v),
            Self::Unknown => None,
        }
    }

    /// Check if the value is known
    pub fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }
}

impl fmt::Display for FiatBalance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(v) => write!(f, "${}", format_fiat(*v)),
            Self::Unknown => write!(f, "{}", FIAT_PLACEHOLDER),
        }
    }
}

/// Result of one balance refresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    /// Raw on-chain balance in octas
    pub raw_octas: u64,
    /// USD price of one coin
    pub usd_rate: Decimal,
    /// Total balance in USD, rounded to cents
    pub total: Decimal,
    /// Available balance in USD, rounded to cents
    pub available: Decimal,
    /// When the snapshot was computed
    pub fetched_at: DateTime<Utc>,
}

impl BalanceSnapshot {
    /// Compute fiat values from a raw balance and a USD rate.
    ///
    /// Both values derive from the unrounded product so that rounding
    /// happens exactly once. Returns `None` when the product overflows.
    pub fn compute(raw_octas: u64, usd_rate: Decimal, available_ratio: Decimal) -> Option<Self> {
        let exact = octas_to_coins(raw_octas).checked_mul(usd_rate)?;
        let available = exact.checked_mul(available_ratio)?;
        Some(Self {
            raw_octas,
            usd_rate,
            total: round_fiat(exact),
            available: round_fiat(available),
            fetched_at: Utc::now(),
        })
    }

    /// Whole-coin balance
    pub fn coins(&self) -> Decimal {
        octas_to_coins(self.raw_octas)
    }

    /// Two snapshots carry the same values (timestamps ignored)
    pub fn same_values(&self, other: &Self) -> bool {
        self.raw_octas == other.raw_octas
            && self.usd_rate == other.usd_rate
            && self.total == other.total
            && self.available == other.available
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_constants() {
        assert_eq!(MIN_BALANCE, dec!(500));
        assert_eq!(AVAILABLE_RATIO, dec!(0.8));
        assert_eq!(DEFAULT_DASHBOARD_BALANCE, dec!(4231.89));
    }

    #[test]
    fn test_format_fiat() {
        assert_eq!(format_fiat(dec!(500)), "500.00");
        assert_eq!(format_fiat(dec!(3731.89)), "3731.89");
        assert_eq!(format_fiat(dec!(0.005)), "0.01");
        assert_eq!(format_fiat(dec!(12.344)), "12.34");
    }

    #[test]
    fn test_parse_fiat() {
        assert_eq!(parse_fiat("$1234.56"), Some(dec!(1234.56)));
        assert_eq!(parse_fiat(" 4231.89 "), Some(dec!(4231.89)));
        assert_eq!(parse_fiat("$ --"), None);
        assert_eq!(parse_fiat("abc"), None);
    }

    #[test]
    fn test_fiat_balance_stored_form() {
        let known = FiatBalance::Known(dec!(85.2));
        assert_eq!(known.to_stored(), "$85.20");
        assert_eq!(FiatBalance::from_stored("$85.20"), Some(known));
        assert_eq!(FiatBalance::Unknown.to_stored(), "$ --");
        assert_eq!(FiatBalance::from_stored("$ --"), Some(FiatBalance::Unknown));
        assert_eq!(FiatBalance::from_stored("garbage"), None);
    }

    #[test]
    fn test_snapshot_compute() {
        // 2.5 coins at $8.42
        let snapshot = BalanceSnapshot::compute(250_000_000, dec!(8.42), AVAILABLE_RATIO).unwrap();
        assert_eq!(snapshot.coins(), dec!(2.5));
        assert_eq!(snapshot.total, dec!(21.05));
        assert_eq!(snapshot.available, dec!(16.84));
    }

    #[test]
    fn test_snapshot_rounds_once() {
        // 1 octa short of 1 coin at $10: exact = 9.9999999
        let snapshot = BalanceSnapshot::compute(99_999_999, dec!(10), AVAILABLE_RATIO).unwrap();
        assert_eq!(snapshot.total, dec!(10.00));
        assert_eq!(snapshot.available, dec!(8.00));
    }

    #[test]
    fn test_zero_balance() {
        let snapshot = BalanceSnapshot::compute(0, dec!(8.42), AVAILABLE_RATIO).unwrap();
        assert_eq!(snapshot.total, Decimal::ZERO);
        assert_eq!(snapshot.available, Decimal::ZERO);
    }

    #[test]
    fn test_snapshot_overflow() {
        let rate = Decimal::from(10_000_000_000_000_000_000u64);
        assert!(BalanceSnapshot::compute(u64::MAX, rate, AVAILABLE_RATIO).is_none());
        assert!(BalanceSnapshot::compute(u64::MAX, Decimal::MAX, AVAILABLE_RATIO).is_none());
    }
}
