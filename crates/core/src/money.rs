//! Fixed-point money value object.
//!
//! Amounts are stored in the smallest currency unit (e.g. cents) to keep all
//! arithmetic exact. Two decimal places are assumed for display and parsing.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// Non-negative monetary amount in minor units (cents).
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Whole currency units (e.g. `Money::from_major(100)` is `100.00`).
    pub const fn from_major(units: u64) -> Self {
        Self(units * 100)
    }

    pub const fn cents(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Money) -> DomainResult<Money> {
        self.0
            .checked_add(other.0)
            .map(Money)
            .ok_or_else(|| DomainError::validation("amount overflow"))
    }

    /// Line total: unit price times quantity.
    pub fn checked_mul(self, quantity: u32) -> DomainResult<Money> {
        self.0
            .checked_mul(u64::from(quantity))
            .map(Money)
            .ok_or_else(|| DomainError::validation("amount overflow"))
    }

    /// Sum an iterator of amounts, failing on overflow.
    pub fn sum<I: IntoIterator<Item = Money>>(amounts: I) -> DomainResult<Money> {
        amounts
            .into_iter()
            .try_fold(Money::ZERO, |acc, m| acc.checked_add(m))
    }
}

impl ValueObject for Money {}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl FromStr for Money {
    type Err = DomainError;

    /// Parse a decimal amount with at most two fractional digits
    /// (`"100"`, `"100.5"`, `"100.50"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || DomainError::validation(format!("invalid amount: {s:?}"));

        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };

        if whole.is_empty() || whole.chars().any(|c| !c.is_ascii_digit()) {
            return Err(invalid());
        }
        if frac.len() > 2 || frac.chars().any(|c| !c.is_ascii_digit()) {
            return Err(invalid());
        }

        let whole: u64 = whole.parse().map_err(|_| invalid())?;
        let frac: u64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<u64>().map_err(|_| invalid())? * 10,
            _ => frac.parse().map_err(|_| invalid())?,
        };

        whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(frac))
            .map(Money)
            .ok_or_else(invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_and_formats_two_decimal_amounts() {
        let m: Money = "250.00".parse().unwrap();
        assert_eq!(m, Money::from_cents(25_000));
        assert_eq!(m.to_string(), "250.00");

        assert_eq!("100".parse::<Money>().unwrap(), Money::from_major(100));
        assert_eq!("100.5".parse::<Money>().unwrap(), Money::from_cents(10_050));
        assert_eq!("0.07".parse::<Money>().unwrap(), Money::from_cents(7));
    }

    #[test]
    fn rejects_malformed_amounts() {
        for s in ["", ".", "1.234", "-5", "12a", "1,50"] {
            assert!(s.parse::<Money>().is_err(), "accepted {s:?}");
        }
    }

    #[test]
    fn line_total_multiplies_by_quantity() {
        let price = Money::from_major(100);
        assert_eq!(price.checked_mul(2).unwrap(), Money::from_major(200));
    }

    #[test]
    fn overflow_is_an_error_not_a_wrap() {
        let max = Money::from_cents(u64::MAX);
        assert!(max.checked_add(Money::from_cents(1)).is_err());
        assert!(max.checked_mul(2).is_err());
    }

    proptest! {
        #[test]
        fn display_round_trips(cents in 0u64..10_000_000_00) {
            let m = Money::from_cents(cents);
            let parsed: Money = m.to_string().parse().unwrap();
            prop_assert_eq!(m, parsed);
        }
    }
}
