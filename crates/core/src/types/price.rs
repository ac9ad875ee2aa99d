//! Integer price representation.
//!
//! Prices are whole rubles, the smallest unit the storefront prices goods in.
//! All arithmetic is integer arithmetic; sums saturate instead of wrapping.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use serde::{Deserialize, Serialize};

/// No-break space used by `ru-RU` digit grouping.
const GROUP_SEPARATOR: char = '\u{a0}';

/// Currency sign appended to formatted amounts.
const CURRENCY_SIGN: char = '₽';

/// A non-negative amount of money in minor units.
///
/// Formats the way the storefront displays prices: digits grouped in threes
/// with no-break spaces, followed by the ruble sign.
///
/// ```
/// use nosorog_core::Price;
///
/// assert_eq!(Price::new(1500).to_string(), "1\u{a0}500₽");
/// assert_eq!(Price::ZERO.to_string(), "0₽");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Price(u64);

impl Price {
    /// Zero amount.
    pub const ZERO: Self = Self(0);

    /// Create a price from an amount in minor units.
    #[must_use]
    pub const fn new(amount: u64) -> Self {
        Self(amount)
    }

    /// Get the amount in minor units.
    #[must_use]
    pub const fn amount(&self) -> u64 {
        self.0
    }

    /// Returns `true` if the amount is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Price of `quantity` units.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(u64::from(quantity)))
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl From<u64> for Price {
    fn from(amount: u64) -> Self {
        Self(amount)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.to_string();
        let len = digits.len();
        let mut grouped = String::with_capacity(len + len / 3 * 2 + 3);
        for (i, digit) in digits.chars().enumerate() {
            if i > 0 && (len - i) % 3 == 0 {
                grouped.push(GROUP_SEPARATOR);
            }
            grouped.push(digit);
        }
        grouped.push(CURRENCY_SIGN);
        f.write_str(&grouped)
    }
}

/// Selected delivery tariff.
///
/// Held only in the memory of one view; never persisted. Defaults to free
/// delivery until the visitor picks an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tariff(Price);

impl Tariff {
    /// No delivery fee.
    pub const FREE: Self = Self(Price::ZERO);

    /// Create a tariff with the given delivery fee.
    #[must_use]
    pub const fn new(fee: u64) -> Self {
        Self(Price::new(fee))
    }

    /// The delivery fee charged for this tariff.
    #[must_use]
    pub const fn fee(&self) -> Price {
        self.0
    }
}

impl From<u64> for Tariff {
    fn from(fee: u64) -> Self {
        Self::new(fee)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_small_amounts() {
        assert_eq!(Price::new(0).to_string(), "0₽");
        assert_eq!(Price::new(7).to_string(), "7₽");
        assert_eq!(Price::new(300).to_string(), "300₽");
    }

    #[test]
    fn test_format_groups_thousands() {
        assert_eq!(Price::new(1500).to_string(), "1\u{a0}500₽");
        assert_eq!(Price::new(25_000).to_string(), "25\u{a0}000₽");
        assert_eq!(Price::new(1_234_567).to_string(), "1\u{a0}234\u{a0}567₽");
    }

    #[test]
    fn test_times() {
        assert_eq!(Price::new(1500).times(2), Price::new(3000));
        assert_eq!(Price::new(1500).times(0), Price::ZERO);
        assert_eq!(Price::new(u64::MAX).times(2), Price::new(u64::MAX));
    }

    #[test]
    fn test_sum_saturates() {
        let total: Price = [Price::new(u64::MAX), Price::new(1)].into_iter().sum();
        assert_eq!(total, Price::new(u64::MAX));
        let total: Price = [Price::new(1500), Price::new(300), Price::new(500)]
            .into_iter()
            .sum();
        assert_eq!(total, Price::new(2300));
    }

    #[test]
    fn test_tariff_default_is_free() {
        assert_eq!(Tariff::default(), Tariff::FREE);
        assert!(Tariff::default().fee().is_zero());
        assert_eq!(Tariff::from(400).fee(), Price::new(400));
    }
}
