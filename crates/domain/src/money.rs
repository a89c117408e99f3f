//! Money in integer minor units.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// An amount of the configured currency, held in cents.
///
/// Serializes as a bare integer, so `21.60` travels as `2160`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub const fn zero() -> Self {
        Self::ZERO
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Line total for `quantity` units at this price, or `None` on overflow.
    pub fn checked_mul(self, quantity: u32) -> Option<Money> {
        self.0.checked_mul(i64::from(quantity)).map(Money)
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    /// Sums the amounts, or `None` if the sum leaves the `i64` range.
    pub fn checked_sum<I: IntoIterator<Item = Money>>(amounts: I) -> Option<Money> {
        amounts
            .into_iter()
            .try_fold(Money::ZERO, |acc, amount| acc.checked_add(amount))
    }

    /// Applies a rate in basis points (800 = 8%), rounding half away from zero.
    pub fn apply_basis_points(self, basis_points: u32) -> Money {
        let scaled = i128::from(self.0) * i128::from(basis_points);
        let rounded = (scaled.abs() + 5_000) / 10_000;
        let signed = if scaled < 0 { -rounded } else { rounded };
        Money(i64::try_from(signed).unwrap_or(i64::MAX))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_uses_two_decimals() {
        assert_eq!(Money::from_cents(2160).to_string(), "21.60");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-150).to_string(), "-1.50");
    }

    #[test]
    fn test_serializes_as_cents() {
        assert_eq!(serde_json::to_value(Money::from_cents(2160)).unwrap(), 2160);
        let parsed: Money = serde_json::from_str("499").unwrap();
        assert_eq!(parsed, Money::from_cents(499));
    }

    #[test]
    fn test_multiply_and_sum() {
        let lines = [
            Money::from_cents(1000).checked_mul(2).unwrap(),
            Money::from_cents(250).checked_mul(3).unwrap(),
        ];
        assert_eq!(Money::checked_sum(lines), Some(Money::from_cents(2750)));
        assert_eq!(lines.into_iter().sum::<Money>(), Money::from_cents(2750));
    }

    #[test]
    fn test_basis_points_round_half_up() {
        assert_eq!(Money::from_cents(2000).apply_basis_points(800), Money::from_cents(160));
        // 0.48 cents
        assert_eq!(Money::from_cents(6).apply_basis_points(800), Money::ZERO);
        // 0.56 cents
        assert_eq!(Money::from_cents(7).apply_basis_points(800), Money::from_cents(1));
        assert_eq!(Money::from_cents(1999).apply_basis_points(800), Money::from_cents(160));
        assert_eq!(Money::from_cents(-7).apply_basis_points(800), Money::from_cents(-1));
    }

    #[test]
    fn test_checked_arithmetic_detects_overflow() {
        let half = Money::from_cents(i64::MAX / 2);
        assert_eq!(Money::from_cents(i64::MAX).checked_add(Money::from_cents(1)), None);
        assert_eq!(Money::from_cents(i64::MIN).checked_sub(Money::from_cents(1)), None);
        assert_eq!(half.checked_mul(3), None);
        assert_eq!(Money::checked_sum([half, half, half]), None);
        assert!(Money::ZERO.is_zero());
        assert!(Money::from_cents(-1).is_negative());
    }
}
