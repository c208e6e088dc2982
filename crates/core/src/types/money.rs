//! Exact euros-and-cents arithmetic.
//!
//! Prices in the Krambambouli catalog are stored as two integer columns
//! (`euros`, `cents`), never as floats. [`Money`] keeps that representation
//! and normalizes on every construction so the stored `cents` is always in
//! `0..=99`. Amounts in this domain are never negative, which the unsigned
//! fields make unrepresentable.

use std::fmt;
use std::ops::{Add, Mul};

use serde::{Deserialize, Serialize};

/// An exact, non-negative amount of euros and cents.
///
/// ```
/// use krambam_core::Money;
///
/// let unit = Money::new(2, 50);
/// assert_eq!(unit * 3, Money::new(7, 50));
/// assert_eq!(Money::new(1, 150), Money::new(2, 50)); // carry
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "MoneyWire")]
pub struct Money {
    euros: u64,
    cents: u64,
}

/// Wire shape of a money value: `{"euros": E, "cents": C}`.
///
/// Incoming values are normalized through [`Money::new`], so a client
/// sending `{"euros": 1, "cents": 150}` is read as €2,50.
#[derive(Deserialize)]
struct MoneyWire {
    euros: u64,
    #[serde(default)]
    cents: u64,
}

impl From<MoneyWire> for Money {
    fn from(wire: MoneyWire) -> Self {
        Self::new(wire.euros, wire.cents)
    }
}

impl Money {
    /// Zero euros, zero cents.
    pub const ZERO: Self = Self { euros: 0, cents: 0 };

    /// Create a normalized amount; `cents >= 100` carries into euros.
    #[must_use]
    pub const fn new(euros: u64, cents: u64) -> Self {
        Self {
            euros: euros + cents / 100,
            cents: cents % 100,
        }
    }

    /// Whole euros after normalization.
    #[must_use]
    pub const fn euros(&self) -> u64 {
        self.euros
    }

    /// Cent remainder, always in `0..=99`.
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.cents
    }

    /// The amount expressed entirely in cents.
    #[must_use]
    pub const fn total_cents(&self) -> u64 {
        self.euros * 100 + self.cents
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.euros + rhs.euros, self.cents + rhs.cents)
    }
}

impl Mul<u64> for Money {
    type Output = Self;

    fn mul(self, scalar: u64) -> Self {
        Self::new(self.euros * scalar, self.cents * scalar)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    /// Renders `€E,CC`, with `-` in place of zero cents (`€7,50`, `€3,-`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.cents == 0 {
            write!(f, "€{},-", self.euros)
        } else {
            write!(f, "€{},{:02}", self.euros, self.cents)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn new_normalizes_cent_overflow() {
        let m = Money::new(1, 150);
        assert_eq!(m.euros(), 2);
        assert_eq!(m.cents(), 50);
    }

    #[test]
    fn normalization_preserves_total() {
        for (e, c) in [(0, 0), (0, 99), (0, 100), (3, 1234), (17, 200)] {
            let m = Money::new(e, c);
            assert!(m.cents() <= 99);
            assert_eq!(m.total_cents(), e * 100 + c);
        }
    }

    #[test]
    fn add_carries() {
        let sum = Money::new(1, 60) + Money::new(2, 70);
        assert_eq!(sum, Money::new(4, 30));
    }

    #[test]
    fn mul_scales_both_parts() {
        // 3 x €2,50 = €7,50 (the flagship test order)
        assert_eq!(Money::new(2, 50) * 3, Money::new(7, 50));
        assert_eq!(Money::new(2, 50) * 0, Money::ZERO);
    }

    #[test]
    fn sum_of_line_totals() {
        let total: Money = [Money::new(2, 50) * 2, Money::new(3, 0)].into_iter().sum();
        assert_eq!(total, Money::new(8, 0));
    }

    #[test]
    fn display_uses_dash_for_zero_cents() {
        assert_eq!(Money::new(3, 0).to_string(), "€3,-");
        assert_eq!(Money::new(7, 50).to_string(), "€7,50");
        assert_eq!(Money::new(7, 5).to_string(), "€7,05");
    }

    #[test]
    fn deserialization_normalizes() {
        let m: Money = serde_json::from_str(r#"{"euros": 1, "cents": 150}"#).unwrap();
        assert_eq!(m, Money::new(2, 50));

        // cents defaults to zero
        let m: Money = serde_json::from_str(r#"{"euros": 4}"#).unwrap();
        assert_eq!(m, Money::new(4, 0));
    }

    #[test]
    fn serialization_wire_shape() {
        let json = serde_json::to_value(Money::new(7, 50)).unwrap();
        assert_eq!(json, serde_json::json!({"euros": 7, "cents": 50}));
    }
}
