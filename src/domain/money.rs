use crate::error::{ChatError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul};

/// A monetary value in whole naira.
///
/// The menu works in whole currency units, so this wraps an `i64` rather than
/// a decimal type. It enforces non-negativity at construction and renders as
/// `₦{n}` everywhere the chat surface prints money. Arithmetic saturates at
/// `i64::MAX` instead of wrapping.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Self = Self(0);

    pub fn new(value: i64) -> Result<Self> {
        if value >= 0 {
            Ok(Self(value))
        } else {
            Err(ChatError::Validation(
                "amount must not be negative".to_string(),
            ))
        }
    }

    /// Constructs from a literal known to be non-negative (seed data, tests).
    pub const fn naira(value: i64) -> Self {
        assert!(value >= 0);
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "₦{}", self.0)
    }
}

impl Add for Amount {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl Mul<u32> for Amount {
    type Output = Self;
    fn mul(self, rhs: u32) -> Self::Output {
        Self(self.0.saturating_mul(i64::from(rhs)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_validation() {
        assert!(Amount::new(0).is_ok());
        assert!(Amount::new(2500).is_ok());
        assert!(matches!(
            Amount::new(-1),
            Err(ChatError::Validation(_))
        ));
    }

    #[test]
    fn test_amount_arithmetic_and_display() {
        let price = Amount::naira(2500);
        assert_eq!(price * 2, Amount::naira(5000));
        assert_eq!(price + Amount::naira(800), Amount::naira(3300));
        assert_eq!(format!("{}", price), "₦2500");
    }

    #[test]
    fn test_amount_arithmetic_saturates_at_the_ceiling() {
        let max = Amount::naira(i64::MAX);
        assert_eq!(max + Amount::naira(1), max);
        assert_eq!(max * 2, max);

        let mut total = max;
        total += Amount::naira(2500);
        assert_eq!(total, max);
    }
}
