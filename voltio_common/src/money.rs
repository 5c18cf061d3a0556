use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

//--------------------------------------       Money        ----------------------------------------------------------
/// An exact monetary amount in minor units (centavos for ARS, cents for USD).
///
/// The currency itself travels separately; `Money` is just the magnitude. All
/// arithmetic is integer arithmetic, so sums and line extensions are exact.
/// The only place rounding occurs is [`Money::scale_bp`], which rounds half
/// away from zero when applying a basis-point rate.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Money(i64);

op!(binary Money, Add, add);
op!(binary Money, Sub, sub);
op!(inplace Money, AddAssign, add_assign);
op!(inplace Money, SubAssign, sub_assign);
op!(unary Money, Neg, neg);

impl Mul<i64> for Money {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as a monetary amount: {0}")]
pub struct MoneyConversionError(String);

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Money {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Money {}

impl TryFrom<u64> for Money {
    type Error = MoneyConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(MoneyConversionError(format!("Value {value} is too large to convert to Money")))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{sign}${}.{:02}", (self.0 / 100).abs(), (self.0 % 100).abs())
    }
}

impl Money {
    pub const ZERO: Money = Money(0);

    /// The amount in minor units.
    pub fn value(&self) -> i64 {
        self.0
    }

    /// Build an amount from whole currency units.
    pub fn from_units(units: i64) -> Self {
        Self(units * 100)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Applies a basis-point rate (2100 = 21%), rounding half away from zero.
    ///
    /// This is the tax computation primitive: `subtotal.scale_bp(rate_bp)`.
    pub fn scale_bp(&self, bp: i64) -> Self {
        let numerator = self.0 * bp;
        let quotient = numerator / 10_000;
        let remainder = numerator % 10_000;
        if remainder.abs() * 2 >= 10_000 {
            Self(quotient + numerator.signum())
        } else {
            Self(quotient)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display_formats_minor_units() {
        assert_eq!(format!("{}", Money::from(123_456)), "$1234.56");
        assert_eq!(format!("{}", Money::from(5)), "$0.05");
        assert_eq!(format!("{}", Money::from(-9_050)), "-$90.50");
        assert_eq!(format!("{}", Money::ZERO), "$0.00");
    }

    #[test]
    fn arithmetic_is_exact() {
        let a = Money::from_units(100);
        let b = Money::from(50);
        assert_eq!(a + b, Money::from(10_050));
        assert_eq!(a - b, Money::from(9_950));
        assert_eq!(a * 3, Money::from_units(300));
        assert_eq!(-b, Money::from(-50));
        let total: Money = [a, b, b].into_iter().sum();
        assert_eq!(total, Money::from(10_100));
    }

    #[test]
    fn scale_bp_rounds_half_away_from_zero() {
        // ARS 200.00 at 21% => ARS 42.00 exactly
        assert_eq!(Money::from(20_000).scale_bp(2100), Money::from(4_200));
        // 1 centavo at 21% => 0.21 centavos, rounds to 0
        assert_eq!(Money::from(1).scale_bp(2100), Money::from(0));
        // 3 centavos at 21% => 0.63 centavos, rounds to 1
        assert_eq!(Money::from(3).scale_bp(2100), Money::from(1));
        // half-way rounds away from zero in both directions
        assert_eq!(Money::from(25).scale_bp(1000), Money::from(3));
        assert_eq!(Money::from(-25).scale_bp(1000), Money::from(-3));
    }
}
