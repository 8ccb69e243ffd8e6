//! Fixed-point currency type.
//!
//! Every monetary amount in the engine is a [`Money`]: a `rust_decimal`
//! value settled to the cent with half-up rounding whenever it is
//! constructed. Intermediate products (rate multiplications, divisions by a
//! period count) are carried at full decimal precision and only settled
//! when they become a `Money`.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Number of decimal places every settled amount carries.
pub const CENT_SCALE: u32 = 2;

/// A currency amount with exact two-digit cent precision.
///
/// Serializes as decimal text (`"2000.00"`) so persisted values never pass
/// through binary floating point.
///
/// # Example
///
/// ```
/// use payroll_engine::models::Money;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let gross = Money::from_str("2000").unwrap();
/// let ten_percent = gross.percent(Decimal::from(10));
/// assert_eq!(ten_percent.to_string(), "200.00");
///
/// // Half-up settlement at the cent.
/// assert_eq!(Money::new(Decimal::from_str("2.675").unwrap()).to_string(), "2.68");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    /// Zero dollars, carried at cent scale.
    pub const ZERO: Money = Money(Decimal::from_parts(0, 0, 0, false, CENT_SCALE));

    /// Settles an arbitrary decimal to the cent (half-up).
    pub fn new(value: Decimal) -> Self {
        Money(settle(value))
    }

    /// Builds an amount from a whole number of cents.
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, CENT_SCALE))
    }

    /// Builds an amount from a whole number of dollars.
    pub fn whole(dollars: i64) -> Self {
        Money::new(Decimal::from(dollars))
    }

    /// The underlying decimal value.
    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// Multiplies by a rate or quantity and settles the product.
    pub fn times(self, factor: Decimal) -> Money {
        Money::new(self.0 * factor)
    }

    /// Takes `pct` percent of the amount and settles the result.
    pub fn percent(self, pct: Decimal) -> Money {
        Money::new(self.0 * pct / Decimal::ONE_HUNDRED)
    }

    /// Divides by a count (for example periods per year) and settles.
    ///
    /// # Panics
    ///
    /// Panics if `divisor` is zero, like integer division.
    pub fn divided_by(self, divisor: u32) -> Money {
        Money::new(self.0 / Decimal::from(divisor))
    }

    /// Returns zero for negative amounts, the amount otherwise.
    pub fn non_negative(self) -> Money {
        self.max(Money::ZERO)
    }

    /// True when the amount is below zero.
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// True when the amount is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// True when the amount is above zero.
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }
}

fn settle(value: Decimal) -> Decimal {
    let mut rounded =
        value.round_dp_with_strategy(CENT_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(CENT_SCALE);
    if rounded.is_zero() {
        rounded.set_sign_positive(true);
    }
    rounded
}

impl Default for Money {
    fn default() -> Self {
        Money::ZERO
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Money::new(value)
    }
}

impl From<Money> for Decimal {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim()).map(Money::new)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(settle(self.0 + rhs.0))
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(settle(self.0 - rhs.0))
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(settle(-self.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        *self = *self + rhs;
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        *self = *self - rhs;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}
