//! A decimal money type.
//!
//! Amounts are kept as [Decimal] so that sums of cents never drift, stored in
//! SQLite as text and shown to people as dollar strings such as `"$2.10"`.

use std::{
    fmt::{self, Display},
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub},
    str::FromStr,
};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The most digits a stored amount may have.
pub const MAX_DIGITS: u32 = 12;
/// The most digits a stored amount may have after the decimal point.
pub const DECIMAL_PLACES: u32 = 2;

/// An amount of money in dollars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(Decimal);

impl Money {
    /// No money at all.
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Create an amount from a whole number of cents.
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, DECIMAL_PLACES))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// The amount as plain decimal text with two decimal places, e.g. "2.10".
    ///
    /// This is the value stored in the database, written into form inputs and
    /// sent in JSON bodies.
    pub fn to_plain_string(&self) -> String {
        format!("{:.2}", self.0.round_dp(DECIMAL_PLACES))
    }

    /// Parse user input into an amount, enforcing the stored precision.
    ///
    /// Accepts an optional leading dollar sign and thousands separators.
    /// The error is a message suitable for showing next to the form field.
    pub fn parse_input(raw: &str) -> Result<Self, String> {
        let cleaned = raw.trim().replacen('$', "", 1).replace(',', "");

        let value = Decimal::from_str(&cleaned).map_err(|_| "Enter a number.".to_owned())?;
        let value = value.normalize();

        if value.scale() > DECIMAL_PLACES {
            return Err(format!(
                "Ensure that there are no more than {DECIMAL_PLACES} decimal places."
            ));
        }

        let whole_digits = value.trunc().abs().to_string().trim_start_matches('0').len() as u32;
        if whole_digits + DECIMAL_PLACES > MAX_DIGITS {
            return Err(format!(
                "Ensure that there are no more than {MAX_DIGITS} digits in total."
            ));
        }

        Ok(Self(value))
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self.0.round_dp(DECIMAL_PLACES);

        if self.is_negative() {
            write!(f, "-${:.2}", rounded.abs())
        } else {
            write!(f, "${:.2}", rounded.abs())
        }
    }
}

impl FromStr for Money {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::parse_input(s)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Self::Output {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl ToSql for Money {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_plain_string()))
    }
}

impl FromSql for Money {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Text(text) => {
                let text = std::str::from_utf8(text).map_err(|error| FromSqlError::Other(Box::new(error)))?;
                Decimal::from_str(text)
                    .map(Money)
                    .map_err(|error| FromSqlError::Other(Box::new(error)))
            }
            ValueRef::Integer(integer) => Ok(Money(Decimal::from(integer))),
            ValueRef::Real(real) => Decimal::try_from(real)
                .map(|value| Money(value.round_dp(DECIMAL_PLACES)))
                .map_err(|error| FromSqlError::Other(Box::new(error))),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

impl Serialize for Money {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_plain_string())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Money::parse_input(&raw).map_err(serde::de::Error::custom)
    }
}
