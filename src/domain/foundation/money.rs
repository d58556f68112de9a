//! Money value object and total derivation.
//!
//! Monetary values are stored as i64 minor units (cents), never floats.
//! On the wire they travel as fixed-point 2-decimal strings ("2999.00")
//! to avoid rounding drift.

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

/// Non-negative monetary amount in minor units (cents).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    /// Zero amount.
    pub const ZERO: Money = Money(0);

    /// Creates a Money from minor units, rejecting negative values.
    pub fn from_minor_units(cents: i64) -> Result<Self, ValidationError> {
        if cents < 0 {
            return Err(ValidationError::negative_amount("amount"));
        }
        Ok(Self(cents))
    }

    /// Parses a fixed-point decimal string, rounding half-up to 2 decimals.
    ///
    /// Accepts "2999", "2999.0", "2999.005" (rounds to 2999.01).
    /// Rejects negative values, empty strings, and non-numeric input.
    pub fn parse(field: &str, input: &str) -> Result<Self, ValidationError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(ValidationError::empty_field(field));
        }
        if s.starts_with('-') {
            return Err(ValidationError::negative_amount(field));
        }

        let (int_part, frac_part) = match s.split_once('.') {
            Some((i, f)) => (i, f),
            None => (s, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(ValidationError::invalid_format(field, "not a number"));
        }
        if !int_part.chars().all(|c| c.is_ascii_digit())
            || !frac_part.chars().all(|c| c.is_ascii_digit())
        {
            return Err(ValidationError::invalid_format(field, "not a decimal number"));
        }

        let whole: i64 = if int_part.is_empty() {
            0
        } else {
            int_part
                .parse()
                .map_err(|_| ValidationError::invalid_format(field, "integer part too large"))?
        };

        let mut frac_digits = frac_part.bytes().map(|b| (b - b'0') as i64);
        let d1 = frac_digits.next().unwrap_or(0);
        let d2 = frac_digits.next().unwrap_or(0);
        // Round half-up on the third decimal digit.
        let round_up = frac_digits.next().map(|d| d >= 5).unwrap_or(false);

        whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(d1 * 10 + d2))
            .and_then(|c| c.checked_add(if round_up { 1 } else { 0 }))
            .map(Self)
            .ok_or_else(|| ValidationError::invalid_format(field, "amount too large"))
    }

    /// Returns the amount in minor units.
    pub fn minor_units(&self) -> i64 {
        self.0
    }

    /// Checked addition.
    pub fn checked_add(&self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

/// Derives a booking total: base + addons + tax - discount.
///
/// Fails with a negative-amount error if the discount exceeds the sum of
/// the other components. Inputs are already exact 2-decimal amounts, so
/// the result needs no further rounding.
pub fn compute_total(
    base: Money,
    addons: Money,
    tax: Money,
    discount: Money,
) -> Result<Money, ValidationError> {
    let gross = base
        .checked_add(addons)
        .and_then(|m| m.checked_add(tax))
        .ok_or_else(|| ValidationError::invalid_format("total_amount", "amount overflow"))?;
    if discount.0 > gross.0 {
        return Err(ValidationError::negative_amount("total_amount"));
    }
    Ok(Money(gross.0 - discount.0))
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl FromStr for Money {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::parse("amount", s)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
