//! Type-safe price representation using decimal arithmetic.
//!
//! Prices are kept as [`Decimal`] so that order totals are exact. They are
//! only converted to `f64` at the storage boundary, where the table service
//! stores them as `Edm.Double`.

use core::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input could not be parsed as a number.
    #[error("price must be a number")]
    NotANumber,
    /// The amount is zero or negative.
    #[error("price must be greater than 0")]
    NotPositive,
    /// The amount is above [`Price::MAX_CENTS`].
    #[error("price must not exceed 1000000000.00")]
    TooLarge,
    /// Price times quantity does not fit in a decimal.
    #[error("order total is too large")]
    TotalOverflow,
}

/// A strictly positive unit price, rounded to cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Largest accepted price in cents (R1 000 000 000.00). Every price up to
    /// this bound survives the round trip through `Edm.Double` exactly.
    pub const MAX_CENTS: i64 = 100_000_000_000;

    /// Create a price from a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::NotPositive`] if the amount rounds to zero or less
    /// and [`PriceError::TooLarge`] if it is above [`Self::MAX_CENTS`].
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        let amount = amount.round_dp(2);
        if amount <= Decimal::ZERO {
            return Err(PriceError::NotPositive);
        }
        if amount > Decimal::new(Self::MAX_CENTS, 2) {
            return Err(PriceError::TooLarge);
        }
        Ok(Self(amount))
    }

    /// Parse a price typed into a form (e.g. `"149.99"`).
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::NotANumber`] for non-numeric input and
    /// [`PriceError::NotPositive`] for zero or negative amounts.
    pub fn parse(input: &str) -> Result<Self, PriceError> {
        let amount = Decimal::from_str(input.trim()).map_err(|_| PriceError::NotANumber)?;
        Self::new(amount)
    }

    /// Convert a stored `Edm.Double` back into a price.
    ///
    /// Uses the shortest round-trip representation of the float so that
    /// `149.99` comes back as `149.99` rather than its binary expansion.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not finite or not positive.
    pub fn from_f64(value: f64) -> Result<Self, PriceError> {
        if !value.is_finite() {
            return Err(PriceError::NotANumber);
        }
        let amount = Decimal::from_str(&value.to_string()).map_err(|_| PriceError::NotANumber)?;
        Self::new(amount)
    }

    /// Returns the amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns the amount as a float for storage.
    #[must_use]
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or_default()
    }

    /// Total for `quantity` units at this price.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::TotalOverflow`] if the product does not fit in a
    /// decimal.
    pub fn line_total(&self, quantity: u32) -> Result<Decimal, PriceError> {
        self.0
            .checked_mul(Decimal::from(quantity))
            .ok_or(PriceError::TotalOverflow)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn parses_form_input() {
        let price = Price::parse(" 149.99 ").unwrap();
        assert_eq!(price.amount(), Decimal::new(14999, 2));
        assert_eq!(price.to_string(), "149.99");
    }

    #[test]
    fn rejects_zero_negative_and_garbage() {
        assert_eq!(Price::parse("0"), Err(PriceError::NotPositive));
        assert_eq!(Price::parse("-5"), Err(PriceError::NotPositive));
        assert_eq!(Price::parse("0.001"), Err(PriceError::NotPositive));
        assert_eq!(Price::parse("abc"), Err(PriceError::NotANumber));
        assert_eq!(Price::parse(""), Err(PriceError::NotANumber));
    }

    #[test]
    fn rejects_amounts_above_the_ceiling() {
        assert!(Price::parse("1000000000.00").is_ok());
        assert_eq!(Price::parse("1000000000.01"), Err(PriceError::TooLarge));
        assert_eq!(
            Price::parse("79228162514264337593543950335"),
            Err(PriceError::TooLarge)
        );
        assert_eq!(Price::from_f64(1e27), Err(PriceError::TooLarge));
    }

    #[test]
    fn line_total_is_exact() {
        let price = Price::parse("19.99").unwrap();
        assert_eq!(price.line_total(3), Ok(Decimal::new(5997, 2)));
    }

    #[test]
    fn largest_line_total_fits() {
        let price = Price::parse("1000000000").unwrap();
        assert_eq!(
            price.line_total(u32::MAX),
            Ok(Decimal::new(Price::MAX_CENTS, 2) * Decimal::from(u32::MAX))
        );
    }

    #[test]
    fn largest_price_survives_float_round_trip() {
        let price = Price::parse("999999999.99").unwrap();
        assert_eq!(Price::from_f64(price.to_f64()), Ok(price));
    }

    #[test]
    fn float_round_trip_keeps_cents() {
        let price = Price::parse("149.99").unwrap();
        let back = Price::from_f64(price.to_f64()).unwrap();
        assert_eq!(back, price);
        assert!(Price::from_f64(f64::NAN).is_err());
    }
}
