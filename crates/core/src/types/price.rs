//! Type-safe price representation using decimal arithmetic.
//!
//! The backend stores money as `BigDecimal` and emits it as a JSON number.
//! `Price` keeps it as a [`Decimal`] so line totals never pick up binary
//! floating-point drift, and formats it the way the storefront displays
//! money: Indian Rupees with two decimals and en-IN digit grouping.

use core::fmt;
use core::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Currency symbol used for every displayed amount.
pub const CURRENCY_SYMBOL: &str = "₹";

/// Errors that can occur when parsing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input is not a decimal number.
    #[error("price must be a number: {0}")]
    NotANumber(String),
    /// The amount is zero or negative.
    #[error("price must be greater than 0")]
    NotPositive,
}

/// A monetary amount.
///
/// Serializes as a JSON number (the backend's shape) and accepts numbers or
/// numeric strings when deserializing.
///
/// ```
/// use ecomweb_core::Price;
///
/// let price: Price = "10.00".parse().unwrap();
/// assert_eq!(price.times(3).to_string(), "₹30.00");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Price {
    /// A zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Parse a price entered by a person, rejecting non-positive amounts.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a number or is not above zero.
    pub fn parse_positive(s: &str) -> Result<Self, PriceError> {
        let price: Self = s.parse()?;
        if price.0 <= Decimal::ZERO {
            return Err(PriceError::NotPositive);
        }
        Ok(price)
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price multiplied by a quantity (a cart line total).
    #[must_use]
    pub fn times(&self, quantity: i32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }

    /// Amount rounded half-up to two decimal places, e.g. `"1234.50"`.
    #[must_use]
    pub fn to_fixed(&self) -> String {
        let rounded = self
            .0
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        format!("{rounded:.2}")
    }
}

impl fmt::Display for Price {
    /// Formats as `₹1,23,456.50`: the last three integer digits form one
    /// group, every group above that has two digits.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fixed = self.to_fixed();
        let (sign, unsigned) = fixed
            .strip_prefix('-')
            .map_or(("", fixed.as_str()), |rest| ("-", rest));
        let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, "00"));

        write!(
            f,
            "{sign}{CURRENCY_SYMBOL}{}.{frac_part}",
            group_en_in(int_part)
        )
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim())
            .map(Self)
            .map_err(|_| PriceError::NotANumber(s.to_owned()))
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl core::iter::Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Self(iter.map(|p| p.0).sum())
    }
}

/// Insert en-IN grouping separators into a string of ASCII digits.
fn group_en_in(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_owned();
    }

    let (head, last_three) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut rest = head;
    while rest.len() > 2 {
        let (front, pair) = rest.split_at(rest.len() - 2);
        groups.push(pair);
        rest = front;
    }
    if !rest.is_empty() {
        groups.push(rest);
    }
    groups.reverse();

    format!("{},{last_three}", groups.join(","))
}
