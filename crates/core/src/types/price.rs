//! Decimal price and rating types for catalog listings.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Whole-unit price in US dollars.
    #[must_use]
    pub const fn usd(whole: i64) -> Self {
        Self::new(const_decimal(whole, 0), CurrencyCode::USD)
    }
}

/// Formats as `$20` for whole amounts and `$19.50` otherwise.
impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = self.currency_code.symbol();
        if self.amount.fract().is_zero() {
            write!(f, "{symbol}{}", self.amount.trunc())
        } else {
            write!(f, "{symbol}{:.2}", self.amount)
        }
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::USD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }
}

/// Average review score on a five-point scale, kept exact (e.g. `4.85`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rating(Decimal);

impl Rating {
    /// Rating from a scaled integer: `Rating::new(485, 2)` is `4.85`.
    #[must_use]
    pub const fn new(scaled: i64, scale: u32) -> Self {
        Self(const_decimal(scaled, scale))
    }

    /// The underlying decimal value.
    #[must_use]
    pub const fn value(self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_display_whole() {
        assert_eq!(Price::usd(20).to_string(), "$20");
    }

    #[test]
    fn test_price_display_fractional() {
        let price = Price::new(Decimal::new(1950, 2), CurrencyCode::USD);
        assert_eq!(price.to_string(), "$19.50");
    }

    #[test]
    fn test_price_display_other_currency() {
        let price = Price::new(Decimal::new(15, 0), CurrencyCode::GBP);
        assert_eq!(price.to_string(), "£15");
    }

    #[test]
    fn test_rating_display_keeps_precision() {
        assert_eq!(Rating::new(485, 2).to_string(), "4.85");
        assert_eq!(Rating::new(48, 1).to_string(), "4.8");
        assert_eq!(Rating::new(490, 2).to_string(), "4.9");
    }

    #[test]
    fn test_rating_ordering() {
        assert!(Rating::new(49, 1) > Rating::new(485, 2));
        assert!(Rating::new(485, 2) > Rating::new(48, 1));
    }
}

/// `Decimal::new` in a `const`-callable form; panics on invalid scale just like it.
const fn const_decimal(num: i64, scale: u32) -> Decimal {
    assert!(scale <= Decimal::MAX_SCALE, "Scale exceeds maximum precision");
    let magnitude = num.unsigned_abs();
    #[allow(clippy::cast_possible_truncation)]
    Decimal::from_parts(magnitude as u32, (magnitude >> 32) as u32, 0, num < 0, scale)
}
