//! Type-safe price representation using decimal arithmetic.
//!
//! All prices are in Brazilian reais (BRL). Amounts are stored as
//! `NUMERIC(10, 2)` and never pass through floating point.

use core::fmt;
use std::iter::Sum;
use std::ops::Add;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A monetary amount in reais.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Largest amount representable by a `NUMERIC(10, 2)` column.
    pub const MAX: Decimal = Decimal::from_parts(99_999_999, 0, 0, false, 0);

    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price, rounding half-even to centavos.
    #[must_use]
    pub fn new(amount: Decimal) -> Self {
        Self(amount.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven))
    }

    /// Create a price from an integer number of centavos.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Total for `quantity` units of this price.
    #[must_use]
    pub fn line_total(&self, quantity: i32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }

    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Format as Brazilian currency, e.g. `R$ 1.234,56`.
    #[must_use]
    pub fn display(&self) -> String {
        let fixed = format!("{:.2}", self.0.abs());
        let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

        let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
        for (i, c) in int_part.chars().enumerate() {
            if i > 0 && (int_part.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(c);
        }

        let sign = if self.0.is_sign_negative() && !self.0.is_zero() {
            "-"
        } else {
            ""
        };
        format!("{sign}R$ {grouped},{frac_part}")
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self::new(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        Ok(Self(<Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Price::from_cents(123_456).display(), "R$ 1.234,56");
        assert_eq!(Price::from_cents(100_000_000).display(), "R$ 1.000.000,00");
        assert_eq!(Price::from_cents(990).display(), "R$ 9,90");
        assert_eq!(Price::ZERO.display(), "R$ 0,00");
    }

    #[test]
    fn test_display_negative() {
        assert_eq!(Price::from_cents(-1050).display(), "-R$ 10,50");
    }

    #[test]
    fn test_new_rounds_to_cents() {
        assert_eq!(Price::new(Decimal::new(12_345, 3)), Price::from_cents(1234));
        assert_eq!(Price::new(Decimal::new(12_355, 3)), Price::from_cents(1236));
    }

    #[test]
    fn test_line_total_and_sum() {
        let shirt = Price::from_cents(7990);
        let socks = Price::from_cents(1990);
        let total: Price = [shirt.line_total(2), socks.line_total(3)].into_iter().sum();
        assert_eq!(total, Price::from_cents(21_950));
    }

    #[test]
    fn test_serializes_as_decimal_string() {
        let json = serde_json::to_string(&Price::from_cents(12_990)).unwrap_or_default();
        assert_eq!(json, "\"129.90\"");
    }
}
