//! Monetary amounts in US dollars.
//!
//! Prices are stored as `NUMERIC(7,2)` and order totals as `NUMERIC(10,2)`,
//! so every `Money` is kept at exactly two decimal places. Arithmetic uses
//! [`rust_decimal::Decimal`] and is checked; floats never touch an amount.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A dollar amount with cent precision.
///
/// Serializes as a decimal string (`"25.00"`), matching the JSON the
/// frontend already consumes. Deserialization accepts numbers or strings.
///
/// ```
/// use pokebin_core::Money;
/// use rust_decimal::Decimal;
///
/// let price = Money::new(Decimal::new(1999, 2));
/// assert_eq!(price.checked_times(3).unwrap().to_string(), "$59.97");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Largest amount a `NUMERIC(7,2)` price column holds.
    pub const MAX_PRICE: Self = Self(Decimal::from_parts(9_999_999, 0, 0, false, 2));

    /// Largest amount a `NUMERIC(10,2)` order total column holds.
    pub const MAX_TOTAL: Self = Self(Decimal::from_parts(
        1_410_065_407, // 9_999_999_999 = 2 << 32 | 1_410_065_407
        2,
        0,
        false,
        2,
    ));

    /// Wrap an amount, rounding half away from zero to whole cents.
    #[must_use]
    pub fn new(amount: Decimal) -> Self {
        let mut amount =
            amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        amount.rescale(2);
        Self(amount)
    }

    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// This amount multiplied by a line quantity, or `None` on overflow.
    #[must_use]
    pub fn checked_times(self, quantity: i32) -> Option<Self> {
        self.0.checked_mul(Decimal::from(quantity)).map(Self::new)
    }

    /// `None` on overflow.
    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self::new)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_negative() {
            write!(f, "-${:.2}", self.0.abs())
        } else {
            write!(f, "${:.2}", self.0)
        }
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self::new(amount)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Money {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Money {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(amount))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Money {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn usd(cents: i64) -> Money {
        Money::new(Decimal::new(cents, 2))
    }

    #[test]
    fn test_new_rounds_to_cents() {
        assert_eq!(Money::new(Decimal::new(10005, 3)).amount(), Decimal::new(1001, 2));
        assert_eq!(Money::new(Decimal::from(10)).amount().scale(), 2);
    }

    #[test]
    fn test_sum_of_lines() {
        let total = usd(1000)
            .checked_times(2)
            .and_then(|t| t.checked_add(usd(500)))
            .unwrap();
        assert_eq!(total, usd(2500));
        assert_eq!(total.to_string(), "$25.00");
    }

    #[test]
    fn test_overflow_is_none() {
        let huge = Money::new(Decimal::MAX);
        assert_eq!(huge.checked_times(2), None);
        assert_eq!(huge.checked_add(huge), None);
        assert_eq!(huge.checked_times(1), Some(huge));
    }

    #[test]
    fn test_column_bounds() {
        assert_eq!(Money::MAX_PRICE.to_string(), "$99999.99");
        assert_eq!(Money::MAX_TOTAL.to_string(), "$99999999.99");
    }

    #[test]
    fn test_serializes_as_string() {
        assert_eq!(serde_json::to_string(&usd(2500)).unwrap(), "\"25.00\"");
    }

    #[test]
    fn test_deserializes_numbers_and_strings() {
        let from_number: Money = serde_json::from_str("10.5").unwrap();
        let from_string: Money = serde_json::from_str("\"10.50\"").unwrap();
        assert_eq!(from_number, usd(1050));
        assert_eq!(from_string, usd(1050));
    }

    #[test]
    fn test_negative_display() {
        assert!(usd(-150).is_negative());
        assert!(!Money::ZERO.is_negative());
        assert_eq!(usd(-150).to_string(), "-$1.50");
    }
}
