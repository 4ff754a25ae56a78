//! The cart handed to checkout.
//!
//! The storefront keeps the cart client-side; at checkout it arrives as a list
//! of `(product, quantity, price)` lines. The price is the one captured when
//! the item was added, and that captured price is what the customer pays.

use serde::Deserialize;

use crate::types::{Money, ProductId};
use crate::validation::ValidationErrors;

/// One cart line as submitted by the client.
#[derive(Debug, Clone, Deserialize)]
pub struct CartLineInput {
    pub id: ProductId,
    pub quantity: i64,
    pub price: Money,
}

/// Most units of one product a single cart line may ask for.
pub const MAX_LINE_QUANTITY: i32 = 999;

/// A validated cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineItem {
    pub product_id: ProductId,
    pub quantity: i32,
    pub unit_price: Money,
}

/// An ordered list of cart lines.
///
/// Lines are kept exactly as submitted: two lines for the same product stay
/// two lines and become two order items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    lines: Vec<LineItem>,
    total: Money,
}

impl Cart {
    /// Validate submitted lines.
    ///
    /// An empty list is a valid (empty) cart; rejecting it is the order
    /// engine's job so it can report the dedicated error.
    ///
    /// # Errors
    ///
    /// Returns field errors for quantities outside `1..=MAX_LINE_QUANTITY`,
    /// for prices outside `0..=Money::MAX_PRICE`, and for the first line that
    /// takes the running total past `Money::MAX_TOTAL`.
    pub fn from_input(lines: Vec<CartLineInput>) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut valid = Vec::with_capacity(lines.len());
        let mut total = Some(Money::ZERO);

        for (i, line) in lines.into_iter().enumerate() {
            let quantity = match i32::try_from(line.quantity) {
                Ok(q) if (1..=MAX_LINE_QUANTITY).contains(&q) => q,
                _ => {
                    errors.add(
                        format!("cart_items[{i}].quantity"),
                        format!("Quantity must be a whole number from 1 to {MAX_LINE_QUANTITY}."),
                    );
                    continue;
                }
            };
            if line.price.is_negative() {
                errors.add(format!("cart_items[{i}].price"), "Price cannot be negative.");
                continue;
            }
            if line.price > Money::MAX_PRICE {
                errors.add(
                    format!("cart_items[{i}].price"),
                    format!("Price cannot exceed {}.", Money::MAX_PRICE),
                );
                continue;
            }

            let running = total
                .and_then(|t| line.price.checked_times(quantity).and_then(|l| t.checked_add(l)))
                .filter(|t| *t <= Money::MAX_TOTAL);
            if running.is_none() && total.is_some() {
                errors.add(
                    format!("cart_items[{i}]"),
                    format!("Order total cannot exceed {}.", Money::MAX_TOTAL),
                );
            }
            total = running;

            valid.push(LineItem {
                product_id: line.id,
                quantity,
                unit_price: line.price,
            });
        }

        errors.finish(Self {
            lines: valid,
            total: total.unwrap_or(Money::MAX_TOTAL),
        })
    }

    #[must_use]
    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of quantity times captured price over every line.
    #[must_use]
    pub const fn total(&self) -> Money {
        self.total
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn line(id: i32, quantity: i64, cents: i64) -> CartLineInput {
        CartLineInput {
            id: ProductId::new(id),
            quantity,
            price: Money::new(Decimal::new(cents, 2)),
        }
    }

    #[test]
    fn test_total_uses_captured_prices() {
        let cart = Cart::from_input(vec![line(1, 2, 1000), line(2, 1, 500)]).unwrap();
        assert_eq!(cart.total(), Money::new(Decimal::new(2500, 2)));
        assert_eq!(cart.lines().len(), 2);
    }

    #[test]
    fn test_duplicate_lines_are_kept() {
        let cart = Cart::from_input(vec![line(1, 1, 999), line(1, 2, 999)]).unwrap();
        assert_eq!(cart.lines().len(), 2);
        assert_eq!(cart.total(), Money::new(Decimal::new(2997, 2)));
    }

    #[test]
    fn test_empty_input_is_empty_cart() {
        let cart = Cart::from_input(Vec::new()).unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Money::ZERO);
    }

    #[test]
    fn test_rejects_bad_quantities_and_prices() {
        let errors = Cart::from_input(vec![
            line(1, 0, 100),
            line(2, -3, 100),
            line(3, i64::from(i32::MAX) + 1, 100),
            line(4, 1, -1),
            line(5, 1000, 100),
            line(6, 1, 10_000_000),
        ])
        .unwrap_err();

        let fields: Vec<_> = errors.errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            [
                "cart_items[0].quantity",
                "cart_items[1].quantity",
                "cart_items[2].quantity",
                "cart_items[3].price",
                "cart_items[4].quantity",
                "cart_items[5].price",
            ]
        );
    }

    #[test]
    fn test_huge_client_price_is_a_field_error() {
        let input: Vec<CartLineInput> = serde_json::from_str(
            r#"[{"id": 1, "quantity": 2, "price": "79228162514264337593543950335"}]"#,
        )
        .unwrap();

        let errors = Cart::from_input(input).unwrap_err();
        assert_eq!(errors.errors()[0].field, "cart_items[0].price");
    }

    #[test]
    fn test_total_capped_at_order_column() {
        let max_line = line(1, i64::from(MAX_LINE_QUANTITY), 9_999_999);
        let cart = Cart::from_input(vec![max_line.clone()]).unwrap();
        assert_eq!(cart.total(), Money::new(Decimal::new(9_989_999_001, 2)));

        let errors = Cart::from_input(vec![max_line.clone(), max_line.clone(), max_line]).unwrap_err();
        let fields: Vec<_> = errors.errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["cart_items[1]"]);
    }

    #[test]
    fn test_deserialize_client_payload() {
        let input: Vec<CartLineInput> =
            serde_json::from_str(r#"[{"id": 1, "quantity": 2, "price": "10.00"}]"#).unwrap();
        let cart = Cart::from_input(input).unwrap();
        assert_eq!(cart.lines()[0].quantity, 2);
    }
}
