//! Order domain types.

use chrono::{DateTime, Utc};
use pokebin_core::{Email, Money, OrderId, ProductId, ShipmentState, UserId};
use serde::Serialize;

/// Shown for a line whose product no longer resolves to a title.
pub const UNKNOWN_PRODUCT_NAME: &str = "N/A";

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: Option<UserId>,
    pub full_name: String,
    pub email: String,
    /// Newline-separated address lines
    pub shipping_address: String,
    pub amount_paid: Money,
    pub date_ordered: DateTime<Utc>,
    #[serde(flatten)]
    pub shipment: ShipmentState,
}

/// One line of a placed order, with the product title resolved for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i32,
    pub price: Money,
    pub total: Money,
}

impl OrderLine {
    /// `total` is `quantity × price` as computed by the database.
    #[must_use]
    pub fn new(
        product_id: ProductId,
        product_name: Option<String>,
        quantity: i32,
        price: Money,
        total: Money,
    ) -> Self {
        Self {
            product_id,
            product_name: product_name.unwrap_or_else(|| UNKNOWN_PRODUCT_NAME.to_owned()),
            quantity,
            price,
            total,
        }
    }
}

/// An order with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderLine>,
}

/// Values for inserting an order row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub full_name: String,
    pub email: Email,
    pub shipping_address: String,
    pub amount_paid: Money,
    pub user_id: Option<UserId>,
}

/// Values for inserting an order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewOrderItem {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub price: Money,
    pub user_id: Option<UserId>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_order_line_fallback_name() {
        let line = OrderLine::new(
            ProductId::new(4),
            None,
            3,
            Money::new(Decimal::new(1499, 2)),
            Money::new(Decimal::new(4497, 2)),
        );
        assert_eq!(line.product_name, "N/A");

        let json = serde_json::to_value(&line).unwrap();
        assert_eq!(json["total"], "44.97");
    }

    #[test]
    fn test_order_detail_serializes_flat() {
        let detail = OrderDetail {
            order: Order {
                id: OrderId::new(12),
                user_id: None,
                full_name: "Ash Ketchum".into(),
                email: "ash@pallet.town".into(),
                shipping_address: "1 Route Road\nPallet Town".into(),
                amount_paid: Money::new(Decimal::new(2500, 2)),
                date_ordered: DateTime::<Utc>::default(),
                shipment: ShipmentState::default(),
            },
            items: Vec::new(),
        };

        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["id"], 12);
        assert_eq!(json["amount_paid"], "25.00");
        assert_eq!(json["shipped"], false);
        assert!(json["date_shipped"].is_null());
    }
}
