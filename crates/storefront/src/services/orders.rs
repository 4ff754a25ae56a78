//! Order lookup and staff shipment updates.

use chrono::Utc;
use serde_json::Value;
use sqlx::PgPool;
use thiserror::Error;

use pokebin_core::{OrderId, ShipmentState, ShipmentUpdate, UserId};

use crate::db::{OrderRepository, RepositoryError};
use crate::models::OrderDetail;

/// Why an order number from a lookup request could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderNumberError {
    #[error("Order number is required")]
    Missing,

    #[error("Unable to find order number")]
    Invalid,
}

/// Read an order number sent as a JSON number or a numeric string.
///
/// # Errors
///
/// `Missing` for null, absent, or blank input; `Invalid` for anything that is
/// not a whole number.
pub fn parse_order_number(value: Option<&Value>) -> Result<OrderId, OrderNumberError> {
    match value {
        None | Some(Value::Null) => Err(OrderNumberError::Missing),
        Some(Value::Number(n)) => n.as_i64().map(OrderId::new).ok_or(OrderNumberError::Invalid),
        Some(Value::String(s)) if s.trim().is_empty() => Err(OrderNumberError::Missing),
        Some(Value::String(s)) => s.parse().map_err(|_| OrderNumberError::Invalid),
        Some(_) => Err(OrderNumberError::Invalid),
    }
}

/// Any order by id, with its lines. Public: knowing the number is enough.
///
/// # Errors
///
/// Returns `RepositoryError` if a query fails.
pub async fn find_order_by_id(
    pool: &PgPool,
    id: OrderId,
) -> Result<Option<OrderDetail>, RepositoryError> {
    OrderRepository::new(pool).find_detail(id).await
}

/// A customer's orders, newest first.
///
/// # Errors
///
/// Returns `RepositoryError` if a query fails.
pub async fn list_orders_for_user(
    pool: &PgPool,
    user_id: UserId,
) -> Result<Vec<OrderDetail>, RepositoryError> {
    OrderRepository::new(pool).list_for_user(user_id).await
}

/// # Errors
///
/// Returns `RepositoryError` if the query fails.
pub async fn count_orders_for_user(pool: &PgPool, user_id: UserId) -> Result<i64, RepositoryError> {
    OrderRepository::new(pool).count_for_user(user_id).await
}

/// Mark an order shipped or unshipped and record tracking details.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the order does not exist.
pub async fn update_shipment(
    pool: &PgPool,
    id: OrderId,
    update: ShipmentUpdate,
) -> Result<ShipmentState, RepositoryError> {
    let state = OrderRepository::new(pool)
        .update_shipment(id, update, Utc::now())
        .await?
        .ok_or(RepositoryError::NotFound)?;

    tracing::info!(
        order_id = %id,
        shipped = state.shipped,
        date_shipped = ?state.date_shipped,
        "Shipment updated"
    );
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_order_number_accepts_numbers_and_strings() {
        assert_eq!(parse_order_number(Some(&json!(42))), Ok(OrderId::new(42)));
        assert_eq!(parse_order_number(Some(&json!("42"))), Ok(OrderId::new(42)));
        assert_eq!(parse_order_number(Some(&json!(" 7 "))), Ok(OrderId::new(7)));
    }

    #[test]
    fn test_parse_order_number_missing() {
        assert_eq!(parse_order_number(None), Err(OrderNumberError::Missing));
        assert_eq!(parse_order_number(Some(&Value::Null)), Err(OrderNumberError::Missing));
        assert_eq!(parse_order_number(Some(&json!("  "))), Err(OrderNumberError::Missing));
    }

    #[test]
    fn test_parse_order_number_invalid() {
        assert_eq!(parse_order_number(Some(&json!("abc"))), Err(OrderNumberError::Invalid));
        assert_eq!(parse_order_number(Some(&json!(4.5))), Err(OrderNumberError::Invalid));
        assert_eq!(parse_order_number(Some(&json!([1]))), Err(OrderNumberError::Invalid));
        assert_eq!(
            parse_order_number(Some(&json!(true))),
            Err(OrderNumberError::Invalid)
        );
    }
}
