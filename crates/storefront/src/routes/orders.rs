//! Checkout and order lookup handlers.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use pokebin_core::{Cart, CartLineInput, OrderId, ShippingForm, ShippingInfo, ValidationErrors};

use super::auth::json_body;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::OptionalAuth;
use crate::models::OrderDetail;
use crate::services::checkout::{CheckoutError, complete_order, notify_order_placed};
use crate::services::orders::{OrderNumberError, find_order_by_id, parse_order_number};
use crate::state::AppState;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Body of `POST /orders`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PlaceOrderRequest {
    pub cart_items: Vec<CartLineInput>,
    pub shipping: ShippingForm,
}

#[derive(Debug, Serialize)]
pub struct PlaceOrderResponse {
    pub success: bool,
    pub order_id: OrderId,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct LookupResponse {
    pub success: bool,
    pub order: OrderDetail,
}

/// Check a checkout request before anything is written.
///
/// An empty cart is reported on its own, ahead of any field errors.
///
/// # Errors
///
/// `CheckoutError::EmptyCart`, or every invalid cart and shipping field.
pub fn validate_order_request(request: PlaceOrderRequest) -> Result<(Cart, ShippingInfo)> {
    if request.cart_items.is_empty() {
        return Err(CheckoutError::EmptyCart.into());
    }

    let mut errors = ValidationErrors::new();

    let cart = Cart::from_input(request.cart_items)
        .map_err(|e| errors.merge(e))
        .ok();
    let shipping = request
        .shipping
        .validate()
        .map_err(|e| errors.merge_prefixed("shipping", e))
        .ok();

    match (cart, shipping) {
        (Some(cart), Some(shipping)) => Ok((cart, shipping)),
        _ => Err(AppError::Validation(errors)),
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// `POST /orders`: place an order for the submitted cart.
///
/// The confirmation email is sent in the background after the order commits.
pub async fn place_order(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    payload: std::result::Result<Json<PlaceOrderRequest>, JsonRejection>,
) -> Result<Json<PlaceOrderResponse>> {
    let request = json_body(payload)?;
    let (cart, shipping) = validate_order_request(request)?;

    let placed = complete_order(
        state.checkout(),
        &cart,
        &shipping,
        user.as_ref().map(|u| u.id),
        state.config().checkout.stock_policy,
    )
    .await?;

    add_breadcrumb(
        "checkout",
        "Order placed",
        Some(&[("order_id", &placed.order_id.to_string())]),
    );

    let email = state.email().clone();
    let confirmation = placed.confirmation;
    tokio::spawn(async move {
        notify_order_placed(&email, &confirmation).await;
    });

    Ok(Json(PlaceOrderResponse {
        success: true,
        order_id: placed.order_id,
        message: "Order completed successfully",
    }))
}

/// `POST /orders/lookup`: find any order by its number.
pub async fn lookup(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<LookupResponse>> {
    let body = json_body(payload)?;

    let order_id = parse_order_number(body.get("order_number"))
        .map_err(|e: OrderNumberError| AppError::BadRequest(e.to_string()))?;

    let order = find_order_by_id(state.pool(), order_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

    Ok(Json(LookupResponse {
        success: true,
        order,
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(value: Value) -> PlaceOrderRequest {
        serde_json::from_value(value).unwrap()
    }

    fn shipping() -> Value {
        json!({
            "full_name": "Ash Ketchum",
            "email": "ash@example.com",
            "address1": "1 Route",
            "city": "Pallet Town"
        })
    }

    #[test]
    fn test_empty_cart_reported_first() {
        let err = validate_order_request(request(json!({ "cart_items": [], "shipping": {} })))
            .unwrap_err();
        assert!(matches!(err, AppError::Checkout(CheckoutError::EmptyCart)));

        let err = validate_order_request(request(json!({}))).unwrap_err();
        assert!(matches!(err, AppError::Checkout(CheckoutError::EmptyCart)));
    }

    #[test]
    fn test_valid_request() {
        let (cart, shipping) = validate_order_request(request(json!({
            "cart_items": [
                { "id": 1, "quantity": 2, "price": "10.00" },
                { "id": 2, "quantity": 1, "price": 5 }
            ],
            "shipping": shipping()
        })))
        .unwrap();

        assert_eq!(cart.lines().len(), 2);
        assert_eq!(cart.total().to_string(), "$25.00");
        assert_eq!(shipping.formatted_address(), "1 Route\nPallet Town");
    }

    #[test]
    fn test_field_errors_collected_from_cart_and_shipping() {
        let err = validate_order_request(request(json!({
            "cart_items": [{ "id": 1, "quantity": 0, "price": "10.00" }],
            "shipping": { "email": "not-an-email" }
        })))
        .unwrap_err();

        let AppError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        let fields: Vec<&str> = errors.errors().iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"cart_items[0].quantity"));
        assert!(fields.contains(&"shipping.full_name"));
        assert!(fields.contains(&"shipping.address1"));
        assert!(fields.contains(&"shipping.city"));
        assert!(fields.contains(&"shipping.email"));
    }
}
