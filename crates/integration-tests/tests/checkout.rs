//! Order engine tests against in-memory storage.

#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;

use pokebin_core::{
    Cart, CartLineInput, Money, ProductId, ShippingForm, ShippingInfo, StockPolicy, UserId,
};
use pokebin_integration_tests::{FailingNotifier, MemoryCheckoutStore, RecordingNotifier};
use pokebin_storefront::services::checkout::{
    CheckoutError, complete_order, notify_order_placed,
};

fn money(cents: i64) -> Money {
    Money::new(Decimal::new(cents, 2))
}

fn cart(lines: &[(i32, i64, i64)]) -> Cart {
    Cart::from_input(
        lines
            .iter()
            .map(|&(id, quantity, cents)| CartLineInput {
                id: ProductId::new(id),
                quantity,
                price: money(cents),
            })
            .collect(),
    )
    .unwrap()
}

fn shipping() -> ShippingInfo {
    ShippingForm {
        full_name: "A B".to_string(),
        email: "a@b.com".to_string(),
        address1: "1 Main St".to_string(),
        address2: None,
        city: "X".to_string(),
        state: Some("Y".to_string()),
        zipcode: Some("00000".to_string()),
    }
    .validate()
    .unwrap()
}

fn two_products() -> MemoryCheckoutStore {
    MemoryCheckoutStore::with_products(&[(1, "Pikachu Plush", 10), (2, "Poke Ball", 4)])
}

// ============================================================================
// Happy path
// ============================================================================

#[tokio::test]
async fn test_order_records_lines_and_moves_stock() {
    let store = two_products();

    let placed = complete_order(
        &store,
        &cart(&[(1, 2, 1000), (2, 1, 500)]),
        &shipping(),
        None,
        StockPolicy::Unchecked,
    )
    .await
    .unwrap();

    assert!(placed.skipped.is_empty());
    assert_eq!(placed.confirmation.total, money(2500));
    assert_eq!(
        placed.confirmation.product_titles,
        vec!["Pikachu Plush".to_string(), "Poke Ball".to_string()]
    );

    let orders = store.orders().await;
    assert_eq!(orders.len(), 1);
    let order = &orders[0];
    assert_eq!(order.id, placed.order_id);
    assert_eq!(order.order.amount_paid, money(2500));
    assert_eq!(order.order.shipping_address, "1 Main St\nX\nY\n00000");
    assert_eq!(order.order.user_id, None);
    assert_eq!(order.items.len(), 2);
    assert_eq!(order.items[0].quantity, 2);
    assert_eq!(order.items[0].price, money(1000));

    let pikachu = store.product(1).await.unwrap();
    assert_eq!((pikachu.stock, pikachu.units_sold), (8, 2));
    let ball = store.product(2).await.unwrap();
    assert_eq!((ball.stock, ball.units_sold), (3, 1));
}

#[tokio::test]
async fn test_signed_in_order_is_owned_by_user() {
    let store = two_products();
    let user = UserId::new(42);

    complete_order(
        &store,
        &cart(&[(1, 1, 1000)]),
        &shipping(),
        Some(user),
        StockPolicy::Unchecked,
    )
    .await
    .unwrap();

    let order = &store.orders().await[0];
    assert_eq!(order.order.user_id, Some(user));
    assert_eq!(order.items[0].user_id, Some(user));
}

#[tokio::test]
async fn test_duplicate_lines_stay_separate() {
    let store = two_products();

    complete_order(
        &store,
        &cart(&[(1, 1, 1000), (1, 2, 1000)]),
        &shipping(),
        None,
        StockPolicy::Unchecked,
    )
    .await
    .unwrap();

    assert_eq!(store.orders().await[0].items.len(), 2);
    assert_eq!(store.product(1).await.unwrap().stock, 7);
}

#[tokio::test]
async fn test_captured_price_is_charged() {
    let store = two_products();

    let placed = complete_order(
        &store,
        &cart(&[(1, 3, 333)]),
        &shipping(),
        None,
        StockPolicy::Unchecked,
    )
    .await
    .unwrap();

    assert_eq!(placed.confirmation.total, money(999));
}

// ============================================================================
// Missing products and empty carts
// ============================================================================

#[tokio::test]
async fn test_missing_product_is_skipped_but_total_kept() {
    let store = MemoryCheckoutStore::with_products(&[(1, "Pikachu Plush", 10)]);

    let placed = complete_order(
        &store,
        &cart(&[(1, 2, 1000), (2, 1, 500)]),
        &shipping(),
        None,
        StockPolicy::Unchecked,
    )
    .await
    .unwrap();

    assert_eq!(placed.skipped, vec![ProductId::new(2)]);
    assert_eq!(placed.confirmation.product_titles, vec!["Pikachu Plush".to_string()]);

    let order = &store.orders().await[0];
    assert_eq!(order.order.amount_paid, money(2500));
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].product_id, ProductId::new(1));
}

#[tokio::test]
async fn test_empty_cart_writes_nothing() {
    let store = two_products();

    let err = complete_order(&store, &Cart::default(), &shipping(), None, StockPolicy::Unchecked)
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::EmptyCart));
    assert!(store.orders().await.is_empty());
}

// ============================================================================
// Stock policy
// ============================================================================

#[tokio::test]
async fn test_unchecked_policy_allows_negative_stock() {
    let store = two_products();

    complete_order(
        &store,
        &cart(&[(2, 6, 500)]),
        &shipping(),
        None,
        StockPolicy::Unchecked,
    )
    .await
    .unwrap();

    let ball = store.product(2).await.unwrap();
    assert_eq!((ball.stock, ball.units_sold), (-2, 6));
}

#[tokio::test]
async fn test_guarded_policy_rolls_back_whole_order() {
    let store = two_products();

    let err = complete_order(
        &store,
        &cart(&[(1, 2, 1000), (2, 6, 500)]),
        &shipping(),
        None,
        StockPolicy::Guarded,
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        CheckoutError::InsufficientStock { product_id } if product_id == ProductId::new(2)
    ));
    assert!(store.orders().await.is_empty());
    assert_eq!(store.product(1).await.unwrap().stock, 10);
    assert_eq!(store.product(2).await.unwrap().units_sold, 0);
}

#[tokio::test]
async fn test_guarded_policy_allows_exact_stock() {
    let store = two_products();

    complete_order(
        &store,
        &cart(&[(2, 4, 500)]),
        &shipping(),
        None,
        StockPolicy::Guarded,
    )
    .await
    .unwrap();

    assert_eq!(store.product(2).await.unwrap().stock, 0);
}

// ============================================================================
// Confirmation
// ============================================================================

#[tokio::test]
async fn test_confirmation_sent_to_shipping_email() {
    let store = two_products();
    let notifier = RecordingNotifier::default();

    let placed = complete_order(
        &store,
        &cart(&[(1, 1, 1000)]),
        &shipping(),
        None,
        StockPolicy::Unchecked,
    )
    .await
    .unwrap();
    notify_order_placed(&notifier, &placed.confirmation).await;

    let sent = notifier.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient.as_str(), "a@b.com");
    assert_eq!(sent[0].full_name, "A B");
    assert_eq!(sent[0].order_id, placed.order_id);
}

#[tokio::test]
async fn test_failed_confirmation_keeps_order() {
    let store = two_products();

    let placed = complete_order(
        &store,
        &cart(&[(1, 1, 1000)]),
        &shipping(),
        None,
        StockPolicy::Unchecked,
    )
    .await
    .unwrap();
    notify_order_placed(&FailingNotifier, &placed.confirmation).await;

    assert_eq!(store.orders().await.len(), 1);
}

#[tokio::test]
async fn test_order_numbers_increase() {
    let store = two_products();

    let mut ids = Vec::new();
    for _ in 0..3 {
        let placed = complete_order(
            &store,
            &cart(&[(1, 1, 1000)]),
            &shipping(),
            None,
            StockPolicy::Unchecked,
        )
        .await
        .unwrap();
        ids.push(placed.order_id);
    }

    assert!(ids.windows(2).all(|w| w[0] < w[1]));
}
