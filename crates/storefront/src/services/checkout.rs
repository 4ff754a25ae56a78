//! Order engine.
//!
//! Turns a cart plus shipping details into a persisted order:
//!
//! 1. Reject an empty cart before touching storage.
//! 2. Total the cart from the prices captured at add-to-cart time.
//! 3. Insert the order, then one item per line whose product still exists,
//!    moving each quantity from `stock` to `units_sold`.
//! 4. Commit, then hand back a confirmation for the notifier.
//!
//! Steps 3 and 4 run in one transaction. Lines for products that no longer
//! exist are skipped; the order keeps the full cart total regardless.

use async_trait::async_trait;
use pokebin_core::{Cart, Email, Money, OrderId, ProductId, ShippingInfo, StockPolicy, UserId};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::db::RepositoryError;
use crate::models::{NewOrder, NewOrderItem};
use crate::services::email::EmailError;

/// Errors that can occur while placing an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    /// Only raised under [`StockPolicy::Guarded`].
    #[error("insufficient stock for product {product_id}")]
    InsufficientStock { product_id: ProductId },

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// A product row locked for the duration of a checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockedProduct {
    pub id: ProductId,
    pub title: String,
    pub stock: i32,
}

/// Storage used by checkout. One call to [`begin`](Self::begin) per order.
#[async_trait]
pub trait CheckoutStore: Send + Sync {
    type Tx: CheckoutTx;

    async fn begin(&self) -> Result<Self::Tx, RepositoryError>;
}

/// An open checkout transaction. Dropping it without `commit` discards every
/// write made through it.
#[async_trait]
pub trait CheckoutTx: Send {
    async fn insert_order(&mut self, order: &NewOrder) -> Result<OrderId, RepositoryError>;

    /// Look up a product and hold it until commit. `None` if it does not exist.
    async fn lock_product(&mut self, id: ProductId) -> Result<Option<LockedProduct>, RepositoryError>;

    async fn insert_item(&mut self, item: &NewOrderItem) -> Result<(), RepositoryError>;

    /// Move `quantity` from stock to units sold. Returns `false` when the
    /// policy refused the decrement.
    async fn record_sale(
        &mut self,
        id: ProductId,
        quantity: i32,
        policy: StockPolicy,
    ) -> Result<bool, RepositoryError>;

    async fn commit(self) -> Result<(), RepositoryError>;
}

/// Sends the order confirmation.
#[async_trait]
pub trait OrderNotifier: Send + Sync {
    async fn order_placed(&self, confirmation: &OrderConfirmation) -> Result<(), EmailError>;
}

/// What the confirmation email needs to know about an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderConfirmation {
    pub order_id: OrderId,
    pub recipient: Email,
    pub full_name: String,
    /// Titles of the lines that were actually recorded
    pub product_titles: Vec<String>,
    pub total: Money,
}

/// Result of a successful checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedOrder {
    pub order_id: OrderId,
    pub confirmation: OrderConfirmation,
    /// Cart lines whose product no longer exists
    pub skipped: Vec<ProductId>,
}

/// Place an order for `cart`, shipping to `shipping`, owned by `user_id`
/// (`None` for guest checkout).
///
/// # Errors
///
/// - `CheckoutError::EmptyCart` if the cart has no lines (nothing is written)
/// - `CheckoutError::InsufficientStock` if the guarded policy refuses a line
///   (the whole order is rolled back)
/// - `CheckoutError::Repository` on storage failure (rolled back)
#[instrument(skip_all, fields(lines = cart.lines().len(), user_id = ?user_id, order_id = tracing::field::Empty))]
pub async fn complete_order<S: CheckoutStore>(
    store: &S,
    cart: &Cart,
    shipping: &ShippingInfo,
    user_id: Option<UserId>,
    policy: StockPolicy,
) -> Result<PlacedOrder, CheckoutError> {
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let total = cart.total();
    let mut tx = store.begin().await?;

    let order_id = tx
        .insert_order(&NewOrder {
            full_name: shipping.full_name.clone(),
            email: shipping.email.clone(),
            shipping_address: shipping.formatted_address(),
            amount_paid: total,
            user_id,
        })
        .await?;
    tracing::Span::current().record("order_id", order_id.as_i64());

    let mut product_titles = Vec::with_capacity(cart.lines().len());
    let mut skipped = Vec::new();

    for line in cart.lines() {
        let Some(product) = tx.lock_product(line.product_id).await? else {
            warn!(
                order_id = %order_id,
                product_id = %line.product_id,
                "Skipping cart line for missing product"
            );
            skipped.push(line.product_id);
            continue;
        };

        tx.insert_item(&NewOrderItem {
            order_id,
            product_id: product.id,
            quantity: line.quantity,
            price: line.unit_price,
            user_id,
        })
        .await?;

        if !tx.record_sale(product.id, line.quantity, policy).await? {
            warn!(
                product_id = %product.id,
                requested = line.quantity,
                available = product.stock,
                "Rejecting order: insufficient stock"
            );
            return Err(CheckoutError::InsufficientStock {
                product_id: product.id,
            });
        }

        product_titles.push(product.title);
    }

    tx.commit().await?;

    info!(
        order_id = %order_id,
        total = %total,
        items = product_titles.len(),
        skipped = skipped.len(),
        "Order placed"
    );

    Ok(PlacedOrder {
        order_id,
        confirmation: OrderConfirmation {
            order_id,
            recipient: shipping.email.clone(),
            full_name: shipping.full_name.clone(),
            product_titles,
            total,
        },
        skipped,
    })
}

/// Send the confirmation for a placed order.
///
/// Delivery failure is logged and reported to Sentry, never returned: the
/// order already exists and the customer has a confirmation number.
pub async fn notify_order_placed<N: OrderNotifier + ?Sized>(
    notifier: &N,
    confirmation: &OrderConfirmation,
) {
    if let Err(e) = notifier.order_placed(confirmation).await {
        let event_id = sentry::capture_error(&e);
        warn!(
            order_id = %confirmation.order_id,
            error = %e,
            sentry_event_id = %event_id,
            "Failed to send order confirmation"
        );
    }
}
