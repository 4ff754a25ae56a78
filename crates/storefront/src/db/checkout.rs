//! `PostgreSQL` implementation of the checkout storage seam.
//!
//! Each checkout runs in a single transaction. Product rows are locked with
//! `SELECT ... FOR UPDATE` so concurrent orders for the same product serialize
//! on that row.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use pokebin_core::{OrderId, ProductId, StockPolicy};

use super::RepositoryError;
use crate::models::{NewOrder, NewOrderItem};
use crate::services::checkout::{CheckoutStore, CheckoutTx, LockedProduct};

/// Checkout storage backed by the storefront pool.
#[derive(Clone)]
pub struct PgCheckoutStore {
    pool: PgPool,
}

impl PgCheckoutStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// An open checkout transaction. Rolls back on drop unless committed.
pub struct PgCheckoutTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl CheckoutStore for PgCheckoutStore {
    type Tx = PgCheckoutTx;

    async fn begin(&self) -> Result<Self::Tx, RepositoryError> {
        Ok(PgCheckoutTx {
            tx: self.pool.begin().await?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct LockedProductRow {
    id: i32,
    title: String,
    stock: i32,
}

#[async_trait]
impl CheckoutTx for PgCheckoutTx {
    async fn insert_order(&mut self, order: &NewOrder) -> Result<OrderId, RepositoryError> {
        let id = sqlx::query_scalar::<_, i64>(
            r"
            INSERT INTO pokebin.orders (full_name, email, shipping_address, amount_paid, user_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            ",
        )
        .bind(&order.full_name)
        .bind(&order.email)
        .bind(&order.shipping_address)
        .bind(order.amount_paid)
        .bind(order.user_id)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(OrderId::new(id))
    }

    async fn lock_product(&mut self, id: ProductId) -> Result<Option<LockedProduct>, RepositoryError> {
        let row = sqlx::query_as::<_, LockedProductRow>(
            r"
            SELECT id, title, stock
            FROM pokebin.product
            WHERE id = $1
            FOR UPDATE
            ",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(|r| LockedProduct {
            id: ProductId::new(r.id),
            title: r.title,
            stock: r.stock,
        }))
    }

    async fn insert_item(&mut self, item: &NewOrderItem) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO pokebin.order_item (order_id, product_id, quantity, price, user_id)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(item.order_id)
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(item.price)
        .bind(item.user_id)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn record_sale(
        &mut self,
        id: ProductId,
        quantity: i32,
        policy: StockPolicy,
    ) -> Result<bool, RepositoryError> {
        let sql = match policy {
            StockPolicy::Unchecked => {
                r"
                UPDATE pokebin.product
                SET stock = stock - $2, units_sold = units_sold + $2
                WHERE id = $1
                "
            }
            StockPolicy::Guarded => {
                r"
                UPDATE pokebin.product
                SET stock = stock - $2, units_sold = units_sold + $2
                WHERE id = $1 AND stock >= $2
                "
            }
        };

        let result = sqlx::query(sql)
            .bind(id)
            .bind(quantity)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn commit(self) -> Result<(), RepositoryError> {
        self.tx.commit().await?;
        Ok(())
    }
}
