//! Order repository: lookups, per-customer history, and shipment updates.
//!
//! Orders are written by checkout through [`super::checkout`]; this module
//! only reads them back and edits their shipment columns.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use pokebin_core::{Money, OrderId, ProductId, ShipmentState, ShipmentUpdate, UserId};

use super::RepositoryError;
use crate::models::{Order, OrderDetail, OrderLine};

/// Internal row type for order queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    user_id: Option<i32>,
    full_name: String,
    email: String,
    shipping_address: String,
    amount_paid: Money,
    date_ordered: DateTime<Utc>,
    shipped: bool,
    date_shipped: Option<DateTime<Utc>>,
    tracking_number: Option<String>,
    courier: Option<String>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: OrderId::new(row.id),
            user_id: row.user_id.map(UserId::new),
            full_name: row.full_name,
            email: row.email,
            shipping_address: row.shipping_address,
            amount_paid: row.amount_paid,
            date_ordered: row.date_ordered,
            shipment: ShipmentState {
                shipped: row.shipped,
                date_shipped: row.date_shipped,
                tracking_number: row.tracking_number,
                courier: row.courier,
            },
        }
    }
}

/// Internal row type for order lines joined with product titles.
#[derive(Debug, sqlx::FromRow)]
struct OrderLineRow {
    order_id: i64,
    product_id: i32,
    product_name: Option<String>,
    quantity: i32,
    price: Money,
    total: Money,
}

#[derive(Debug, sqlx::FromRow)]
struct ShipmentRow {
    shipped: bool,
    date_shipped: Option<DateTime<Utc>>,
    tracking_number: Option<String>,
    courier: Option<String>,
}

const ORDER_COLUMNS: &str = r"
    id, user_id, full_name, email, shipping_address, amount_paid, date_ordered,
    shipped, date_shipped, tracking_number, courier
";

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// An order and its lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn find_detail(&self, id: OrderId) -> Result<Option<OrderDetail>, RepositoryError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM pokebin.orders WHERE id = $1");
        let Some(row) = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
        else {
            return Ok(None);
        };

        let mut lines = self.lines_for(&[row.id]).await?;
        let items = lines.remove(&row.id).unwrap_or_default();

        Ok(Some(OrderDetail {
            order: Order::from(row),
            items,
        }))
    }

    /// A customer's orders, newest first, each with its lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<OrderDetail>, RepositoryError> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM pokebin.orders
             WHERE user_id = $1
             ORDER BY date_ordered DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(user_id)
            .fetch_all(self.pool)
            .await?;

        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let mut lines = self.lines_for(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let items = lines.remove(&row.id).unwrap_or_default();
                OrderDetail {
                    order: Order::from(row),
                    items,
                }
            })
            .collect())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_for_user(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            r"
            SELECT COUNT(*) FROM pokebin.orders WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    /// Apply a staff shipment edit inside a transaction.
    ///
    /// Returns the new shipment state, or `None` if the order does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn update_shipment(
        &self,
        id: OrderId,
        update: ShipmentUpdate,
        now: DateTime<Utc>,
    ) -> Result<Option<ShipmentState>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let Some(current) = sqlx::query_as::<_, ShipmentRow>(
            r"
            SELECT shipped, date_shipped, tracking_number, courier
            FROM pokebin.orders
            WHERE id = $1
            FOR UPDATE
            ",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        else {
            return Ok(None);
        };

        let next = ShipmentState {
            shipped: current.shipped,
            date_shipped: current.date_shipped,
            tracking_number: current.tracking_number,
            courier: current.courier,
        }
        .apply(update, now);

        sqlx::query(
            r"
            UPDATE pokebin.orders
            SET shipped = $2, date_shipped = $3, tracking_number = $4, courier = $5
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(next.shipped)
        .bind(next.date_shipped)
        .bind(next.tracking_number.as_deref())
        .bind(next.courier.as_deref())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(next))
    }

    /// Lines for a set of orders, grouped by order id in insertion order.
    async fn lines_for(&self, order_ids: &[i64]) -> Result<HashMap<i64, Vec<OrderLine>>, RepositoryError> {
        if order_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, OrderLineRow>(
            r"
            SELECT oi.order_id, oi.product_id, p.title AS product_name, oi.quantity, oi.price,
                   oi.price * oi.quantity AS total
            FROM pokebin.order_item oi
            LEFT JOIN pokebin.product p ON p.id = oi.product_id
            WHERE oi.order_id = ANY($1)
            ORDER BY oi.id
            ",
        )
        .bind(order_ids)
        .fetch_all(self.pool)
        .await?;

        let mut grouped: HashMap<i64, Vec<OrderLine>> = HashMap::new();
        for row in rows {
            grouped.entry(row.order_id).or_default().push(OrderLine::new(
                ProductId::new(row.product_id),
                row.product_name,
                row.quantity,
                row.price,
                row.total,
            ));
        }
        Ok(grouped)
    }
}
