//! Shipping profile repository.
//!
//! The table allows several rows per user; reads and updates always target
//! the user's lowest-id row so a duplicate left behind by old data is never
//! multiplied further.

use async_trait::async_trait;
use sqlx::PgPool;

use pokebin_core::{ShippingAddressId, ShippingInfo, UserId};

use super::RepositoryError;
use crate::models::ShippingAddress;
use crate::services::shipping::ShippingProfileStore;

/// Internal row type for shipping address queries.
#[derive(Debug, sqlx::FromRow)]
struct ShippingAddressRow {
    id: i32,
    user_id: Option<i32>,
    full_name: String,
    email: String,
    address1: String,
    address2: Option<String>,
    city: String,
    state: Option<String>,
    zipcode: Option<String>,
}

impl From<ShippingAddressRow> for ShippingAddress {
    fn from(row: ShippingAddressRow) -> Self {
        Self {
            id: ShippingAddressId::new(row.id),
            user_id: row.user_id.map(UserId::new),
            full_name: row.full_name,
            email: row.email,
            address1: row.address1,
            address2: row.address2,
            city: row.city,
            state: row.state,
            zipcode: row.zipcode,
        }
    }
}

/// Repository for shipping profile database operations.
#[derive(Clone, Copy)]
pub struct ShippingAddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ShippingAddressRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ShippingProfileStore for ShippingAddressRepository<'_> {
    async fn find_for_user(&self, user_id: UserId) -> Result<Option<ShippingAddress>, RepositoryError> {
        let row = sqlx::query_as::<_, ShippingAddressRow>(
            r"
            SELECT id, user_id, full_name, email, address1, address2, city, state, zipcode
            FROM pokebin.shipping_address
            WHERE user_id = $1
            ORDER BY id
            LIMIT 1
            ",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(ShippingAddress::from))
    }

    async fn upsert_for_user(
        &self,
        user_id: UserId,
        info: &ShippingInfo,
    ) -> Result<ShippingAddress, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_scalar::<_, i32>(
            r"
            SELECT id
            FROM pokebin.shipping_address
            WHERE user_id = $1
            ORDER BY id
            LIMIT 1
            FOR UPDATE
            ",
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let row = match existing {
            Some(id) => {
                sqlx::query_as::<_, ShippingAddressRow>(
                    r"
                    UPDATE pokebin.shipping_address
                    SET full_name = $2, email = $3, address1 = $4, address2 = $5,
                        city = $6, state = $7, zipcode = $8
                    WHERE id = $1
                    RETURNING id, user_id, full_name, email, address1, address2, city, state, zipcode
                    ",
                )
                .bind(id)
                .bind(&info.full_name)
                .bind(&info.email)
                .bind(&info.address1)
                .bind(info.address2.as_deref())
                .bind(&info.city)
                .bind(info.state.as_deref())
                .bind(info.zipcode.as_deref())
                .fetch_one(&mut *tx)
                .await?
            }
            None => {
                sqlx::query_as::<_, ShippingAddressRow>(
                    r"
                    INSERT INTO pokebin.shipping_address
                        (user_id, full_name, email, address1, address2, city, state, zipcode)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                    RETURNING id, user_id, full_name, email, address1, address2, city, state, zipcode
                    ",
                )
                .bind(user_id)
                .bind(&info.full_name)
                .bind(&info.email)
                .bind(&info.address1)
                .bind(info.address2.as_deref())
                .bind(&info.city)
                .bind(info.state.as_deref())
                .bind(info.zipcode.as_deref())
                .fetch_one(&mut *tx)
                .await?
            }
        };

        tx.commit().await?;
        Ok(ShippingAddress::from(row))
    }
}
