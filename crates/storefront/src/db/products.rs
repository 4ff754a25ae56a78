//! Product repository.
//!
//! Storefront reads only ever see products with `stock > 0`.

use sqlx::PgPool;

use pokebin_core::{CategoryId, Money, PageRequest, ProductId, ProductQuery, Slug};

use super::RepositoryError;
use crate::models::{Category, Product};

const PRODUCT_COLUMNS: &str = r"
    p.id, p.title, p.brand, p.description, p.slug, p.price,
    p.image, p.image2, p.image3, p.image4, p.stock, p.units_sold,
    c.id AS category_id, c.name AS category_name, c.slug AS category_slug
";

/// Filter shared by the listing and count queries.
///
/// `$1` is the category slug, `$2` the escaped `ILIKE` pattern; either may be NULL.
const IN_STOCK_FILTER: &str = r"
    FROM pokebin.product p
    LEFT JOIN pokebin.category c ON c.id = p.category_id
    WHERE p.stock > 0
      AND ($1::text IS NULL OR c.slug = $1)
      AND ($2::text IS NULL
           OR p.title ILIKE $2
           OR p.description ILIKE $2
           OR p.brand ILIKE $2)
";

/// Internal row type for product queries (joined with category).
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    title: String,
    brand: String,
    description: String,
    slug: String,
    price: Money,
    image: String,
    image2: Option<String>,
    image3: Option<String>,
    image4: Option<String>,
    stock: i32,
    units_sold: i32,
    category_id: Option<i32>,
    category_name: Option<String>,
    category_slug: Option<String>,
}

fn parse_slug(value: &str) -> Result<Slug, RepositoryError> {
    Slug::parse(value)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid slug {value:?}: {e}")))
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let category = match (row.category_id, row.category_name, row.category_slug) {
            (Some(id), Some(name), Some(slug)) => Some(Category {
                id: CategoryId::new(id),
                name,
                slug: parse_slug(&slug)?,
            }),
            _ => None,
        };

        Ok(Self {
            id: ProductId::new(row.id),
            category,
            title: row.title,
            brand: row.brand,
            description: row.description,
            slug: parse_slug(&row.slug)?,
            price: row.price,
            image: row.image,
            image2: row.image2,
            image3: row.image3,
            image4: row.image4,
            stock: row.stock,
            units_sold: row.units_sold,
        })
    }
}

/// Values for inserting a product from seed data.
#[derive(Debug, Clone)]
pub struct NewProduct<'a> {
    pub category_id: Option<CategoryId>,
    pub title: &'a str,
    pub brand: &'a str,
    pub description: &'a str,
    pub slug: &'a Slug,
    pub price: Money,
    pub images: &'a [String],
    pub stock: i32,
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of in-stock products plus the total number of matches.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either query fails.
    pub async fn list_in_stock(
        &self,
        query: &ProductQuery,
        page: PageRequest,
    ) -> Result<(Vec<Product>, u64), RepositoryError> {
        let category = query.category.as_ref().map(Slug::as_str);
        let pattern = query.search_pattern();

        // ORDER BY comes from a closed enum, never from client text
        let list_sql = format!(
            "SELECT {PRODUCT_COLUMNS} {IN_STOCK_FILTER} ORDER BY {} LIMIT $3 OFFSET $4",
            query.sort.order_by()
        );
        let rows = sqlx::query_as::<_, ProductRow>(&list_sql)
            .bind(category)
            .bind(pattern.as_deref())
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool)
            .await?;

        let count_sql = format!("SELECT COUNT(*) {IN_STOCK_FILTER}");
        let total = sqlx::query_scalar::<_, i64>(&count_sql)
            .bind(category)
            .bind(pattern.as_deref())
            .fetch_one(self.pool)
            .await?;

        let products = rows
            .into_iter()
            .map(Product::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((products, u64::try_from(total).unwrap_or(0)))
    }

    /// An in-stock product by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_in_stock_by_slug(&self, slug: &Slug) -> Result<Option<Product>, RepositoryError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS}
             FROM pokebin.product p
             LEFT JOIN pokebin.category c ON c.id = p.category_id
             WHERE p.slug = $1 AND p.stock > 0"
        );
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(slug.as_str())
            .fetch_optional(self.pool)
            .await?;

        row.map(Product::try_from).transpose()
    }

    /// Insert a product unless its slug is taken. Returns `true` if inserted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert_if_absent(&self, product: &NewProduct<'_>) -> Result<bool, RepositoryError> {
        let image = |i: usize| product.images.get(i).map(String::as_str);

        let result = sqlx::query(
            r"
            INSERT INTO pokebin.product
                (category_id, title, brand, description, slug, price,
                 image, image2, image3, image4, stock)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (slug) DO NOTHING
            ",
        )
        .bind(product.category_id)
        .bind(product.title)
        .bind(product.brand)
        .bind(product.description)
        .bind(product.slug.as_str())
        .bind(product.price)
        .bind(image(0).unwrap_or_default())
        .bind(image(1))
        .bind(image(2))
        .bind(image(3))
        .bind(product.stock)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
