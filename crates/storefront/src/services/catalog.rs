//! Catalog query service.
//!
//! Read-only views of categories and in-stock products. Categories change
//! rarely and are cached for 5 minutes using `moka`. Products are always read
//! fresh because every order moves their stock.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use tracing::{debug, instrument};

use pokebin_core::{Page, PageRequest, ProductQuery, ProductSort, Slug};

use crate::db::{CategoryRepository, ProductRepository, RepositoryError};
use crate::models::{Category, Product};

/// Cache key for category lookups.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    Categories,
    Category(Slug),
}

/// Cached value types.
#[derive(Debug, Clone)]
enum CacheValue {
    Categories(Vec<Category>),
    /// `None` caches a miss so unknown slugs don't hit the database
    Category(Option<Category>),
}

/// Catalog queries with a fixed page size.
#[derive(Clone)]
pub struct CatalogService {
    inner: Arc<CatalogServiceInner>,
}

struct CatalogServiceInner {
    pool: PgPool,
    page_size: u32,
    cache: Cache<CacheKey, CacheValue>,
}

impl CatalogService {
    #[must_use]
    pub fn new(pool: PgPool, page_size: u32) -> Self {
        let cache = Cache::builder()
            .max_capacity(256)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(CatalogServiceInner {
                pool,
                page_size: page_size.max(1),
                cache,
            }),
        }
    }

    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.inner.page_size
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// One page of in-stock products matching `query`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if a query fails.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        query: &ProductQuery,
        page: u32,
    ) -> Result<Page<Product>, RepositoryError> {
        let request = PageRequest::new(page, self.inner.page_size);
        let (items, total) = ProductRepository::new(&self.inner.pool)
            .list_in_stock(query, request)
            .await?;

        Ok(Page::new(items, request, total))
    }

    /// A single product, if it exists and is in stock.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn get_product(&self, slug: &Slug) -> Result<Option<Product>, RepositoryError> {
        ProductRepository::new(&self.inner.pool)
            .get_in_stock_by_slug(slug)
            .await
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// All categories, in creation order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let categories = CategoryRepository::new(&self.inner.pool).list().await?;
        self.inner
            .cache
            .insert(CacheKey::Categories, CacheValue::Categories(categories.clone()))
            .await;

        Ok(categories)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn get_category(&self, slug: &Slug) -> Result<Option<Category>, RepositoryError> {
        let key = CacheKey::Category(slug.clone());
        if let Some(CacheValue::Category(category)) = self.inner.cache.get(&key).await {
            debug!(slug = %slug, "Cache hit for category");
            return Ok(category);
        }

        let category = CategoryRepository::new(&self.inner.pool)
            .get_by_slug(slug)
            .await?;
        self.inner
            .cache
            .insert(key, CacheValue::Category(category.clone()))
            .await;

        Ok(category)
    }

    /// One page of a category's in-stock products.
    ///
    /// Returns `None` when the category does not exist, so callers can tell an
    /// unknown slug apart from an empty category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if a query fails.
    pub async fn list_category_products(
        &self,
        slug: &Slug,
        sort: ProductSort,
        page: u32,
    ) -> Result<Option<(Category, Page<Product>)>, RepositoryError> {
        let Some(category) = self.get_category(slug).await? else {
            return Ok(None);
        };

        let query = ProductQuery {
            category: Some(category.slug.clone()),
            search: None,
            sort,
        };
        let products = self.list_products(&query, page).await?;

        Ok(Some((category, products)))
    }
}
