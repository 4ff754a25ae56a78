//! Catalog domain types.

use pokebin_core::{CategoryId, Money, ProductId, Slug};
use serde::Serialize;

/// A product category. Created by seeding and never edited by the storefront.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: Slug,
}

/// A catalog product.
///
/// Image fields hold storage paths; the HTTP layer turns them into URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: ProductId,
    pub category: Option<Category>,
    pub title: String,
    pub brand: String,
    pub description: String,
    pub slug: Slug,
    pub price: Money,
    pub image: String,
    pub image2: Option<String>,
    pub image3: Option<String>,
    pub image4: Option<String>,
    pub stock: i32,
    pub units_sold: i32,
}
