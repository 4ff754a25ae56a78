//! Product route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use pokebin_core::{
    Money, Page, PageRequest, ProductId, ProductQuery, ProductSort, Slug, ValidationErrors,
};

use crate::config::CatalogConfig;
use crate::error::{AppError, Result};
use crate::models::{Category, Product};
use crate::state::AppState;

// =============================================================================
// Views
// =============================================================================

/// Product as returned by the API, with image paths turned into URLs.
#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    pub id: ProductId,
    pub title: String,
    pub brand: String,
    pub description: String,
    pub slug: Slug,
    pub price: Money,
    pub category: Option<Category>,
    pub stock: i32,
    pub units_sold: i32,
    pub image_url: Option<String>,
    pub image2_url: Option<String>,
    pub image3_url: Option<String>,
    pub image4_url: Option<String>,
}

impl ProductView {
    #[must_use]
    pub fn new(product: Product, catalog: &CatalogConfig) -> Self {
        let url = |path: Option<&str>| {
            path.filter(|p| !p.trim().is_empty())
                .map(|p| catalog.media_url(p))
        };

        Self {
            image_url: url(Some(&product.image)),
            image2_url: url(product.image2.as_deref()),
            image3_url: url(product.image3.as_deref()),
            image4_url: url(product.image4.as_deref()),
            id: product.id,
            title: product.title,
            brand: product.brand,
            description: product.description,
            slug: product.slug,
            price: product.price,
            category: product.category,
            stock: product.stock,
            units_sold: product.units_sold,
        }
    }
}

// =============================================================================
// Query parameters
// =============================================================================

/// Listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
}

/// Parse `?page=`: absent or blank means page 1.
pub(crate) fn parse_page(page: Option<&str>) -> Result<u32> {
    match page.map(str::trim).filter(|p| !p.is_empty()) {
        None => Ok(1),
        Some(p) => p
            .parse()
            .map_err(|_| ValidationErrors::single("page", "Invalid page.").into()),
    }
}

/// Parse `?sort=`.
pub(crate) fn parse_sort(sort: Option<&str>) -> Result<ProductSort> {
    sort.unwrap_or_default()
        .parse::<ProductSort>()
        .map_err(|e| ValidationErrors::single("sort", e.to_string()).into())
}

// =============================================================================
// Handlers
// =============================================================================

/// `GET /products?category=&search=&sort=&page=`
pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<Page<ProductView>>> {
    let page = parse_page(params.page.as_deref())?;
    let sort = parse_sort(params.sort.as_deref())?;

    let category = match params.category.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => match Slug::parse(raw) {
            Ok(slug) => Some(slug),
            // No category can have this slug, so nothing matches
            Err(_) => {
                let request = PageRequest::new(page, state.catalog().page_size());
                return Ok(Json(Page::new(Vec::new(), request, 0)));
            }
        },
    };

    let query = ProductQuery {
        category,
        search: params.search,
        sort,
    };

    let products = state.catalog().list_products(&query, page).await?;
    let catalog = &state.config().catalog;

    Ok(Json(products.map(|p| ProductView::new(p, catalog))))
}

/// `GET /products/{slug}`
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ProductView>> {
    let not_found = || AppError::NotFound("Product not found".to_string());

    let slug = Slug::parse(&slug).map_err(|_| not_found())?;
    let product = state
        .catalog()
        .get_product(&slug)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(ProductView::new(product, &state.config().catalog)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pokebin_core::CategoryId;
    use rust_decimal::Decimal;

    fn product() -> Product {
        Product {
            id: ProductId::new(1),
            category: Some(Category {
                id: CategoryId::new(2),
                name: "Plush".to_string(),
                slug: Slug::parse("plush").unwrap(),
            }),
            title: "Pikachu Plush".to_string(),
            brand: "un-branded".to_string(),
            description: String::new(),
            slug: Slug::parse("pikachu-plush").unwrap(),
            price: Money::new(Decimal::new(1000, 2)),
            image: "images/pikachu.jpg".to_string(),
            image2: Some(String::new()),
            image3: None,
            image4: Some("https://cdn.example.com/back.jpg".to_string()),
            stock: 5,
            units_sold: 1,
        }
    }

    #[test]
    fn test_product_view_image_urls() {
        let catalog = CatalogConfig {
            page_size: 6,
            media_base_url: "https://pokebin.app/media/".to_string(),
        };
        let view = ProductView::new(product(), &catalog);

        assert_eq!(
            view.image_url.as_deref(),
            Some("https://pokebin.app/media/images/pikachu.jpg")
        );
        assert_eq!(view.image2_url, None);
        assert_eq!(view.image3_url, None);
        assert_eq!(
            view.image4_url.as_deref(),
            Some("https://cdn.example.com/back.jpg")
        );
    }

    #[test]
    fn test_product_view_json_shape() {
        let view = ProductView::new(product(), &CatalogConfig::default());
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["price"], "10.00");
        assert_eq!(json["slug"], "pikachu-plush");
        assert_eq!(json["category"]["slug"], "plush");
        assert_eq!(json["units_sold"], 1);
    }

    #[test]
    fn test_parse_page() {
        assert_eq!(parse_page(None).unwrap(), 1);
        assert_eq!(parse_page(Some(" ")).unwrap(), 1);
        assert_eq!(parse_page(Some("3")).unwrap(), 3);
        assert_eq!(parse_page(Some("0")).unwrap(), 0);
        assert!(parse_page(Some("two")).is_err());
        assert!(parse_page(Some("-1")).is_err());
    }

    #[test]
    fn test_parse_sort() {
        assert_eq!(parse_sort(None).unwrap(), ProductSort::Default);
        assert_eq!(parse_sort(Some("price_desc")).unwrap(), ProductSort::PriceDesc);
        assert!(matches!(
            parse_sort(Some("rating")),
            Err(AppError::Validation(_))
        ));
    }
}
