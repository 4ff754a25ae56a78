//! Category route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use pokebin_core::{Page, Slug};

use super::products::{ProductView, parse_page, parse_sort};
use crate::error::{AppError, Result};
use crate::models::Category;
use crate::state::AppState;

/// Query parameters for a category's product listing.
#[derive(Debug, Default, Deserialize)]
pub struct CategoryProductsQuery {
    pub sort: Option<String>,
    pub page: Option<String>,
}

/// A category and one page of its products.
#[derive(Debug, Serialize)]
pub struct CategoryProducts {
    pub category: Category,
    pub products: Page<ProductView>,
}

fn category_not_found() -> AppError {
    AppError::NotFound("Category not found".to_string())
}

/// `GET /categories`
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    Ok(Json(state.catalog().list_categories().await?))
}

/// `GET /categories/{slug}`
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Category>> {
    let slug = Slug::parse(&slug).map_err(|_| category_not_found())?;
    let category = state
        .catalog()
        .get_category(&slug)
        .await?
        .ok_or_else(category_not_found)?;

    Ok(Json(category))
}

/// `GET /categories/{slug}/products?sort=&page=`
pub async fn products(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<CategoryProductsQuery>,
) -> Result<Json<CategoryProducts>> {
    let page = parse_page(params.page.as_deref())?;
    let sort = parse_sort(params.sort.as_deref())?;
    let slug = Slug::parse(&slug).map_err(|_| category_not_found())?;

    let (category, products) = state
        .catalog()
        .list_category_products(&slug, sort, page)
        .await?
        .ok_or_else(category_not_found)?;

    let catalog = &state.config().catalog;
    Ok(Json(CategoryProducts {
        category,
        products: products.map(|p| ProductView::new(p, catalog)),
    }))
}
