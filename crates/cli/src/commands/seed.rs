//! Seed the catalog with categories and products.
//!
//! Reads a YAML catalog (the bundled starter catalog by default) and inserts
//! every category and product whose slug is not already taken. Running it
//! twice changes nothing.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use pokebin_core::{CategoryId, Money, Slug};
use pokebin_storefront::db::{CategoryRepository, ProductRepository, products::NewProduct};

/// Starter catalog shipped with the CLI.
const BUNDLED_CATALOG: &str = include_str!("../../seed/catalog.yaml");

const DEFAULT_BRAND: &str = "un-branded";

/// Errors from reading a seed file.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid seed file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Product {product} references unknown category {category}")]
    UnknownCategory { product: String, category: String },

    #[error("Product {0} has a negative stock")]
    NegativeStock(String),
}

/// A seed catalog file.
#[derive(Debug, Deserialize)]
pub struct SeedCatalog {
    #[serde(default)]
    pub categories: Vec<SeedCategory>,
    #[serde(default)]
    pub products: Vec<SeedProduct>,
}

#[derive(Debug, Deserialize)]
pub struct SeedCategory {
    pub name: String,
    pub slug: Slug,
}

#[derive(Debug, Deserialize)]
pub struct SeedProduct {
    pub title: String,
    #[serde(default = "default_brand")]
    pub brand: String,
    #[serde(default)]
    pub description: String,
    pub slug: Slug,
    pub price: Money,
    /// Category slug; must be one of the file's categories.
    pub category: Option<Slug>,
    #[serde(default)]
    pub stock: i32,
    /// Up to four image paths, the first being the main image.
    #[serde(default)]
    pub images: Vec<String>,
}

fn default_brand() -> String {
    DEFAULT_BRAND.to_string()
}

/// Parse and check a seed catalog.
///
/// # Errors
///
/// Returns `SeedError` for malformed YAML, a product pointing at a category
/// the file does not define, or a negative stock.
pub fn parse_catalog(content: &str) -> Result<SeedCatalog, SeedError> {
    let catalog: SeedCatalog = serde_yaml::from_str(content)?;

    for product in &catalog.products {
        if product.stock < 0 {
            return Err(SeedError::NegativeStock(product.slug.to_string()));
        }
        if let Some(category) = &product.category
            && !catalog.categories.iter().any(|c| &c.slug == category)
        {
            return Err(SeedError::UnknownCategory {
                product: product.slug.to_string(),
                category: category.to_string(),
            });
        }
    }

    Ok(catalog)
}

/// Seed the catalog from `file`, or from the bundled starter catalog.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if a database
/// operation fails.
pub async fn catalog(file: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    // Read and validate before connecting to the database
    let catalog = match file {
        Some(file_path) => {
            let path = Path::new(file_path);
            if !path.exists() {
                return Err(SeedError::FileNotFound(file_path.to_owned()).into());
            }
            info!(path = %file_path, "Loading catalog from file");
            parse_catalog(&tokio::fs::read_to_string(path).await?)?
        }
        None => {
            info!("Loading bundled starter catalog");
            parse_catalog(BUNDLED_CATALOG)?
        }
    };

    info!(
        categories = catalog.categories.len(),
        products = catalog.products.len(),
        "Parsed catalog"
    );

    let pool = super::connect().await?;
    let categories = CategoryRepository::new(&pool);
    let products = ProductRepository::new(&pool);

    let mut category_ids: HashMap<Slug, CategoryId> = HashMap::new();
    let mut categories_created = 0;
    for seed in &catalog.categories {
        let (category, created) = categories.get_or_create(&seed.name, &seed.slug).await?;
        if created {
            categories_created += 1;
        }
        category_ids.insert(category.slug, category.id);
    }

    let mut products_created = 0;
    for seed in &catalog.products {
        let product = NewProduct {
            category_id: seed
                .category
                .as_ref()
                .and_then(|slug| category_ids.get(slug).copied()),
            title: &seed.title,
            brand: &seed.brand,
            description: &seed.description,
            slug: &seed.slug,
            price: seed.price,
            images: &seed.images,
            stock: seed.stock,
        };
        if products.insert_if_absent(&product).await? {
            products_created += 1;
        }
    }

    info!("Seeding complete!");
    info!("  Categories created: {categories_created}");
    info!("  Products created: {products_created}");
    info!(
        "  Products skipped (already exist): {}",
        catalog.products.len() - products_created
    );

    Ok(())
}
