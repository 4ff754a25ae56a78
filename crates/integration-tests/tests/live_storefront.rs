//! End-to-end tests against a running storefront.
//!
//! These tests require:
//! - A running `PostgreSQL` database, migrated and seeded
//!   (`pokebin-cli migrate && pokebin-cli seed`)
//! - The storefront server running (`cargo run -p pokebin-storefront`)
//!
//! Run with: `cargo test -p pokebin-integration-tests -- --ignored`

#![allow(clippy::unwrap_used)]

use std::str::FromStr;

use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde_json::{Value, json};

/// Seeded with `stock: 0`; must never be listed or served.
const SOLD_OUT_SLUG: &str = "shiny-mewtwo-statue";

/// Base URL for the storefront API (configurable via environment).
fn storefront_base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

async fn first_product(client: &Client) -> Value {
    let base_url = storefront_base_url();
    let page: Value = client
        .get(format!("{base_url}/products"))
        .send()
        .await
        .expect("Failed to list products")
        .json()
        .await
        .unwrap();

    page["items"][0].clone()
}

/// Every item of a paginated listing, following `has_next`.
async fn all_items(client: &Client, path: &str) -> Vec<Value> {
    let base_url = storefront_base_url();
    let separator = if path.contains('?') { '&' } else { '?' };
    let mut items = Vec::new();

    for page in 1.. {
        let resp = client
            .get(format!("{base_url}{path}{separator}page={page}"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK, "{path} page {page}");

        let body: Value = resp.json().await.unwrap();
        items.extend(body["items"].as_array().unwrap().iter().cloned());
        if body["has_next"] != true {
            break;
        }
    }
    items
}

fn prices(items: &[Value]) -> Vec<Decimal> {
    items
        .iter()
        .map(|item| Decimal::from_str(item["price"].as_str().unwrap()).unwrap())
        .collect()
}

fn assert_all_in_stock(items: &[Value]) {
    for item in items {
        assert!(item["stock"].as_i64().unwrap() > 0, "{item}");
        assert_ne!(item["slug"], SOLD_OUT_SLUG);
    }
}

// ============================================================================
// Catalog
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server and seeded database"]
async fn test_readiness() {
    let resp = client()
        .get(format!("{}/health/ready", storefront_base_url()))
        .send()
        .await
        .expect("Failed to reach storefront");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded database"]
async fn test_product_listing_and_detail() {
    let client = client();
    let base_url = storefront_base_url();

    let product = first_product(&client).await;
    let slug = product["slug"].as_str().expect("product has a slug");

    let resp = client
        .get(format!("{base_url}/products/{slug}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let detail: Value = resp.json().await.unwrap();
    assert_eq!(detail["id"], product["id"]);
    assert!(detail["stock"].as_i64().unwrap() > 0);
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded database"]
async fn test_category_products() {
    let client = client();
    let base_url = storefront_base_url();

    let categories: Value = client
        .get(format!("{base_url}/categories"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let slug = categories[0]["slug"].as_str().expect("seeded category");

    let items = all_items(&client, &format!("/categories/{slug}/products?sort=price_asc")).await;
    assert!(!items.is_empty());
    assert!(prices(&items).windows(2).all(|w| w[0] <= w[1]));
    assert_all_in_stock(&items);

    let resp = client
        .get(format!("{base_url}/categories/no-such-category/products"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded database"]
async fn test_price_sorting_is_monotonic() {
    let client = client();

    let ascending = all_items(&client, "/products?sort=price_asc").await;
    assert!(ascending.len() > 1);
    assert!(prices(&ascending).windows(2).all(|w| w[0] <= w[1]));

    let descending = all_items(&client, "/products?sort=price_desc").await;
    assert!(prices(&descending).windows(2).all(|w| w[0] >= w[1]));
    assert_eq!(ascending.len(), descending.len());
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded database"]
async fn test_sold_out_products_are_hidden() {
    let client = client();
    let base_url = storefront_base_url();

    assert_all_in_stock(&all_items(&client, "/products").await);
    assert_all_in_stock(&all_items(&client, "/categories/accessories/products").await);

    // Another in-stock Mewtwo product still matches the search
    let found = all_items(&client, "/products?search=mewtwo").await;
    assert!(!found.is_empty());
    assert_all_in_stock(&found);
    assert!(all_items(&client, "/products?search=statue").await.is_empty());

    let resp = client
        .get(format!("{base_url}/products/{SOLD_OUT_SLUG}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Guest checkout and lookup
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server and seeded database"]
async fn test_guest_checkout_then_lookup() {
    let client = client();
    let base_url = storefront_base_url();

    let product = first_product(&client).await;

    let resp = client
        .post(format!("{base_url}/orders"))
        .json(&json!({
            "cart_items": [{ "id": product["id"], "quantity": 1, "price": product["price"] }],
            "shipping": {
                "full_name": "Integration Test",
                "email": "integration@example.com",
                "address1": "1 Test Way",
                "city": "Testville"
            }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let placed: Value = resp.json().await.unwrap();
    assert_eq!(placed["success"], true);
    let order_id = placed["order_id"].as_i64().unwrap();

    // Lookup accepts the number as a string too
    let resp = client
        .post(format!("{base_url}/orders/lookup"))
        .json(&json!({ "order_number": order_id.to_string() }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let found: Value = resp.json().await.unwrap();
    assert_eq!(found["order"]["id"], order_id);
    assert_eq!(found["order"]["amount_paid"], product["price"]);
    assert_eq!(found["order"]["shipped"], false);
    assert_eq!(found["order"]["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded database"]
async fn test_lookup_unknown_order() {
    let resp = client()
        .post(format!("{}/orders/lookup", storefront_base_url()))
        .json(&json!({ "order_number": i64::MAX }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Order not found");
}
