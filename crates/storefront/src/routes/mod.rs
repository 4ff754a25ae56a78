//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                         - Liveness
//! GET  /health/ready                   - Database readiness
//!
//! # Catalog
//! GET  /products                       - Paginated listing (category, search, sort, page)
//! GET  /products/{slug}                - Product detail
//! GET  /categories                     - Category list
//! GET  /categories/{slug}              - Category detail
//! GET  /categories/{slug}/products     - Category-scoped listing
//!
//! # Orders (rate limited)
//! POST /orders                         - Place an order (guest or signed in)
//! POST /orders/lookup                  - Look up an order by number
//!
//! # Auth (rate limited)
//! POST /auth/register                  - Create an inactive account
//! POST /auth/verify-email              - Activate with the emailed token
//! GET  /auth/verify-email?token=       - Same, from the emailed link
//! POST /auth/password-reset            - Email a reset link
//! POST /auth/password-reset/confirm    - Set a new password with the token
//! POST /auth/login                     - Start a session
//! POST /auth/logout                    - End the session
//! GET  /auth/me                        - Session status
//!
//! # Account (requires auth)
//! GET    /account/dashboard            - Account summary
//! GET    /account/profile              - Username and email
//! POST   /account/profile              - Change username and email
//! DELETE /account                      - Delete the account
//! GET    /account/orders               - Own orders, newest first
//! GET    /account/shipping             - Saved shipping profile
//! POST   /account/shipping             - Save shipping profile
//! ```

pub mod account;
pub mod auth;
pub mod categories;
pub mod health;
pub mod orders;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::{auth_rate_limiter, checkout_rate_limiter};
use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{slug}", get(products::show))
}

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::index))
        .route("/{slug}", get(categories::show))
        .route("/{slug}/products", get(categories::products))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(orders::place_order))
        .route("/lookup", post(orders::lookup))
        .layer(checkout_rate_limiter())
}

/// Create the auth routes router.
///
/// Only the credential-handling routes are rate limited.
pub fn auth_routes() -> Router<AppState> {
    let limited = Router::new()
        .route("/register", post(auth::register))
        .route(
            "/verify-email",
            get(auth::verify_email_link).post(auth::verify_email),
        )
        .route("/password-reset", post(auth::request_password_reset))
        .route(
            "/password-reset/confirm",
            post(auth::confirm_password_reset),
        )
        .route("/login", post(auth::login))
        .layer(auth_rate_limiter());

    Router::new()
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .merge(limited)
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", axum::routing::delete(account::delete_account))
        .route("/dashboard", get(account::dashboard))
        .route(
            "/profile",
            get(account::profile).post(account::update_profile),
        )
        .route("/orders", get(account::orders))
        .route(
            "/shipping",
            get(account::shipping).post(account::save_shipping),
        )
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/products", product_routes())
        .nest("/categories", category_routes())
        .nest("/orders", order_routes())
        .nest("/auth", auth_routes())
        .nest("/account", account_routes())
}
