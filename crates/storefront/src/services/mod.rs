//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Registration, email verification, password reset, login, profile changes
//! - `catalog` - Category and in-stock product queries
//! - `checkout` - The order engine (`complete_order`)
//! - `email` - Order confirmation, verification and password reset emails
//! - `orders` - Order lookup and shipment updates
//! - `shipping` - Saved shipping profiles

pub mod auth;
pub mod catalog;
pub mod checkout;
pub mod email;
pub mod orders;
pub mod shipping;

pub use auth::{AuthError, AuthService};
pub use catalog::CatalogService;
pub use checkout::{CheckoutError, OrderNotifier, PlacedOrder, complete_order, notify_order_placed};
pub use email::{EmailError, EmailService};
pub use shipping::{ShippingProfileError, ShippingProfileStore};
