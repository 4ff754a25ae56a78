//! Domain models for the storefront.
//!
//! These are validated domain objects, separate from the database row types
//! in [`crate::db`].

pub mod catalog;
pub mod order;
pub mod session;
pub mod shipping;
pub mod user;

pub use catalog::{Category, Product};
pub use order::{NewOrder, NewOrderItem, Order, OrderDetail, OrderLine};
pub use session::{CurrentUser, keys as session_keys};
pub use shipping::ShippingAddress;
pub use user::User;
