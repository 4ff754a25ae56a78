//! Pokebin Core - Shared domain types.
//!
//! This crate provides the value types used across the Pokebin components:
//! - `storefront` - Public JSON API (catalog, checkout, accounts)
//! - `cli` - Operator tools for migrations, seeding, and shipment updates
//!
//! # Architecture
//!
//! The core crate contains only types and pure rules - no I/O, no database
//! access, no HTTP. Everything here can be unit tested without a runtime.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, money, emails, and slugs
//! - [`cart`] - Cart value object handed to the order engine
//! - [`catalog`] - Product listing query, sort order, and pagination
//! - [`shipping`] - Shipping details validation and address formatting
//! - [`shipment`] - Order shipment state transitions
//! - [`inventory`] - Stock decrement policy
//! - [`validation`] - Field-level validation errors

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod inventory;
pub mod shipment;
pub mod shipping;
pub mod types;
pub mod validation;

pub use cart::{Cart, CartLineInput, LineItem};
pub use catalog::{Page, PageRequest, ProductQuery, ProductSort};
pub use inventory::StockPolicy;
pub use shipment::{ShipmentState, ShipmentUpdate};
pub use shipping::{ShippingForm, ShippingInfo};
pub use types::*;
pub use validation::{FieldError, ValidationErrors};
