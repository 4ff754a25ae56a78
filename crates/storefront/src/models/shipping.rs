//! Saved shipping profile.

use pokebin_core::{ShippingAddressId, UserId};
use serde::Serialize;

/// A shipping address row. Each signed-in customer keeps at most one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShippingAddress {
    pub id: ShippingAddressId,
    pub user_id: Option<UserId>,
    pub full_name: String,
    pub email: String,
    pub address1: String,
    pub address2: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub zipcode: Option<String>,
}
