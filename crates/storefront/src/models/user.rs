//! User domain types.

use chrono::{DateTime, Utc};
use pokebin_core::{Email, UserId};

/// A storefront account.
///
/// Accounts start inactive and are activated by the emailed verification link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: Email,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
