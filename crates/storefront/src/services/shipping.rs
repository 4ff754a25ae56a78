//! Shipping profile service.
//!
//! Each signed-in customer keeps one saved shipping profile. Saving creates it
//! the first time and updates it afterwards; the owner is always the caller.

use async_trait::async_trait;
use thiserror::Error;

use pokebin_core::{ShippingForm, ShippingInfo, UserId, ValidationErrors};

use crate::db::RepositoryError;
use crate::models::ShippingAddress;

/// Storage for saved shipping profiles.
#[async_trait]
pub trait ShippingProfileStore: Send + Sync {
    /// The caller's profile, if one has been saved.
    async fn find_for_user(&self, user_id: UserId) -> Result<Option<ShippingAddress>, RepositoryError>;

    /// Replace the caller's profile, creating it if absent.
    async fn upsert_for_user(
        &self,
        user_id: UserId,
        info: &ShippingInfo,
    ) -> Result<ShippingAddress, RepositoryError>;
}

/// Errors from saving a shipping profile.
#[derive(Debug, Error)]
pub enum ShippingProfileError {
    #[error("invalid shipping details: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// The caller's saved profile.
///
/// # Errors
///
/// Returns `RepositoryError` if the lookup fails.
pub async fn get_shipping_profile<S: ShippingProfileStore + ?Sized>(
    store: &S,
    user_id: UserId,
) -> Result<Option<ShippingAddress>, RepositoryError> {
    store.find_for_user(user_id).await
}

/// Validate `form` and save it as the caller's profile.
///
/// Nothing is written when validation fails.
///
/// # Errors
///
/// Returns `ShippingProfileError::Validation` listing every invalid field, or
/// `ShippingProfileError::Repository` if the write fails.
pub async fn upsert_shipping_profile<S: ShippingProfileStore + ?Sized>(
    store: &S,
    user_id: UserId,
    form: ShippingForm,
) -> Result<ShippingAddress, ShippingProfileError> {
    let info = form.validate()?;
    let saved = store.upsert_for_user(user_id, &info).await?;

    tracing::info!(user_id = %user_id, address_id = %saved.id, "Shipping profile saved");
    Ok(saved)
}
