//! Password reset by emailed single-use token.
//!
//! A reset token is issued only for an active account whose email matches.
//! Unknown addresses get the same response so the endpoint does not reveal
//! which emails are registered. Presenting a token deletes it; setting the
//! new password deletes every other reset token of that account.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use pokebin_core::{Email, UserId, ValidationErrors};

use super::{AuthError, generate_token, hash_password, hash_token, validate_password};
use crate::db::RepositoryError;
use crate::models::User;

/// How long an emailed reset link stays valid.
pub const RESET_TOKEN_TTL_HOURS: i64 = 72;

/// A reset token as it was stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetToken {
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
}

/// Storage for reset tokens and password hashes.
#[async_trait]
pub trait PasswordResetStore: Send + Sync {
    /// The active account registered under `email` (case-insensitive).
    async fn find_active_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError>;

    async fn create_reset_token(
        &self,
        token_hash: &str,
        user_id: UserId,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;

    /// Delete a reset token and return it, expired or not.
    async fn take_reset_token(&self, token_hash: &str) -> Result<Option<ResetToken>, RepositoryError>;

    /// Replace the password hash and drop the user's outstanding reset tokens.
    ///
    /// Returns `false` if the user no longer exists.
    async fn set_password(&self, user_id: UserId, password_hash: &str) -> Result<bool, RepositoryError>;
}

/// Issue a reset token for the account registered under `email`.
///
/// Returns the account and the raw token to email, or `None` when no active
/// account uses that address.
///
/// # Errors
///
/// Returns `AuthError::Validation` if `email` is not an email address, or
/// `AuthError::Repository` if storage fails.
pub async fn issue_reset_token<S: PasswordResetStore + ?Sized>(
    store: &S,
    email: &str,
    now: DateTime<Utc>,
) -> Result<Option<(User, String)>, AuthError> {
    let email = Email::parse(email)
        .map_err(|e| AuthError::Validation(ValidationErrors::single("email", e.to_string())))?;

    let Some(user) = store.find_active_by_email(&email).await? else {
        tracing::info!("Password reset requested for unknown email");
        return Ok(None);
    };

    let token = generate_token();
    store
        .create_reset_token(
            &hash_token(&token),
            user.id,
            now + Duration::hours(RESET_TOKEN_TTL_HOURS),
        )
        .await?;

    tracing::info!(user_id = %user.id, "Password reset token issued");
    Ok(Some((user, token)))
}

/// Set a new password using an emailed reset token.
///
/// The password fields are checked before the token is touched, so a typo
/// does not burn the token.
///
/// # Errors
///
/// Returns `AuthError::Validation` for a short or mismatched password,
/// `AuthError::InvalidToken` if the token is unknown, used, or expired.
pub async fn reset_password<S: PasswordResetStore + ?Sized>(
    store: &S,
    token: &str,
    password: &str,
    password_confirm: &str,
    now: DateTime<Utc>,
) -> Result<UserId, AuthError> {
    let mut errors = ValidationErrors::new();
    if let Err(message) = validate_password(password) {
        errors.add("password", message);
    }
    if password != password_confirm {
        errors.add("password_confirm", "The two password fields didn't match.");
    }
    if !errors.is_empty() {
        return Err(AuthError::Validation(errors));
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::InvalidToken);
    }

    let stored = store
        .take_reset_token(&hash_token(token))
        .await?
        .ok_or(AuthError::InvalidToken)?;
    if stored.expires_at <= now {
        return Err(AuthError::InvalidToken);
    }

    let password_hash = hash_password(password)?;
    if !store.set_password(stored.user_id, &password_hash).await? {
        return Err(AuthError::InvalidToken);
    }

    tracing::info!(user_id = %stored.user_id, "Password reset");
    Ok(stored.user_id)
}
