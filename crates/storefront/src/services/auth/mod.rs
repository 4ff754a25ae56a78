//! Authentication service.
//!
//! Username and password accounts with email verification. New accounts are
//! inactive until the emailed link is followed. Forgotten passwords are reset
//! with an emailed single-use token.

mod error;
mod password_reset;

pub use error::AuthError;
pub use password_reset::{
    PasswordResetStore, RESET_TOKEN_TTL_HOURS, ResetToken, issue_reset_token, reset_password,
};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use sqlx::PgPool;

use pokebin_core::{Email, UserId, ValidationErrors};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::User;
use crate::services::email::EmailService;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum username length.
const MAX_USERNAME_LENGTH: usize = 150;

/// How long an emailed verification link stays valid.
pub const VERIFICATION_TOKEN_TTL_HOURS: i64 = 72;

/// Random bytes in a verification token.
const TOKEN_BYTES: usize = 32;

/// Authentication service.
///
/// Handles registration, email verification, login, and profile changes.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    email: &'a EmailService,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, email: &'a EmailService) -> Self {
        Self {
            users: UserRepository::new(pool),
            email,
        }
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register a new, inactive account and email its verification link.
    ///
    /// A failed verification email is logged; the account still exists.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` listing every invalid field.
    /// Returns `AuthError::UsernameTaken` / `AuthError::EmailTaken` on conflicts.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        password_confirm: &str,
    ) -> Result<User, AuthError> {
        let mut errors = ValidationErrors::new();

        let username = username.trim();
        if let Err(message) = validate_username(username) {
            errors.add("username", message);
        }
        let email = match Email::parse(email) {
            Ok(email) => Some(email),
            Err(e) => {
                errors.add("email", e.to_string());
                None
            }
        };
        if let Err(message) = validate_password(password) {
            errors.add("password", message);
        }
        if password != password_confirm {
            errors.add("password_confirm", "The two password fields didn't match.");
        }

        let email = match email {
            Some(email) if errors.is_empty() => email,
            _ => return Err(AuthError::Validation(errors)),
        };

        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create_with_password(username, &email, &password_hash)
            .await
            .map_err(map_account_conflict)?;

        let token = generate_token();
        let expires_at = Utc::now() + Duration::hours(VERIFICATION_TOKEN_TTL_HOURS);
        self.users
            .create_verification_token(&hash_token(&token), user.id, expires_at)
            .await?;

        if let Err(e) = self
            .email
            .send_verification_email(&user.email, &user.username, &token)
            .await
        {
            let event_id = sentry::capture_error(&e);
            tracing::warn!(
                user_id = %user.id,
                error = %e,
                sentry_event_id = %event_id,
                "Failed to send verification email"
            );
        }

        tracing::info!(user_id = %user.id, "Account registered");
        Ok(user)
    }

    /// Consume a verification token and activate its account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the token is unknown, used, or expired.
    pub async fn verify_email(&self, token: &str) -> Result<User, AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::InvalidToken);
        }

        let user = self
            .users
            .activate_with_token(&hash_token(token))
            .await?
            .ok_or(AuthError::InvalidToken)?;

        tracing::info!(user_id = %user.id, "Account activated");
        Ok(user)
    }

    // =========================================================================
    // Login
    // =========================================================================

    /// Login with username and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the username/password is wrong.
    /// Returns `AuthError::InactiveAccount` if the account was never verified.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let (user, password_hash) = self
            .users
            .get_with_password_by_username(username.trim())
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        if !user.is_active {
            return Err(AuthError::InactiveAccount);
        }

        Ok(user)
    }

    // =========================================================================
    // Password reset
    // =========================================================================

    /// Email a reset link to the active account registered under `email`.
    ///
    /// Succeeds without sending anything when no such account exists. A
    /// failed email is logged.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` for a malformed address, or
    /// `AuthError::Repository` if storage fails.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let Some((user, token)) = issue_reset_token(&self.users, email, Utc::now()).await? else {
            return Ok(());
        };

        if let Err(e) = self
            .email
            .send_password_reset_email(&user.email, &user.username, &token)
            .await
        {
            let event_id = sentry::capture_error(&e);
            tracing::warn!(
                user_id = %user.id,
                error = %e,
                sentry_event_id = %event_id,
                "Failed to send password reset email"
            );
        }
        Ok(())
    }

    /// Set a new password with an emailed reset token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` for a bad password and
    /// `AuthError::InvalidToken` for an unknown, used or expired token.
    pub async fn confirm_password_reset(
        &self,
        token: &str,
        password: &str,
        password_confirm: &str,
    ) -> Result<UserId, AuthError> {
        reset_password(&self.users, token, password, password_confirm, Utc::now()).await
    }

    // =========================================================================
    // Profile
    // =========================================================================

    /// Change the username and email of an account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` for invalid fields, a conflict variant
    /// if the new values are taken, or `AuthError::UserNotFound`.
    pub async fn update_profile(
        &self,
        user_id: UserId,
        username: &str,
        email: &str,
    ) -> Result<User, AuthError> {
        let mut errors = ValidationErrors::new();

        let username = username.trim();
        if let Err(message) = validate_username(username) {
            errors.add("username", message);
        }
        let email = match Email::parse(email) {
            Ok(email) => Some(email),
            Err(e) => {
                errors.add("email", e.to_string());
                None
            }
        };

        let email = match email {
            Some(email) if errors.is_empty() => email,
            _ => return Err(AuthError::Validation(errors)),
        };

        self.users
            .update_profile(user_id, username, &email)
            .await
            .map_err(map_account_conflict)
    }

    /// Delete an account. Its orders and shipping profile go with it.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the account is already gone.
    pub async fn delete_account(&self, user_id: UserId) -> Result<(), AuthError> {
        if !self.users.delete(user_id).await? {
            return Err(AuthError::UserNotFound);
        }
        tracing::info!(user_id = %user_id, "Account deleted");
        Ok(())
    }

    /// Look up the account behind a session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the query fails.
    pub async fn get_user(&self, user_id: UserId) -> Result<Option<User>, AuthError> {
        Ok(self.users.get_by_id(user_id).await?)
    }
}

fn map_account_conflict(e: RepositoryError) -> AuthError {
    match e {
        RepositoryError::Conflict(constraint) if constraint.contains("email") => {
            AuthError::EmailTaken
        }
        RepositoryError::Conflict(_) => AuthError::UsernameTaken,
        RepositoryError::NotFound => AuthError::UserNotFound,
        other => AuthError::Repository(other),
    }
}

/// Validate username: 1-150 characters of letters, digits and `@.+-_`.
fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("This field is required.".to_owned());
    }
    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(format!(
            "Ensure this field has at most {MAX_USERNAME_LENGTH} characters."
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Err(
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
                .to_owned(),
        );
    }
    Ok(())
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "This password is too short. It must contain at least {MIN_PASSWORD_LENGTH} characters."
        ));
    }
    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// A fresh URL-safe single-use token.
fn generate_token() -> String {
    let bytes: [u8; TOKEN_BYTES] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Hex SHA-256 of a token, as stored.
fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("ash_ketchum").is_ok());
        assert!(validate_username("misty@cerulean.gym").is_ok());
        assert!(validate_username("brock+1-2").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username("semi;colon").is_err());
        assert!(validate_username(&"a".repeat(150)).is_ok());
        assert!(validate_username(&"a".repeat(151)).is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("1234567").is_err());
        assert!(validate_password("12345678").is_ok());
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("pikachu-rocks").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("pikachu-rocks", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong-password", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_verify_password_rejects_garbage_hash() {
        assert!(matches!(
            verify_password("anything", "not-a-hash"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_generate_token() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        // 32 bytes, unpadded base64
        assert_eq!(a.len(), 43);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_hash_token() {
        let hash = hash_token("token");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, hash_token("token"));
        assert_ne!(hash, hash_token("token2"));
    }

    #[test]
    fn test_map_account_conflict() {
        assert!(matches!(
            map_account_conflict(RepositoryError::Conflict("users_email_lower_idx".into())),
            AuthError::EmailTaken
        ));
        assert!(matches!(
            map_account_conflict(RepositoryError::Conflict("users_username_key".into())),
            AuthError::UsernameTaken
        ));
        assert!(matches!(
            map_account_conflict(RepositoryError::NotFound),
            AuthError::UserNotFound
        ));
    }
}
