//! User repository for database operations.
//!
//! Accounts, their password hashes, and single-use email verification and
//! password reset tokens. Only the SHA-256 of a token is ever stored.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use pokebin_core::{Email, UserId};

use super::{RepositoryError, conflict_or_database};
use crate::models::User;
use crate::services::auth::{PasswordResetStore, ResetToken};

/// Internal row type for user queries.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    username: String,
    email: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            username: row.username,
            email,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserWithPasswordRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, username, email, is_active, created_at, updated_at
            FROM pokebin.users
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Get a user and their password hash by username.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_with_password_by_username(
        &self,
        username: &str,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserWithPasswordRow>(
            r"
            SELECT u.id, u.username, u.email, u.is_active, u.created_at, u.updated_at,
                   p.password_hash
            FROM pokebin.users u
            JOIN pokebin.user_password p ON p.user_id = u.id
            WHERE u.username = $1
            ",
        )
        .bind(username)
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some((User::try_from(r.user)?, r.password_hash))),
            None => Ok(None),
        }
    }

    /// Create an inactive user with a password.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` naming the violated constraint if
    /// the username or email is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_with_password(
        &self,
        username: &str,
        email: &Email,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO pokebin.users (username, email, is_active)
            VALUES ($1, $2, FALSE)
            RETURNING id, username, email, is_active, created_at, updated_at
            ",
        )
        .bind(username)
        .bind(email)
        .fetch_one(&mut *tx)
        .await
        .map_err(conflict_or_database)?;

        let user = User::try_from(row)?;

        sqlx::query(
            r"
            INSERT INTO pokebin.user_password (user_id, password_hash)
            VALUES ($1, $2)
            ",
        )
        .bind(user.id)
        .bind(password_hash)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(user)
    }

    /// Store a verification token hash for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create_verification_token(
        &self,
        token_hash: &str,
        user_id: UserId,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO pokebin.email_verification_token (token_hash, user_id, expires_at)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(token_hash)
        .bind(user_id)
        .bind(expires_at)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Consume an unexpired verification token and activate its user.
    ///
    /// The token is deleted whether or not it had expired, so each token can
    /// be presented once. Returns `None` when the token is unknown or expired.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn activate_with_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let token = sqlx::query_as::<_, (i32, DateTime<Utc>)>(
            r"
            DELETE FROM pokebin.email_verification_token
            WHERE token_hash = $1
            RETURNING user_id, expires_at
            ",
        )
        .bind(token_hash)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((user_id, expires_at)) = token else {
            return Ok(None);
        };

        if expires_at <= Utc::now() {
            tx.commit().await?;
            return Ok(None);
        }

        let row = sqlx::query_as::<_, UserRow>(
            r"
            UPDATE pokebin.users
            SET is_active = TRUE, updated_at = NOW()
            WHERE id = $1
            RETURNING id, username, email, is_active, created_at, updated_at
            ",
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;
        row.map(User::try_from).transpose()
    }

    /// Change a user's username and email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    /// Returns `RepositoryError::Conflict` if the new username or email is taken.
    pub async fn update_profile(
        &self,
        id: UserId,
        username: &str,
        email: &Email,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            UPDATE pokebin.users
            SET username = $2, email = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING id, username, email, is_active, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(username)
        .bind(email)
        .fetch_optional(self.pool)
        .await
        .map_err(conflict_or_database)?
        .ok_or(RepositoryError::NotFound)?;

        User::try_from(row)
    }

    /// Delete a user. Orders, shipping profiles and tokens cascade.
    ///
    /// Returns `true` if a row was deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM pokebin.users WHERE id = $1
            ",
        )
        .bind(id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl PasswordResetStore for UserRepository<'_> {
    async fn find_active_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, username, email, is_active, created_at, updated_at
            FROM pokebin.users
            WHERE LOWER(email) = LOWER($1) AND is_active
            ",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn create_reset_token(
        &self,
        token_hash: &str,
        user_id: UserId,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO pokebin.password_reset_token (token_hash, user_id, expires_at)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(token_hash)
        .bind(user_id)
        .bind(expires_at)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    async fn take_reset_token(&self, token_hash: &str) -> Result<Option<ResetToken>, RepositoryError> {
        let row = sqlx::query_as::<_, (i32, DateTime<Utc>)>(
            r"
            DELETE FROM pokebin.password_reset_token
            WHERE token_hash = $1
            RETURNING user_id, expires_at
            ",
        )
        .bind(token_hash)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|(user_id, expires_at)| ResetToken {
            user_id: UserId::new(user_id),
            expires_at,
        }))
    }

    async fn set_password(&self, user_id: UserId, password_hash: &str) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r"
            UPDATE pokebin.user_password
            SET password_hash = $2, updated_at = NOW()
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .bind(password_hash)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
            DELETE FROM pokebin.password_reset_token WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(updated.rows_affected() > 0)
    }
}
