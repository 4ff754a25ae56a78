//! Authentication route handlers.
//!
//! Registration, email verification, password reset, and session login for
//! storefront accounts. Accounts start inactive; the emailed link activates
//! them.

use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use pokebin_core::{Email, UserId};

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, User};
use crate::services::AuthService;
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

/// Login request body.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Registration request body.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

/// Verification token, from the JSON body or the emailed link's query string.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct VerifyEmailRequest {
    pub token: String,
}

/// Password reset request body.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PasswordResetRequest {
    pub email: String,
}

/// New password with the emailed reset token.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PasswordResetConfirmRequest {
    pub token: String,
    pub password: String,
    pub password_confirm: String,
}

// =============================================================================
// Response Types
// =============================================================================

/// Public view of an account.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: UserId,
    pub username: String,
    pub email: Email,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

impl From<CurrentUser> for UserView {
    fn from(user: CurrentUser) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
        }
    }
}

/// `{success, message}` acknowledgement.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: &'static str,
}

impl MessageResponse {
    #[must_use]
    pub const fn ok(message: &'static str) -> Self {
        Self {
            success: true,
            message,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: &'static str,
    pub user: UserView,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserView>,
}

pub(crate) fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e.body_text())))
}

pub(crate) fn session_error(e: &tower_sessions::session::Error) -> AppError {
    tracing::error!(error = %e, "Session store error");
    AppError::Internal(e.to_string())
}

// =============================================================================
// Registration
// =============================================================================

/// `POST /auth/register`
pub async fn register(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>> {
    let form = json_body(payload)?;

    AuthService::new(state.pool(), state.email())
        .register(
            &form.username,
            &form.email,
            &form.password,
            &form.password_confirm,
        )
        .await?;

    Ok(Json(MessageResponse::ok(
        "Registration successful. Please check your email to verify your account.",
    )))
}

/// `POST /auth/verify-email` with `{token}`.
pub async fn verify_email(
    State(state): State<AppState>,
    payload: std::result::Result<Json<VerifyEmailRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>> {
    let request = json_body(payload)?;
    activate(&state, &request.token).await
}

/// `GET /auth/verify-email?token=`, the link sent in the verification email.
pub async fn verify_email_link(
    State(state): State<AppState>,
    Query(request): Query<VerifyEmailRequest>,
) -> Result<Json<MessageResponse>> {
    activate(&state, &request.token).await
}

async fn activate(state: &AppState, token: &str) -> Result<Json<MessageResponse>> {
    AuthService::new(state.pool(), state.email())
        .verify_email(token)
        .await?;

    Ok(Json(MessageResponse::ok(
        "Email verified successfully. You can now log in.",
    )))
}

// =============================================================================
// Password reset
// =============================================================================

/// `POST /auth/password-reset` with `{email}`.
///
/// The response is the same whether or not the address has an account.
pub async fn request_password_reset(
    State(state): State<AppState>,
    payload: std::result::Result<Json<PasswordResetRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>> {
    let request = json_body(payload)?;

    AuthService::new(state.pool(), state.email())
        .request_password_reset(&request.email)
        .await?;

    Ok(Json(MessageResponse::ok(
        "If an account uses that email, a password reset link has been sent.",
    )))
}

/// `POST /auth/password-reset/confirm` with `{token, password, password_confirm}`.
pub async fn confirm_password_reset(
    State(state): State<AppState>,
    payload: std::result::Result<Json<PasswordResetConfirmRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>> {
    let form = json_body(payload)?;

    AuthService::new(state.pool(), state.email())
        .confirm_password_reset(&form.token, &form.password, &form.password_confirm)
        .await?;

    Ok(Json(MessageResponse::ok(
        "Password has been reset. You can now log in.",
    )))
}

// =============================================================================
// Session
// =============================================================================

/// `POST /auth/login`
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>> {
    let form = json_body(payload)?;
    if form.username.trim().is_empty() || form.password.is_empty() {
        return Err(AppError::BadRequest(
            "Username and password are required".to_string(),
        ));
    }

    let user = AuthService::new(state.pool(), state.email())
        .login(&form.username, &form.password)
        .await
        .inspect_err(|e| tracing::warn!(error = %e, "Login failed"))?;

    let current = CurrentUser::from(&user);
    set_current_user(&session, &current)
        .await
        .map_err(|e| session_error(&e))?;
    set_sentry_user(&user.id, Some(user.email.as_str()));

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse {
        success: true,
        message: "Login successful",
        user: UserView::from(&user),
    }))
}

/// `POST /auth/logout`
pub async fn logout(session: Session) -> Result<Json<MessageResponse>> {
    clear_current_user(&session)
        .await
        .map_err(|e| session_error(&e))?;
    clear_sentry_user();

    Ok(Json(MessageResponse::ok("Logout successful")))
}

/// `GET /auth/me`
pub async fn me(OptionalAuth(user): OptionalAuth) -> Json<MeResponse> {
    Json(MeResponse {
        authenticated: user.is_some(),
        user: user.map(UserView::from),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_me_response_shape() {
        let anonymous = serde_json::to_value(MeResponse {
            authenticated: false,
            user: None,
        })
        .unwrap();
        assert_eq!(anonymous, serde_json::json!({ "authenticated": false }));

        let signed_in = serde_json::to_value(MeResponse {
            authenticated: true,
            user: Some(UserView {
                id: UserId::new(7),
                username: "misty".to_string(),
                email: Email::parse("misty@example.com").unwrap(),
            }),
        })
        .unwrap();
        assert_eq!(signed_in["user"]["id"], 7);
        assert_eq!(signed_in["user"]["email"], "misty@example.com");
    }

    #[test]
    fn test_login_request_missing_fields_default() {
        let request: LoginRequest = serde_json::from_str(r#"{"username": "brock"}"#).unwrap();
        assert_eq!(request.username, "brock");
        assert!(request.password.is_empty());
    }

    #[test]
    fn test_password_reset_confirm_defaults() {
        let request: PasswordResetConfirmRequest =
            serde_json::from_str(r#"{"token": "abc"}"#).unwrap();
        assert_eq!(request.token, "abc");
        assert!(request.password.is_empty());
        assert!(request.password_confirm.is_empty());
    }

    #[test]
    fn test_message_response() {
        let json = serde_json::to_value(MessageResponse::ok("Logout successful")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "success": true, "message": "Logout successful" })
        );
    }
}
