//! Account route handlers.
//!
//! These routes require authentication.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use pokebin_core::{Email, ShippingForm};

use super::auth::{MessageResponse, UserView, json_body, session_error};
use crate::db::ShippingAddressRepository;
use crate::error::{AppError, Result, clear_sentry_user};
use crate::middleware::{RequireAuth, clear_current_user};
use crate::models::{CurrentUser, OrderDetail, ShippingAddress, User, session_keys};
use crate::services::AuthService;
use crate::services::orders::{count_orders_for_user, list_orders_for_user};
use crate::services::shipping::{get_shipping_profile, upsert_shipping_profile};
use crate::state::AppState;

// =============================================================================
// Types
// =============================================================================

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub user: UserView,
    pub orders_count: i64,
}

#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub username: String,
    pub email: Email,
}

/// Profile update request body.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProfileRequest {
    pub username: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileUpdated {
    pub success: bool,
    pub message: &'static str,
    pub user: UserView,
}

#[derive(Debug, Serialize)]
pub struct OrdersResponse {
    pub orders: Vec<OrderDetail>,
}

/// Saved shipping fields, or `{}` when nothing has been saved yet.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ShippingProfileResponse {
    Saved {
        full_name: String,
        email: String,
        address1: String,
        address2: Option<String>,
        city: String,
        state: Option<String>,
        zipcode: Option<String>,
    },
    Empty {},
}

impl From<Option<ShippingAddress>> for ShippingProfileResponse {
    fn from(address: Option<ShippingAddress>) -> Self {
        match address {
            Some(a) => Self::Saved {
                full_name: a.full_name,
                email: a.email,
                address1: a.address1,
                address2: a.address2,
                city: a.city,
                state: a.state,
                zipcode: a.zipcode,
            },
            None => Self::Empty {},
        }
    }
}

/// The signed-in account, or 401 if it has been deleted since login.
async fn load_user(state: &AppState, current: &CurrentUser) -> Result<User> {
    AuthService::new(state.pool(), state.email())
        .get_user(current.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
}

// =============================================================================
// Dashboard & Profile
// =============================================================================

/// `GET /account/dashboard`
pub async fn dashboard(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<DashboardResponse>> {
    let user = load_user(&state, &current).await?;
    let orders_count = count_orders_for_user(state.pool(), user.id).await?;

    Ok(Json(DashboardResponse {
        user: UserView::from(&user),
        orders_count,
    }))
}

/// `GET /account/profile`
pub async fn profile(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<ProfileView>> {
    let user = load_user(&state, &current).await?;

    Ok(Json(ProfileView {
        username: user.username,
        email: user.email,
    }))
}

/// `POST /account/profile`
pub async fn update_profile(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    session: Session,
    payload: std::result::Result<Json<ProfileRequest>, JsonRejection>,
) -> Result<Json<ProfileUpdated>> {
    let form = json_body(payload)?;

    let user = AuthService::new(state.pool(), state.email())
        .update_profile(current.id, &form.username, &form.email)
        .await?;

    // Keep the session copy in step with the new username and email
    session
        .insert(session_keys::CURRENT_USER, CurrentUser::from(&user))
        .await
        .map_err(|e| session_error(&e))?;

    tracing::info!(user_id = %user.id, "Profile updated");

    Ok(Json(ProfileUpdated {
        success: true,
        message: "Profile updated successfully",
        user: UserView::from(&user),
    }))
}

/// `DELETE /account`
pub async fn delete_account(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    session: Session,
) -> Result<Json<MessageResponse>> {
    AuthService::new(state.pool(), state.email())
        .delete_account(current.id)
        .await?;

    clear_current_user(&session)
        .await
        .map_err(|e| session_error(&e))?;
    clear_sentry_user();

    Ok(Json(MessageResponse::ok("Account deleted successfully")))
}

// =============================================================================
// Orders & Shipping
// =============================================================================

/// `GET /account/orders`, newest first.
pub async fn orders(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<OrdersResponse>> {
    let orders = list_orders_for_user(state.pool(), current.id).await?;
    Ok(Json(OrdersResponse { orders }))
}

/// `GET /account/shipping`
pub async fn shipping(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<ShippingProfileResponse>> {
    let store = ShippingAddressRepository::new(state.pool());
    let saved = get_shipping_profile(&store, current.id).await?;
    Ok(Json(saved.into()))
}

/// `POST /account/shipping`
pub async fn save_shipping(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    payload: std::result::Result<Json<ShippingForm>, JsonRejection>,
) -> Result<Json<MessageResponse>> {
    let form = json_body(payload)?;
    let store = ShippingAddressRepository::new(state.pool());
    upsert_shipping_profile(&store, current.id, form).await?;

    Ok(Json(MessageResponse::ok("Shipping address saved successfully")))
}
