//! Order management commands for staff.
//!
//! # Usage
//!
//! ```bash
//! # Mark shipped; the ship date is stamped the first time only
//! pokebin-cli order ship 42 -t 1Z999AA10123456784 -c UPS
//!
//! # Mark not shipped; tracking details and ship date are kept
//! pokebin-cli order unship 42
//!
//! # Print an order as JSON
//! pokebin-cli order show 42
//! ```

use thiserror::Error;

use pokebin_core::{OrderId, ShipmentUpdate};
use pokebin_storefront::db::RepositoryError;
use pokebin_storefront::services::orders::{find_order_by_id, update_shipment};

/// Errors from order commands.
#[derive(Debug, Error)]
pub enum OrderCommandError {
    #[error("Order {0} not found")]
    NotFound(OrderId),

    #[error("Database error: {0}")]
    Repository(RepositoryError),
}

impl OrderCommandError {
    fn from_repository(id: OrderId, e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => Self::NotFound(id),
            other => Self::Repository(other),
        }
    }
}

/// Blank CLI values mean "leave unchanged".
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

async fn set_shipment(id: i64, update: ShipmentUpdate) -> Result<(), Box<dyn std::error::Error>> {
    let id = OrderId::new(id);
    let pool = super::connect().await?;

    let state = update_shipment(&pool, id, update)
        .await
        .map_err(|e| OrderCommandError::from_repository(id, e))?;

    tracing::info!(
        order_id = %id,
        shipped = state.shipped,
        date_shipped = ?state.date_shipped,
        tracking_number = ?state.tracking_number,
        courier = ?state.courier,
        "Shipment updated"
    );
    Ok(())
}

/// Mark an order shipped, recording any tracking details given.
///
/// # Errors
///
/// Returns an error if the order does not exist or the update fails.
pub async fn ship(
    id: i64,
    tracking_number: Option<String>,
    courier: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    set_shipment(
        id,
        ShipmentUpdate {
            shipped: true,
            tracking_number: non_blank(tracking_number),
            courier: non_blank(courier),
        },
    )
    .await
}

/// Mark an order not shipped.
///
/// # Errors
///
/// Returns an error if the order does not exist or the update fails.
pub async fn unship(id: i64) -> Result<(), Box<dyn std::error::Error>> {
    set_shipment(id, ShipmentUpdate::default()).await
}

/// Print an order with its items as JSON.
///
/// # Errors
///
/// Returns an error if the order does not exist or the lookup fails.
pub async fn show(id: i64) -> Result<(), Box<dyn std::error::Error>> {
    let id = OrderId::new(id);
    let pool = super::connect().await?;

    let order = find_order_by_id(&pool, id)
        .await
        .map_err(OrderCommandError::Repository)?
        .ok_or(OrderCommandError::NotFound(id))?;

    #[allow(clippy::print_stdout)]
    {
        println!("{}", serde_json::to_string_pretty(&order)?);
    }
    Ok(())
}
