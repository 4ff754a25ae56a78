//! Shipment state of an order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Shipment columns of an order row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentState {
    pub shipped: bool,
    pub date_shipped: Option<DateTime<Utc>>,
    pub tracking_number: Option<String>,
    pub courier: Option<String>,
}

/// A staff edit to an order's shipment. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ShipmentUpdate {
    pub shipped: bool,
    pub tracking_number: Option<String>,
    pub courier: Option<String>,
}

impl ShipmentState {
    /// Apply a staff edit.
    ///
    /// `date_shipped` is stamped with `now` only when the order moves from
    /// not shipped to shipped. Re-saving a shipped order keeps the original
    /// date, and un-shipping keeps it too.
    #[must_use]
    pub fn apply(self, update: ShipmentUpdate, now: DateTime<Utc>) -> Self {
        let date_shipped = if update.shipped && !self.shipped {
            Some(now)
        } else {
            self.date_shipped
        };

        Self {
            shipped: update.shipped,
            date_shipped,
            tracking_number: update.tracking_number.or(self.tracking_number),
            courier: update.courier.or(self.courier),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).single().unwrap_or_default()
    }

    fn ship() -> ShipmentUpdate {
        ShipmentUpdate {
            shipped: true,
            ..ShipmentUpdate::default()
        }
    }

    #[test]
    fn test_first_ship_sets_date() {
        let state = ShipmentState::default().apply(ship(), t0());
        assert!(state.shipped);
        assert_eq!(state.date_shipped, Some(t0()));
    }

    #[test]
    fn test_reship_keeps_original_date() {
        let later = t0() + Duration::days(2);
        let state = ShipmentState::default()
            .apply(ship(), t0())
            .apply(ship(), later);
        assert_eq!(state.date_shipped, Some(t0()));
    }

    #[test]
    fn test_unship_keeps_date() {
        let state = ShipmentState::default()
            .apply(ship(), t0())
            .apply(ShipmentUpdate::default(), t0() + Duration::hours(1));
        assert!(!state.shipped);
        assert_eq!(state.date_shipped, Some(t0()));
    }

    #[test]
    fn test_unshipped_save_leaves_date_empty() {
        let state = ShipmentState::default().apply(ShipmentUpdate::default(), t0());
        assert_eq!(state.date_shipped, None);
    }

    #[test]
    fn test_tracking_fields_merge() {
        let state = ShipmentState::default().apply(
            ShipmentUpdate {
                shipped: true,
                tracking_number: Some("1Z999".into()),
                courier: Some("UPS".into()),
            },
            t0(),
        );
        let state = state.apply(ship(), t0());
        assert_eq!(state.tracking_number.as_deref(), Some("1Z999"));
        assert_eq!(state.courier.as_deref(), Some("UPS"));
    }
}
