use chrono::{DateTime, NaiveDate, Utc};
use common::ShipmentId;
use serde::{Deserialize, Serialize};

use crate::error::OrderError;
use crate::status::ShippingStatus;

/// A parcel sent for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shipment {
    pub id: ShipmentId,
    pub tracking_number: String,
    pub carrier: String,
    pub status: ShippingStatus,
    pub estimated_delivery: Option<NaiveDate>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Shipment {
    /// A new shipment starts in `Preparing`.
    pub fn new(
        tracking_number: impl Into<String>,
        carrier: impl Into<String>,
        estimated_delivery: Option<NaiveDate>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ShipmentId::new(),
            tracking_number: tracking_number.into(),
            carrier: carrier.into(),
            status: ShippingStatus::Preparing,
            estimated_delivery,
            shipped_at: None,
            delivered_at: None,
            created_at,
        }
    }

    /// Moves the shipment to `next`, stamping departure and delivery times.
    pub(crate) fn advance(
        &mut self,
        next: ShippingStatus,
        at: DateTime<Utc>,
    ) -> Result<ShippingStatus, OrderError> {
        if !self.status.can_transition_to(next) {
            return Err(OrderError::InvalidShippingTransition {
                from: self.status,
                to: next,
            });
        }

        if matches!(
            next,
            ShippingStatus::Shipped | ShippingStatus::InTransit | ShippingStatus::Delivered
        ) && self.shipped_at.is_none()
        {
            self.shipped_at = Some(at);
        }
        if next == ShippingStatus::Delivered {
            self.delivered_at = Some(at);
        }

        let previous = self.status;
        self.status = next;
        Ok(previous)
    }
}
