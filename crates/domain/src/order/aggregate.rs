//! Order aggregate implementation.

use chrono::{DateTime, NaiveDate, Utc};
use common::{OrderId, ShipmentId, UserId};
use serde::{Deserialize, Serialize};

use crate::address::AddressSnapshot;
use crate::error::OrderError;
use crate::money::Money;
use crate::status::{OrderStatus, PaymentStatus, ShippingStatus};

use super::{OrderLine, OrderNumber, OrderTotals, Shipment};

/// Everything needed to place an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub id: OrderId,
    pub user_id: UserId,
    pub order_number: OrderNumber,
    pub lines: Vec<OrderLine>,
    pub tax: Money,
    pub shipping: Money,
    pub discount: Money,
    pub currency: String,
    pub shipping_address: AddressSnapshot,
    pub billing_address: AddressSnapshot,
    pub notes: Option<String>,
    pub placed_at: DateTime<Utc>,
}

/// A durable customer order.
///
/// The order is always complete: it has at least one line, balanced totals
/// and both address snapshots. Every status change goes through one of the
/// transition methods below, which consult the status machines in
/// [`crate::status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    user_id: UserId,
    order_number: OrderNumber,
    lines: Vec<OrderLine>,
    totals: OrderTotals,
    currency: String,
    status: OrderStatus,
    payment_status: PaymentStatus,
    shipping_status: ShippingStatus,
    shipping_address: AddressSnapshot,
    billing_address: AddressSnapshot,
    notes: Option<String>,
    shipments: Vec<Shipment>,
    created_at: DateTime<Utc>,
    ordered_at: DateTime<Utc>,
    shipped_at: Option<DateTime<Utc>>,
    delivered_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
    version: u64,
}

impl Order {
    /// Places a new order in the pending state.
    pub fn place(new: NewOrder) -> Result<Self, OrderError> {
        if new.lines.is_empty() {
            return Err(OrderError::EmptyOrder);
        }

        let subtotal = OrderTotals::subtotal_of(&new.lines)?;
        let totals = OrderTotals::compute(subtotal, new.tax, new.shipping, new.discount)?;

        Ok(Self {
            id: new.id,
            user_id: new.user_id,
            order_number: new.order_number,
            lines: new.lines,
            totals,
            currency: new.currency,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            shipping_status: ShippingStatus::Pending,
            shipping_address: new.shipping_address,
            billing_address: new.billing_address,
            notes: new.notes,
            shipments: Vec::new(),
            created_at: new.placed_at,
            ordered_at: new.placed_at,
            shipped_at: None,
            delivered_at: None,
            cancelled_at: None,
            updated_at: new.placed_at,
            version: 0,
        })
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn order_number(&self) -> &OrderNumber {
        &self.order_number
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    /// Total number of units across all lines.
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    pub fn totals(&self) -> &OrderTotals {
        &self.totals
    }

    pub fn total(&self) -> Money {
        self.totals.total
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_status
    }

    pub fn shipping_status(&self) -> ShippingStatus {
        self.shipping_status
    }

    pub fn shipping_address(&self) -> &AddressSnapshot {
        &self.shipping_address
    }

    pub fn billing_address(&self) -> &AddressSnapshot {
        &self.billing_address
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn shipments(&self) -> &[Shipment] {
        &self.shipments
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn ordered_at(&self) -> DateTime<Utc> {
        self.ordered_at
    }

    pub fn shipped_at(&self) -> Option<DateTime<Utc>> {
        self.shipped_at
    }

    pub fn delivered_at(&self) -> Option<DateTime<Utc>> {
        self.delivered_at
    }

    pub fn cancelled_at(&self) -> Option<DateTime<Utc>> {
        self.cancelled_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Persistence version, bumped by the repository on every update.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Sets the persistence version. Repositories call this, as do writes that
    /// put a previously loaded order back.
    pub fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Completed
    }

    pub fn can_be_cancelled(&self) -> bool {
        self.status.is_cancellable()
    }

    pub fn can_be_shipped(&self) -> bool {
        self.status == OrderStatus::Processing && self.is_paid()
    }

    /// Amount owed back to the customer if the order is cancelled now.
    pub fn refund_amount(&self) -> Money {
        if self.is_paid() {
            self.totals.total
        } else {
            Money::zero()
        }
    }

    /// Verifies the structural invariants of a loaded or mutated order.
    pub fn check_invariants(&self) -> Result<(), OrderError> {
        if self.lines.is_empty() {
            return Err(OrderError::EmptyOrder);
        }
        let subtotal = OrderTotals::subtotal_of(&self.lines)?;
        if subtotal != self.totals.subtotal {
            return Err(OrderError::TotalMismatch {
                expected: subtotal,
                actual: self.totals.subtotal,
            });
        }
        self.totals.verify()
    }

    /// Moves the order to `next`, returning the previous status.
    ///
    /// Shipped and delivered stamp their timestamps and pull the shipping
    /// status along when that is a legal shipping move. Refunded requires a
    /// completed payment.
    pub fn transition_to(
        &mut self,
        next: OrderStatus,
        at: DateTime<Utc>,
    ) -> Result<OrderStatus, OrderError> {
        let invalid = OrderError::InvalidStatusTransition {
            from: self.status,
            to: next,
        };
        if !self.status.can_transition_to(next) {
            return Err(invalid);
        }
        if next == OrderStatus::Refunded && !self.is_paid() {
            return Err(invalid);
        }

        match next {
            OrderStatus::Shipped => {
                self.shipped_at = Some(at);
                self.follow_shipping(ShippingStatus::Shipped);
            }
            OrderStatus::Delivered => {
                self.delivered_at = Some(at);
                self.follow_shipping(ShippingStatus::Delivered);
            }
            OrderStatus::Cancelled => {
                self.cancelled_at = Some(at);
            }
            _ => {}
        }

        let previous = self.status;
        self.status = next;
        self.updated_at = at;
        Ok(previous)
    }

    /// Cancels a pending or confirmed order.
    pub fn cancel(&mut self, at: DateTime<Utc>) -> Result<OrderStatus, OrderError> {
        if !self.can_be_cancelled() {
            return Err(OrderError::CannotBeCancelled {
                order_id: self.id,
                status: self.status,
            });
        }
        self.transition_to(OrderStatus::Cancelled, at)
    }

    /// Moves the order's payment status, returning the previous value.
    pub fn set_payment_status(
        &mut self,
        next: PaymentStatus,
        at: DateTime<Utc>,
    ) -> Result<PaymentStatus, OrderError> {
        if !self.payment_status.can_transition_to(next) {
            return Err(OrderError::InvalidPaymentTransition {
                from: self.payment_status,
                to: next,
            });
        }
        let previous = self.payment_status;
        self.payment_status = next;
        self.updated_at = at;
        Ok(previous)
    }

    fn ensure_shippable(&self) -> Result<(), OrderError> {
        if !self.can_be_shipped() {
            return Err(OrderError::CannotBeShipped {
                order_id: self.id,
                status: self.status,
                payment_status: self.payment_status,
            });
        }
        Ok(())
    }

    /// Attaches a new shipment in the preparing state.
    pub fn add_shipment(
        &mut self,
        tracking_number: impl Into<String>,
        carrier: impl Into<String>,
        estimated_delivery: Option<NaiveDate>,
        at: DateTime<Utc>,
    ) -> Result<&Shipment, OrderError> {
        self.ensure_shippable()?;

        let shipment = Shipment::new(tracking_number, carrier, estimated_delivery, at);
        self.follow_shipping(shipment.status);
        self.shipments.push(shipment);
        self.updated_at = at;

        Ok(&self.shipments[self.shipments.len() - 1])
    }

    /// Moves one shipment's status and mirrors it onto the order.
    pub fn update_shipment_status(
        &mut self,
        shipment_id: ShipmentId,
        next: ShippingStatus,
        at: DateTime<Utc>,
    ) -> Result<ShippingStatus, OrderError> {
        self.ensure_shippable()?;

        let order_id = self.id;
        let shipment = self
            .shipments
            .iter_mut()
            .find(|s| s.id == shipment_id)
            .ok_or(OrderError::ShipmentNotFound {
                order_id,
                shipment_id,
            })?;

        let previous = shipment.advance(next, at)?;
        self.follow_shipping(next);
        self.updated_at = at;
        Ok(previous)
    }

    fn follow_shipping(&mut self, next: ShippingStatus) {
        if self.shipping_status.can_transition_to(next) {
            self.shipping_status = next;
        }
    }
}
