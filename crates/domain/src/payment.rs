//! Payment records.

use chrono::{DateTime, Utc};
use common::{OrderId, PaymentId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::OrderError;
use crate::money::Money;
use crate::status::{PaymentMethod, PaymentStatus};

/// Input for recording a payment attempt.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub amount: Money,
    pub currency: String,
    pub method: PaymentMethod,
    pub transaction_ref: Option<String>,
    pub gateway_response: Option<serde_json::Value>,
}

/// One attempt to pay for an order.
///
/// At most one payment per order may ever reach `Completed`; the payment
/// ledger enforces that across records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    id: PaymentId,
    order_id: OrderId,
    user_id: UserId,
    amount: Money,
    currency: String,
    method: PaymentMethod,
    status: PaymentStatus,
    transaction_ref: Option<String>,
    gateway_response: Option<serde_json::Value>,
    failure_reason: Option<String>,
    processed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Payment {
    /// Starts a payment attempt in the processing state.
    pub fn start(new: NewPayment, at: DateTime<Utc>) -> Self {
        Self {
            id: PaymentId::new(),
            order_id: new.order_id,
            user_id: new.user_id,
            amount: new.amount,
            currency: new.currency,
            method: new.method,
            status: PaymentStatus::Processing,
            transaction_ref: new.transaction_ref,
            gateway_response: new.gateway_response,
            failure_reason: None,
            processed_at: None,
            created_at: at,
            updated_at: at,
        }
    }

    pub fn id(&self) -> PaymentId {
        self.id
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn method(&self) -> PaymentMethod {
        self.method
    }

    pub fn status(&self) -> PaymentStatus {
        self.status
    }

    pub fn transaction_ref(&self) -> Option<&str> {
        self.transaction_ref.as_deref()
    }

    pub fn gateway_response(&self) -> Option<&serde_json::Value> {
        self.gateway_response.as_ref()
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    pub fn processed_at(&self) -> Option<DateTime<Utc>> {
        self.processed_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_completed(&self) -> bool {
        self.status == PaymentStatus::Completed
    }

    /// Moves the payment to `next`, returning the previous status.
    ///
    /// Completing stamps `processed_at`. Leaving the failed state clears the
    /// failure reason.
    pub fn transition_to(
        &mut self,
        next: PaymentStatus,
        at: DateTime<Utc>,
    ) -> Result<PaymentStatus, OrderError> {
        if !self.status.can_transition_to(next) {
            return Err(OrderError::InvalidPaymentTransition {
                from: self.status,
                to: next,
            });
        }
        if next == PaymentStatus::Completed {
            self.processed_at = Some(at);
        }
        if self.status == PaymentStatus::Failed {
            self.failure_reason = None;
        }

        let previous = self.status;
        self.status = next;
        self.updated_at = at;
        Ok(previous)
    }

    pub fn complete(&mut self, at: DateTime<Utc>) -> Result<PaymentStatus, OrderError> {
        self.transition_to(PaymentStatus::Completed, at)
    }

    pub fn fail(
        &mut self,
        reason: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Result<PaymentStatus, OrderError> {
        let previous = self.transition_to(PaymentStatus::Failed, at)?;
        self.failure_reason = Some(reason.into());
        Ok(previous)
    }

    pub fn set_transaction_ref(&mut self, transaction_ref: impl Into<String>) {
        self.transaction_ref = Some(transaction_ref.into());
    }

    pub fn set_gateway_response(&mut self, response: serde_json::Value) {
        self.gateway_response = Some(response);
    }
}
