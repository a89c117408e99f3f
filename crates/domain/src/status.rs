//! Status dimensions of an order and its payment.
//!
//! Each dimension has exactly one transition function; every mutation in the
//! crate goes through it.
//!
//! ```text
//! OrderStatus:    Pending ─► Confirmed ─► Processing ─► Shipped ─► Delivered
//!                    │           │
//!                    └───────────┴──► Cancelled
//!                 (any non-cancelled, paid) ──► Refunded
//!
//! PaymentStatus:  Pending ─► Processing ─► Completed ─► Refunded
//!                    │           ├──► Failed ──► Processing
//!                    └───────────┴──► Cancelled
//!
//! ShippingStatus: Pending ─► Preparing ─► Shipped ─► InTransit ─► Delivered
//!                                           └──────────┴────────────┴──► Returned
//! ```

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::OrderError;

/// Lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
        OrderStatus::Refunded,
    ];

    /// Returns true if the status may move to `next`.
    ///
    /// Forward moves are single steps. Refunded is allowed from every
    /// non-cancelled, non-refunded status; whether the order is actually paid
    /// is checked by the order itself.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match (self, next) {
            (Pending, Confirmed)
            | (Confirmed, Processing)
            | (Processing, Shipped)
            | (Shipped, Delivered) => true,
            (Pending | Confirmed, Cancelled) => true,
            (Cancelled | Refunded, Refunded) => false,
            (_, Refunded) => true,
            _ => false,
        }
    }

    /// Returns true if the order can still be cancelled by its owner.
    pub fn is_cancellable(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Confirmed)
    }

    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Cancelled | OrderStatus::Refunded)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| OrderError::UnknownStatus {
                kind: "order status",
                value: s.to_string(),
            })
    }
}

/// Status of a payment record, mirrored onto its order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
    Refunded,
    Cancelled,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 6] = [
        PaymentStatus::Pending,
        PaymentStatus::Processing,
        PaymentStatus::Completed,
        PaymentStatus::Failed,
        PaymentStatus::Refunded,
        PaymentStatus::Cancelled,
    ];

    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Pending, Cancelled)
                | (Processing, Completed)
                | (Processing, Failed)
                | (Processing, Cancelled)
                | (Failed, Processing)
                | (Completed, Refunded)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
            PaymentStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| OrderError::UnknownStatus {
                kind: "payment status",
                value: s.to_string(),
            })
    }
}

/// Physical delivery status of an order or one of its shipments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShippingStatus {
    #[default]
    Pending,
    Preparing,
    Shipped,
    InTransit,
    Delivered,
    Returned,
}

impl ShippingStatus {
    pub const ALL: [ShippingStatus; 6] = [
        ShippingStatus::Pending,
        ShippingStatus::Preparing,
        ShippingStatus::Shipped,
        ShippingStatus::InTransit,
        ShippingStatus::Delivered,
        ShippingStatus::Returned,
    ];

    fn rank(&self) -> u8 {
        match self {
            ShippingStatus::Pending => 0,
            ShippingStatus::Preparing => 1,
            ShippingStatus::Shipped => 2,
            ShippingStatus::InTransit => 3,
            ShippingStatus::Delivered => 4,
            ShippingStatus::Returned => 5,
        }
    }

    /// Forward moves may skip carrier states that were never reported.
    /// Returned is only reachable once the parcel has left.
    pub fn can_transition_to(&self, next: ShippingStatus) -> bool {
        use ShippingStatus::*;
        match (self, next) {
            (Returned, _) => false,
            (Shipped | InTransit | Delivered, Returned) => true,
            (_, Returned) => false,
            (Delivered, _) => false,
            (current, next) => next.rank() > current.rank(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ShippingStatus::Pending => "pending",
            ShippingStatus::Preparing => "preparing",
            ShippingStatus::Shipped => "shipped",
            ShippingStatus::InTransit => "in_transit",
            ShippingStatus::Delivered => "delivered",
            ShippingStatus::Returned => "returned",
        }
    }
}

impl std::fmt::Display for ShippingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShippingStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ShippingStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| OrderError::UnknownStatus {
                kind: "shipping status",
                value: s.to_string(),
            })
    }
}

/// How a payment was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    Paypal,
    Stripe,
    BankTransfer,
    Cash,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 6] = [
        PaymentMethod::CreditCard,
        PaymentMethod::DebitCard,
        PaymentMethod::Paypal,
        PaymentMethod::Stripe,
        PaymentMethod::BankTransfer,
        PaymentMethod::Cash,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::DebitCard => "debit_card",
            PaymentMethod::Paypal => "paypal",
            PaymentMethod::Stripe => "stripe",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Cash => "cash",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentMethod::ALL
            .into_iter()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| OrderError::UnknownStatus {
                kind: "payment method",
                value: s.to_string(),
            })
    }
}
