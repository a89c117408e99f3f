//! Aggregate statistics over a set of orders.

use domain::{Money, Order, OrderError, OrderStatus};
use serde::{Deserialize, Serialize};

/// Order counts by status plus revenue figures.
///
/// Revenue is the sum of the totals of every matched order, whatever its
/// status. `delivered` is the count reported as completed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub total_orders: u64,
    pub total_revenue: Money,
    pub average_order_value: Money,
    pub pending: u64,
    pub confirmed: u64,
    pub processing: u64,
    pub shipped: u64,
    pub delivered: u64,
    pub cancelled: u64,
    pub refunded: u64,
}

impl OrderSummary {
    pub fn from_orders<'a>(orders: impl IntoIterator<Item = &'a Order>) -> Result<Self, OrderError> {
        let mut summary = OrderSummary::default();

        for order in orders {
            summary.total_orders += 1;
            summary.total_revenue = summary
                .total_revenue
                .checked_add(order.total())
                .ok_or(OrderError::AmountOverflow { field: "revenue" })?;

            let count = match order.status() {
                OrderStatus::Pending => &mut summary.pending,
                OrderStatus::Confirmed => &mut summary.confirmed,
                OrderStatus::Processing => &mut summary.processing,
                OrderStatus::Shipped => &mut summary.shipped,
                OrderStatus::Delivered => &mut summary.delivered,
                OrderStatus::Cancelled => &mut summary.cancelled,
                OrderStatus::Refunded => &mut summary.refunded,
            };
            *count += 1;
        }

        if summary.total_orders > 0 {
            let revenue = i128::from(summary.total_revenue.cents());
            let orders = i128::from(summary.total_orders);
            // Half a cent rounds up.
            let average = (2 * revenue + orders) / (2 * orders);
            summary.average_order_value = Money::from_cents(average as i64);
        }

        Ok(summary)
    }
}
