use common::ProductId;
use serde::{Deserialize, Serialize};

use crate::error::OrderError;
use crate::money::Money;

/// A priced line of an order.
///
/// Name, SKU and unit price are copied from the catalog when the order is
/// built and never re-read afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub sku: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub line_total: Money,
}

impl OrderLine {
    pub fn new(
        product_id: ProductId,
        product_name: impl Into<String>,
        sku: impl Into<String>,
        unit_price: Money,
        quantity: u32,
    ) -> Result<Self, OrderError> {
        if quantity == 0 {
            return Err(OrderError::InvalidQuantity {
                product_id,
                quantity: 0,
            });
        }
        if unit_price.is_negative() {
            return Err(OrderError::NegativeAmount {
                field: "unit price",
                amount: unit_price,
            });
        }
        let line_total = unit_price
            .checked_mul(quantity)
            .ok_or(OrderError::AmountOverflow { field: "line total" })?;
        Ok(Self {
            product_id,
            product_name: product_name.into(),
            sku: sku.into(),
            unit_price,
            quantity,
            line_total,
        })
    }
}

/// Money breakdown of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub tax: Money,
    pub shipping: Money,
    pub discount: Money,
    pub total: Money,
}

impl OrderTotals {
    /// Sum of the line totals.
    pub fn subtotal_of(lines: &[OrderLine]) -> Result<Money, OrderError> {
        Money::checked_sum(lines.iter().map(|line| line.line_total))
            .ok_or(OrderError::AmountOverflow { field: "subtotal" })
    }

    /// Derives the total from its components.
    ///
    /// Components must be non-negative and the discount may not exceed the
    /// rest of the order.
    pub fn compute(
        subtotal: Money,
        tax: Money,
        shipping: Money,
        discount: Money,
    ) -> Result<Self, OrderError> {
        for (field, amount) in [
            ("subtotal", subtotal),
            ("tax", tax),
            ("shipping", shipping),
            ("discount", discount),
        ] {
            if amount.is_negative() {
                return Err(OrderError::NegativeAmount { field, amount });
            }
        }

        let total = gross(subtotal, tax, shipping, discount)?;
        if total.is_negative() {
            return Err(OrderError::NegativeAmount {
                field: "total",
                amount: total,
            });
        }

        Ok(Self {
            subtotal,
            tax,
            shipping,
            discount,
            total,
        })
    }

    /// Checks total = subtotal + tax + shipping - discount.
    pub fn verify(&self) -> Result<(), OrderError> {
        let expected = gross(self.subtotal, self.tax, self.shipping, self.discount)?;
        if expected != self.total {
            return Err(OrderError::TotalMismatch {
                expected,
                actual: self.total,
            });
        }
        Ok(())
    }
}

fn gross(subtotal: Money, tax: Money, shipping: Money, discount: Money) -> Result<Money, OrderError> {
    subtotal
        .checked_add(tax)
        .and_then(|sum| sum.checked_add(shipping))
        .and_then(|sum| sum.checked_sub(discount))
        .ok_or(OrderError::AmountOverflow { field: "total" })
}
