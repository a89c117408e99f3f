//! Turns line requests into a priced, validated order.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::{OrderId, ProductId, UserId};
use domain::{
    AddressSnapshot, Money, NewOrder, Order, OrderLine, OrderNumber, OrderTotals, TaxPolicy,
};
use serde::{Deserialize, Serialize};
use store::ProductCatalog;

use crate::config::FulfillmentConfig;
use crate::error::{FulfillmentError, Result};

/// One requested line: a product and how many units.
///
/// The quantity is signed so that bad input from carts and clients reaches
/// validation instead of failing to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRequest {
    pub product_id: ProductId,
    pub quantity: i64,
}

impl LineRequest {
    pub fn new(product_id: ProductId, quantity: i64) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

/// Everything the builder needs besides the catalog.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub user_id: UserId,
    pub lines: Vec<LineRequest>,
    pub shipping_address: AddressSnapshot,
    pub billing_address: AddressSnapshot,
    pub notes: Option<String>,
    /// Client-supplied number; generated when absent.
    pub order_number: Option<OrderNumber>,
}

/// Builds orders from drafts.
///
/// The builder only reads the catalog. It checks stock as currently visible
/// so that obviously unfillable requests fail before any reservation, but the
/// ledger remains the authority.
#[derive(Clone)]
pub struct OrderBuilder {
    tax: Arc<dyn TaxPolicy>,
    shipping_fee: Money,
    currency: String,
}

impl OrderBuilder {
    pub fn new(tax: Arc<dyn TaxPolicy>, shipping_fee: Money, currency: impl Into<String>) -> Self {
        Self {
            tax,
            shipping_fee,
            currency: currency.into(),
        }
    }

    pub fn from_config(config: &FulfillmentConfig) -> Self {
        Self::new(
            config.tax_policy(),
            config.shipping_fee(),
            config.currency.clone(),
        )
    }

    /// Resolves every line and prices the order.
    ///
    /// Fails on the first invalid line.
    pub async fn build(
        &self,
        catalog: &dyn ProductCatalog,
        draft: OrderDraft,
        placed_at: DateTime<Utc>,
    ) -> Result<Order> {
        if draft.lines.is_empty() {
            return Err(FulfillmentError::EmptyOrder);
        }

        let mut lines = Vec::with_capacity(draft.lines.len());
        for (index, request) in draft.lines.iter().enumerate() {
            let invalid = || FulfillmentError::InvalidQuantity {
                line: index,
                product_id: request.product_id,
                quantity: request.quantity,
            };
            if request.quantity <= 0 {
                return Err(invalid());
            }
            let quantity = u32::try_from(request.quantity).map_err(|_| invalid())?;

            let product = catalog.get_product(request.product_id).await?;
            if !product.is_active {
                return Err(FulfillmentError::ProductInactive(product.id));
            }
            if product.stock < request.quantity {
                return Err(FulfillmentError::InsufficientStock {
                    product_id: product.id,
                    requested: request.quantity,
                    available: product.stock,
                });
            }

            lines.push(OrderLine::new(
                product.id,
                product.name,
                product.sku,
                product.price,
                quantity,
            )?);
        }

        let subtotal = OrderTotals::subtotal_of(&lines)?;
        let tax = self.tax.tax_for(subtotal);

        let order = Order::place(NewOrder {
            id: OrderId::new(),
            user_id: draft.user_id,
            order_number: draft
                .order_number
                .unwrap_or_else(|| OrderNumber::generate(placed_at)),
            lines,
            tax,
            shipping: self.shipping_fee,
            discount: Money::zero(),
            currency: self.currency.clone(),
            shipping_address: draft.shipping_address,
            billing_address: draft.billing_address,
            notes: draft.notes,
            placed_at,
        })?;

        Ok(order)
    }
}
