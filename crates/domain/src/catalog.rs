//! Catalog products and their stock counters.

use chrono::{DateTime, Utc};
use common::ProductId;
use serde::{Deserialize, Serialize};

use crate::money::Money;

pub const DEFAULT_MIN_STOCK: i64 = 0;
pub const DEFAULT_MAX_STOCK: i64 = 1000;

/// A sellable product.
///
/// `stock` is the only field the fulfillment engine ever writes, and only
/// through the inventory ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub sku: String,
    pub price: Money,
    pub is_active: bool,
    pub stock: i64,
    pub min_stock: i64,
    pub max_stock: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Creates an active product with default stock thresholds.
    pub fn new(name: impl Into<String>, sku: impl Into<String>, price: Money, stock: i64) -> Self {
        let now = Utc::now();
        Self {
            id: ProductId::new(),
            name: name.into(),
            sku: sku.into(),
            price,
            is_active: true,
            stock,
            min_stock: DEFAULT_MIN_STOCK,
            max_stock: DEFAULT_MAX_STOCK,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_min_stock(mut self, min_stock: i64) -> Self {
        self.min_stock = min_stock;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// True if `quantity` units could be reserved right now.
    pub fn can_order(&self, quantity: i64) -> bool {
        self.is_active && quantity > 0 && self.stock >= quantity
    }

    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.min_stock
    }

    pub fn is_out_of_stock(&self) -> bool {
        self.stock <= 0
    }

    /// Stock that can be sold; zero for inactive products.
    pub fn available_stock(&self) -> i64 {
        if self.is_active { self.stock } else { 0 }
    }
}

/// Stock counter of a product after a ledger operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    pub product_id: ProductId,
    pub stock: i64,
    pub min_stock: i64,
}

impl StockLevel {
    pub fn is_low(&self) -> bool {
        self.stock <= self.min_stock
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_order_checks_activity_quantity_and_stock() {
        let product = Product::new("Widget", "W-1", Money::from_cents(1000), 5);
        assert!(product.can_order(5));
        assert!(!product.can_order(6));
        assert!(!product.can_order(0));
        assert!(!product.can_order(-1));
        assert!(!product.clone().inactive().can_order(1));
    }

    #[test]
    fn test_stock_helpers() {
        let product = Product::new("Widget", "W-1", Money::from_cents(1000), 2).with_min_stock(2);
        assert!(product.is_low_stock());
        assert!(!product.is_out_of_stock());
        assert_eq!(product.available_stock(), 2);
        assert_eq!(product.inactive().available_stock(), 0);
    }

    #[test]
    fn test_defaults() {
        let product = Product::new("Widget", "W-1", Money::from_cents(1000), 0);
        assert_eq!(product.min_stock, DEFAULT_MIN_STOCK);
        assert_eq!(product.max_stock, DEFAULT_MAX_STOCK);
        assert!(product.is_out_of_stock());
    }
}
