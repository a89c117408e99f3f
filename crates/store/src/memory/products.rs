use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use common::ProductId;
use domain::{Money, Product, StockLevel};
use tokio::sync::{Mutex, RwLock};

use crate::{InventoryLedger, ProductCatalog, Result, StoreError};

type Slot = Arc<Mutex<Product>>;

/// In-memory catalog and inventory ledger.
///
/// Each product sits behind its own mutex, so reservations of one product
/// are serialized while other products proceed in parallel. The outer map
/// lock is only held long enough to find the slot.
#[derive(Clone, Default)]
pub struct InMemoryProductStore {
    products: Arc<RwLock<HashMap<ProductId, Slot>>>,
    fail_on_restore: Arc<AtomicBool>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a product.
    pub async fn insert(&self, product: Product) -> ProductId {
        let id = product.id;
        self.products
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(product)));
        id
    }

    pub async fn set_active(&self, product_id: ProductId, active: bool) -> Result<()> {
        let slot = self.slot(product_id).await?;
        let mut product = slot.lock().await;
        product.is_active = active;
        product.updated_at = Utc::now();
        Ok(())
    }

    /// Changes the catalog price. Existing orders keep their snapshot.
    pub async fn set_price(&self, product_id: ProductId, price: Money) -> Result<()> {
        let slot = self.slot(product_id).await?;
        let mut product = slot.lock().await;
        product.price = price;
        product.updated_at = Utc::now();
        Ok(())
    }

    /// Returns the current stock, or None for an unknown product.
    pub async fn stock_of(&self, product_id: ProductId) -> Option<i64> {
        let slot = self.slot(product_id).await.ok()?;
        let product = slot.lock().await;
        Some(product.stock)
    }

    /// Makes every subsequent restore fail until switched back.
    pub fn set_fail_on_restore(&self, fail: bool) {
        self.fail_on_restore.store(fail, Ordering::SeqCst);
    }

    async fn slot(&self, product_id: ProductId) -> Result<Slot> {
        self.products
            .read()
            .await
            .get(&product_id)
            .cloned()
            .ok_or(StoreError::ProductNotFound(product_id))
    }
}

fn level(product: &Product) -> StockLevel {
    StockLevel {
        product_id: product.id,
        stock: product.stock,
        min_stock: product.min_stock,
    }
}

#[async_trait]
impl ProductCatalog for InMemoryProductStore {
    async fn get_product(&self, product_id: ProductId) -> Result<Product> {
        let slot = self.slot(product_id).await?;
        let product = slot.lock().await;
        Ok(product.clone())
    }
}

#[async_trait]
impl InventoryLedger for InMemoryProductStore {
    async fn reserve(&self, product_id: ProductId, quantity: u32) -> Result<StockLevel> {
        let slot = self.slot(product_id).await?;
        let mut product = slot.lock().await;

        if !product.is_active {
            return Err(StoreError::ProductInactive(product_id));
        }
        let requested = i64::from(quantity);
        if product.stock < requested {
            return Err(StoreError::InsufficientStock {
                product_id,
                requested,
                available: product.stock,
            });
        }

        product.stock -= requested;
        product.updated_at = Utc::now();
        tracing::debug!(%product_id, quantity, stock = product.stock, "stock reserved");
        Ok(level(&product))
    }

    async fn restore(&self, product_id: ProductId, quantity: u32) -> Result<StockLevel> {
        if self.fail_on_restore.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("inventory ledger offline".to_string()));
        }

        let slot = self.slot(product_id).await?;
        let mut product = slot.lock().await;
        product.stock += i64::from(quantity);
        product.updated_at = Utc::now();
        tracing::debug!(%product_id, quantity, stock = product.stock, "stock restored");
        Ok(level(&product))
    }

    async fn stock_level(&self, product_id: ProductId) -> Result<StockLevel> {
        let slot = self.slot(product_id).await?;
        let product = slot.lock().await;
        Ok(level(&product))
    }
}
