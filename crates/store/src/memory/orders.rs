use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use common::OrderId;
use domain::{Order, OrderNumber, OrderStatus, PaymentStatus};
use tokio::sync::RwLock;

use crate::{OrderFilter, OrderRepository, Result, StoreError};

#[derive(Default)]
struct OrderTable {
    by_id: HashMap<OrderId, Order>,
    by_number: HashMap<OrderNumber, OrderId>,
}

/// In-memory order repository.
#[derive(Clone, Default)]
pub struct InMemoryOrderRepository {
    table: Arc<RwLock<OrderTable>>,
    fail_on_create: Arc<AtomicBool>,
    fail_on_update: Arc<AtomicBool>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn order_count(&self) -> usize {
        self.table.read().await.by_id.len()
    }

    /// Makes every subsequent create fail until switched back.
    pub fn set_fail_on_create(&self, fail: bool) {
        self.fail_on_create.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent update fail until switched back.
    pub fn set_fail_on_update(&self, fail: bool) {
        self.fail_on_update.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn create(&self, order: &Order) -> Result<()> {
        if self.fail_on_create.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("order store offline".to_string()));
        }

        let mut table = self.table.write().await;
        if table.by_number.contains_key(order.order_number()) {
            return Err(StoreError::DuplicateOrderNumber(
                order.order_number().clone(),
            ));
        }
        if table.by_id.contains_key(&order.id()) {
            return Err(StoreError::OrderAlreadyExists(order.id()));
        }

        table
            .by_number
            .insert(order.order_number().clone(), order.id());
        table.by_id.insert(order.id(), order.clone());
        Ok(())
    }

    async fn get_by_id(&self, order_id: OrderId) -> Result<Order> {
        self.table
            .read()
            .await
            .by_id
            .get(&order_id)
            .cloned()
            .ok_or(StoreError::OrderNotFound(order_id))
    }

    async fn get_by_order_number(&self, order_number: &OrderNumber) -> Result<Order> {
        let table = self.table.read().await;
        table
            .by_number
            .get(order_number)
            .and_then(|id| table.by_id.get(id))
            .cloned()
            .ok_or_else(|| StoreError::OrderNumberNotFound(order_number.clone()))
    }

    async fn update(&self, order: &mut Order) -> Result<()> {
        if self.fail_on_update.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("order store offline".to_string()));
        }

        let mut table = self.table.write().await;
        let stored = table
            .by_id
            .get_mut(&order.id())
            .ok_or(StoreError::OrderNotFound(order.id()))?;

        if stored.version() != order.version() {
            return Err(StoreError::ConcurrencyConflict {
                order_id: order.id(),
                expected: order.version(),
                actual: stored.version(),
            });
        }

        order.set_version(order.version() + 1);
        *stored = order.clone();
        Ok(())
    }

    async fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>> {
        let table = self.table.read().await;
        Ok(filter.apply(table.by_id.values()))
    }

    async fn get_orders_to_process(&self) -> Result<Vec<Order>> {
        let table = self.table.read().await;
        let mut orders: Vec<Order> = table
            .by_id
            .values()
            .filter(|o| {
                matches!(o.status(), OrderStatus::Confirmed | OrderStatus::Processing)
                    && o.payment_status() == PaymentStatus::Completed
            })
            .cloned()
            .collect();
        orders.sort_by_key(|o| o.ordered_at());
        Ok(orders)
    }
}
