use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use common::{OrderId, PaymentId};
use domain::Payment;
use tokio::sync::RwLock;

use crate::{PaymentFilter, PaymentLedger, Result, StoreError};

/// In-memory payment ledger.
#[derive(Clone, Default)]
pub struct InMemoryPaymentLedger {
    payments: Arc<RwLock<HashMap<PaymentId, Payment>>>,
    fail_on_write: Arc<AtomicBool>,
}

impl InMemoryPaymentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn payment_count(&self) -> usize {
        self.payments.read().await.len()
    }

    /// Makes every subsequent record and update fail until switched back.
    pub fn set_fail_on_write(&self, fail: bool) {
        self.fail_on_write.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_on_write.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("payment ledger offline".to_string()));
        }
        Ok(())
    }
}

fn ensure_single_completion(
    payments: &HashMap<PaymentId, Payment>,
    candidate: &Payment,
) -> Result<()> {
    if !candidate.is_completed() {
        return Ok(());
    }
    let other_completed = payments.values().any(|p| {
        p.order_id() == candidate.order_id() && p.id() != candidate.id() && p.is_completed()
    });
    if other_completed {
        return Err(StoreError::PaymentAlreadyCompleted(candidate.order_id()));
    }
    Ok(())
}

#[async_trait]
impl PaymentLedger for InMemoryPaymentLedger {
    async fn record(&self, payment: &Payment) -> Result<()> {
        self.check_writable()?;
        let mut payments = self.payments.write().await;
        ensure_single_completion(&payments, payment)?;
        payments.insert(payment.id(), payment.clone());
        Ok(())
    }

    async fn update(&self, payment: &Payment) -> Result<()> {
        self.check_writable()?;
        let mut payments = self.payments.write().await;
        if !payments.contains_key(&payment.id()) {
            return Err(StoreError::PaymentNotFound(payment.id()));
        }
        ensure_single_completion(&payments, payment)?;
        payments.insert(payment.id(), payment.clone());
        Ok(())
    }

    async fn get(&self, payment_id: PaymentId) -> Result<Payment> {
        self.payments
            .read()
            .await
            .get(&payment_id)
            .cloned()
            .ok_or(StoreError::PaymentNotFound(payment_id))
    }

    async fn list_for_order(&self, order_id: OrderId) -> Result<Vec<Payment>> {
        let payments = self.payments.read().await;
        let mut for_order: Vec<Payment> = payments
            .values()
            .filter(|p| p.order_id() == order_id)
            .cloned()
            .collect();
        for_order.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(for_order)
    }

    async fn get_by_transaction_ref(&self, transaction_ref: &str) -> Result<Option<Payment>> {
        Ok(self
            .payments
            .read()
            .await
            .values()
            .filter(|p| p.transaction_ref() == Some(transaction_ref))
            .max_by_key(|p| p.created_at())
            .cloned())
    }

    async fn list(&self, filter: &PaymentFilter) -> Result<Vec<Payment>> {
        Ok(filter.apply(self.payments.read().await.values()))
    }
}
