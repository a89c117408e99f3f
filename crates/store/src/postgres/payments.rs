use async_trait::async_trait;
use common::{OrderId, PaymentId};
use domain::Payment;
use sqlx::{PgPool, Postgres, QueryBuilder, Row, postgres::PgRow};

use super::violates;
use crate::{PaymentFilter, PaymentLedger, Result, StoreError};

const SINGLE_COMPLETION_INDEX: &str = "payments_one_completed_per_order";

/// PostgreSQL-backed payment ledger.
///
/// A partial unique index on `(order_id) WHERE status = 'completed'` makes
/// the single-completion rule hold even across concurrent writers.
#[derive(Clone)]
pub struct PostgresPaymentLedger {
    pool: PgPool,
}

impl PostgresPaymentLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn row_to_payment(row: PgRow) -> Result<Payment> {
        let document: serde_json::Value = row.try_get("document")?;
        Ok(serde_json::from_value(document)?)
    }

    fn map_write_error(payment: &Payment, error: sqlx::Error) -> StoreError {
        if violates(&error, SINGLE_COMPLETION_INDEX) {
            return StoreError::PaymentAlreadyCompleted(payment.order_id());
        }
        StoreError::Database(error)
    }
}

#[async_trait]
impl PaymentLedger for PostgresPaymentLedger {
    async fn record(&self, payment: &Payment) -> Result<()> {
        let document = serde_json::to_value(payment)?;

        sqlx::query(
            r#"
            INSERT INTO payments (id, order_id, user_id, method, status, transaction_ref, amount_cents,
                                  created_at, updated_at, document)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(payment.id().as_uuid())
        .bind(payment.order_id().as_uuid())
        .bind(payment.user_id().as_uuid())
        .bind(payment.method().as_str())
        .bind(payment.status().as_str())
        .bind(payment.transaction_ref())
        .bind(payment.amount().cents())
        .bind(payment.created_at())
        .bind(payment.updated_at())
        .bind(document)
        .execute(&self.pool)
        .await
        .map_err(|e| Self::map_write_error(payment, e))?;

        Ok(())
    }

    async fn update(&self, payment: &Payment) -> Result<()> {
        let document = serde_json::to_value(payment)?;

        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = $2, transaction_ref = $3, updated_at = $4, document = $5
            WHERE id = $1
            "#,
        )
        .bind(payment.id().as_uuid())
        .bind(payment.status().as_str())
        .bind(payment.transaction_ref())
        .bind(payment.updated_at())
        .bind(document)
        .execute(&self.pool)
        .await
        .map_err(|e| Self::map_write_error(payment, e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::PaymentNotFound(payment.id()));
        }
        Ok(())
    }

    async fn get(&self, payment_id: PaymentId) -> Result<Payment> {
        let row = sqlx::query("SELECT document FROM payments WHERE id = $1")
            .bind(payment_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::PaymentNotFound(payment_id))?;

        Self::row_to_payment(row)
    }

    async fn list_for_order(&self, order_id: OrderId) -> Result<Vec<Payment>> {
        let rows = sqlx::query(
            "SELECT document FROM payments WHERE order_id = $1 ORDER BY created_at DESC",
        )
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_payment).collect()
    }

    async fn get_by_transaction_ref(&self, transaction_ref: &str) -> Result<Option<Payment>> {
        let row = sqlx::query(
            "SELECT document FROM payments WHERE transaction_ref = $1 ORDER BY created_at DESC LIMIT 1",
        )
        .bind(transaction_ref)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_payment).transpose()
    }

    async fn list(&self, filter: &PaymentFilter) -> Result<Vec<Payment>> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT document FROM payments WHERE 1=1");
        if let Some(order_id) = filter.order_id {
            builder.push(" AND order_id = ").push_bind(order_id.as_uuid());
        }
        if let Some(user_id) = filter.user_id {
            builder.push(" AND user_id = ").push_bind(user_id.as_uuid());
        }
        if let Some(status) = filter.status {
            builder.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(method) = filter.method {
            builder.push(" AND method = ").push_bind(method.as_str());
        }
        if let Some(from) = filter.created_from {
            builder.push(" AND created_at >= ").push_bind(from);
        }
        if let Some(to) = filter.created_to {
            builder.push(" AND created_at <= ").push_bind(to);
        }
        builder
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(i64::from(filter.limit()))
            .push(" OFFSET ")
            .push_bind(filter.offset() as i64);

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_payment).collect()
    }

    async fn has_completed(&self, order_id: OrderId) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM payments WHERE order_id = $1 AND status = 'completed')",
        )
        .bind(order_id.as_uuid())
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}
