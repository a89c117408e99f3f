use async_trait::async_trait;
use common::OrderId;
use domain::{Order, OrderNumber};
use sqlx::{PgPool, Postgres, QueryBuilder, Row, postgres::PgRow};

use super::violates;
use crate::{OrderFilter, OrderRepository, Result, StoreError};

const ORDER_NUMBER_CONSTRAINT: &str = "orders_order_number_key";

/// PostgreSQL-backed order repository.
///
/// Orders are stored as a JSONB document next to the columns used for
/// filtering and sorting. The `version` column is authoritative.
#[derive(Clone)]
pub struct PostgresOrderRepository {
    pool: PgPool,
}

impl PostgresOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let document: serde_json::Value = row.try_get("document")?;
        let version: i64 = row.try_get("version")?;

        let mut order: Order = serde_json::from_value(document)?;
        order.set_version(version as u64);
        Ok(order)
    }

    fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &OrderFilter) {
        if let Some(user_id) = filter.user_id {
            builder.push(" AND user_id = ").push_bind(user_id.as_uuid());
        }
        if let Some(status) = filter.status {
            builder.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(payment_status) = filter.payment_status {
            builder
                .push(" AND payment_status = ")
                .push_bind(payment_status.as_str());
        }
        if let Some(from) = filter.ordered_from {
            builder.push(" AND ordered_at >= ").push_bind(from);
        }
        if let Some(to) = filter.ordered_to {
            builder.push(" AND ordered_at <= ").push_bind(to);
        }
        if let Some(min) = filter.min_total {
            builder.push(" AND total_cents >= ").push_bind(min.cents());
        }
        if let Some(max) = filter.max_total {
            builder.push(" AND total_cents <= ").push_bind(max.cents());
        }
    }
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    async fn create(&self, order: &Order) -> Result<()> {
        let document = serde_json::to_value(order)?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, order_number, status, payment_status, shipping_status,
                                total_cents, currency, ordered_at, created_at, updated_at, version, document)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(order.id().as_uuid())
        .bind(order.user_id().as_uuid())
        .bind(order.order_number().as_str())
        .bind(order.status().as_str())
        .bind(order.payment_status().as_str())
        .bind(order.shipping_status().as_str())
        .bind(order.total().cents())
        .bind(order.currency())
        .bind(order.ordered_at())
        .bind(order.created_at())
        .bind(order.updated_at())
        .bind(order.version() as i64)
        .bind(document)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if violates(&e, ORDER_NUMBER_CONSTRAINT) {
                return StoreError::DuplicateOrderNumber(order.order_number().clone());
            }
            if violates(&e, "orders_pkey") {
                return StoreError::OrderAlreadyExists(order.id());
            }
            StoreError::Database(e)
        })?;

        Ok(())
    }

    async fn get_by_id(&self, order_id: OrderId) -> Result<Order> {
        let row = sqlx::query("SELECT version, document FROM orders WHERE id = $1")
            .bind(order_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::OrderNotFound(order_id))?;

        Self::row_to_order(row)
    }

    async fn get_by_order_number(&self, order_number: &OrderNumber) -> Result<Order> {
        let row = sqlx::query("SELECT version, document FROM orders WHERE order_number = $1")
            .bind(order_number.as_str())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::OrderNumberNotFound(order_number.clone()))?;

        Self::row_to_order(row)
    }

    async fn update(&self, order: &mut Order) -> Result<()> {
        let expected = order.version();
        let mut next = order.clone();
        next.set_version(expected + 1);
        let document = serde_json::to_value(&next)?;

        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $3, payment_status = $4, shipping_status = $5, total_cents = $6,
                updated_at = $7, version = $8, document = $9
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(next.id().as_uuid())
        .bind(expected as i64)
        .bind(next.status().as_str())
        .bind(next.payment_status().as_str())
        .bind(next.shipping_status().as_str())
        .bind(next.total().cents())
        .bind(next.updated_at())
        .bind(next.version() as i64)
        .bind(document)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let actual: Option<i64> = sqlx::query_scalar("SELECT version FROM orders WHERE id = $1")
                .bind(order.id().as_uuid())
                .fetch_optional(&self.pool)
                .await?;

            return Err(match actual {
                None => StoreError::OrderNotFound(order.id()),
                Some(actual) => StoreError::ConcurrencyConflict {
                    order_id: order.id(),
                    expected,
                    actual: actual as u64,
                },
            });
        }

        *order = next;
        Ok(())
    }

    async fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT version, document FROM orders WHERE 1=1");
        Self::push_filters(&mut builder, filter);

        let direction = if filter.descending { "DESC" } else { "ASC" };
        builder.push(format!(
            " ORDER BY {} {direction}, id {direction}",
            filter.sort_by.column()
        ));
        builder
            .push(" LIMIT ")
            .push_bind(i64::from(filter.limit()))
            .push(" OFFSET ")
            .push_bind(filter.offset() as i64);

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn get_orders_to_process(&self) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT version, document
            FROM orders
            WHERE status IN ('confirmed', 'processing') AND payment_status = 'completed'
            ORDER BY ordered_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }
}
