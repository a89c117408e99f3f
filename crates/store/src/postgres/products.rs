use async_trait::async_trait;
use common::ProductId;
use domain::{Money, Product, StockLevel};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{InventoryLedger, ProductCatalog, Result, StoreError};

/// PostgreSQL-backed catalog and inventory ledger.
///
/// Reservations are a single conditional `UPDATE ... RETURNING`. The row
/// lock it takes serializes concurrent reservations of the same product and
/// the `stock >= $2` guard keeps the counter non-negative.
#[derive(Clone)]
pub struct PostgresProductStore {
    pool: PgPool,
}

impl PostgresProductStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Inserts a catalog product.
    pub async fn insert(&self, product: &Product) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, sku, price_cents, is_active, stock, min_stock, max_stock, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.sku)
        .bind(product.price.cents())
        .bind(product.is_active)
        .bind(product.stock)
        .bind(product.min_stock)
        .bind(product.max_stock)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn set_active(&self, product_id: ProductId, active: bool) -> Result<()> {
        let result =
            sqlx::query("UPDATE products SET is_active = $2, updated_at = NOW() WHERE id = $1")
                .bind(product_id.as_uuid())
                .bind(active)
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::ProductNotFound(product_id));
        }
        Ok(())
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        Ok(Product {
            id: ProductId::from_uuid(row.try_get("id")?),
            name: row.try_get("name")?,
            sku: row.try_get("sku")?,
            price: Money::from_cents(row.try_get("price_cents")?),
            is_active: row.try_get("is_active")?,
            stock: row.try_get("stock")?,
            min_stock: row.try_get("min_stock")?,
            max_stock: row.try_get("max_stock")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_level(product_id: ProductId, row: PgRow) -> Result<StockLevel> {
        Ok(StockLevel {
            product_id,
            stock: row.try_get("stock")?,
            min_stock: row.try_get("min_stock")?,
        })
    }

    /// Explains why a conditional reservation matched no row.
    async fn reservation_failure(&self, product_id: ProductId, requested: i64) -> Result<StoreError> {
        let Some(row) = sqlx::query("SELECT is_active, stock FROM products WHERE id = $1")
            .bind(product_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(StoreError::ProductNotFound(product_id));
        };

        let is_active: bool = row.try_get("is_active")?;
        if !is_active {
            return Ok(StoreError::ProductInactive(product_id));
        }
        Ok(StoreError::InsufficientStock {
            product_id,
            requested,
            available: row.try_get("stock")?,
        })
    }
}

#[async_trait]
impl ProductCatalog for PostgresProductStore {
    async fn get_product(&self, product_id: ProductId) -> Result<Product> {
        let row = sqlx::query(
            r#"
            SELECT id, name, sku, price_cents, is_active, stock, min_stock, max_stock, created_at, updated_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(product_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::ProductNotFound(product_id))?;

        Self::row_to_product(row)
    }
}

#[async_trait]
impl InventoryLedger for PostgresProductStore {
    async fn reserve(&self, product_id: ProductId, quantity: u32) -> Result<StockLevel> {
        let requested = i64::from(quantity);
        let row = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock - $2, updated_at = NOW()
            WHERE id = $1 AND is_active AND stock >= $2
            RETURNING stock, min_stock
            "#,
        )
        .bind(product_id.as_uuid())
        .bind(requested)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let level = Self::row_to_level(product_id, row)?;
                tracing::debug!(%product_id, quantity, stock = level.stock, "stock reserved");
                Ok(level)
            }
            None => Err(self.reservation_failure(product_id, requested).await?),
        }
    }

    async fn restore(&self, product_id: ProductId, quantity: u32) -> Result<StockLevel> {
        let row = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock + $2, updated_at = NOW()
            WHERE id = $1
            RETURNING stock, min_stock
            "#,
        )
        .bind(product_id.as_uuid())
        .bind(i64::from(quantity))
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::ProductNotFound(product_id))?;

        let level = Self::row_to_level(product_id, row)?;
        tracing::debug!(%product_id, quantity, stock = level.stock, "stock restored");
        Ok(level)
    }

    async fn stock_level(&self, product_id: ProductId) -> Result<StockLevel> {
        let row = sqlx::query("SELECT stock, min_stock FROM products WHERE id = $1")
            .bind(product_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::ProductNotFound(product_id))?;

        Self::row_to_level(product_id, row)
    }
}
