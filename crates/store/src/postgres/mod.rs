//! PostgreSQL implementations of the storage ports.

mod orders;
mod payments;
mod products;

use sqlx::PgPool;

pub use orders::PostgresOrderRepository;
pub use payments::PostgresPaymentLedger;
pub use products::PostgresProductStore;

/// Runs the workspace migrations against the pool.
pub async fn run_migrations(pool: &PgPool) -> crate::Result<()> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    Ok(())
}

/// Returns true if the error is a violation of the named constraint or index.
fn violates(error: &sqlx::Error, constraint: &str) -> bool {
    matches!(error, sqlx::Error::Database(db_err) if db_err.constraint() == Some(constraint))
}
