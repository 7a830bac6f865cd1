use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use crate::config::DatabaseConfig;
use crate::domain::order::StoreError;

// ============================================================================
// Persistence Gateway
// ============================================================================
//
// A pool hands out one connection per operation; the connection goes back to
// the pool when the operation's transaction is committed or dropped.
//
// ============================================================================

const SCHEMA: [&str; 3] = [
    "CREATE TABLE IF NOT EXISTS dishes (
        id SERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        price DOUBLE PRECISION NOT NULL,
        preparation_time INTEGER NOT NULL CHECK (preparation_time >= 0)
    )",
    "CREATE TABLE IF NOT EXISTS orders (
        id SERIAL PRIMARY KEY,
        user_id INTEGER NOT NULL,
        status TEXT NOT NULL CHECK (status IN ('PENDING', 'COOKED', 'CANCELLED', 'COMPLETED')),
        created_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS order_details (
        order_id INTEGER NOT NULL REFERENCES orders (id),
        dish_id INTEGER NOT NULL REFERENCES dishes (id),
        quantity INTEGER NOT NULL CHECK (quantity > 0),
        PRIMARY KEY (order_id, dish_id)
    )",
];

pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, StoreError> {
    tracing::info!(max_connections = config.max_connections, "Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.url)
        .await?;

    Ok(pool)
}

/// Create the tables the engine reads and writes, if they are missing.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), StoreError> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    tracing::debug!("Schema is up to date");
    Ok(())
}
