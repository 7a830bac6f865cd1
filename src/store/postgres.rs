use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnection, PgPool};
use sqlx::{Postgres, Transaction};
use std::time::Duration;

use super::{ensure_terminal, DishCatalog, OrderStore};
use crate::domain::order::{
    Dish, DishId, DishSelection, NewDish, Order, OrderError, OrderId, OrderLineItem, OrderStatus,
    OrderSummary, Quantity, StoreError, UserId,
};

// ============================================================================
// PostgreSQL Order Store
// ============================================================================
//
// Tables: dishes, orders, order_details (see db::ensure_schema).
//
// Every mutating method opens one transaction on a pooled connection, runs
// its statements through a helper taking `&mut PgConnection`, then commits on
// success or rolls back on any error before returning.
//
// ============================================================================

pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = OrderError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Order {
            id: OrderId(row.id),
            user_id: UserId(row.user_id),
            status: parse_status(&row.status)?,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct DishRow {
    id: i32,
    name: String,
    price: f64,
    preparation_time: i32,
}

impl TryFrom<DishRow> for Dish {
    type Error = OrderError;

    fn try_from(row: DishRow) -> Result<Self, Self::Error> {
        Ok(Dish {
            id: DishId(row.id),
            name: row.name,
            price: row.price,
            preparation_time: seconds(row.preparation_time)?,
        })
    }
}

fn parse_status(raw: &str) -> Result<OrderStatus, OrderError> {
    raw.parse()
        .map_err(|_| StoreError::Corrupt(format!("order status {raw:?}")).into())
}

fn seconds(raw: i32) -> Result<Duration, OrderError> {
    u64::try_from(raw)
        .map(Duration::from_secs)
        .map_err(|_| StoreError::Corrupt(format!("preparation time {raw}")).into())
}

fn stored_quantity(raw: i32) -> Result<Quantity, OrderError> {
    Quantity::new(raw).map_err(|_| StoreError::Corrupt(format!("quantity {raw}")).into())
}

/// SQLSTATE numeric_value_out_of_range
const NUMERIC_OUT_OF_RANGE: &str = "22003";

/// Maps failures of an `order_details` write: a foreign-key failure means the
/// dish is unknown, an out-of-range integer means the summed quantity
/// overflowed.
fn line_violation(dish_id: DishId) -> impl FnOnce(sqlx::Error) -> OrderError {
    move |err| match &err {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            OrderError::DishNotFound(dish_id)
        }
        sqlx::Error::Database(db) if db.code().as_deref() == Some(NUMERIC_OUT_OF_RANGE) => {
            OrderError::QuantityOverflow
        }
        _ => err.into(),
    }
}

async fn finish<T>(
    tx: Transaction<'_, Postgres>,
    operation: &'static str,
    result: Result<T, OrderError>,
) -> Result<T, OrderError> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            tracing::warn!(operation, error = %err, "Rolling back transaction");
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!(operation, error = %rollback_err, "Rollback failed");
            }
            Err(err)
        }
    }
}

// ============================================================================
// Statement Helpers (run inside an open transaction)
// ============================================================================

async fn write_order(
    conn: &mut PgConnection,
    user_id: UserId,
    lines: &[DishSelection],
) -> Result<Order, OrderError> {
    let row: OrderRow = sqlx::query_as(
        r#"
        INSERT INTO orders (user_id, status, created_at)
        VALUES ($1, 'PENDING', $2)
        RETURNING id, user_id, status, created_at
        "#,
    )
    .bind(user_id.0)
    .bind(Utc::now())
    .fetch_one(&mut *conn)
    .await?;

    for line in lines {
        sqlx::query(
            r#"
            INSERT INTO order_details (order_id, dish_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (order_id, dish_id)
            DO UPDATE SET quantity = order_details.quantity + EXCLUDED.quantity
            "#,
        )
        .bind(row.id)
        .bind(line.dish_id.0)
        .bind(line.quantity.get())
        .execute(&mut *conn)
        .await
        .map_err(line_violation(line.dish_id))?;
    }

    Order::try_from(row)
}

async fn upsert_line(
    conn: &mut PgConnection,
    order_id: OrderId,
    selection: DishSelection,
) -> Result<OrderLineItem, OrderError> {
    // Row lock keeps the status stable until commit.
    let status: Option<(String,)> =
        sqlx::query_as("SELECT status FROM orders WHERE id = $1 FOR UPDATE")
            .bind(order_id.0)
            .fetch_optional(&mut *conn)
            .await?;

    let status = match status {
        Some((raw,)) => parse_status(&raw)?,
        None => return Err(OrderError::OrderNotFound(order_id)),
    };
    if !status.accepts_line_items() {
        return Err(OrderError::StateConflict { order_id, status });
    }

    let (quantity,): (i32,) = sqlx::query_as(
        r#"
        INSERT INTO order_details (order_id, dish_id, quantity)
        VALUES ($1, $2, $3)
        ON CONFLICT (order_id, dish_id)
        DO UPDATE SET quantity = order_details.quantity + EXCLUDED.quantity
        RETURNING quantity
        "#,
    )
    .bind(order_id.0)
    .bind(selection.dish_id.0)
    .bind(selection.quantity.get())
    .fetch_one(&mut *conn)
    .await
    .map_err(line_violation(selection.dish_id))?;

    Ok(OrderLineItem {
        order_id,
        dish_id: selection.dish_id,
        quantity: stored_quantity(quantity)?,
    })
}

// ============================================================================
// Port Implementations
// ============================================================================

#[async_trait]
impl DishCatalog for PgOrderStore {
    async fn preparation_time(&self, dish_id: DishId) -> Result<Duration, OrderError> {
        let row: Option<(i32,)> = sqlx::query_as("SELECT preparation_time FROM dishes WHERE id = $1")
            .bind(dish_id.0)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some((secs,)) => seconds(secs),
            None => Err(OrderError::DishNotFound(dish_id)),
        }
    }

    async fn list_dishes(&self) -> Result<Vec<Dish>, OrderError> {
        let rows: Vec<DishRow> = sqlx::query_as(
            "SELECT id, name, price, preparation_time FROM dishes ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Dish::try_from).collect()
    }

    async fn add_dish(&self, dish: NewDish) -> Result<Dish, OrderError> {
        let preparation_time = i32::try_from(dish.preparation_time.as_secs())
            .map_err(|_| OrderError::QuantityOverflow)?;

        let row: DishRow = sqlx::query_as(
            r#"
            INSERT INTO dishes (name, price, preparation_time)
            VALUES ($1, $2, $3)
            RETURNING id, name, price, preparation_time
            "#,
        )
        .bind(&dish.name)
        .bind(dish.price)
        .bind(preparation_time)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(dish_id = row.id, name = %row.name, "Dish added to menu");
        Dish::try_from(row)
    }

    async fn remove_dish(&self, dish_id: DishId) -> Result<bool, OrderError> {
        let result = sqlx::query("DELETE FROM dishes WHERE id = $1")
            .bind(dish_id.0)
            .execute(&self.pool)
            .await
            .map_err(|err| match &err {
                sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                    OrderError::DishInUse(dish_id)
                }
                _ => err.into(),
            })?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn insert_order(
        &self,
        user_id: UserId,
        lines: &[DishSelection],
    ) -> Result<Order, OrderError> {
        let mut tx = self.pool.begin().await?;
        let result = write_order(&mut tx, user_id, lines).await;
        finish(tx, "insert_order", result).await
    }

    async fn mark_cooked(&self, order_id: OrderId) -> Result<bool, OrderError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("UPDATE orders SET status = 'COOKED' WHERE id = $1 AND status = 'PENDING'")
            .bind(order_id.0)
            .execute(&mut *tx)
            .await
            .map(|done| done.rows_affected() == 1)
            .map_err(OrderError::from);
        finish(tx, "mark_cooked", result).await
    }

    async fn add_line_item(
        &self,
        order_id: OrderId,
        selection: DishSelection,
    ) -> Result<OrderLineItem, OrderError> {
        let mut tx = self.pool.begin().await?;
        let result = upsert_line(&mut tx, order_id, selection).await;
        finish(tx, "add_line_item", result).await
    }

    async fn transition_user_orders(
        &self,
        user_id: UserId,
        target: OrderStatus,
    ) -> Result<u64, OrderError> {
        ensure_terminal(target)?;

        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $1
            WHERE user_id = $2 AND status NOT IN ('CANCELLED', 'COMPLETED')
            "#,
        )
        .bind(target.as_str())
        .bind(user_id.0)
        .execute(&mut *tx)
        .await
        .map(|done| done.rows_affected())
        .map_err(OrderError::from);
        finish(tx, "transition_user_orders", result).await
    }

    async fn find_order(&self, order_id: OrderId) -> Result<Option<Order>, OrderError> {
        let row: Option<OrderRow> =
            sqlx::query_as("SELECT id, user_id, status, created_at FROM orders WHERE id = $1")
                .bind(order_id.0)
                .fetch_optional(&self.pool)
                .await?;

        row.map(Order::try_from).transpose()
    }

    async fn line_items(&self, order_id: OrderId) -> Result<Vec<OrderLineItem>, OrderError> {
        let rows: Vec<(i32, i32, i32)> = sqlx::query_as(
            "SELECT order_id, dish_id, quantity FROM order_details WHERE order_id = $1 ORDER BY dish_id",
        )
        .bind(order_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(order_id, dish_id, quantity)| {
                Ok(OrderLineItem {
                    order_id: OrderId(order_id),
                    dish_id: DishId(dish_id),
                    quantity: stored_quantity(quantity)?,
                })
            })
            .collect()
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<OrderSummary>, OrderError> {
        let rows: Vec<(i32, String, DateTime<Utc>, String, i32)> = sqlx::query_as(
            r#"
            SELECT o.id, o.status, o.created_at, d.name, od.quantity
            FROM orders o
            JOIN order_details od ON o.id = od.order_id
            JOIN dishes d ON od.dish_id = d.id
            WHERE o.user_id = $1
            ORDER BY o.id, od.dish_id
            "#,
        )
        .bind(user_id.0)
        .fetch_all(&self.pool)
        .await?;

        let mut summaries: Vec<OrderSummary> = Vec::new();
        for (order_id, status, created_at, dish_name, quantity) in rows {
            let order_id = OrderId(order_id);
            match summaries.last_mut() {
                Some(current) if current.order_id == order_id => {
                    current.dishes.push((dish_name, quantity));
                }
                _ => summaries.push(OrderSummary {
                    order_id,
                    status: parse_status(&status)?,
                    created_at,
                    dishes: vec![(dish_name, quantity)],
                }),
            }
        }

        tracing::debug!(user_id = %user_id, orders = summaries.len(), "Loaded orders for user");
        Ok(summaries)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
//
// Statement behaviour against a live database is covered by
// tests/postgres_store.rs; these tests cover the row decoding.
