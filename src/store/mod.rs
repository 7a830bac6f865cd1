// ============================================================================
// Order Store - Transactional Persistence Ports
// ============================================================================
//
// The engine talks to persistence only through these traits. Every method is
// one unit of work: it acquires its own transaction and either commits or
// rolls back before returning.
//
// Adapters:
// - postgres/ - sqlx over PostgreSQL (production)
// - memory/   - in-process tables behind a tokio RwLock (tests, demo mode)
//
// ============================================================================

mod memory;
mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgOrderStore;

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::order::{
    Dish, DishId, DishSelection, NewDish, Order, OrderError, OrderId, OrderLineItem, OrderStatus,
    OrderSummary, UserId,
};

/// Read side of the menu as the engine sees it, plus the catalog CRUD used
/// to seed and maintain it.
#[async_trait]
pub trait DishCatalog: Send + Sync {
    /// Preparation time of one portion; `DishNotFound` for unknown ids.
    async fn preparation_time(&self, dish_id: DishId) -> Result<Duration, OrderError>;

    async fn list_dishes(&self) -> Result<Vec<Dish>, OrderError>;

    async fn add_dish(&self, dish: NewDish) -> Result<Dish, OrderError>;

    /// Returns whether a dish was removed.
    async fn remove_dish(&self, dish_id: DishId) -> Result<bool, OrderError>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert a `PENDING` header and all of its line items atomically.
    async fn insert_order(
        &self,
        user_id: UserId,
        lines: &[DishSelection],
    ) -> Result<Order, OrderError>;

    /// `PENDING -> COOKED`. Returns `false` when the order had already left
    /// `PENDING` (or does not exist), in which case nothing was written.
    async fn mark_cooked(&self, order_id: OrderId) -> Result<bool, OrderError>;

    /// Add `selection.quantity` of a dish to a `PENDING` order, merging with an
    /// existing line for the same dish. Returns the resulting line.
    async fn add_line_item(
        &self,
        order_id: OrderId,
        selection: DishSelection,
    ) -> Result<OrderLineItem, OrderError>;

    /// Move every non-terminal order of the user to `target`, returning the
    /// number of orders changed.
    async fn transition_user_orders(
        &self,
        user_id: UserId,
        target: OrderStatus,
    ) -> Result<u64, OrderError>;

    async fn find_order(&self, order_id: OrderId) -> Result<Option<Order>, OrderError>;

    async fn line_items(&self, order_id: OrderId) -> Result<Vec<OrderLineItem>, OrderError>;

    /// Orders of one user with their dish names, ordered by order id.
    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<OrderSummary>, OrderError>;
}

/// Rejects bulk transitions to anything but a terminal status.
pub(crate) fn ensure_terminal(target: OrderStatus) -> Result<(), OrderError> {
    if target.is_terminal() {
        Ok(())
    } else {
        Err(OrderError::NotTerminal(target))
    }
}
