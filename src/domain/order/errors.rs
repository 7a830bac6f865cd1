use super::value_objects::{DishId, OrderId, OrderStatus};
use crate::utils::IsTransient;

// ============================================================================
// Order Lifecycle Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    // Validation: rejected before any store mutation
    #[error("Invalid item quantity: {0}")]
    InvalidQuantity(i32),

    #[error("No dishes selected")]
    NoDishesSelected,

    #[error("Invalid selection {0:?}, expected 'dishId,quantity'")]
    InvalidSelection(String),

    #[error("Quantity or preparation time overflow")]
    QuantityOverflow,

    #[error("Bulk transition target must be terminal, got {0}")]
    NotTerminal(OrderStatus),

    #[error("Unknown order status: {0}")]
    UnknownStatus(String),

    // Not found: aborts the enclosing transaction
    #[error("Order {0} not found")]
    OrderNotFound(OrderId),

    #[error("Dish with ID {0} not found")]
    DishNotFound(DishId),

    #[error("Dish {0} is referenced by existing orders")]
    DishInUse(DishId),

    #[error("Order {order_id} is not in a modifiable state (status {status})")]
    StateConflict { order_id: OrderId, status: OrderStatus },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Notification error: {0}")]
    Notification(#[from] NotificationError),
}

impl From<sqlx::Error> for OrderError {
    fn from(err: sqlx::Error) -> Self {
        OrderError::Store(StoreError::Database(err))
    }
}

/// Lost connections and exhausted pools are worth another attempt; anything
/// the database actually answered is not.
impl IsTransient for OrderError {
    fn is_transient(&self) -> bool {
        match self {
            OrderError::Store(StoreError::Unavailable(_)) => true,
            OrderError::Store(StoreError::Database(err)) => matches!(
                err,
                sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::WorkerCrashed
            ),
            _ => false,
        }
    }
}

/// Connectivity, transaction and decoding failures from a store adapter.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("corrupt row: {0}")]
    Corrupt(String),
}

/// A subscriber handler failed while an event was being dispatched.
#[derive(Debug, thiserror::Error)]
#[error("subscriber {subscriber} failed on order {order_id}: {reason}")]
pub struct NotificationError {
    pub subscriber: String,
    pub order_id: OrderId,
    pub reason: String,
}

impl NotificationError {
    pub fn new(subscriber: impl Into<String>, order_id: OrderId, reason: impl Into<String>) -> Self {
        Self {
            subscriber: subscriber.into(),
            order_id,
            reason: reason.into(),
        }
    }
}
