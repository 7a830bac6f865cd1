use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::value_objects::{OrderId, OrderStatus};

// ============================================================================
// Order Events
// ============================================================================

/// An order reached a new status. Only emitted after the change committed.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderStatusChanged {
    pub event_id: Uuid,
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub timestamp: DateTime<Utc>,
}

impl OrderStatusChanged {
    pub fn new(order_id: OrderId, status: OrderStatus) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            order_id,
            status,
            timestamp: Utc::now(),
        }
    }
}
