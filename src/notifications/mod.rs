// ============================================================================
// Order Status Notifications
// ============================================================================
//
// - registry/ - ordered subscriber list owned by the engine, fail-fast dispatch
// - sinks/    - subscribers shipped with the crate (user alerts, channel fan-out)
//
// ============================================================================

mod registry;
mod sinks;

pub use registry::SubscriberRegistry;
pub use sinks::{ChannelSink, UserNotificationService};

use crate::domain::order::{NotificationError, OrderId, OrderStatus};

/// Something that reacts to committed order status changes.
///
/// Handlers run synchronously on the dispatching task; an error stops the
/// dispatch and is returned to whoever called `notify`.
pub trait OrderStatusSubscriber: Send + Sync {
    fn name(&self) -> &str;

    fn on_order_updated(&self, order_id: OrderId, status: OrderStatus)
        -> Result<(), NotificationError>;
}
