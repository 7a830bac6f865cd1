use std::sync::Arc;
use tokio::sync::RwLock;

use super::OrderStatusSubscriber;
use crate::domain::order::{NotificationError, OrderId, OrderStatus};

/// Attached subscribers in attachment order. Duplicates are kept.
///
/// `notify` iterates over a snapshot taken when it starts, so attach/detach
/// calls racing with a dispatch only affect later dispatches.
#[derive(Default)]
pub struct SubscriberRegistry {
    subscribers: RwLock<Vec<Arc<dyn OrderStatusSubscriber>>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn attach(&self, subscriber: Arc<dyn OrderStatusSubscriber>) {
        tracing::debug!(subscriber = subscriber.name(), "Subscriber attached");
        self.subscribers.write().await.push(subscriber);
    }

    /// Removes the first entry that is the same object as `subscriber`.
    pub async fn detach(&self, subscriber: &Arc<dyn OrderStatusSubscriber>) {
        let mut subscribers = self.subscribers.write().await;
        if let Some(index) = subscribers.iter().position(|s| same_subscriber(s, subscriber)) {
            subscribers.remove(index);
            tracing::debug!(subscriber = subscriber.name(), "Subscriber detached");
        }
    }

    pub async fn notify(&self, order_id: OrderId, status: OrderStatus) -> Result<(), NotificationError> {
        let snapshot: Vec<_> = self.subscribers.read().await.clone();

        for subscriber in &snapshot {
            if let Err(err) = subscriber.on_order_updated(order_id, status) {
                tracing::error!(
                    order_id = %order_id,
                    status = %status,
                    subscriber = subscriber.name(),
                    error = %err,
                    "Subscriber failed, remaining subscribers skipped"
                );
                return Err(err);
            }
        }

        tracing::debug!(
            order_id = %order_id,
            status = %status,
            delivered = snapshot.len(),
            "Status change dispatched"
        );
        Ok(())
    }
}

// Compare data pointers only; vtable pointers for one type may differ.
fn same_subscriber(a: &Arc<dyn OrderStatusSubscriber>, b: &Arc<dyn OrderStatusSubscriber>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

// ============================================================================
// Unit Tests
// ============================================================================
