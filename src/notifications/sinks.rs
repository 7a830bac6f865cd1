use tokio::sync::mpsc;

use super::OrderStatusSubscriber;
use crate::domain::order::{NotificationError, OrderId, OrderStatus, OrderStatusChanged};

/// Tells the guest their food is ready.
#[derive(Debug, Default)]
pub struct UserNotificationService;

impl OrderStatusSubscriber for UserNotificationService {
    fn name(&self) -> &str {
        "user_notifications"
    }

    fn on_order_updated(&self, order_id: OrderId, status: OrderStatus) -> Result<(), NotificationError> {
        if status == OrderStatus::Cooked {
            tracing::info!(order_id = %order_id, "🍽️ Notification: order is cooked");
        }
        Ok(())
    }
}

/// Forwards every status change as an [`OrderStatusChanged`] event into a
/// channel, decoupling slow consumers from the dispatching task.
pub struct ChannelSink {
    name: String,
    sender: mpsc::UnboundedSender<OrderStatusChanged>,
}

impl ChannelSink {
    pub fn new(name: impl Into<String>) -> (Self, mpsc::UnboundedReceiver<OrderStatusChanged>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                name: name.into(),
                sender,
            },
            receiver,
        )
    }
}

impl OrderStatusSubscriber for ChannelSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_order_updated(&self, order_id: OrderId, status: OrderStatus) -> Result<(), NotificationError> {
        self.sender
            .send(OrderStatusChanged::new(order_id, status))
            .map_err(|_| NotificationError::new(self.name.clone(), order_id, "receiver dropped"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn test_cooked_alert_carries_order_as_field() {
        let captured = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(captured.clone())
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            UserNotificationService
                .on_order_updated(OrderId(31), OrderStatus::Cooked)
                .unwrap();
            UserNotificationService
                .on_order_updated(OrderId(32), OrderStatus::Cancelled)
                .unwrap();
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("Notification: order is cooked"));
        assert!(output.contains("order_id=31"));
        assert!(!output.contains("#31"));
        assert!(!output.contains("order_id=32"));
    }

    #[test]
    fn test_user_notifications_never_fail() {
        let service = UserNotificationService;
        assert!(service.on_order_updated(OrderId(1), OrderStatus::Cooked).is_ok());
        assert!(service.on_order_updated(OrderId(1), OrderStatus::Cancelled).is_ok());
    }

    #[tokio::test]
    async fn test_channel_sink_forwards_events() {
        let (sink, mut events) = ChannelSink::new("kitchen_display");

        sink.on_order_updated(OrderId(8), OrderStatus::Cooked).unwrap();

        let event = events.recv().await.unwrap();
        assert_eq!(event.order_id, OrderId(8));
        assert_eq!(event.status, OrderStatus::Cooked);
    }

    #[test]
    fn test_channel_sink_fails_when_receiver_dropped() {
        let (sink, events) = ChannelSink::new("kitchen_display");
        drop(events);

        let err = sink.on_order_updated(OrderId(8), OrderStatus::Cooked).unwrap_err();
        assert_eq!(err.subscriber, "kitchen_display");
        assert_eq!(err.order_id, OrderId(8));
    }
}
