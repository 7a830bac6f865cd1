use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::Instrument;

use crate::metrics::{Metrics, COOK_OUTCOME_COOKED, COOK_OUTCOME_FAILED, COOK_OUTCOME_SUPERSEDED};
use crate::notifications::{OrderStatusSubscriber, SubscriberRegistry};
use crate::store::{DishCatalog, OrderStore};
use crate::utils::{retry_on_transient, RetryConfig};

use super::errors::OrderError;
use super::value_objects::{
    total_preparation_time, DishSelection, OrderId, OrderLineItem, OrderRequest, OrderStatus,
    OrderSummary, UserId,
};

// ============================================================================
// Order Lifecycle Engine
// ============================================================================
//
// Orchestrates: Request → Dish lookup → Store transaction → Cook timer → Notify
//
// Every public operation is one store transaction. The only work that
// outlives a call is the deferred cook task spawned after a successful
// creation; it takes its own transaction when the timer fires.
//
// ============================================================================

/// What a deferred cook task ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookOutcome {
    /// `PENDING -> COOKED` committed and every subscriber was notified.
    Cooked,
    /// The order left `PENDING` before the timer fired; nothing written.
    Superseded,
}

/// Result of a successful order placement.
pub struct PlacedOrder {
    pub order_id: OrderId,
    pub preparation_time: Duration,
    /// Handle on the armed cook task. Dropping it leaves the task running.
    pub cooking: JoinHandle<Result<CookOutcome, OrderError>>,
}

pub struct OrderLifecycleEngine {
    store: Arc<dyn OrderStore>,
    dishes: Arc<dyn DishCatalog>,
    subscribers: Arc<SubscriberRegistry>,
    metrics: Option<Arc<Metrics>>,
    cook_retry: RetryConfig,
}

impl OrderLifecycleEngine {
    pub fn new(store: Arc<dyn OrderStore>, dishes: Arc<dyn DishCatalog>) -> Self {
        Self {
            store,
            dishes,
            subscribers: Arc::new(SubscriberRegistry::new()),
            metrics: None,
            cook_retry: RetryConfig::default(),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_cook_retry(mut self, cook_retry: RetryConfig) -> Self {
        self.cook_retry = cook_retry;
        self
    }

    // ------------------------------------------------------------------------
    // Subscriptions
    // ------------------------------------------------------------------------

    pub async fn attach(&self, subscriber: Arc<dyn OrderStatusSubscriber>) {
        self.subscribers.attach(subscriber).await;
    }

    pub async fn detach(&self, subscriber: &Arc<dyn OrderStatusSubscriber>) {
        self.subscribers.detach(subscriber).await;
    }

    pub async fn notify(&self, order_id: OrderId, status: OrderStatus) -> Result<(), OrderError> {
        self.subscribers.notify(order_id, status).await.map_err(|err| {
            self.record(|m| m.record_notification_failure());
            err.into()
        })
    }

    // ------------------------------------------------------------------------
    // Creation
    // ------------------------------------------------------------------------

    /// Place an order: one transaction for header and lines, then arm the
    /// cook timer for the summed preparation time.
    pub async fn place_order(&self, request: OrderRequest) -> Result<PlacedOrder, OrderError> {
        let lines = request.line_items()?;

        let mut timed = Vec::with_capacity(lines.len());
        for line in &lines {
            let prep = self.dishes.preparation_time(line.dish_id).await?;
            timed.push((prep, line.quantity));
        }
        let preparation_time = total_preparation_time(timed)?;
        // The deadline must be representable before anything is committed.
        let deadline = Instant::now()
            .checked_add(preparation_time)
            .ok_or(OrderError::QuantityOverflow)?;

        let order = self.store.insert_order(request.user_id(), &lines).await?;

        tracing::info!(
            order_id = %order.id,
            user_id = %order.user_id,
            line_count = lines.len(),
            preparation_secs = preparation_time.as_secs(),
            "✅ Order created"
        );
        self.record(|m| m.record_order_created(preparation_time.as_secs_f64()));

        let cooking = self.schedule_cooking(order.id, deadline);

        Ok(PlacedOrder {
            order_id: order.id,
            preparation_time,
            cooking,
        })
    }

    /// Arm the deferred `PENDING -> COOKED` transition. The deadline is fixed
    /// by the caller, not when the task is first polled.
    fn schedule_cooking(
        &self,
        order_id: OrderId,
        deadline: Instant,
    ) -> JoinHandle<Result<CookOutcome, OrderError>> {
        let span = tracing::info_span!("cook", order_id = %order_id);
        let task = CookTask {
            order_id,
            deadline,
            store: self.store.clone(),
            subscribers: self.subscribers.clone(),
            metrics: self.metrics.clone(),
            retry: self.cook_retry.clone(),
        };

        tokio::spawn(task.run().instrument(span))
    }

    // ------------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------------

    /// Add dishes to a `PENDING` order. The armed cook timer keeps its
    /// original deadline.
    pub async fn add_line_item(
        &self,
        order_id: OrderId,
        selection: DishSelection,
    ) -> Result<OrderLineItem, OrderError> {
        match self.store.add_line_item(order_id, selection).await {
            Ok(line) => {
                tracing::info!(
                    order_id = %order_id,
                    dish_id = %line.dish_id,
                    quantity = line.quantity.get(),
                    "Dish added/updated in the order"
                );
                self.record(|m| m.record_line_item_added());
                Ok(line)
            }
            Err(err @ OrderError::StateConflict { .. }) => {
                tracing::warn!(order_id = %order_id, error = %err, "Cannot add dishes to the order");
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    pub async fn cancel_orders_for_user(&self, user_id: UserId) -> Result<u64, OrderError> {
        self.close_orders_for_user(user_id, OrderStatus::Cancelled).await
    }

    /// Checkout: every open order of the user becomes `COMPLETED`.
    pub async fn complete_orders_for_user(&self, user_id: UserId) -> Result<u64, OrderError> {
        self.close_orders_for_user(user_id, OrderStatus::Completed).await
    }

    async fn close_orders_for_user(
        &self,
        user_id: UserId,
        target: OrderStatus,
    ) -> Result<u64, OrderError> {
        let affected = self.store.transition_user_orders(user_id, target).await?;

        tracing::info!(
            user_id = %user_id,
            status = %target,
            affected,
            "Orders closed for user"
        );
        self.record(|m| m.record_transitions(target.as_str(), affected));

        Ok(affected)
    }

    // ------------------------------------------------------------------------
    // Read-back
    // ------------------------------------------------------------------------

    /// Orders of the user with their dishes; empty when the user has none.
    pub async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<OrderSummary>, OrderError> {
        self.store.orders_for_user(user_id).await
    }

    fn record(&self, f: impl FnOnce(&Metrics)) {
        if let Some(metrics) = &self.metrics {
            f(metrics);
        }
    }
}

// ============================================================================
// Deferred Cook Task
// ============================================================================

struct CookTask {
    order_id: OrderId,
    deadline: Instant,
    store: Arc<dyn OrderStore>,
    subscribers: Arc<SubscriberRegistry>,
    metrics: Option<Arc<Metrics>>,
    retry: RetryConfig,
}

impl CookTask {
    async fn run(self) -> Result<CookOutcome, OrderError> {
        tokio::time::sleep_until(self.deadline).await;

        let order_id = self.order_id;
        let store = self.store.clone();
        let transitioned = retry_on_transient(self.retry.clone(), "mark_cooked", |_attempt| {
            let store = store.clone();
            async move { store.mark_cooked(order_id).await }
        })
        .await
        .into_result();

        match transitioned {
            Ok(true) => {
                tracing::info!(order_id = %order_id, "👨‍🍳 Order cooked");
                self.record(|m| {
                    m.record_cook_outcome(COOK_OUTCOME_COOKED);
                    m.record_transitions(OrderStatus::Cooked.as_str(), 1);
                });

                // The transition is committed; a failing subscriber cannot undo it.
                if let Err(err) = self.subscribers.notify(order_id, OrderStatus::Cooked).await {
                    self.record(|m| m.record_notification_failure());
                    return Err(err.into());
                }
                Ok(CookOutcome::Cooked)
            }
            Ok(false) => {
                tracing::warn!(
                    order_id = %order_id,
                    "Order left PENDING before cooking finished, transition skipped"
                );
                self.record(|m| m.record_cook_outcome(COOK_OUTCOME_SUPERSEDED));
                Ok(CookOutcome::Superseded)
            }
            Err(err) => {
                tracing::error!(order_id = %order_id, error = %err, "Failed to mark order as cooked");
                self.record(|m| m.record_cook_outcome(COOK_OUTCOME_FAILED));
                Err(err)
            }
        }
    }

    fn record(&self, f: impl FnOnce(&Metrics)) {
        if let Some(metrics) = &self.metrics {
            f(metrics);
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{DishId, NewDish, NotificationError, Order, StoreError};
    use crate::notifications::ChannelSink;
    use crate::store::InMemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    struct Kitchen {
        engine: OrderLifecycleEngine,
        store: InMemoryStore,
        soup: DishId,
        bread: DishId,
    }

    /// Dish 1 takes 10s, dish 2 takes 5s.
    async fn kitchen() -> Kitchen {
        let store = InMemoryStore::new();
        let soup = store
            .add_dish(NewDish {
                name: "Borscht".to_string(),
                price: 4.5,
                preparation_time: Duration::from_secs(10),
            })
            .await
            .unwrap();
        let bread = store
            .add_dish(NewDish {
                name: "Rye bread".to_string(),
                price: 1.0,
                preparation_time: Duration::from_secs(5),
            })
            .await
            .unwrap();

        let engine = OrderLifecycleEngine::new(Arc::new(store.clone()), Arc::new(store.clone()));
        Kitchen {
            engine,
            store,
            soup: soup.id,
            bread: bread.id,
        }
    }

    fn request(user: i32, lines: &[(DishId, i32)]) -> OrderRequest {
        OrderRequest::new(
            UserId(user),
            lines
                .iter()
                .map(|(dish, qty)| DishSelection::new(dish.0, *qty).unwrap())
                .collect(),
        )
        .unwrap()
    }

    async fn status_of(store: &InMemoryStore, order_id: OrderId) -> OrderStatus {
        store.find_order(order_id).await.unwrap().unwrap().status
    }

    type Log = Arc<Mutex<Vec<(&'static str, OrderId, OrderStatus)>>>;

    struct Recorder {
        label: &'static str,
        log: Log,
        fail: bool,
    }

    impl OrderStatusSubscriber for Recorder {
        fn name(&self) -> &str {
            self.label
        }

        fn on_order_updated(
            &self,
            order_id: OrderId,
            status: OrderStatus,
        ) -> Result<(), NotificationError> {
            self.log.lock().unwrap().push((self.label, order_id, status));
            if self.fail {
                return Err(NotificationError::new(self.label, order_id, "display offline"));
            }
            Ok(())
        }
    }

    fn recorder(label: &'static str, log: &Log, fail: bool) -> Arc<dyn OrderStatusSubscriber> {
        Arc::new(Recorder {
            label,
            log: log.clone(),
            fail,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_to_end_order_is_cooked_after_preparation_time() {
        let k = kitchen().await;
        let (sink, mut events) = ChannelSink::new("pass");
        k.engine.attach(Arc::new(sink)).await;

        let start = Instant::now();
        let placed = k
            .engine
            .place_order(request(7, &[(k.soup, 2), (k.bread, 1)]))
            .await
            .unwrap();

        assert_eq!(placed.preparation_time, Duration::from_secs(25));
        assert_eq!(status_of(&k.store, placed.order_id).await, OrderStatus::Pending);
        assert_eq!(k.store.line_items(placed.order_id).await.unwrap().len(), 2);

        tokio::time::advance(Duration::from_secs(24)).await;
        tokio::task::yield_now().await;
        assert_eq!(status_of(&k.store, placed.order_id).await, OrderStatus::Pending);
        assert!(events.try_recv().is_err());

        let outcome = placed.cooking.await.unwrap().unwrap();
        assert_eq!(outcome, CookOutcome::Cooked);
        assert!(start.elapsed() >= Duration::from_secs(25));
        assert_eq!(status_of(&k.store, placed.order_id).await, OrderStatus::Cooked);

        let event = events.recv().await.unwrap();
        assert_eq!(event.order_id, placed.order_id);
        assert_eq!(event.status, OrderStatus::Cooked);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_notified_in_attachment_order() {
        let k = kitchen().await;
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        k.engine.attach(recorder("A", &log, false)).await;
        k.engine.attach(recorder("B", &log, false)).await;

        let placed = k.engine.place_order(request(1, &[(k.bread, 1)])).await.unwrap();
        placed.cooking.await.unwrap().unwrap();

        let log = log.lock().unwrap();
        assert_eq!(
            *log,
            vec![
                ("A", placed.order_id, OrderStatus::Cooked),
                ("B", placed.order_id, OrderStatus::Cooked),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_subscriber_does_not_undo_cooking() {
        let k = kitchen().await;
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        k.engine.attach(recorder("A", &log, true)).await;
        k.engine.attach(recorder("B", &log, false)).await;

        let placed = k.engine.place_order(request(1, &[(k.bread, 1)])).await.unwrap();
        let result = placed.cooking.await.unwrap();

        assert!(matches!(result, Err(OrderError::Notification(_))));
        assert_eq!(status_of(&k.store, placed.order_id).await, OrderStatus::Cooked);
        // B never ran
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_order_is_not_cooked() {
        let k = kitchen().await;
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        k.engine.attach(recorder("A", &log, false)).await;

        let placed = k.engine.place_order(request(3, &[(k.soup, 1)])).await.unwrap();
        assert_eq!(k.engine.cancel_orders_for_user(UserId(3)).await.unwrap(), 1);

        let outcome = placed.cooking.await.unwrap().unwrap();
        assert_eq!(outcome, CookOutcome::Superseded);
        assert_eq!(status_of(&k.store, placed.order_id).await, OrderStatus::Cancelled);
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_never_regresses_after_checkout() {
        let k = kitchen().await;
        let placed = k.engine.place_order(request(3, &[(k.soup, 1)])).await.unwrap();
        let order_id = placed.order_id;
        placed.cooking.await.unwrap().unwrap();

        assert_eq!(k.engine.complete_orders_for_user(UserId(3)).await.unwrap(), 1);
        assert_eq!(status_of(&k.store, order_id).await, OrderStatus::Completed);

        // Completed orders are terminal: cancel does not touch them.
        assert_eq!(k.engine.cancel_orders_for_user(UserId(3)).await.unwrap(), 0);
        assert_eq!(status_of(&k.store, order_id).await, OrderStatus::Completed);
    }

    #[tokio::test]
    async fn test_unknown_dish_aborts_creation() {
        let k = kitchen().await;

        let result = k
            .engine
            .place_order(request(7, &[(k.soup, 1), (DishId(404), 1)]))
            .await;

        assert!(matches!(result, Err(OrderError::DishNotFound(DishId(404)))));
        assert!(k.engine.orders_for_user(UserId(7)).await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreachable_deadline_is_rejected_before_commit() {
        let store = InMemoryStore::new();
        let mut slow = Vec::new();
        for name in ["Brisket", "Sourdough", "Kimchi"] {
            let dish = store
                .add_dish(NewDish {
                    name: name.to_string(),
                    price: 30.0,
                    preparation_time: Duration::from_secs(i32::MAX as u64),
                })
                .await
                .unwrap();
            slow.push((dish.id, i32::MAX));
        }
        let engine = OrderLifecycleEngine::new(Arc::new(store.clone()), Arc::new(store.clone()));

        let result = engine.place_order(request(1, &slow)).await;

        assert!(matches!(result, Err(OrderError::QuantityOverflow)));
        assert!(store.find_order(OrderId(1)).await.unwrap().is_none());
        assert!(engine.orders_for_user(UserId(1)).await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_dish_increments_quantity() {
        let k = kitchen().await;
        let placed = k.engine.place_order(request(2, &[(k.soup, 1)])).await.unwrap();

        k.engine
            .add_line_item(placed.order_id, DishSelection::new(k.soup.0, 2).unwrap())
            .await
            .unwrap();
        let line = k
            .engine
            .add_line_item(placed.order_id, DishSelection::new(k.soup.0, 1).unwrap())
            .await
            .unwrap();

        assert_eq!(line.quantity.get(), 4);
        let items = k.store.line_items(placed.order_id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity.get(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_adding_to_completed_order_is_rejected() {
        let k = kitchen().await;
        let placed = k
            .engine
            .place_order(request(5, &[(k.soup, 1), (k.bread, 2)]))
            .await
            .unwrap();
        k.engine.complete_orders_for_user(UserId(5)).await.unwrap();

        let before = k.store.line_items(placed.order_id).await.unwrap();
        let result = k
            .engine
            .add_line_item(placed.order_id, DishSelection::new(k.bread.0, 1).unwrap())
            .await;

        assert!(matches!(
            result,
            Err(OrderError::StateConflict {
                status: OrderStatus::Completed,
                ..
            })
        ));
        assert_eq!(k.store.line_items(placed.order_id).await.unwrap(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_adding_dishes_keeps_original_deadline() {
        let k = kitchen().await;
        let start = Instant::now();
        let placed = k.engine.place_order(request(2, &[(k.bread, 1)])).await.unwrap();

        k.engine
            .add_line_item(placed.order_id, DishSelection::new(k.soup.0, 3).unwrap())
            .await
            .unwrap();

        placed.cooking.await.unwrap().unwrap();
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(5));
        assert!(elapsed < Duration::from_secs(35));
    }

    #[tokio::test(start_paused = true)]
    async fn test_bulk_transitions_are_idempotent() {
        let k = kitchen().await;
        k.engine.place_order(request(9, &[(k.soup, 1)])).await.unwrap();
        k.engine.place_order(request(9, &[(k.bread, 1)])).await.unwrap();
        k.engine.place_order(request(10, &[(k.bread, 1)])).await.unwrap();

        assert_eq!(k.engine.cancel_orders_for_user(UserId(9)).await.unwrap(), 2);
        assert_eq!(k.engine.cancel_orders_for_user(UserId(9)).await.unwrap(), 0);

        assert_eq!(k.engine.complete_orders_for_user(UserId(10)).await.unwrap(), 1);
        assert_eq!(k.engine.complete_orders_for_user(UserId(10)).await.unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_orders_for_user_read_back() {
        let k = kitchen().await;
        assert!(k.engine.orders_for_user(UserId(7)).await.unwrap().is_empty());

        let placed = k
            .engine
            .place_order(request(7, &[(k.soup, 2), (k.bread, 1)]))
            .await
            .unwrap();

        let summaries = k.engine.orders_for_user(UserId(7)).await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].order_id, placed.order_id);
        assert_eq!(summaries[0].status, OrderStatus::Pending);
        assert_eq!(
            summaries[0].dishes,
            vec![("Borscht".to_string(), 2), ("Rye bread".to_string(), 1)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_detached_subscriber_is_not_notified() {
        let k = kitchen().await;
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let a = recorder("A", &log, false);
        k.engine.attach(a.clone()).await;
        k.engine.detach(&a).await;

        let placed = k.engine.place_order(request(1, &[(k.bread, 1)])).await.unwrap();
        placed.cooking.await.unwrap().unwrap();

        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_metrics_follow_lifecycle() {
        let k = kitchen().await;
        let metrics = Arc::new(Metrics::new().unwrap());
        let engine = OrderLifecycleEngine::new(Arc::new(k.store.clone()), Arc::new(k.store.clone()))
            .with_metrics(metrics.clone());

        let placed = engine.place_order(request(4, &[(k.bread, 1)])).await.unwrap();
        placed.cooking.await.unwrap().unwrap();
        engine.complete_orders_for_user(UserId(4)).await.unwrap();

        assert_eq!(metrics.orders_created.get(), 1);
        assert_eq!(
            metrics.cook_outcomes.with_label_values(&[COOK_OUTCOME_COOKED]).get(),
            1
        );
        assert_eq!(
            metrics.status_transitions.with_label_values(&["COMPLETED"]).get(),
            1
        );
    }

    // ------------------------------------------------------------------------
    // Store failures during the deferred transition
    // ------------------------------------------------------------------------

    /// Delegates to the in-memory store but cannot reach the database when
    /// the cook timer fires.
    struct UnreachableOnCook {
        inner: InMemoryStore,
        attempts: AtomicU32,
    }

    #[async_trait]
    impl OrderStore for UnreachableOnCook {
        async fn insert_order(
            &self,
            user_id: UserId,
            lines: &[DishSelection],
        ) -> Result<Order, OrderError> {
            self.inner.insert_order(user_id, lines).await
        }

        async fn mark_cooked(&self, _order_id: OrderId) -> Result<bool, OrderError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Unavailable("connection refused".to_string()).into())
        }

        async fn add_line_item(
            &self,
            order_id: OrderId,
            selection: DishSelection,
        ) -> Result<OrderLineItem, OrderError> {
            self.inner.add_line_item(order_id, selection).await
        }

        async fn transition_user_orders(
            &self,
            user_id: UserId,
            target: OrderStatus,
        ) -> Result<u64, OrderError> {
            self.inner.transition_user_orders(user_id, target).await
        }

        async fn find_order(&self, order_id: OrderId) -> Result<Option<Order>, OrderError> {
            self.inner.find_order(order_id).await
        }

        async fn line_items(&self, order_id: OrderId) -> Result<Vec<OrderLineItem>, OrderError> {
            self.inner.line_items(order_id).await
        }

        async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<OrderSummary>, OrderError> {
            self.inner.orders_for_user(user_id).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_cook_update_sends_no_notification() {
        let k = kitchen().await;
        let store = Arc::new(UnreachableOnCook {
            inner: k.store.clone(),
            attempts: AtomicU32::new(0),
        });
        let engine = OrderLifecycleEngine::new(store.clone(), Arc::new(k.store.clone()))
            .with_cook_retry(RetryConfig::default().with_max_attempts(3));
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        engine.attach(recorder("A", &log, false)).await;

        let placed = engine.place_order(request(1, &[(k.soup, 1)])).await.unwrap();
        let result = placed.cooking.await.unwrap();

        assert!(matches!(
            result,
            Err(OrderError::Store(StoreError::Unavailable(_)))
        ));
        assert_eq!(store.attempts.load(Ordering::SeqCst), 3);
        assert_eq!(status_of(&k.store, placed.order_id).await, OrderStatus::Pending);
        assert!(log.lock().unwrap().is_empty());
    }
}
