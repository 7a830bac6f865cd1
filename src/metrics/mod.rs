// Private module declaration
mod server;

use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};

// Re-export for public API
pub use server::start_metrics_server;

// ============================================================================
// Metrics Module - Prometheus metrics for the order lifecycle
// ============================================================================
//
// Provides metrics for:
// - Order creation and line-item additions
// - Status transitions (bulk cancel/complete, deferred cooking)
// - Outcomes of deferred cook transitions
// - Subscriber failures during dispatch
//
// All metrics are registered with Prometheus and can be scraped via /metrics
// ============================================================================

/// Outcome label values for `cook_outcomes_total`
pub const COOK_OUTCOME_COOKED: &str = "cooked";
pub const COOK_OUTCOME_SUPERSEDED: &str = "superseded";
pub const COOK_OUTCOME_FAILED: &str = "failed";

pub struct Metrics {
    registry: Registry,

    // Order Metrics
    pub orders_created: IntCounter,
    pub line_items_added: IntCounter,
    pub order_preparation_seconds: Histogram,

    // Lifecycle Metrics
    pub status_transitions: IntCounterVec,
    pub cook_outcomes: IntCounterVec,

    // Notification Metrics
    pub notification_failures: IntCounter,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let orders_created = IntCounter::new("orders_created_total", "Total orders created")?;
        registry.register(Box::new(orders_created.clone()))?;

        let line_items_added = IntCounter::new(
            "line_items_added_total",
            "Total line items added to existing orders",
        )?;
        registry.register(Box::new(line_items_added.clone()))?;

        let order_preparation_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "order_preparation_seconds",
                "Total preparation time computed at order creation",
            )
            .buckets(vec![30.0, 60.0, 300.0, 600.0, 1200.0, 1800.0, 3600.0]),
        )?;
        registry.register(Box::new(order_preparation_seconds.clone()))?;

        let status_transitions = IntCounterVec::new(
            Opts::new("order_status_transitions_total", "Orders moved into a status"),
            &["status"],
        )?;
        registry.register(Box::new(status_transitions.clone()))?;

        let cook_outcomes = IntCounterVec::new(
            Opts::new("cook_outcomes_total", "Deferred cook transitions by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(cook_outcomes.clone()))?;

        let notification_failures = IntCounter::new(
            "notification_failures_total",
            "Dispatches aborted by a failing subscriber",
        )?;
        registry.register(Box::new(notification_failures.clone()))?;

        Ok(Self {
            registry,
            orders_created,
            line_items_added,
            order_preparation_seconds,
            status_transitions,
            cook_outcomes,
            notification_failures,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_order_created(&self, preparation_secs: f64) {
        self.orders_created.inc();
        self.order_preparation_seconds.observe(preparation_secs);
    }

    pub fn record_line_item_added(&self) {
        self.line_items_added.inc();
    }

    pub fn record_transitions(&self, status: &str, count: u64) {
        self.status_transitions.with_label_values(&[status]).inc_by(count);
    }

    pub fn record_cook_outcome(&self, outcome: &str) {
        self.cook_outcomes.with_label_values(&[outcome]).inc();
    }

    pub fn record_notification_failure(&self) {
        self.notification_failures.inc();
    }
}
