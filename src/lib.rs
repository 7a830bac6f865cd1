//! Restaurant order lifecycle: order placement, deferred cooking, bulk
//! cancel/checkout and status notifications over a transactional store.

pub mod config;
pub mod db;
pub mod domain;
pub mod metrics;
pub mod notifications;
pub mod store;
pub mod utils;

pub use domain::order::{OrderError, OrderLifecycleEngine};
