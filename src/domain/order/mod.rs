// ============================================================================
// Order Domain - Restaurant Order Lifecycle
// ============================================================================
//
// This module contains ALL Order-specific code:
// - Value objects (ids, Quantity, OrderStatus, OrderRequest, read-back shapes)
// - Events (OrderStatusChanged)
// - Errors (OrderError, StoreError, NotificationError)
// - Engine (OrderLifecycleEngine: creation, mutations, deferred cooking)
//
// ============================================================================

pub mod value_objects;
pub mod events;
pub mod errors;
pub mod engine;

// Re-export for convenience
pub use value_objects::*;
pub use events::*;
pub use errors::*;
pub use engine::*;
