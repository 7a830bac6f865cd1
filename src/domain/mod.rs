// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Each aggregate has its own subdirectory with:
// - Value objects
// - Events
// - Errors
// - Lifecycle engine
//
// Persistence lives behind the ports in `crate::store`.
//
// ============================================================================

pub mod order;
