//! # fanout-storage
//!
//! Store abstraction for the fanout propagation engine.
//!
//! This crate defines the traits and types a shared workload store must
//! implement. It contains no implementation; backends live in separate
//! crates (`fanout-db-memory` ships the in-memory one).
//!
//! ## Overview
//!
//! The main trait is [`WorkloadStore`], the narrow contract the engine
//! consumes:
//! - `list` with label-equality filtering
//! - `get` returning `Ok(None)` for missing workloads
//! - `create` / `update` / `delete`, with idempotent delete
//!
//! Not-found is benign throughout: a missing workload is an empty result,
//! never an error. Errors are reserved for infrastructure failures, which
//! the engine propagates to its dispatcher for a wholesale retry.

mod error;
mod filter;
mod traits;

pub use error::{ErrorCategory, StoreError};
pub use filter::ListFilter;
pub use traits::WorkloadStore;

/// Type alias for a store result.
pub type StoreResult<T> = Result<T, StoreError>;

/// Type alias for a shared store trait object.
pub type DynStore = std::sync::Arc<dyn WorkloadStore>;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{ErrorCategory, StoreError};
    pub use crate::filter::ListFilter;
    pub use crate::traits::WorkloadStore;
    pub use crate::{DynStore, StoreResult};
}
