//! # fanout-engine
//!
//! The reconciliation core of fanout: keeps per-cluster child workloads in
//! lock-step with their parent's placement, and sweeps the store for
//! workloads whose hosting chain dangles.
//!
//! ## Overview
//!
//! Two independent entry points:
//!
//! - [`Reconciler::reconcile`] — a single-parent pass. Resolves the
//!   parent's family, handles the hub-to-local transition, rolls child
//!   status up into the parent, materializes one child per target cluster,
//!   deletes children no longer placed anywhere, and prunes the
//!   per-cluster status map. Level-triggered: desired state is recomputed
//!   from scratch on every pass, so a partially failed pass converges on
//!   the next retry.
//! - [`OrphanSweeper::sweep`] — a store-wide sweep that walks each
//!   workload's hosting chain and deletes workloads whose ultimate
//!   referenced host is absent from the store.
//!
//! Placement policy, rolling-update revisioning, override validation and
//! event recording are external concerns, consumed through the
//! [`collaborators`] traits. The engine performs no background work and
//! makes no internal concurrency assumptions; an external dispatcher
//! invokes passes one parent at a time, and retries wholesale on error.

pub mod collaborators;
mod error;
mod reconciler;
mod sweep;

pub use collaborators::{
    AnnotationClusterResolver, ClusterResolver, EventRecorder, NoopOverrideReconciler,
    NoopPausePropagator, NoopRolloutMutator, OverrideReconciler, PausePropagator,
    PlacementResolver, RolloutMutator, StaticPlacementResolver, TracingEventRecorder,
};
pub use error::EngineError;
pub use reconciler::{Reconciler, ReconcilerBuilder};
pub use sweep::OrphanSweeper;

/// Type alias for an engine result.
pub type EngineResult<T> = Result<T, EngineError>;
