//! # fanout-core
//!
//! Core workload types for the fanout propagation engine.
//!
//! A [`Workload`] is the single resource shape the whole system deals in:
//! a parent workload describes a template payload and a placement decision,
//! and the engine materializes one child workload per target cluster. Parent
//! and child are the same type; a child is distinguished by the hosting
//! annotation pointing back at the workload that generated it.
//!
//! This crate carries no behavior beyond the data model and the identity
//! key derivation. Storage contracts live in `fanout-storage`, the
//! reconciliation logic in `fanout-engine`.

mod error;
mod name;
mod status;
mod workload;

pub use error::CoreError;
pub use name::{NamespacedName, generate_name_suffix};
pub use status::{UnitPhase, UnitStatus, WorkloadPhase, WorkloadStatus};
pub use workload::{
    ANNOTATION_CLUSTER, ANNOTATION_HOSTING, ANNOTATION_SHARED, ClusterOverride, LABEL_HOSTING_NAME,
    PlacementRef, Workload, WorkloadSpec,
};

/// Type alias for a core result.
pub type Result<T> = std::result::Result<T, CoreError>;
