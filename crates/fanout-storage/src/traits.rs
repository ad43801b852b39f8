//! The store contract all workload store backends must implement.

use async_trait::async_trait;

use fanout_core::{NamespacedName, Workload};

use crate::error::StoreError;
use crate::filter::ListFilter;

/// The shared workload store consumed by the propagation engine.
///
/// Implementations must be thread-safe (`Send + Sync`) and must hand out
/// owned copies: callers may freely mutate returned workloads without
/// affecting store state.
///
/// The engine's correctness rests on three properties of this contract:
/// every write is safe to retry, `delete` of an absent workload succeeds,
/// and a missing workload reads as `Ok(None)` rather than an error.
#[async_trait]
pub trait WorkloadStore: Send + Sync {
    /// Lists workloads matching the filter.
    ///
    /// An empty store (or a filter matching nothing) yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues.
    async fn list(&self, filter: &ListFilter) -> Result<Vec<Workload>, StoreError>;

    /// Reads a workload by its `namespace/name` key.
    ///
    /// Returns `None` if the workload does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues, not for missing
    /// workloads.
    async fn get(&self, key: &NamespacedName) -> Result<Option<Workload>, StoreError>;

    /// Creates a new workload.
    ///
    /// If `name` is empty and `generate_name` is set, the store assigns a
    /// generated name. The stored copy (with the assigned name) is
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::AlreadyExists` if the key is taken.
    /// Returns `StoreError::InvalidWorkload` if identity fields are
    /// missing.
    async fn create(&self, workload: &Workload) -> Result<Workload, StoreError>;

    /// Updates an existing workload.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the workload does not exist.
    async fn update(&self, workload: &Workload) -> Result<(), StoreError>;

    /// Deletes a workload by key.
    ///
    /// Deleting an absent workload is a success; every delete must be safe
    /// to repeat.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues.
    async fn delete(&self, key: &NamespacedName) -> Result<(), StoreError>;

    /// Returns the name of this store backend for logging/debugging.
    fn backend_name(&self) -> &'static str;
}
