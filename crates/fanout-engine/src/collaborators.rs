//! Collaborator contracts consumed by the reconciler.
//!
//! Placement policy, rolling updates, override validation, pause
//! propagation, event recording and cluster association are all external
//! subsystems. The engine consumes them through these narrow traits; the
//! defaults here make the engine usable (and testable) without any of
//! them.

use async_trait::async_trait;
use tracing::{info, warn};

use fanout_core::Workload;
use fanout_storage::StoreError;

use crate::error::EngineError;

/// Resolves a parent's placement reference to the set of target clusters.
#[async_trait]
pub trait PlacementResolver: Send + Sync {
    /// Returns the cluster names the parent's payload should fan out to.
    ///
    /// # Errors
    ///
    /// A resolution failure aborts the reconcile pass.
    async fn resolve(&self, parent: &Workload) -> Result<Vec<String>, EngineError>;
}

/// Advances a parent's rolling update, mutating its template/revision in
/// place.
#[async_trait]
pub trait RolloutMutator: Send + Sync {
    /// # Errors
    ///
    /// A mutation failure aborts the reconcile pass before any child is
    /// touched.
    async fn advance(&self, parent: &mut Workload) -> Result<(), EngineError>;
}

/// Drops stale per-cluster override entries left behind by rolling
/// updates. Best-effort; no error is surfaced.
#[async_trait]
pub trait OverrideReconciler: Send + Sync {
    async fn reconcile_overrides(&self, parent: &mut Workload);
}

/// Propagates the pause marker from a parent onto its embedded template.
pub trait PausePropagator: Send + Sync {
    /// # Errors
    ///
    /// A propagation failure aborts the reconcile pass immediately.
    fn propagate(&self, parent: &mut Workload) -> Result<(), EngineError>;
}

/// Fire-and-forget audit recording for child create/update/delete actions.
pub trait EventRecorder: Send + Sync {
    fn record(&self, subject: &Workload, verb: &str, message: &str, error: Option<&StoreError>);
}

/// Derives the target cluster a child workload is associated with.
pub trait ClusterResolver: Send + Sync {
    /// Returns `None` for workloads with no cluster association (the
    /// parent itself, or same-namespace copies).
    fn cluster_of(&self, workload: &Workload) -> Option<String>;
}

/// Placement resolver returning a fixed cluster set.
///
/// Suitable for single-tenant deployments and tests; real placement
/// policies live outside the engine.
#[derive(Debug, Clone, Default)]
pub struct StaticPlacementResolver {
    clusters: Vec<String>,
}

impl StaticPlacementResolver {
    pub fn new(clusters: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            clusters: clusters.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl PlacementResolver for StaticPlacementResolver {
    async fn resolve(&self, _parent: &Workload) -> Result<Vec<String>, EngineError> {
        Ok(self.clusters.clone())
    }
}

/// Cluster resolver reading the cluster annotation the propagation engine
/// stamps onto every child it materializes.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnnotationClusterResolver;

impl ClusterResolver for AnnotationClusterResolver {
    fn cluster_of(&self, workload: &Workload) -> Option<String> {
        workload.cluster().map(str::to_string)
    }
}

/// Event recorder that reports through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventRecorder;

impl EventRecorder for TracingEventRecorder {
    fn record(&self, subject: &Workload, verb: &str, message: &str, error: Option<&StoreError>) {
        match error {
            Some(e) => warn!(
                workload = %subject.namespaced_name(),
                verb,
                error = %e,
                "{message}"
            ),
            None => info!(workload = %subject.namespaced_name(), verb, "{message}"),
        }
    }
}

/// Rollout mutator that leaves the parent untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRolloutMutator;

#[async_trait]
impl RolloutMutator for NoopRolloutMutator {
    async fn advance(&self, _parent: &mut Workload) -> Result<(), EngineError> {
        Ok(())
    }
}

/// Override reconciler that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopOverrideReconciler;

#[async_trait]
impl OverrideReconciler for NoopOverrideReconciler {
    async fn reconcile_overrides(&self, _parent: &mut Workload) {}
}

/// Pause propagator that accepts every parent.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPausePropagator;

impl PausePropagator for NoopPausePropagator {
    fn propagate(&self, _parent: &mut Workload) -> Result<(), EngineError> {
        Ok(())
    }
}
