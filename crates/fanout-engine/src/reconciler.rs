use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use fanout_core::{
    ANNOTATION_CLUSTER, LABEL_HOSTING_NAME, NamespacedName, Workload, WorkloadPhase,
};
use fanout_storage::{DynStore, ListFilter, StoreError};

use crate::collaborators::{
    AnnotationClusterResolver, ClusterResolver, EventRecorder, NoopOverrideReconciler,
    NoopPausePropagator, NoopRolloutMutator, OverrideReconciler, PausePropagator,
    PlacementResolver, RolloutMutator, TracingEventRecorder,
};
use crate::error::EngineError;

/// Single-parent reconcile orchestrator.
///
/// One instance serves any number of parents; a pass holds no state beyond
/// what it writes to the store. Construction goes through
/// [`Reconciler::builder`], which wires default collaborators for
/// everything but the store and the placement resolver.
pub struct Reconciler {
    store: DynStore,
    placement: Arc<dyn PlacementResolver>,
    rollout: Arc<dyn RolloutMutator>,
    overrides: Arc<dyn OverrideReconciler>,
    pause: Arc<dyn PausePropagator>,
    events: Arc<dyn EventRecorder>,
    clusters: Arc<dyn ClusterResolver>,
}

/// Builder for [`Reconciler`].
pub struct ReconcilerBuilder {
    store: DynStore,
    placement: Arc<dyn PlacementResolver>,
    rollout: Arc<dyn RolloutMutator>,
    overrides: Arc<dyn OverrideReconciler>,
    pause: Arc<dyn PausePropagator>,
    events: Arc<dyn EventRecorder>,
    clusters: Arc<dyn ClusterResolver>,
}

impl ReconcilerBuilder {
    pub fn rollout_mutator(mut self, rollout: Arc<dyn RolloutMutator>) -> Self {
        self.rollout = rollout;
        self
    }

    pub fn override_reconciler(mut self, overrides: Arc<dyn OverrideReconciler>) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn pause_propagator(mut self, pause: Arc<dyn PausePropagator>) -> Self {
        self.pause = pause;
        self
    }

    pub fn event_recorder(mut self, events: Arc<dyn EventRecorder>) -> Self {
        self.events = events;
        self
    }

    pub fn cluster_resolver(mut self, clusters: Arc<dyn ClusterResolver>) -> Self {
        self.clusters = clusters;
        self
    }

    pub fn build(self) -> Reconciler {
        Reconciler {
            store: self.store,
            placement: self.placement,
            rollout: self.rollout,
            overrides: self.overrides,
            pause: self.pause,
            events: self.events,
            clusters: self.clusters,
        }
    }
}

impl Reconciler {
    /// Starts a builder with the two collaborators that have no sensible
    /// default: the store and the placement resolver.
    pub fn builder(store: DynStore, placement: Arc<dyn PlacementResolver>) -> ReconcilerBuilder {
        ReconcilerBuilder {
            store,
            placement,
            rollout: Arc::new(NoopRolloutMutator),
            overrides: Arc::new(NoopOverrideReconciler),
            pause: Arc::new(NoopPausePropagator),
            events: Arc::new(TracingEventRecorder),
            clusters: Arc::new(AnnotationClusterResolver),
        }
    }

    /// Runs one reconcile pass for the parent identified by `key`.
    ///
    /// A missing parent is a no-op success; the dispatcher may deliver
    /// keys for workloads deleted in the meantime.
    ///
    /// # Errors
    ///
    /// A store or collaborator failure aborts the pass; already-committed
    /// child writes are not rolled back and the dispatcher is expected to
    /// retry the whole pass. The parent's phase is only advanced to
    /// `Propagated` on a pass that ran to completion.
    pub async fn reconcile(&self, key: &NamespacedName) -> Result<(), EngineError> {
        let Some(mut parent) = self.store.get(key).await? else {
            debug!(workload = %key, "Workload gone, nothing to reconcile");
            return Ok(());
        };
        self.handle(&mut parent).await
    }

    async fn handle(&self, parent: &mut Workload) -> Result<(), EngineError> {
        let original = parent.clone();

        self.pause.propagate(parent).map_err(|e| {
            error!(workload = %parent.namespaced_name(), error = %e,
                "Failed to propagate pause marker to template");
            e
        })?;

        // a family resolution error degrades to an empty family, the rest
        // of the pass still runs
        let children = match self.family(parent).await {
            Ok(children) => children,
            Err(e) => {
                error!(workload = %parent.namespaced_name(), error = %e,
                    "Failed to resolve workload family");
                Vec::new()
            }
        };

        if !parent.finalizers.is_empty() || parent.spec.placement.is_none() {
            return self.demote_to_local(parent, &original, children).await;
        }

        // hub reconcile always carries a cluster status map
        parent.status.propagated_status_mut();

        // expiration working set: every child, keyed by identity key, with
        // its unit status rolled up per cluster (last write wins)
        let mut expiring: HashMap<String, Workload> = HashMap::new();
        for child in children {
            if let Some(cluster) = self.clusters.cluster_of(&child) {
                parent
                    .status
                    .propagated_status_mut()
                    .insert(cluster, child.status.unit.clone());
            }
            expiring.insert(child.identity_key(), child);
        }
        // the parent never expires itself
        expiring.remove(&parent.identity_key());

        self.rollout.advance(parent).await.map_err(|e| {
            error!(workload = %parent.namespaced_name(), error = %e, "Rolling update failed");
            e
        })?;

        let clusters = self.placement.resolve(parent).await.map_err(|e| {
            error!(workload = %parent.namespaced_name(), error = %e, "Placement resolution failed");
            e
        })?;

        self.propagate(parent, &clusters, &mut expiring).await?;

        let last_delete_err = self.collect_expired(parent, expiring).await;

        // clusters dropped from placement since the rollup leave stale
        // status entries behind
        if let Some(map) = parent.status.propagated_status.as_mut() {
            map.retain(|cluster, _| clusters.iter().any(|c| c == cluster));
        }

        self.overrides.reconcile_overrides(parent).await;

        parent.status.phase = WorkloadPhase::Propagated;
        parent.status.reason.clear();
        self.persist_if_changed(parent, &original).await?;

        match last_delete_err {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    /// Finds all children declaring `parent` as their host.
    ///
    /// Candidates come from a coarse label query on the parent's bare name
    /// (labels cannot hold the namespace separator), then the hosting
    /// annotation is matched exactly. Not-found from the store means "no
    /// children yet".
    async fn family(&self, parent: &Workload) -> Result<Vec<Workload>, StoreError> {
        let filter = ListFilter::all().with_label(LABEL_HOSTING_NAME, &parent.name);
        let candidates = match self.store.list(&filter).await {
            Ok(candidates) => candidates,
            Err(e) if e.is_not_found() => Vec::new(),
            Err(e) => return Err(e),
        };

        let hosting = parent.namespaced_name();
        Ok(candidates
            .into_iter()
            .filter(|c| c.hosting().as_ref() == Some(&hosting))
            .collect())
    }

    /// Hub-to-local transition: the parent carries finalizers or lost its
    /// placement. Cross-namespace children are the propagated copies and
    /// get deleted; same-namespace children are left alone. Idempotent --
    /// once no cross-namespace children remain this is a no-op.
    async fn demote_to_local(
        &self,
        parent: &mut Workload,
        original: &Workload,
        children: Vec<Workload>,
    ) -> Result<(), EngineError> {
        for child in children {
            if child.namespace == parent.namespace {
                continue;
            }

            let child_key = child.namespaced_name();
            debug!(workload = %parent.namespaced_name(), child = %child_key,
                "Deleting propagated child on hub-to-local transition");

            let result = self.store.delete(&child_key).await;
            self.events.record(
                parent,
                "Delete",
                &format!("Delete propagated workload {child_key}"),
                result.as_ref().err(),
            );
            if let Err(e) = result {
                warn!(child = %child_key, error = %e,
                    "Failed to delete propagated child, skipping");
            }
        }

        parent.status.propagated_status = None;
        self.persist_if_changed(parent, original).await
    }

    /// Materializes one child per target cluster and reconfirms surviving
    /// children by removing them from the expiration working set.
    async fn propagate(
        &self,
        parent: &Workload,
        clusters: &[String],
        expiring: &mut HashMap<String, Workload>,
    ) -> Result<(), EngineError> {
        for cluster in clusters {
            let desired = build_child(parent, cluster);

            let existing_key = expiring
                .iter()
                .find(|(_, c)| self.clusters.cluster_of(c).as_deref() == Some(cluster.as_str()))
                .map(|(key, _)| key.clone());
            let existing = existing_key.and_then(|key| expiring.remove(&key));

            match existing {
                Some(current) if child_up_to_date(&current, &desired) => {
                    debug!(child = %current.namespaced_name(), cluster = %cluster,
                        "Child already up to date");
                }
                Some(mut current) => {
                    apply_desired(&mut current, &desired);
                    self.store.update(&current).await?;
                    self.events.record(
                        parent,
                        "Update",
                        &format!("Update propagated workload {}", current.namespaced_name()),
                        None,
                    );
                    info!(child = %current.namespaced_name(), cluster = %cluster,
                        "Updated propagated child");
                }
                None => {
                    let created = self.store.create(&desired).await?;
                    self.events.record(
                        parent,
                        "Create",
                        &format!("Create propagated workload {}", created.namespaced_name()),
                        None,
                    );
                    info!(child = %created.namespaced_name(), cluster = %cluster,
                        "Created propagated child");
                }
            }
        }

        Ok(())
    }

    /// Deletes every child left in the expiration working set and repairs
    /// the parent's cluster status map. Best-effort: a failed delete is
    /// logged and the loop moves on; the last failure is handed back to
    /// the caller so the pass gets retried.
    async fn collect_expired(
        &self,
        parent: &mut Workload,
        expiring: HashMap<String, Workload>,
    ) -> Option<StoreError> {
        let mut last_err = None;

        for child in expiring.into_values() {
            if let Some(cluster) = self.clusters.cluster_of(&child) {
                parent.status.propagated_status_mut().remove(&cluster);
            }

            if child.is_shared() {
                debug!(child = %child.namespaced_name(),
                    "Child is shared, exempt from expiration");
                continue;
            }

            let child_key = child.namespaced_name();
            let result = self.store.delete(&child_key).await;
            self.events.record(
                parent,
                "Delete",
                &format!("Delete expired workload {child_key}"),
                result.as_ref().err(),
            );
            if let Err(e) = result {
                warn!(child = %child_key, error = %e,
                    "Failed to delete expired workload, skipping");
                last_err = Some(e);
            }
        }

        last_err
    }

    async fn persist_if_changed(
        &self,
        parent: &Workload,
        original: &Workload,
    ) -> Result<(), EngineError> {
        if parent != original {
            self.store.update(parent).await?;
        }
        Ok(())
    }
}

/// Builds the desired child for `cluster`: the parent's template (with the
/// cluster's override merged on top) under a generate-name in the target
/// cluster's namespace, tagged with the hosting and cluster markers.
fn build_child(parent: &Workload, cluster: &str) -> Workload {
    let mut template = parent.spec.template.clone();
    if let Some(entry) = parent
        .spec
        .overrides
        .iter()
        .find(|o| o.cluster_name == cluster)
    {
        merge_override(&mut template, &entry.value);
    }

    let mut child = Workload::new(cluster, "")
        .with_generate_name(format!("{}-", parent.name))
        .with_template(template);
    child.set_hosting(parent);
    child
        .annotations
        .insert(ANNOTATION_CLUSTER.to_string(), cluster.to_string());
    child
}

/// Shallow-merges an override object into the template; a non-object
/// override replaces the template wholesale.
fn merge_override(template: &mut Value, value: &Value) {
    match (template.as_object_mut(), value.as_object()) {
        (Some(base), Some(over)) => {
            for (k, v) in over {
                base.insert(k.clone(), v.clone());
            }
        }
        _ => *template = value.clone(),
    }
}

/// A child is up to date when it already carries the desired payload and
/// markers. Extra labels/annotations (the shared flag, third-party tags)
/// are not grounds for an update.
fn child_up_to_date(current: &Workload, desired: &Workload) -> bool {
    current.spec == desired.spec
        && desired
            .labels
            .iter()
            .all(|(k, v)| current.labels.get(k) == Some(v))
        && desired
            .annotations
            .iter()
            .all(|(k, v)| current.annotations.get(k) == Some(v))
}

/// Applies the desired payload onto an existing child, preserving its
/// store-assigned name, status and any extra metadata.
fn apply_desired(current: &mut Workload, desired: &Workload) {
    current.spec = desired.spec.clone();
    for (k, v) in &desired.labels {
        current.labels.insert(k.clone(), v.clone());
    }
    for (k, v) in &desired.annotations {
        current.annotations.insert(k.clone(), v.clone());
    }
}
