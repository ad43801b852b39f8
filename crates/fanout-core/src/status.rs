use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Lifecycle phase of a parent workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum WorkloadPhase {
    /// Not yet reconciled, or the last pass aborted before completion.
    #[default]
    Pending,
    /// The last reconcile pass completed and children match the placement.
    Propagated,
    /// The workload was rejected (reason carries the detail).
    Failed,
}

/// Per-cluster deployment phase reported on a child workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum UnitPhase {
    #[default]
    Unknown,
    Deployed,
    Failed,
}

/// Status of a single materialized unit, as reported from its cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct UnitStatus {
    pub phase: UnitPhase,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub reason: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub message: String,
    #[serde(
        rename = "lastUpdated",
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub last_updated: Option<OffsetDateTime>,
}

impl UnitStatus {
    pub fn new(phase: UnitPhase) -> Self {
        Self {
            phase,
            reason: String::new(),
            message: String::new(),
            last_updated: Some(OffsetDateTime::now_utc()),
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// True when nothing has ever been reported for this unit.
    pub fn is_empty(&self) -> bool {
        self.phase == UnitPhase::Unknown
            && self.reason.is_empty()
            && self.message.is_empty()
            && self.last_updated.is_none()
    }
}

/// Status block shared by parent and child workloads.
///
/// `propagated_status` is only meaningful on parents in hub mode. It is
/// `None` until the first propagating pass initializes it, and cleared back
/// to `None` on the hub-to-local transition; the absent/empty distinction
/// is part of the reconcile contract, hence the `Option`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct WorkloadStatus {
    pub phase: WorkloadPhase,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub reason: String,
    /// The workload's own per-cluster unit status (set on children).
    #[serde(skip_serializing_if = "UnitStatus::is_empty", default)]
    pub unit: UnitStatus,
    /// Cluster name -> last-known unit status of the child on that cluster.
    #[serde(
        rename = "propagatedStatus",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub propagated_status: Option<BTreeMap<String, UnitStatus>>,
}

impl WorkloadStatus {
    /// Returns the propagated-status map, initializing it if absent.
    pub fn propagated_status_mut(&mut self) -> &mut BTreeMap<String, UnitStatus> {
        self.propagated_status.get_or_insert_with(BTreeMap::new)
    }

    /// Number of clusters with a recorded unit status.
    pub fn propagated_count(&self) -> usize {
        self.propagated_status.as_ref().map_or(0, BTreeMap::len)
    }
}
