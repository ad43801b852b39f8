use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::name::NamespacedName;
use crate::status::WorkloadStatus;

/// Annotation carrying the full `namespace/name` of the hosting workload.
pub const ANNOTATION_HOSTING: &str = "fanout.dev/hosting";

/// Annotation marking a child as shared; shared children are exempt from
/// expiration-driven deletion.
pub const ANNOTATION_SHARED: &str = "fanout.dev/shared";

/// Annotation recording the target cluster a child was materialized for.
pub const ANNOTATION_CLUSTER: &str = "fanout.dev/cluster";

/// Label carrying the bare name of the hosting workload. Labels cannot hold
/// the `/` separator, so this is only a coarse pre-filter; exact matching
/// goes through [`ANNOTATION_HOSTING`].
pub const LABEL_HOSTING_NAME: &str = "fanout.dev/hosting-name";

/// Reference to an externally resolved placement decision.
///
/// The engine never interprets this beyond presence: an absent placement
/// means the workload is in local-only mode. Resolution to a cluster set is
/// the placement collaborator's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementRef {
    pub name: String,
}

impl PlacementRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A per-cluster override applied on top of the template payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterOverride {
    #[serde(rename = "clusterName")]
    pub cluster_name: String,
    pub value: Value,
}

/// Desired-state half of a workload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct WorkloadSpec {
    /// The payload materialized on each target cluster.
    pub template: Value,
    /// Placement decision reference; `None` puts the workload in
    /// local-only mode.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub placement: Option<PlacementRef>,
    /// Per-cluster template overrides.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub overrides: Vec<ClusterOverride>,
}

/// The single resource shape of the system.
///
/// Parents and children are both `Workload`s; a child carries the hosting
/// annotation/label pointing back at the workload that generated it, plus
/// the cluster annotation naming its target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workload {
    pub namespace: String,
    pub name: String,
    /// Name-prefix template for store-assigned names. Set on children
    /// before they are materialized; the store fills in `name`.
    #[serde(
        rename = "generateName",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub generate_name: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub labels: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub annotations: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub finalizers: Vec<String>,
    pub spec: WorkloadSpec,
    #[serde(default)]
    pub status: WorkloadStatus,
}

impl Workload {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            generate_name: None,
            labels: BTreeMap::new(),
            annotations: BTreeMap::new(),
            finalizers: Vec::new(),
            spec: WorkloadSpec::default(),
            status: WorkloadStatus::default(),
        }
    }

    pub fn with_template(mut self, template: Value) -> Self {
        self.spec.template = template;
        self
    }

    pub fn with_placement(mut self, placement: PlacementRef) -> Self {
        self.spec.placement = Some(placement);
        self
    }

    pub fn with_generate_name(mut self, prefix: impl Into<String>) -> Self {
        self.generate_name = Some(prefix.into());
        self
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// The store identity of this workload.
    pub fn namespaced_name(&self) -> NamespacedName {
        NamespacedName::new(self.namespace.clone(), self.name.clone())
    }

    /// The name used for identity-key comparison: the generate-name prefix
    /// when present, the assigned name otherwise.
    pub fn effective_name(&self) -> &str {
        match self.generate_name.as_deref() {
            Some(prefix) if !prefix.is_empty() => prefix,
            _ => &self.name,
        }
    }

    /// Stable identity key, `namespace/effective_name`.
    ///
    /// A desired-but-unmaterialized child and an already-materialized child
    /// produced by the same generate-name template compare equal under this
    /// key, whatever suffix the store assigned. Expiration bookkeeping
    /// would churn indefinitely otherwise.
    pub fn identity_key(&self) -> String {
        format!("{}/{}", self.namespace, self.effective_name())
    }

    /// The hosting reference declared by this workload, if any.
    ///
    /// A malformed annotation value is treated as absent; the chain walk
    /// then sees this workload as a root.
    pub fn hosting(&self) -> Option<NamespacedName> {
        self.annotations
            .get(ANNOTATION_HOSTING)
            .and_then(|v| v.parse().ok())
    }

    /// Marks this workload as hosted by `parent`, setting both the exact
    /// annotation and the coarse pre-filter label.
    pub fn set_hosting(&mut self, parent: &Workload) {
        self.annotations.insert(
            ANNOTATION_HOSTING.to_string(),
            parent.namespaced_name().to_string(),
        );
        self.labels
            .insert(LABEL_HOSTING_NAME.to_string(), parent.name.clone());
    }

    /// True when the shared annotation is set to `"true"`.
    pub fn is_shared(&self) -> bool {
        self.annotations
            .get(ANNOTATION_SHARED)
            .is_some_and(|v| v == "true")
    }

    /// The target cluster recorded on this workload, if any.
    pub fn cluster(&self) -> Option<&str> {
        self.annotations
            .get(ANNOTATION_CLUSTER)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Validates the identity fields required before a store write.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.namespace.is_empty() {
            return Err(CoreError::invalid_workload("namespace must not be empty"));
        }
        if self.name.is_empty() && self.generate_name.as_deref().unwrap_or("").is_empty() {
            return Err(CoreError::invalid_workload(
                "one of name or generateName must be set",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identity_key_plain_name() {
        let w = Workload::new("default", "web");
        assert_eq!(w.identity_key(), "default/web");
        assert_eq!(w.namespaced_name().to_string(), "default/web");
    }

    #[test]
    fn test_identity_key_prefers_generate_name() {
        let mut w = Workload::new("default", "web-1a2b3c4d").with_generate_name("web-");
        assert_eq!(w.identity_key(), "default/web-");

        // a recreated sibling with a different suffix compares equal
        w.name = "web-9f8e7d6c".to_string();
        assert_eq!(w.identity_key(), "default/web-");
    }

    #[test]
    fn test_identity_key_ignores_empty_generate_name() {
        let w = Workload::new("default", "web").with_generate_name("");
        assert_eq!(w.identity_key(), "default/web");
    }

    #[test]
    fn test_hosting_roundtrip() {
        let parent = Workload::new("hub", "app");
        let mut child = Workload::new("cluster-a", "app-x1");
        child.set_hosting(&parent);

        assert_eq!(child.hosting(), Some(NamespacedName::new("hub", "app")));
        assert_eq!(
            child.labels.get(LABEL_HOSTING_NAME).map(String::as_str),
            Some("app")
        );
    }

    #[test]
    fn test_hosting_malformed_annotation_is_root() {
        let w = Workload::new("default", "web").with_annotation(ANNOTATION_HOSTING, "not-a-key");
        assert!(w.hosting().is_none());
    }

    #[test]
    fn test_is_shared() {
        assert!(!Workload::new("ns", "w").is_shared());
        assert!(
            Workload::new("ns", "w")
                .with_annotation(ANNOTATION_SHARED, "true")
                .is_shared()
        );
        assert!(
            !Workload::new("ns", "w")
                .with_annotation(ANNOTATION_SHARED, "false")
                .is_shared()
        );
    }

    #[test]
    fn test_cluster_annotation() {
        let w = Workload::new("cluster-a", "web-x").with_annotation(ANNOTATION_CLUSTER, "cluster-a");
        assert_eq!(w.cluster(), Some("cluster-a"));
        assert_eq!(Workload::new("ns", "w").cluster(), None);
    }

    #[test]
    fn test_validate() {
        assert!(Workload::new("ns", "w").validate().is_ok());
        assert!(Workload::new("", "w").validate().is_err());
        assert!(Workload::new("ns", "").validate().is_err());
        assert!(
            Workload::new("ns", "")
                .with_generate_name("w-")
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn test_serialization_shape() {
        let w = Workload::new("hub", "app")
            .with_template(json!({"image": "app:v1"}))
            .with_placement(PlacementRef::new("all-clusters"));
        let json = serde_json::to_value(&w).unwrap();

        assert_eq!(json["namespace"], "hub");
        assert_eq!(json["spec"]["template"]["image"], "app:v1");
        assert_eq!(json["spec"]["placement"]["name"], "all-clusters");
        assert!(json.get("generateName").is_none());
        assert!(json.get("finalizers").is_none());

        let back: Workload = serde_json::from_value(json).unwrap();
        assert_eq!(back, w);
    }
}
