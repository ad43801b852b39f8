//! List filtering for store queries.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use fanout_core::Workload;

/// Label-equality filter for [`WorkloadStore::list`].
///
/// An empty filter matches every workload. Anything finer than label
/// equality (annotation inspection, exact hosting matches) is done
/// client-side by the caller; the filter only narrows the candidate set.
///
/// [`WorkloadStore::list`]: crate::WorkloadStore::list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListFilter {
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub labels: BTreeMap<String, String>,
}

impl ListFilter {
    /// Creates a filter matching everything.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Adds a required label equality.
    #[must_use]
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Returns `true` when the workload carries every required label.
    #[must_use]
    pub fn matches(&self, workload: &Workload) -> bool {
        self.labels
            .iter()
            .all(|(k, v)| workload.labels.get(k) == Some(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fanout_core::LABEL_HOSTING_NAME;

    #[test]
    fn test_empty_filter_matches_all() {
        assert!(ListFilter::all().matches(&Workload::new("ns", "w")));
    }

    #[test]
    fn test_label_filter() {
        let filter = ListFilter::all().with_label(LABEL_HOSTING_NAME, "app");

        let hosted = Workload::new("cluster-a", "app-x").with_label(LABEL_HOSTING_NAME, "app");
        let other = Workload::new("cluster-a", "other-x").with_label(LABEL_HOSTING_NAME, "other");

        assert!(filter.matches(&hosted));
        assert!(!filter.matches(&other));
        assert!(!filter.matches(&Workload::new("ns", "bare")));
    }
}
