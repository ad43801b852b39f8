use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A namespace-qualified workload identity, rendered as `namespace/name`.
///
/// This is the full identity used in hosting annotations and as the store
/// key. Labels cannot carry the separator, which is why coarse family
/// pre-filtering goes through the bare hosting name label instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NamespacedName {
    pub namespace: String,
    pub name: String,
}

impl NamespacedName {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for NamespacedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

impl FromStr for NamespacedName {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((namespace, name)) if !name.is_empty() => Ok(Self::new(namespace, name)),
            _ => Err(CoreError::invalid_name(s)),
        }
    }
}

/// Generates a short random suffix for store-assigned names.
///
/// Workloads created from a generate-name template get
/// `<prefix><suffix>` as their stored name.
pub fn generate_name_suffix() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}
