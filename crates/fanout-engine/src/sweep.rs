use std::collections::{HashMap, HashSet};

use tracing::{info, warn};

use fanout_core::Workload;
use fanout_storage::{DynStore, ListFilter};

use crate::error::EngineError;

/// Store-wide family validator.
///
/// Walks every workload's hosting chain and deletes workloads whose
/// ultimate referenced host is absent from the store. Runs independently
/// of per-parent reconcile passes (periodically, or on a global trigger),
/// against the same shared store.
///
/// The sweep is list-then-delete without recheck: a parent created between
/// the listing and a delete can briefly lose a child, which the next
/// reconcile pass recreates. That race is accepted; the store contract has
/// no cross-resource transactions.
pub struct OrphanSweeper {
    store: DynStore,
}

impl OrphanSweeper {
    pub fn new(store: DynStore) -> Self {
        Self { store }
    }

    /// Sweeps the whole store once and returns the number of orphans
    /// deleted.
    ///
    /// For each workload the hosting chain is walked through an
    /// identity-key map of the full listing: no annotation means root,
    /// keep; a chain returning to a key it already visited means a
    /// (self-)reference cycle, keep; a referenced key missing from the map
    /// means the *starting* workload is an orphan and is deleted from the
    /// store and the map. Deeper descendants of a removed root are caught
    /// by their own walks in this same sweep.
    ///
    /// # Errors
    ///
    /// Only the initial listing can fail the sweep; individual deletion
    /// failures are logged and skipped.
    pub async fn sweep(&self) -> Result<usize, EngineError> {
        let all = self.store.list(&ListFilter::all()).await?;

        let mut map: HashMap<String, Workload> = all
            .into_iter()
            .map(|w| (w.identity_key(), w))
            .collect();

        let keys: Vec<String> = map.keys().cloned().collect();
        let mut deleted = 0usize;

        for start_key in keys {
            // may have been removed by an earlier walk in this sweep
            if !map.contains_key(&start_key) {
                continue;
            }

            if let Some(missing) = find_missing_host(&map, &start_key) {
                let Some(orphan) = map.remove(&start_key) else {
                    continue;
                };
                let orphan_key = orphan.namespaced_name();

                match self.store.delete(&orphan_key).await {
                    Ok(()) => {
                        deleted += 1;
                        info!(workload = %orphan_key, missing_host = %missing,
                            "Deleted orphaned workload");
                    }
                    Err(e) => {
                        warn!(workload = %orphan_key, error = %e,
                            "Failed to delete orphaned workload, skipping");
                    }
                }
            }
        }

        if deleted > 0 {
            info!(count = deleted, "Orphan sweep finished");
        }

        Ok(deleted)
    }
}

/// Walks the hosting chain upward from `start_key` and returns the first
/// referenced identity key absent from the map, or `None` when the chain
/// ends at a root or folds back on itself.
fn find_missing_host(map: &HashMap<String, Workload>, start_key: &str) -> Option<String> {
    let mut visited: HashSet<String> = HashSet::from([start_key.to_string()]);
    let mut current_key = start_key.to_string();

    loop {
        let host = map.get(&current_key).and_then(Workload::hosting)?;
        let host_key = host.to_string();

        // a chain pointing back at a key it already passed terminates the
        // walk instead of looping; the degenerate self-reference included
        if !visited.insert(host_key.clone()) {
            return None;
        }
        if !map.contains_key(&host_key) {
            return Some(host_key);
        }
        current_key = host_key;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fanout_core::ANNOTATION_HOSTING;

    fn hosted(namespace: &str, name: &str, host: &str) -> Workload {
        Workload::new(namespace, name).with_annotation(ANNOTATION_HOSTING, host)
    }

    fn as_map(workloads: Vec<Workload>) -> HashMap<String, Workload> {
        workloads
            .into_iter()
            .map(|w| (w.identity_key(), w))
            .collect()
    }

    #[test]
    fn test_root_is_kept() {
        let map = as_map(vec![Workload::new("hub", "root")]);
        assert_eq!(find_missing_host(&map, "hub/root"), None);
    }

    #[test]
    fn test_dangling_reference_found() {
        let map = as_map(vec![hosted("cluster-a", "child", "hub/ghost")]);
        assert_eq!(
            find_missing_host(&map, "cluster-a/child"),
            Some("hub/ghost".to_string())
        );
    }

    #[test]
    fn test_multi_level_chain_resolves_to_root() {
        let map = as_map(vec![
            Workload::new("hub", "root"),
            hosted("mid", "branch", "hub/root"),
            hosted("leaf", "twig", "mid/branch"),
        ]);
        assert_eq!(find_missing_host(&map, "leaf/twig"), None);
    }

    #[test]
    fn test_multi_level_chain_with_missing_root() {
        let map = as_map(vec![
            hosted("mid", "branch", "hub/gone"),
            hosted("leaf", "twig", "mid/branch"),
        ]);
        assert_eq!(
            find_missing_host(&map, "leaf/twig"),
            Some("hub/gone".to_string())
        );
    }

    #[test]
    fn test_self_reference_terminates() {
        let map = as_map(vec![hosted("hub", "selfish", "hub/selfish")]);
        assert_eq!(find_missing_host(&map, "hub/selfish"), None);
    }

    #[test]
    fn test_mid_chain_self_reference_terminates() {
        let map = as_map(vec![
            hosted("hub", "loop", "hub/loop"),
            hosted("leaf", "twig", "hub/loop"),
        ]);
        assert_eq!(find_missing_host(&map, "leaf/twig"), None);
    }
}
