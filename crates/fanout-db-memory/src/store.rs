use std::sync::Arc;

use async_trait::async_trait;
use papaya::HashMap as PapayaHashMap;

use fanout_core::{NamespacedName, Workload, generate_name_suffix};
use fanout_storage::{ListFilter, StoreError, WorkloadStore};

type StorageKey = String; // Format: "namespace/name"

fn make_storage_key(key: &NamespacedName) -> StorageKey {
    key.to_string()
}

/// In-memory workload store backed by a papaya lock-free HashMap.
///
/// All reads hand out clones; the map is never exposed. Name generation
/// for `generate_name` workloads happens here, mirroring a
/// generate-on-write store.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    data: Arc<PapayaHashMap<StorageKey, Workload>>,
}

impl InMemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self {
            data: Arc::new(PapayaHashMap::new()),
        }
    }

    /// Number of workloads currently stored.
    pub fn count(&self) -> usize {
        self.data.pin().len()
    }

    /// Returns `true` when a workload exists under `key`.
    pub fn contains(&self, key: &NamespacedName) -> bool {
        self.data.pin().contains_key(&make_storage_key(key))
    }

    fn assign_name(&self, workload: &mut Workload) -> Result<(), StoreError> {
        let Some(prefix) = workload.generate_name.as_deref() else {
            return Err(StoreError::invalid_workload(
                "workload has neither name nor generateName",
            ));
        };
        workload.name = format!("{prefix}{}", generate_name_suffix());
        Ok(())
    }
}

#[async_trait]
impl WorkloadStore for InMemoryStore {
    async fn list(&self, filter: &ListFilter) -> Result<Vec<Workload>, StoreError> {
        let guard = self.data.pin();
        Ok(guard
            .iter()
            .filter(|(_, w)| filter.matches(w))
            .map(|(_, w)| w.clone())
            .collect())
    }

    async fn get(&self, key: &NamespacedName) -> Result<Option<Workload>, StoreError> {
        let guard = self.data.pin();
        Ok(guard.get(&make_storage_key(key)).cloned())
    }

    async fn create(&self, workload: &Workload) -> Result<Workload, StoreError> {
        let mut stored = workload.clone();
        let generated = stored.name.is_empty();
        if generated {
            self.assign_name(&mut stored)?;
        }
        stored
            .validate()
            .map_err(|e| StoreError::invalid_workload(e.to_string()))?;

        loop {
            let key = make_storage_key(&stored.namespaced_name());
            let guard = self.data.pin();
            if guard.try_insert(key.clone(), stored.clone()).is_ok() {
                return Ok(stored);
            }
            if !generated {
                return Err(StoreError::already_exists(key));
            }
            // generated suffix collided, draw a fresh one
            self.assign_name(&mut stored)?;
        }
    }

    async fn update(&self, workload: &Workload) -> Result<(), StoreError> {
        workload
            .validate()
            .map_err(|e| StoreError::invalid_workload(e.to_string()))?;

        let key = make_storage_key(&workload.namespaced_name());
        let guard = self.data.pin();
        if guard.get(&key).is_none() {
            return Err(StoreError::not_found(key));
        }
        guard.insert(key, workload.clone());
        Ok(())
    }

    async fn delete(&self, key: &NamespacedName) -> Result<(), StoreError> {
        // absent is success, deletes must be safe to repeat
        let guard = self.data.pin();
        guard.remove(&make_storage_key(key));
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fanout_core::LABEL_HOSTING_NAME;
    use serde_json::json;

    fn test_workload(namespace: &str, name: &str) -> Workload {
        Workload::new(namespace, name).with_template(json!({"image": "app:v1"}))
    }

    #[tokio::test]
    async fn test_create_get_update_delete() {
        let store = InMemoryStore::new();
        let workload = test_workload("hub", "app");

        let stored = store.create(&workload).await.unwrap();
        assert_eq!(stored.name, "app");
        assert_eq!(store.count(), 1);

        let fetched = store
            .get(&NamespacedName::new("hub", "app"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched, workload);

        let mut updated = fetched.clone();
        updated.spec.template = json!({"image": "app:v2"});
        store.update(&updated).await.unwrap();

        let fetched = store
            .get(&NamespacedName::new("hub", "app"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.spec.template["image"], "app:v2");

        store
            .delete(&NamespacedName::new("hub", "app"))
            .await
            .unwrap();
        assert_eq!(store.count(), 0);
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let store = InMemoryStore::new();
        let result = store.get(&NamespacedName::new("hub", "ghost")).await;
        assert!(result.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_conflict() {
        let store = InMemoryStore::new();
        store.create(&test_workload("hub", "app")).await.unwrap();

        let err = store
            .create(&test_workload("hub", "app"))
            .await
            .unwrap_err();
        assert!(err.is_already_exists());
        assert_eq!(store.count(), 1);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let store = InMemoryStore::new();
        let err = store
            .update(&test_workload("hub", "ghost"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = InMemoryStore::new();
        store.create(&test_workload("hub", "app")).await.unwrap();

        let key = NamespacedName::new("hub", "app");
        store.delete(&key).await.unwrap();
        store.delete(&key).await.unwrap();
        store
            .delete(&NamespacedName::new("hub", "never-existed"))
            .await
            .unwrap();
        assert_eq!(store.count(), 0);
    }

    #[tokio::test]
    async fn test_generated_name_assignment() {
        let store = InMemoryStore::new();
        let template = Workload::new("cluster-a", "").with_generate_name("app-");

        let first = store.create(&template).await.unwrap();
        let second = store.create(&template).await.unwrap();

        assert!(first.name.starts_with("app-"));
        assert!(second.name.starts_with("app-"));
        assert_ne!(first.name, second.name);
        assert_eq!(store.count(), 2);

        // identity keys stay prefix-stable across recreations
        assert_eq!(first.identity_key(), "cluster-a/app-");
        assert_eq!(first.identity_key(), second.identity_key());
    }

    #[tokio::test]
    async fn test_create_without_identity_is_invalid() {
        let store = InMemoryStore::new();
        let err = store.create(&Workload::new("ns", "")).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidWorkload { .. }));
    }

    #[tokio::test]
    async fn test_list_with_label_filter() {
        let store = InMemoryStore::new();
        store
            .create(&test_workload("cluster-a", "app-1").with_label(LABEL_HOSTING_NAME, "app"))
            .await
            .unwrap();
        store
            .create(&test_workload("cluster-b", "app-2").with_label(LABEL_HOSTING_NAME, "app"))
            .await
            .unwrap();
        store
            .create(&test_workload("cluster-a", "other-1").with_label(LABEL_HOSTING_NAME, "other"))
            .await
            .unwrap();

        let all = store.list(&ListFilter::all()).await.unwrap();
        assert_eq!(all.len(), 3);

        let hosted = store
            .list(&ListFilter::all().with_label(LABEL_HOSTING_NAME, "app"))
            .await
            .unwrap();
        assert_eq!(hosted.len(), 2);
        assert!(hosted.iter().all(|w| w.name.starts_with("app-")));
    }

    #[tokio::test]
    async fn test_reads_hand_out_copies() {
        let store = InMemoryStore::new();
        store.create(&test_workload("hub", "app")).await.unwrap();

        let key = NamespacedName::new("hub", "app");
        let mut copy = store.get(&key).await.unwrap().unwrap();
        copy.spec.template = json!({"image": "mutated"});

        let fresh = store.get(&key).await.unwrap().unwrap();
        assert_eq!(fresh.spec.template["image"], "app:v1");
    }

    #[tokio::test]
    async fn test_concurrent_creates() {
        use tokio::task::JoinSet;

        let store = Arc::new(InMemoryStore::new());
        let mut join_set = JoinSet::new();

        for i in 0..50 {
            let store = Arc::clone(&store);
            join_set.spawn(async move {
                store
                    .create(&test_workload("hub", &format!("app-{i}")))
                    .await
            });
        }

        let mut created = 0;
        while let Some(result) = join_set.join_next().await {
            if result.unwrap().is_ok() {
                created += 1;
            }
        }

        assert_eq!(created, 50);
        assert_eq!(store.count(), 50);
    }

    #[tokio::test]
    async fn test_concurrent_conflicting_creates() {
        use tokio::task::JoinSet;

        let store = Arc::new(InMemoryStore::new());
        let mut join_set = JoinSet::new();

        for _ in 0..10 {
            let store = Arc::clone(&store);
            join_set.spawn(async move { store.create(&test_workload("hub", "same")).await });
        }

        let mut ok = 0;
        let mut conflicts = 0;
        while let Some(result) = join_set.join_next().await {
            match result.unwrap() {
                Ok(_) => ok += 1,
                Err(StoreError::AlreadyExists { .. }) => conflicts += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(ok, 1);
        assert_eq!(conflicts, 9);
        assert_eq!(store.count(), 1);
    }
}
