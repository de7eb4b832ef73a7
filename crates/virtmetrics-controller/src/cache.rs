//! Object caches.
//!
//! Collectors and spec finders read cluster objects through the narrow
//! [`ObjectStore`] trait: a keyed lookup and a full listing. Cache keys are
//! `namespace/name` for namespaced objects and `name` for cluster-scoped ones.

use std::sync::Arc;

use dashmap::DashMap;
use virtmetrics_api::{
    ControllerRevision, PersistentVolumeClaim, Pod, Resource, VirtualMachine,
    VirtualMachineClusterInstancetype, VirtualMachineClusterPreference, VirtualMachineInstance,
    VirtualMachineInstanceMigration, VirtualMachineInstancetype, VirtualMachinePreference,
};

/// Read access to a cache of cluster objects.
pub trait ObjectStore<T>: Send + Sync {
    /// Look up an object by its cache key.
    fn get_by_key(&self, key: &str) -> Option<T>;

    /// All cached objects.
    fn list(&self) -> Vec<T>;
}

/// Shared handle to an object cache.
pub type SharedStore<T> = Arc<dyn ObjectStore<T>>;

/// Concurrent in-memory object cache.
pub struct InMemoryStore<T> {
    objects: DashMap<String, T>,
}

impl<T: Resource> InMemoryStore<T> {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            objects: DashMap::new(),
        }
    }

    /// Create a cache holding `objects`.
    pub fn with_objects(objects: impl IntoIterator<Item = T>) -> Self {
        let store = Self::new();
        for object in objects {
            store.insert(object);
        }
        store
    }

    /// Insert or replace an object, returning the previous version.
    pub fn insert(&self, object: T) -> Option<T> {
        self.objects.insert(object.key(), object)
    }

    /// Remove an object by key.
    pub fn remove(&self, key: &str) -> Option<T> {
        self.objects.remove(key).map(|(_, object)| object)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Wrap this cache in a shared handle.
    pub fn shared(self) -> SharedStore<T> {
        Arc::new(self)
    }
}

impl<T: Resource> Default for InMemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Resource> ObjectStore<T> for InMemoryStore<T> {
    fn get_by_key(&self, key: &str) -> Option<T> {
        self.objects.get(key).map(|entry| entry.value().clone())
    }

    fn list(&self) -> Vec<T> {
        let mut objects: Vec<(String, T)> = self
            .objects
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        objects.sort_by(|a, b| a.0.cmp(&b.0));
        objects.into_iter().map(|(_, object)| object).collect()
    }
}

fn empty<T: Resource>() -> SharedStore<T> {
    InMemoryStore::<T>::new().shared()
}

/// Caches of the objects the collectors report on.
#[derive(Clone)]
pub struct Informers {
    pub vm: SharedStore<VirtualMachine>,
    pub vmi: SharedStore<VirtualMachineInstance>,
    pub persistent_volume_claim: SharedStore<PersistentVolumeClaim>,
    pub vmi_migration: SharedStore<VirtualMachineInstanceMigration>,
    /// Pods of the virtualization components, used to find handler images per node.
    pub kv_pod: SharedStore<Pod>,
}

impl Informers {
    /// Informers over empty caches.
    pub fn empty() -> Self {
        Self {
            vm: empty(),
            vmi: empty(),
            persistent_volume_claim: empty(),
            vmi_migration: empty(),
            kv_pod: empty(),
        }
    }
}

/// Caches read when resolving instance types and preferences.
#[derive(Clone)]
pub struct Stores {
    pub instancetype: SharedStore<VirtualMachineInstancetype>,
    pub cluster_instancetype: SharedStore<VirtualMachineClusterInstancetype>,
    pub preference: SharedStore<VirtualMachinePreference>,
    pub cluster_preference: SharedStore<VirtualMachineClusterPreference>,
    pub controller_revision: SharedStore<ControllerRevision>,
}

impl Stores {
    /// Stores over empty caches.
    pub fn empty() -> Self {
        Self {
            instancetype: empty(),
            cluster_instancetype: empty(),
            preference: empty(),
            cluster_preference: empty(),
            controller_revision: empty(),
        }
    }
}
