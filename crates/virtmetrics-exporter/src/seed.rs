//! Seed files.
//!
//! A seed file is a JSON document holding the objects the caches are filled
//! with and the cluster configuration. Every field is optional.
//!
//! ```json
//! {
//!   "clusterConfig": { "featureGates": ["Snapshot"], "defaultArchitecture": "amd64" },
//!   "vms": [],
//!   "vmis": [],
//!   "clusterInstancetypes": []
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use virtmetrics_api::{
    ControllerRevision, PersistentVolumeClaim, Pod, VirtualMachine,
    VirtualMachineClusterInstancetype, VirtualMachineClusterPreference, VirtualMachineInstance,
    VirtualMachineInstanceMigration, VirtualMachineInstancetype, VirtualMachinePreference,
    VirtualMachineSnapshot,
};
use virtmetrics_controller::{ClusterConfigSpec, InMemoryStore, Informers, Stores};

use crate::error::SeedError;

/// Contents of a seed file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Seed {
    pub cluster_config: ClusterConfigSpec,
    pub vms: Vec<VirtualMachine>,
    pub vmis: Vec<VirtualMachineInstance>,
    pub persistent_volume_claims: Vec<PersistentVolumeClaim>,
    pub migrations: Vec<VirtualMachineInstanceMigration>,
    pub pods: Vec<Pod>,
    pub instancetypes: Vec<VirtualMachineInstancetype>,
    pub cluster_instancetypes: Vec<VirtualMachineClusterInstancetype>,
    pub preferences: Vec<VirtualMachinePreference>,
    pub cluster_preferences: Vec<VirtualMachineClusterPreference>,
    pub controller_revisions: Vec<ControllerRevision>,
    pub snapshots: Vec<VirtualMachineSnapshot>,
}

/// Caches built from a seed.
pub struct SeededCaches {
    pub informers: Informers,
    pub stores: Stores,
    pub cluster_config: ClusterConfigSpec,
    /// Snapshots to replay as updates once metrics are registered.
    pub snapshots: Vec<VirtualMachineSnapshot>,
}

impl Seed {
    /// Load a seed from a JSON file.
    pub fn load(path: &Path) -> Result<Self, SeedError> {
        let raw = std::fs::read_to_string(path).map_err(|source| SeedError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let seed: Seed = serde_json::from_str(&raw).map_err(|source| SeedError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::info!(
            path = %path.display(),
            vms = seed.vms.len(),
            vmis = seed.vmis.len(),
            migrations = seed.migrations.len(),
            "loaded seed file"
        );
        Ok(seed)
    }

    /// Fill in-memory caches with the seeded objects.
    pub fn into_caches(self) -> SeededCaches {
        let informers = Informers {
            vm: InMemoryStore::with_objects(self.vms).shared(),
            vmi: InMemoryStore::with_objects(self.vmis).shared(),
            persistent_volume_claim: InMemoryStore::with_objects(self.persistent_volume_claims)
                .shared(),
            vmi_migration: InMemoryStore::with_objects(self.migrations).shared(),
            kv_pod: InMemoryStore::with_objects(self.pods).shared(),
        };
        let stores = Stores {
            instancetype: InMemoryStore::with_objects(self.instancetypes).shared(),
            cluster_instancetype: InMemoryStore::with_objects(self.cluster_instancetypes).shared(),
            preference: InMemoryStore::with_objects(self.preferences).shared(),
            cluster_preference: InMemoryStore::with_objects(self.cluster_preferences).shared(),
            controller_revision: InMemoryStore::with_objects(self.controller_revisions).shared(),
        };

        SeededCaches {
            informers,
            stores,
            cluster_config: self.cluster_config,
            snapshots: self.snapshots,
        }
    }
}
