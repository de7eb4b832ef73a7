//! Shared state of the metrics subsystem.
//!
//! The context holds the caches, cluster configuration and VM spec applier
//! the collectors read from. It is built once by setup and handed to the
//! collectors explicitly.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use virtmetrics_api::{
    PersistentVolumeClaim, Pod, VirtualMachine, VirtualMachineInstance,
    VirtualMachineInstanceMigration,
};

use crate::cache::{Informers, SharedStore, Stores};
use crate::config::SharedClusterConfig;
use crate::instancetype::VmApplyHandler;

/// Component label value of the per-node handler pods.
pub const VIRT_HANDLER_COMPONENT: &str = "virt-handler";

/// Collaborators the collectors read from.
pub struct MetricsContext {
    vm: SharedStore<VirtualMachine>,
    vmi: SharedStore<VirtualMachineInstance>,
    persistent_volume_claim: SharedStore<PersistentVolumeClaim>,
    vmi_migration: RwLock<SharedStore<VirtualMachineInstanceMigration>>,
    kv_pod: SharedStore<Pod>,
    stores: Stores,
    cluster_config: SharedClusterConfig,
    vm_applier: Arc<dyn VmApplyHandler>,
}

impl MetricsContext {
    pub fn new(
        informers: Informers,
        stores: Stores,
        cluster_config: SharedClusterConfig,
        vm_applier: Arc<dyn VmApplyHandler>,
    ) -> Self {
        Self {
            vm: informers.vm,
            vmi: informers.vmi,
            persistent_volume_claim: informers.persistent_volume_claim,
            vmi_migration: RwLock::new(informers.vmi_migration),
            kv_pod: informers.kv_pod,
            stores,
            cluster_config,
            vm_applier,
        }
    }

    pub fn vm_informer(&self) -> &SharedStore<VirtualMachine> {
        &self.vm
    }

    pub fn vmi_informer(&self) -> &SharedStore<VirtualMachineInstance> {
        &self.vmi
    }

    pub fn persistent_volume_claim_informer(&self) -> &SharedStore<PersistentVolumeClaim> {
        &self.persistent_volume_claim
    }

    /// The current migration cache.
    pub fn vmi_migration_informer(&self) -> SharedStore<VirtualMachineInstanceMigration> {
        self.vmi_migration.read().clone()
    }

    /// Replace the migration cache. Later polls read from `informer`.
    pub fn update_vmi_migration_informer(
        &self,
        informer: SharedStore<VirtualMachineInstanceMigration>,
    ) {
        *self.vmi_migration.write() = informer;
        tracing::info!("migration informer replaced");
    }

    pub fn kv_pod_informer(&self) -> &SharedStore<Pod> {
        &self.kv_pod
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    pub fn cluster_config(&self) -> &SharedClusterConfig {
        &self.cluster_config
    }

    pub fn vm_applier(&self) -> &dyn VmApplyHandler {
        self.vm_applier.as_ref()
    }

    /// Image of the handler pod running on each node.
    pub fn handler_images_by_node(&self) -> HashMap<String, String> {
        self.kv_pod
            .list()
            .into_iter()
            .filter(|pod| pod.component() == Some(VIRT_HANDLER_COMPONENT))
            .filter_map(|pod| {
                let image = pod.image()?.to_string();
                Some((pod.spec.node_name.clone(), image))
            })
            .collect()
    }

    /// Number of instances running an outdated launcher.
    pub fn count_outdated_vmis(&self) -> usize {
        let handler_images = self.handler_images_by_node();
        self.vmi
            .list()
            .iter()
            .filter(|vmi| is_outdated(vmi, &handler_images))
            .count()
    }
}

/// Whether `vmi` runs a launcher image that differs from the handler image on
/// its node. Instances on nodes without a known handler are not outdated.
pub fn is_outdated(vmi: &VirtualMachineInstance, handler_images: &HashMap<String, String>) -> bool {
    let launcher = vmi.status.launcher_container_image_version.as_str();
    if launcher.is_empty() {
        return false;
    }
    handler_images
        .get(&vmi.status.node_name)
        .is_some_and(|image| image != launcher)
}
