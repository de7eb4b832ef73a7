//! Metrics registration wiring.
//!
//! Startup builds a [`ControllerMetrics`] bundle: the metrics context, the VM
//! spec applier, every metric group and the three collectors, registered with
//! a [`Registrar`]. Registration fails fast. When any group or collector is
//! rejected, everything this call registered before it is unregistered again
//! and the error is returned, so startup never leaves a partial registration
//! behind.

use std::sync::Arc;

use parking_lot::Mutex;
use virtmetrics_api::{
    VirtualMachineInstance, VirtualMachineInstanceMigration, VirtualMachineSnapshot, VmiPhase,
};
use virtmetrics_core::{Collector, Metric, MetricDescriptor, Registrar};

use crate::cache::{Informers, Stores};
use crate::client::{InstrumentedClient, OfflineClient, SharedClient};
use crate::collectors::{MigrationStatsCollector, VmStatsCollector, VmiStatsCollector};
use crate::config::{ClusterConfig, SharedClusterConfig};
use crate::context::MetricsContext;
use crate::error::Error;
use crate::instancetype::{InstancetypeSpecFinder, PreferenceSpecFinder, VmApplier};
use crate::metrics::{
    ComponentMetrics, LeaderMetrics, MetricGroup, MigrationMetrics, PerfscaleMetrics,
    RestClientMetrics, VmSnapshotMetrics, VmiMetrics, WorkqueueMetrics,
};

/// Registered metrics of the controller.
pub struct ControllerMetrics {
    context: Arc<MetricsContext>,
    client: Arc<InstrumentedClient>,
    rest_client: RestClientMetrics,
    workqueue: WorkqueueMetrics,
    component: ComponentMetrics,
    migration: MigrationMetrics,
    perfscale: PerfscaleMetrics,
    vmi: VmiMetrics,
    vm_snapshot: VmSnapshotMetrics,
    leader: LeaderMetrics,
    leader_registered: Mutex<bool>,
}

impl ControllerMetrics {
    /// Start building the metrics bundle.
    pub fn builder() -> ControllerMetricsBuilder {
        ControllerMetricsBuilder::default()
    }

    /// Context the collectors read from.
    pub fn context(&self) -> &Arc<MetricsContext> {
        &self.context
    }

    /// API client whose requests are recorded in the REST client metrics.
    pub fn client(&self) -> &Arc<InstrumentedClient> {
        &self.client
    }

    pub fn rest_client(&self) -> &RestClientMetrics {
        &self.rest_client
    }

    pub fn workqueue(&self) -> &WorkqueueMetrics {
        &self.workqueue
    }

    pub fn component(&self) -> &ComponentMetrics {
        &self.component
    }

    pub fn migration(&self) -> &MigrationMetrics {
        &self.migration
    }

    pub fn perfscale(&self) -> &PerfscaleMetrics {
        &self.perfscale
    }

    pub fn vmi(&self) -> &VmiMetrics {
        &self.vmi
    }

    pub fn vm_snapshot(&self) -> &VmSnapshotMetrics {
        &self.vm_snapshot
    }

    pub fn leader(&self) -> &LeaderMetrics {
        &self.leader
    }

    /// Record a VMI update.
    pub fn observe_vmi_update(&self, old: &VirtualMachineInstance, new: &VirtualMachineInstance) {
        if new.status.phase == VmiPhase::Unset || old.status.phase == new.status.phase {
            return;
        }
        self.vmi.record_phase_transition(new.status.phase);
        let clamped = self.perfscale.update_vmi(old, new);
        self.vmi.record_clamped(clamped);
    }

    /// Record a migration update. `old` is `None` for a newly added migration.
    pub fn observe_migration_update(
        &self,
        old: Option<&VirtualMachineInstanceMigration>,
        new: &VirtualMachineInstanceMigration,
    ) {
        if let Some(transition) = self.migration.update_migration(old, new) {
            self.vmi.record_clamped(u64::from(transition.clamped));
        }
    }

    /// Record a snapshot update.
    pub fn observe_snapshot_update(&self, snapshot: &VirtualMachineSnapshot) {
        self.vm_snapshot.handle_succeeded(snapshot);
    }

    /// Register the leader-only metrics.
    ///
    /// Only the first call registers; later calls return `Ok(())`.
    pub fn register_leader_metrics(&self, registrar: &dyn Registrar) -> Result<(), Error> {
        let mut registered = self.leader_registered.lock();
        if *registered {
            tracing::debug!("leader metrics already registered");
            return Ok(());
        }
        registrar.register_metrics(&self.leader.metrics())?;
        *registered = true;
        tracing::info!("registered leader metrics");
        Ok(())
    }

    /// Recount outdated instances into the leader metrics.
    pub fn refresh_outdated_vmis(&self) -> usize {
        let outdated = self.context.count_outdated_vmis();
        self.leader.set_outdated_vmis(outdated);
        outdated
    }

    fn groups(&self) -> Vec<(&'static str, Vec<Metric>)> {
        let groups: [&dyn MetricGroup; 7] = [
            &self.rest_client,
            &self.workqueue,
            &self.component,
            &self.migration,
            &self.perfscale,
            &self.vmi,
            &self.vm_snapshot,
        ];
        groups.iter().map(|g| (g.name(), g.metrics())).collect()
    }
}

/// Builder for [`ControllerMetrics`]. Collaborators that are not set default
/// to empty caches, the default cluster configuration and an offline client.
#[derive(Default)]
pub struct ControllerMetricsBuilder {
    informers: Option<Informers>,
    stores: Option<Stores>,
    cluster_config: Option<SharedClusterConfig>,
    client: Option<SharedClient>,
}

impl ControllerMetricsBuilder {
    pub fn informers(mut self, informers: Informers) -> Self {
        self.informers = Some(informers);
        self
    }

    pub fn stores(mut self, stores: Stores) -> Self {
        self.stores = Some(stores);
        self
    }

    pub fn cluster_config(mut self, cluster_config: SharedClusterConfig) -> Self {
        self.cluster_config = Some(cluster_config);
        self
    }

    pub fn client(mut self, client: SharedClient) -> Self {
        self.client = Some(client);
        self
    }

    /// Build the bundle without registering anything.
    pub fn build(self) -> Result<ControllerMetrics, Error> {
        let informers = self.informers.unwrap_or_else(Informers::empty);
        let stores = self.stores.unwrap_or_else(Stores::empty);
        let cluster_config = self
            .cluster_config
            .unwrap_or_else(|| Arc::new(ClusterConfig::default()));
        let raw_client = self.client.unwrap_or_else(|| Arc::new(OfflineClient));

        let rest_client = RestClientMetrics::new()?;
        let client = Arc::new(InstrumentedClient::new(raw_client, rest_client.clone()));
        let lookup_client: SharedClient = client.clone();

        let vm_applier = VmApplier::new(
            InstancetypeSpecFinder::new(&stores, lookup_client.clone()),
            PreferenceSpecFinder::new(&stores, lookup_client),
        );
        let context = Arc::new(MetricsContext::new(
            informers,
            stores,
            cluster_config,
            Arc::new(vm_applier),
        ));

        Ok(ControllerMetrics {
            context,
            client,
            rest_client,
            workqueue: WorkqueueMetrics::new()?,
            component: ComponentMetrics::new()?,
            migration: MigrationMetrics::new()?,
            perfscale: PerfscaleMetrics::new()?,
            vmi: VmiMetrics::new()?,
            vm_snapshot: VmSnapshotMetrics::new()?,
            leader: LeaderMetrics::new()?,
            leader_registered: Mutex::new(false),
        })
    }

    /// Build the bundle and register its groups and collectors.
    pub fn register(self, registrar: &dyn Registrar) -> Result<ControllerMetrics, Error> {
        let metrics = self.build()?;
        let groups = metrics.groups();

        let mut registered: Vec<&[Metric]> = Vec::with_capacity(groups.len());
        for (name, group) in &groups {
            if let Err(e) = registrar.register_metrics(group) {
                tracing::error!(group = name, error = %e, "metric group registration failed");
                rollback(registrar, &registered, &[]);
                return Err(e.into());
            }
            tracing::debug!(group = name, metrics = group.len(), "registered metric group");
            registered.push(group.as_slice());
        }

        let collectors: Vec<Arc<dyn Collector>> = vec![
            Arc::new(MigrationStatsCollector::new(metrics.context.clone())?),
            Arc::new(VmiStatsCollector::new(metrics.context.clone())?),
            Arc::new(VmStatsCollector::new(metrics.context.clone())?),
        ];
        let mut registered_collectors: Vec<String> = Vec::with_capacity(collectors.len());
        for collector in collectors {
            let name = collector.name().to_string();
            if let Err(e) = registrar.register_collector(collector) {
                tracing::error!(collector = %name, error = %e, "collector registration failed");
                rollback(registrar, &registered, &registered_collectors);
                return Err(e.into());
            }
            registered_collectors.push(name);
        }

        tracing::info!(
            groups = registered.len(),
            collectors = registered_collectors.len(),
            "registered controller metrics"
        );
        Ok(metrics)
    }
}

fn rollback(registrar: &dyn Registrar, groups: &[&[Metric]], collectors: &[String]) {
    for name in collectors.iter().rev() {
        registrar.unregister_collector(name);
    }
    for group in groups.iter().rev() {
        registrar.unregister_metrics(group);
    }
}

/// Wire the collaborators into the metrics subsystem and register every
/// metric group and collector with `registrar`.
pub fn setup_metrics(
    informers: Informers,
    stores: Stores,
    cluster_config: SharedClusterConfig,
    client: SharedClient,
    registrar: &dyn Registrar,
) -> Result<ControllerMetrics, Error> {
    ControllerMetrics::builder()
        .informers(informers)
        .stores(stores)
        .cluster_config(cluster_config)
        .client(client)
        .register(registrar)
}

/// Every metric registered with `registrar`.
pub fn list_metrics(registrar: &dyn Registrar) -> Vec<MetricDescriptor> {
    registrar.list_metrics()
}
