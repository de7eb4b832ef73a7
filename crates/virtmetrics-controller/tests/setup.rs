//! End-to-end registration and scrape tests against a real registry.

use std::sync::Arc;

use chrono::{TimeDelta, TimeZone, Utc};
use virtmetrics_api::{
    MigrationPhase, ObjectMeta, SnapshotPhase, VirtualMachineInstance,
    VirtualMachineInstanceMigration, VirtualMachineSnapshot, VirtualMachineSnapshotSpec,
    VirtualMachineSnapshotStatus, VmiPhase,
};
use virtmetrics_controller::{
    setup_metrics, ClusterConfig, ClusterConfigSpec, InMemoryStore, Informers, OfflineClient,
    Stores,
};
use virtmetrics_core::{MetricsRegistry, Registrar};

fn setup(informers: Informers) -> (MetricsRegistry, virtmetrics_controller::ControllerMetrics) {
    let registry = MetricsRegistry::new();
    let config = Arc::new(ClusterConfig::new(
        ClusterConfigSpec::default().with_default_architecture("arm64"),
    ));
    let metrics = setup_metrics(
        informers,
        Stores::empty(),
        config,
        Arc::new(OfflineClient),
        &registry,
    )
    .unwrap();
    (registry, metrics)
}

#[test]
fn test_scrape_after_setup() {
    let mut informers = Informers::empty();
    let mut vmi = VirtualMachineInstance::new(ObjectMeta::namespaced("default", "vmi-a"), VmiPhase::Running);
    vmi.status.node_name = "node-1".to_string();
    informers.vmi = InMemoryStore::with_objects(vec![vmi]).shared();

    let (registry, metrics) = setup(informers);
    metrics.component().set_ready(true);
    metrics.workqueue().add("vmi");

    let text = registry.to_prometheus();
    assert!(text.contains("kubevirt_virt_controller_ready_status 1"));
    assert!(text.contains("kubevirt_workqueue_adds_total{name=\"vmi\"} 1"));
    assert!(text.contains("kubevirt_vmi_migrations_in_pending_phase 0"));
    assert!(text.contains("kubevirt_vmi_phase_count{"));
    assert!(text.contains("arch=\"arm64\""));
}

#[test]
fn test_list_metrics_is_sorted_and_complete() {
    let (registry, metrics) = setup(Informers::empty());
    let before = virtmetrics_controller::list_metrics(&registry);
    let names: Vec<&str> = before.iter().map(|m| m.name.as_str()).collect();
    let mut sorted = names.clone();
    sorted.sort_unstable();
    assert_eq!(names, sorted);
    assert!(names.contains(&"kubevirt_vm_resource_requests"));

    metrics.register_leader_metrics(&registry).unwrap();
    assert_eq!(registry.list_metrics().len(), before.len() + 1);
}

#[test]
fn test_migration_transitions_and_informer_swap() {
    let (registry, metrics) = setup(Informers::empty());
    let created = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
    let meta = ObjectMeta::namespaced("default", "mig-1").with_creation_timestamp(created);

    let pending = VirtualMachineInstanceMigration::new(meta.clone(), "vmi-a", MigrationPhase::Pending)
        .with_phase_transition(MigrationPhase::Pending, created + TimeDelta::seconds(1));
    let running = VirtualMachineInstanceMigration::new(meta, "vmi-a", MigrationPhase::Running)
        .with_phase_transition(MigrationPhase::Pending, created + TimeDelta::seconds(1))
        .with_phase_transition(MigrationPhase::Running, created + TimeDelta::seconds(12));

    metrics.observe_migration_update(None, &pending);
    metrics.observe_migration_update(Some(&pending), &running);
    assert_eq!(metrics.migration().from_creation().sample_count(&["Running"]), Some(1));

    metrics
        .context()
        .update_vmi_migration_informer(InMemoryStore::with_objects(vec![running]).shared());
    let text = registry.to_prometheus();
    assert!(text.contains("kubevirt_vmi_migrations_in_running_phase 1"));
    assert!(text.contains(
        "kubevirt_vmi_migration_phase_transition_time_from_creation_seconds_bucket{phase=\"Running\",le=\"20\"} 1"
    ));
}

#[test]
fn test_snapshot_succeeded_timestamp() {
    let (registry, metrics) = setup(Informers::empty());
    let created = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    let snapshot = VirtualMachineSnapshot {
        metadata: ObjectMeta::namespaced("default", "snap-1"),
        spec: VirtualMachineSnapshotSpec {
            source_name: "vm-a".to_string(),
        },
        status: VirtualMachineSnapshotStatus {
            phase: SnapshotPhase::Succeeded,
            creation_time: Some(created),
        },
    };
    metrics.observe_snapshot_update(&snapshot);

    let text = registry.to_prometheus();
    assert!(text.contains(
        "kubevirt_vmsnapshot_succeeded_timestamp_seconds{name=\"vm-a\",namespace=\"default\",snapshot_name=\"snap-1\"} 1717200000"
    ));
}
