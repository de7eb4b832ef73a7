//! Virtualization object model.
//!
//! This crate defines the cluster objects the metrics collectors read from
//! their caches. The types mirror the JSON shape served by the orchestration
//! API (camelCase fields) so that cache contents can be loaded with serde.
//!
//! # Modules
//!
//! - [`meta`] - Object metadata and cache keys
//! - [`vm`] - Virtual machines
//! - [`vmi`] - Virtual machine instances and their phases
//! - [`migration`] - Live migrations
//! - [`storage`] - Persistent volume claims
//! - [`pod`] - Pods
//! - [`snapshot`] - Virtual machine snapshots
//! - [`instancetype`] - Instance types, preferences and revision history
//! - [`quantity`] - Resource quantity parsing

pub mod error;
pub mod instancetype;
pub mod meta;
pub mod migration;
pub mod pod;
pub mod quantity;
pub mod snapshot;
pub mod storage;
pub mod vm;
pub mod vmi;

pub use error::Error;

pub use instancetype::{
    ControllerRevision, CpuInstancetype, CpuPreferences, InstancetypeSpec, MachinePreferences,
    MemoryInstancetype, PreferenceSpec, PreferredCpuTopology, VirtualMachineClusterInstancetype,
    VirtualMachineClusterPreference, VirtualMachineInstancetype, VirtualMachinePreference,
};
pub use meta::{ObjectMeta, Resource};
pub use migration::{
    MigrationPhase, MigrationPhaseTransitionTimestamp, VirtualMachineInstanceMigration,
    VirtualMachineInstanceMigrationSpec, VirtualMachineInstanceMigrationStatus,
};
pub use pod::{Container, Pod, PodPhase, PodSpec, PodStatus};
pub use quantity::parse_quantity;
pub use snapshot::{SnapshotPhase, VirtualMachineSnapshot, VirtualMachineSnapshotSpec, VirtualMachineSnapshotStatus};
pub use storage::{PersistentVolumeClaim, PersistentVolumeClaimSpec, PersistentVolumeClaimStatus};
pub use vm::{
    DataVolumeTemplate, InstancetypeMatcher, PreferenceMatcher, PrintableStatus, RunStrategy,
    VirtualMachine, VirtualMachineSpec, VirtualMachineStatus, VirtualMachineTemplate,
};
pub use vmi::{
    Cpu, DomainSpec, EvictionStrategy, GuestOsInfo, Machine, Memory, PhaseTransitionTimestamp,
    ResourceRequirements, VirtualMachineInstance, VirtualMachineInstanceCondition,
    VirtualMachineInstanceSpec, VirtualMachineInstanceStatus, VmiPhase, Volume,
    LIVE_MIGRATABLE_CONDITION,
};

/// API group of the virtualization resources.
pub const API_GROUP: &str = "kubevirt.io";

/// Annotation carrying the guest operating system of a VM template.
pub const OS_ANNOTATION: &str = "vm.kubevirt.io/os";

/// Annotation carrying the workload profile of a VM template.
pub const WORKLOAD_ANNOTATION: &str = "vm.kubevirt.io/workload";

/// Annotation carrying the flavor of a VM template.
pub const FLAVOR_ANNOTATION: &str = "vm.kubevirt.io/flavor";

/// Label set on VMIs created from a namespaced instance type.
pub const INSTANCETYPE_NAME_LABEL: &str = "instancetype.kubevirt.io/instancetype";

/// Label set on VMIs created from a cluster-scoped instance type.
pub const CLUSTER_INSTANCETYPE_NAME_LABEL: &str = "instancetype.kubevirt.io/cluster-instancetype";

/// Label set on VMIs created with a namespaced preference.
pub const PREFERENCE_NAME_LABEL: &str = "instancetype.kubevirt.io/preference";

/// Label set on VMIs created with a cluster-scoped preference.
pub const CLUSTER_PREFERENCE_NAME_LABEL: &str = "instancetype.kubevirt.io/cluster-preference";

/// Label identifying the component a KubeVirt pod belongs to.
pub const COMPONENT_LABEL: &str = "kubevirt.io";
