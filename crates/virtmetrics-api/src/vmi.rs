//! Virtual machine instances.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::meta::ObjectMeta;

/// Lifecycle phase of a virtual machine instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VmiPhase {
    /// Phase not yet set by the controller.
    #[default]
    #[serde(rename = "")]
    Unset,
    /// Accepted, waiting for scheduling.
    Pending,
    /// Launcher pod is being scheduled.
    Scheduling,
    /// Launcher pod was scheduled to a node.
    Scheduled,
    /// Guest is running.
    Running,
    /// Guest shut down successfully.
    Succeeded,
    /// Guest failed.
    Failed,
    /// State could not be determined.
    Unknown,
}

impl VmiPhase {
    /// All phases, in lifecycle order.
    pub const ALL: [VmiPhase; 8] = [
        VmiPhase::Unset,
        VmiPhase::Pending,
        VmiPhase::Scheduling,
        VmiPhase::Scheduled,
        VmiPhase::Running,
        VmiPhase::Succeeded,
        VmiPhase::Failed,
        VmiPhase::Unknown,
    ];

    /// Phase name as a lower-case metric label value.
    pub fn as_label(&self) -> &'static str {
        match self {
            VmiPhase::Unset => "",
            VmiPhase::Pending => "pending",
            VmiPhase::Scheduling => "scheduling",
            VmiPhase::Scheduled => "scheduled",
            VmiPhase::Running => "running",
            VmiPhase::Succeeded => "succeeded",
            VmiPhase::Failed => "failed",
            VmiPhase::Unknown => "unknown",
        }
    }

    /// Whether the instance has finished and will not change phase again.
    pub fn is_final(&self) -> bool {
        matches!(self, VmiPhase::Succeeded | VmiPhase::Failed)
    }
}

impl fmt::Display for VmiPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Record of when an instance entered a phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseTransitionTimestamp {
    /// Phase entered.
    pub phase: VmiPhase,
    /// When the phase was entered.
    #[serde(default)]
    pub phase_transition_timestamp: Option<DateTime<Utc>>,
}

/// Guest CPU topology.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Cpu {
    /// Cores per socket.
    pub cores: u32,
    /// Sockets.
    pub sockets: u32,
    /// Threads per core.
    pub threads: u32,
}

impl Cpu {
    /// Total vCPUs, treating unset dimensions as one.
    pub fn vcpus(&self) -> u32 {
        self.cores.max(1) * self.sockets.max(1) * self.threads.max(1)
    }
}

/// Guest memory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Memory {
    /// Memory visible to the guest, as a resource quantity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest: Option<String>,
}

/// Machine settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Machine {
    /// Emulated machine type, such as `q35`.
    #[serde(rename = "type")]
    pub machine_type: String,
}

/// Compute resource requests and limits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceRequirements {
    /// Requested resources by name (`cpu`, `memory`).
    pub requests: BTreeMap<String, String>,
    /// Resource limits by name.
    pub limits: BTreeMap<String, String>,
}

/// Domain (guest hardware) specification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DomainSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu: Option<Cpu>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<Memory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub machine: Option<Machine>,
    pub resources: ResourceRequirements,
}

/// A volume attached to the instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Volume {
    /// Volume name inside the domain.
    pub name: String,
    /// Backing persistent volume claim, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistent_volume_claim: Option<String>,
    /// Backing data volume, if any. Data volumes are served by a claim of the same name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_volume: Option<String>,
}

impl Volume {
    /// Name of the claim backing this volume.
    pub fn claim_name(&self) -> Option<&str> {
        self.persistent_volume_claim
            .as_deref()
            .or(self.data_volume.as_deref())
    }
}

/// What to do with the instance when its node is drained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvictionStrategy {
    None,
    LiveMigrate,
    LiveMigrateIfPossible,
    External,
}

/// Instance specification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VirtualMachineInstanceSpec {
    pub domain: DomainSpec,
    pub volumes: Vec<Volume>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eviction_strategy: Option<EvictionStrategy>,
    /// CPU architecture; empty means the cluster default.
    pub architecture: String,
}

/// Guest operating system details reported by the guest agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GuestOsInfo {
    pub name: String,
    pub version_id: String,
    pub kernel_release: String,
    pub machine: String,
}

/// A status condition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VirtualMachineInstanceCondition {
    /// Condition type, such as `Ready` or `LiveMigratable`.
    #[serde(rename = "type")]
    pub condition_type: String,
    /// `True`, `False` or `Unknown`.
    pub status: String,
    pub reason: String,
}

/// Condition type reporting whether the instance can be live migrated.
pub const LIVE_MIGRATABLE_CONDITION: &str = "LiveMigratable";

/// Instance status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VirtualMachineInstanceStatus {
    pub phase: VmiPhase,
    pub node_name: String,
    pub phase_transition_timestamps: Vec<PhaseTransitionTimestamp>,
    pub guest_os_info: GuestOsInfo,
    pub conditions: Vec<VirtualMachineInstanceCondition>,
    /// Image of the launcher container running the guest.
    pub launcher_container_image_version: String,
}

/// A running (or about to run) virtual machine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VirtualMachineInstance {
    pub metadata: ObjectMeta,
    pub spec: VirtualMachineInstanceSpec,
    pub status: VirtualMachineInstanceStatus,
}

impl VirtualMachineInstance {
    /// Create an instance in the given phase.
    pub fn new(metadata: ObjectMeta, phase: VmiPhase) -> Self {
        Self {
            metadata,
            status: VirtualMachineInstanceStatus {
                phase,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Record that the instance entered `phase` at `at`.
    pub fn with_phase_transition(mut self, phase: VmiPhase, at: DateTime<Utc>) -> Self {
        self.status
            .phase_transition_timestamps
            .push(PhaseTransitionTimestamp {
                phase,
                phase_transition_timestamp: Some(at),
            });
        self
    }

    /// When the instance entered `phase`, if recorded.
    pub fn phase_transition_time(&self, phase: VmiPhase) -> Option<DateTime<Utc>> {
        self.status
            .phase_transition_timestamps
            .iter()
            .find(|t| t.phase == phase)
            .and_then(|t| t.phase_transition_timestamp)
    }

    /// Look up a status condition by type.
    pub fn condition(&self, condition_type: &str) -> Option<&VirtualMachineInstanceCondition> {
        self.status
            .conditions
            .iter()
            .find(|c| c.condition_type == condition_type)
    }

    /// Whether the `LiveMigratable` condition is explicitly false.
    pub fn is_not_migratable(&self) -> bool {
        self.condition(LIVE_MIGRATABLE_CONDITION)
            .map(|c| c.status == "False")
            .unwrap_or(false)
    }
}
