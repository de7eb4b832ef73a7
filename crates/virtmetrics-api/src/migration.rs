//! Live migrations of virtual machine instances.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::meta::ObjectMeta;

/// Phase of a migration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MigrationPhase {
    #[default]
    #[serde(rename = "")]
    Unset,
    Pending,
    Scheduling,
    Scheduled,
    PreparingTarget,
    TargetReady,
    Running,
    Succeeded,
    Failed,
}

impl MigrationPhase {
    /// Phase name as served by the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            MigrationPhase::Unset => "",
            MigrationPhase::Pending => "Pending",
            MigrationPhase::Scheduling => "Scheduling",
            MigrationPhase::Scheduled => "Scheduled",
            MigrationPhase::PreparingTarget => "PreparingTarget",
            MigrationPhase::TargetReady => "TargetReady",
            MigrationPhase::Running => "Running",
            MigrationPhase::Succeeded => "Succeeded",
            MigrationPhase::Failed => "Failed",
        }
    }

    /// Whether the migration has finished.
    pub fn is_final(&self) -> bool {
        matches!(self, MigrationPhase::Succeeded | MigrationPhase::Failed)
    }
}

impl fmt::Display for MigrationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record of when a migration entered a phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationPhaseTransitionTimestamp {
    pub phase: MigrationPhase,
    #[serde(default)]
    pub phase_transition_timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VirtualMachineInstanceMigrationSpec {
    /// Name of the instance being migrated, in the migration's namespace.
    pub vmi_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VirtualMachineInstanceMigrationStatus {
    pub phase: MigrationPhase,
    pub phase_transition_timestamps: Vec<MigrationPhaseTransitionTimestamp>,
}

/// A request to live migrate an instance to another node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VirtualMachineInstanceMigration {
    pub metadata: ObjectMeta,
    pub spec: VirtualMachineInstanceMigrationSpec,
    pub status: VirtualMachineInstanceMigrationStatus,
}

impl VirtualMachineInstanceMigration {
    /// Create a migration of `vmi_name` in the given phase.
    pub fn new(metadata: ObjectMeta, vmi_name: impl Into<String>, phase: MigrationPhase) -> Self {
        Self {
            metadata,
            spec: VirtualMachineInstanceMigrationSpec {
                vmi_name: vmi_name.into(),
            },
            status: VirtualMachineInstanceMigrationStatus {
                phase,
                ..Default::default()
            },
        }
    }

    /// Record that the migration entered `phase` at `at`.
    pub fn with_phase_transition(mut self, phase: MigrationPhase, at: DateTime<Utc>) -> Self {
        self.status
            .phase_transition_timestamps
            .push(MigrationPhaseTransitionTimestamp {
                phase,
                phase_transition_timestamp: Some(at),
            });
        self
    }

    /// When the migration entered `phase`, if recorded.
    pub fn phase_transition_time(&self, phase: MigrationPhase) -> Option<DateTime<Utc>> {
        self.status
            .phase_transition_timestamps
            .iter()
            .find(|t| t.phase == phase)
            .and_then(|t| t.phase_transition_timestamp)
    }
}
