//! Virtual machine snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::meta::ObjectMeta;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnapshotPhase {
    #[default]
    #[serde(rename = "")]
    Unset,
    InProgress,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VirtualMachineSnapshotSpec {
    /// Name of the VM being snapshotted, in the snapshot's namespace.
    pub source_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VirtualMachineSnapshotStatus {
    pub phase: SnapshotPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_time: Option<DateTime<Utc>>,
}

/// A point-in-time snapshot of a VM.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VirtualMachineSnapshot {
    pub metadata: ObjectMeta,
    pub spec: VirtualMachineSnapshotSpec,
    pub status: VirtualMachineSnapshotStatus,
}
