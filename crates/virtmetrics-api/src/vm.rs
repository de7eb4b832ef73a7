//! Virtual machines.

use serde::{Deserialize, Serialize};

use crate::meta::ObjectMeta;
use crate::vmi::VirtualMachineInstanceSpec;

/// How the controller keeps the instance of a VM running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStrategy {
    Always,
    RerunOnFailure,
    Manual,
    Halted,
    Once,
}

/// Printable status summarising the VM state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrintableStatus {
    #[default]
    Stopped,
    Provisioning,
    Starting,
    Running,
    Paused,
    Stopping,
    Terminating,
    CrashLoopBackOff,
    Migrating,
    Unknown,
    ErrorUnschedulable,
    ErrImagePull,
    ImagePullBackOff,
    ErrorPvcNotFound,
    ErrorDataVolumeNotFound,
    DataVolumeError,
    WaitingForVolumeBinding,
    WaitingForReceiver,
}

impl PrintableStatus {
    /// Status name as served by the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            PrintableStatus::Stopped => "Stopped",
            PrintableStatus::Provisioning => "Provisioning",
            PrintableStatus::Starting => "Starting",
            PrintableStatus::Running => "Running",
            PrintableStatus::Paused => "Paused",
            PrintableStatus::Stopping => "Stopping",
            PrintableStatus::Terminating => "Terminating",
            PrintableStatus::CrashLoopBackOff => "CrashLoopBackOff",
            PrintableStatus::Migrating => "Migrating",
            PrintableStatus::Unknown => "Unknown",
            PrintableStatus::ErrorUnschedulable => "ErrorUnschedulable",
            PrintableStatus::ErrImagePull => "ErrImagePull",
            PrintableStatus::ImagePullBackOff => "ImagePullBackOff",
            PrintableStatus::ErrorPvcNotFound => "ErrorPvcNotFound",
            PrintableStatus::ErrorDataVolumeNotFound => "ErrorDataVolumeNotFound",
            PrintableStatus::DataVolumeError => "DataVolumeError",
            PrintableStatus::WaitingForVolumeBinding => "WaitingForVolumeBinding",
            PrintableStatus::WaitingForReceiver => "WaitingForReceiver",
        }
    }

    /// Coarse grouping of the status used as a low-cardinality metric label.
    pub fn group(&self) -> &'static str {
        match self {
            PrintableStatus::Running => "running",
            PrintableStatus::Provisioning
            | PrintableStatus::Starting
            | PrintableStatus::WaitingForVolumeBinding
            | PrintableStatus::WaitingForReceiver => "starting",
            PrintableStatus::Migrating => "migrating",
            PrintableStatus::Stopped
            | PrintableStatus::Paused
            | PrintableStatus::Stopping
            | PrintableStatus::Terminating
            | PrintableStatus::Unknown => "non_running",
            PrintableStatus::CrashLoopBackOff
            | PrintableStatus::ErrorUnschedulable
            | PrintableStatus::ErrImagePull
            | PrintableStatus::ImagePullBackOff
            | PrintableStatus::ErrorPvcNotFound
            | PrintableStatus::ErrorDataVolumeNotFound
            | PrintableStatus::DataVolumeError => "error",
        }
    }
}

/// Reference from a VM to its instance type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InstancetypeMatcher {
    /// Instance type name.
    pub name: String,
    /// `VirtualMachineInstancetype` or `VirtualMachineClusterInstancetype`.
    /// Empty means cluster-scoped.
    pub kind: String,
    /// Controller revision holding the snapshot the VM was started with.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision_name: Option<String>,
}

/// Reference from a VM to its preference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreferenceMatcher {
    /// Preference name.
    pub name: String,
    /// `VirtualMachinePreference` or `VirtualMachineClusterPreference`.
    /// Empty means cluster-scoped.
    pub kind: String,
    /// Controller revision holding the snapshot the VM was started with.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision_name: Option<String>,
}

/// Template the VM instance is created from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VirtualMachineTemplate {
    pub metadata: ObjectMeta,
    pub spec: VirtualMachineInstanceSpec,
}

/// Data volume created alongside the VM.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DataVolumeTemplate {
    pub metadata: ObjectMeta,
}

/// VM specification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VirtualMachineSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_strategy: Option<RunStrategy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instancetype: Option<InstancetypeMatcher>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preference: Option<PreferenceMatcher>,
    pub template: VirtualMachineTemplate,
    pub data_volume_templates: Vec<DataVolumeTemplate>,
}

/// VM status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VirtualMachineStatus {
    pub printable_status: PrintableStatus,
    pub created: bool,
    pub ready: bool,
}

/// A virtual machine definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VirtualMachine {
    pub metadata: ObjectMeta,
    pub spec: VirtualMachineSpec,
    pub status: VirtualMachineStatus,
}

impl VirtualMachine {
    /// Create a VM with the given metadata.
    pub fn new(metadata: ObjectMeta) -> Self {
        Self {
            metadata,
            ..Default::default()
        }
    }

    /// Set the instance type reference.
    pub fn with_instancetype(mut self, matcher: InstancetypeMatcher) -> Self {
        self.spec.instancetype = Some(matcher);
        self
    }

    /// Set the preference reference.
    pub fn with_preference(mut self, matcher: PreferenceMatcher) -> Self {
        self.spec.preference = Some(matcher);
        self
    }

    /// Set the printable status.
    pub fn with_status(mut self, status: PrintableStatus) -> Self {
        self.status.printable_status = status;
        self
    }

    /// Annotation on the VM template, falling back to the VM itself.
    pub fn template_annotation(&self, key: &str) -> Option<&str> {
        self.spec
            .template
            .metadata
            .annotations
            .get(key)
            .or_else(|| self.metadata.annotations.get(key))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_group() {
        assert_eq!(PrintableStatus::Running.group(), "running");
        assert_eq!(PrintableStatus::WaitingForVolumeBinding.group(), "starting");
        assert_eq!(PrintableStatus::Paused.group(), "non_running");
        assert_eq!(PrintableStatus::ErrImagePull.group(), "error");
        assert_eq!(PrintableStatus::Migrating.group(), "migrating");
    }

    #[test]
    fn test_template_annotation_fallback() {
        let mut vm = VirtualMachine::new(
            ObjectMeta::namespaced("ns", "vm").with_annotation(crate::OS_ANNOTATION, "fedora"),
        );
        assert_eq!(vm.template_annotation(crate::OS_ANNOTATION), Some("fedora"));

        vm.spec
            .template
            .metadata
            .annotations
            .insert(crate::OS_ANNOTATION.to_string(), "rhel9".to_string());
        assert_eq!(vm.template_annotation(crate::OS_ANNOTATION), Some("rhel9"));
    }

    #[test]
    fn test_deserialize_vm() {
        let vm: VirtualMachine = serde_json::from_str(
            r#"{
                "metadata": {"name": "vm", "namespace": "ns"},
                "spec": {
                    "runStrategy": "Always",
                    "instancetype": {"name": "u1.small", "kind": "VirtualMachineClusterInstancetype"}
                },
                "status": {"printableStatus": "Running", "created": true, "ready": true}
            }"#,
        )
        .unwrap();
        assert_eq!(vm.spec.run_strategy, Some(RunStrategy::Always));
        assert_eq!(vm.spec.instancetype.unwrap().name, "u1.small");
        assert_eq!(vm.status.printable_status, PrintableStatus::Running);
    }
}
