//! Instance types, preferences and their revision history.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::meta::ObjectMeta;

/// Guest CPU provided by an instance type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CpuInstancetype {
    /// Number of vCPUs exposed to the guest.
    pub guest: u32,
}

/// Guest memory provided by an instance type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MemoryInstancetype {
    /// Guest memory as a resource quantity.
    pub guest: String,
}

/// Resources an instance type provides to a VM.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InstancetypeSpec {
    pub cpu: CpuInstancetype,
    pub memory: MemoryInstancetype,
}

/// Preferred layout of guest vCPUs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PreferredCpuTopology {
    Sockets,
    Cores,
    Threads,
    Spread,
    Any,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CpuPreferences {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_cpu_topology: Option<PreferredCpuTopology>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MachinePreferences {
    pub preferred_machine_type: String,
}

/// Defaults a preference fills into a VM when the VM leaves them unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreferenceSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu: Option<CpuPreferences>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub machine: Option<MachinePreferences>,
}

/// Namespaced instance type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VirtualMachineInstancetype {
    pub metadata: ObjectMeta,
    pub spec: InstancetypeSpec,
}

/// Cluster-scoped instance type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VirtualMachineClusterInstancetype {
    pub metadata: ObjectMeta,
    pub spec: InstancetypeSpec,
}

/// Namespaced preference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VirtualMachinePreference {
    pub metadata: ObjectMeta,
    pub spec: PreferenceSpec,
}

/// Cluster-scoped preference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VirtualMachineClusterPreference {
    pub metadata: ObjectMeta,
    pub spec: PreferenceSpec,
}

/// Immutable snapshot of an object, kept so a running VM is not affected by
/// later edits to its instance type or preference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ControllerRevision {
    pub metadata: ObjectMeta,
    /// Serialized object.
    pub data: serde_json::Value,
    /// Revision number.
    pub revision: i64,
}

/// Wrapper used to pull just the `spec` out of a stored object.
#[derive(Deserialize)]
struct SpecOnly<T> {
    spec: T,
}

impl ControllerRevision {
    /// Create a revision holding `object`.
    pub fn new<T: Serialize>(metadata: ObjectMeta, object: &T, revision: i64) -> Result<Self, Error> {
        Ok(Self {
            metadata,
            data: serde_json::to_value(object)?,
            revision,
        })
    }

    /// Decode the `spec` of the stored object.
    pub fn decode_spec<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let wrapper: SpecOnly<T> = serde_json::from_value(self.data.clone())?;
        Ok(wrapper.spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revision_decode_spec() {
        let instancetype = VirtualMachineClusterInstancetype {
            metadata: ObjectMeta::cluster("u1.medium"),
            spec: InstancetypeSpec {
                cpu: CpuInstancetype { guest: 2 },
                memory: MemoryInstancetype {
                    guest: "4Gi".to_string(),
                },
            },
        };
        let revision =
            ControllerRevision::new(ObjectMeta::namespaced("ns", "rev-1"), &instancetype, 1)
                .unwrap();

        let spec: InstancetypeSpec = revision.decode_spec().unwrap();
        assert_eq!(spec, instancetype.spec);
    }

    #[test]
    fn test_revision_decode_spec_rejects_wrong_shape() {
        let revision = ControllerRevision {
            metadata: ObjectMeta::namespaced("ns", "rev-1"),
            data: serde_json::json!({"spec": {"cpu": {"guest": "two"}}}),
            revision: 1,
        };
        assert!(revision.decode_spec::<InstancetypeSpec>().is_err());
    }
}
