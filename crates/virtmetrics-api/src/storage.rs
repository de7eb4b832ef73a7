//! Persistent volume claims.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::meta::ObjectMeta;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistentVolumeClaimSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_class_name: Option<String>,
    /// `Filesystem` or `Block`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_mode: Option<String>,
    pub access_modes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistentVolumeClaimStatus {
    /// `Pending`, `Bound` or `Lost`.
    pub phase: String,
    /// Provisioned capacity by resource name (`storage`).
    pub capacity: BTreeMap<String, String>,
}

/// A claim for persistent storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistentVolumeClaim {
    pub metadata: ObjectMeta,
    pub spec: PersistentVolumeClaimSpec,
    pub status: PersistentVolumeClaimStatus,
}

impl PersistentVolumeClaim {
    /// Create a bound claim with the given storage capacity.
    pub fn bound(metadata: ObjectMeta, capacity: impl Into<String>) -> Self {
        let mut status = PersistentVolumeClaimStatus {
            phase: "Bound".to_string(),
            ..Default::default()
        };
        status.capacity.insert("storage".to_string(), capacity.into());
        Self {
            metadata,
            spec: PersistentVolumeClaimSpec::default(),
            status,
        }
    }

    /// Provisioned storage capacity, as a resource quantity.
    pub fn storage_capacity(&self) -> Option<&str> {
        self.status.capacity.get("storage").map(String::as_str)
    }

    /// Volume mode, defaulting to `Filesystem`.
    pub fn volume_mode(&self) -> &str {
        self.spec.volume_mode.as_deref().unwrap_or("Filesystem")
    }
}
