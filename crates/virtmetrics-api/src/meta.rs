//! Object metadata shared by every cluster object.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Standard object metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectMeta {
    /// Object name, unique within its namespace.
    pub name: String,
    /// Namespace, absent for cluster-scoped objects.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Cluster-assigned unique id.
    pub uid: String,
    /// Identifying labels.
    pub labels: BTreeMap<String, String>,
    /// Non-identifying annotations.
    pub annotations: BTreeMap<String, String>,
    /// When the object was created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<DateTime<Utc>>,
    /// When deletion of the object was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deletion_timestamp: Option<DateTime<Utc>>,
}

impl ObjectMeta {
    /// Create metadata for a namespaced object.
    pub fn namespaced(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: Some(namespace.into()),
            ..Default::default()
        }
    }

    /// Create metadata for a cluster-scoped object.
    pub fn cluster(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the creation timestamp.
    pub fn with_creation_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.creation_timestamp = Some(timestamp);
        self
    }

    /// Set the deletion timestamp.
    pub fn with_deletion_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.deletion_timestamp = Some(timestamp);
        self
    }

    /// Add a label.
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Add an annotation.
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    /// Namespace of the object, or the empty string when cluster-scoped.
    pub fn namespace_or_default(&self) -> &str {
        self.namespace.as_deref().unwrap_or("")
    }

    /// Cache key: `namespace/name`, or `name` for cluster-scoped objects.
    pub fn key(&self) -> String {
        object_key(self.namespace.as_deref(), &self.name)
    }
}

/// Build a cache key from an optional namespace and a name.
pub fn object_key(namespace: Option<&str>, name: &str) -> String {
    match namespace {
        Some(ns) if !ns.is_empty() => format!("{}/{}", ns, name),
        _ => name.to_string(),
    }
}

/// A cluster object kept in an object cache.
pub trait Resource: Clone + Send + Sync + 'static {
    /// Kind name as served by the API.
    const KIND: &'static str;

    /// Object metadata.
    fn meta(&self) -> &ObjectMeta;

    /// Cache key of this object.
    fn key(&self) -> String {
        self.meta().key()
    }
}

macro_rules! impl_resource {
    ($($ty:ty => $kind:literal),* $(,)?) => {
        $(
            impl $crate::meta::Resource for $ty {
                const KIND: &'static str = $kind;

                fn meta(&self) -> &$crate::meta::ObjectMeta {
                    &self.metadata
                }
            }
        )*
    };
}

impl_resource! {
    crate::vm::VirtualMachine => "VirtualMachine",
    crate::vmi::VirtualMachineInstance => "VirtualMachineInstance",
    crate::migration::VirtualMachineInstanceMigration => "VirtualMachineInstanceMigration",
    crate::storage::PersistentVolumeClaim => "PersistentVolumeClaim",
    crate::pod::Pod => "Pod",
    crate::snapshot::VirtualMachineSnapshot => "VirtualMachineSnapshot",
    crate::instancetype::VirtualMachineInstancetype => "VirtualMachineInstancetype",
    crate::instancetype::VirtualMachineClusterInstancetype => "VirtualMachineClusterInstancetype",
    crate::instancetype::VirtualMachinePreference => "VirtualMachinePreference",
    crate::instancetype::VirtualMachineClusterPreference => "VirtualMachineClusterPreference",
    crate::instancetype::ControllerRevision => "ControllerRevision",
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespaced_key() {
        let meta = ObjectMeta::namespaced("default", "vm-1");
        assert_eq!(meta.key(), "default/vm-1");
        assert_eq!(meta.namespace_or_default(), "default");
    }

    #[test]
    fn test_cluster_key() {
        let meta = ObjectMeta::cluster("u1.small");
        assert_eq!(meta.key(), "u1.small");
        assert_eq!(meta.namespace_or_default(), "");
    }

    #[test]
    fn test_empty_namespace_is_cluster_key() {
        assert_eq!(object_key(Some(""), "node-a"), "node-a");
    }

    #[test]
    fn test_deserialize_camel_case() {
        let meta: ObjectMeta = serde_json::from_str(
            r#"{"name":"vm","namespace":"ns","creationTimestamp":"2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(meta.key(), "ns/vm");
        assert!(meta.creation_timestamp.is_some());
        assert!(meta.deletion_timestamp.is_none());
    }
}
