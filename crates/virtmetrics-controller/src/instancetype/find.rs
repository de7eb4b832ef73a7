//! Instance type lookup.

use virtmetrics_api::meta::object_key;
use virtmetrics_api::{
    ControllerRevision, InstancetypeSpec, VirtualMachine, VirtualMachineClusterInstancetype,
    VirtualMachineInstancetype,
};

use super::{find_revision, lookup, Scope};
use crate::cache::{SharedStore, Stores};
use crate::client::SharedClient;
use crate::error::Error;

const NAMESPACED_KIND: &str = "VirtualMachineInstancetype";
const CLUSTER_KIND: &str = "VirtualMachineClusterInstancetype";

/// Resolves the instance type spec a VM references.
pub struct InstancetypeSpecFinder {
    instancetype_store: SharedStore<VirtualMachineInstancetype>,
    cluster_instancetype_store: SharedStore<VirtualMachineClusterInstancetype>,
    revision_store: SharedStore<ControllerRevision>,
    client: SharedClient,
}

impl InstancetypeSpecFinder {
    pub fn new(stores: &Stores, client: SharedClient) -> Self {
        Self {
            instancetype_store: stores.instancetype.clone(),
            cluster_instancetype_store: stores.cluster_instancetype.clone(),
            revision_store: stores.controller_revision.clone(),
            client,
        }
    }

    /// The instance type spec of `vm`, or `None` when it references none.
    pub fn find(&self, vm: &VirtualMachine) -> Result<Option<InstancetypeSpec>, Error> {
        let Some(matcher) = &vm.spec.instancetype else {
            return Ok(None);
        };
        let namespace = vm.metadata.namespace_or_default();

        if let Some(revision_name) = matcher.revision_name.as_deref().filter(|r| !r.is_empty()) {
            let revision = find_revision(
                self.revision_store.as_ref(),
                self.client.as_ref(),
                namespace,
                revision_name,
            )?;
            return Ok(Some(revision.decode_spec()?));
        }

        let name = matcher.name.as_str();
        let spec = match Scope::of("instancetype", &matcher.kind, NAMESPACED_KIND, CLUSTER_KIND)? {
            Scope::Namespaced => {
                lookup(
                    self.instancetype_store.as_ref(),
                    &object_key(Some(namespace), name),
                    || self.client.get_instancetype(namespace, name),
                )?
                .spec
            }
            Scope::Cluster => {
                lookup(self.cluster_instancetype_store.as_ref(), name, || {
                    self.client.get_cluster_instancetype(name)
                })?
                .spec
            }
        };
        Ok(Some(spec))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use virtmetrics_api::{CpuInstancetype, InstancetypeMatcher, MemoryInstancetype, ObjectMeta};

    use crate::cache::InMemoryStore;
    use crate::client::OfflineClient;

    fn spec(guest: u32, memory: &str) -> InstancetypeSpec {
        InstancetypeSpec {
            cpu: CpuInstancetype { guest },
            memory: MemoryInstancetype {
                guest: memory.to_string(),
            },
        }
    }

    fn stores() -> Stores {
        let mut stores = Stores::empty();
        stores.instancetype = InMemoryStore::with_objects(vec![VirtualMachineInstancetype {
            metadata: ObjectMeta::namespaced("team-a", "small"),
            spec: spec(1, "1Gi"),
        }])
        .shared();
        stores.cluster_instancetype =
            InMemoryStore::with_objects(vec![VirtualMachineClusterInstancetype {
                metadata: ObjectMeta::cluster("large"),
                spec: spec(8, "32Gi"),
            }])
            .shared();

        let snapshot = VirtualMachineClusterInstancetype {
            metadata: ObjectMeta::cluster("large"),
            spec: spec(4, "16Gi"),
        };
        stores.controller_revision = InMemoryStore::with_objects(vec![ControllerRevision::new(
            ObjectMeta::namespaced("team-a", "vm-a-large-1"),
            &snapshot,
            1,
        )
        .unwrap()])
        .shared();
        stores
    }

    fn finder() -> InstancetypeSpecFinder {
        InstancetypeSpecFinder::new(&stores(), Arc::new(OfflineClient))
    }

    fn vm(kind: &str, name: &str, revision: Option<&str>) -> VirtualMachine {
        VirtualMachine::new(ObjectMeta::namespaced("team-a", "vm-a")).with_instancetype(
            InstancetypeMatcher {
                name: name.to_string(),
                kind: kind.to_string(),
                revision_name: revision.map(str::to_string),
            },
        )
    }

    #[test]
    fn test_no_matcher() {
        let plain = VirtualMachine::new(ObjectMeta::namespaced("team-a", "vm-a"));
        assert_eq!(finder().find(&plain).unwrap(), None);
    }

    #[test]
    fn test_namespaced_and_cluster_lookup() {
        let found = finder().find(&vm("VirtualMachineInstancetype", "small", None)).unwrap();
        assert_eq!(found, Some(spec(1, "1Gi")));

        let found = finder().find(&vm("", "large", None)).unwrap();
        assert_eq!(found, Some(spec(8, "32Gi")));
    }

    #[test]
    fn test_revision_takes_precedence() {
        let found = finder().find(&vm("", "large", Some("vm-a-large-1"))).unwrap();
        assert_eq!(found, Some(spec(4, "16Gi")));
    }

    #[test]
    fn test_miss_everywhere_is_not_found() {
        let err = finder().find(&vm("VirtualMachineInstancetype", "medium", None)).unwrap_err();
        assert!(matches!(err, Error::NotFound { kind: "VirtualMachineInstancetype", .. }));

        let err = finder().find(&vm("", "large", Some("missing-rev"))).unwrap_err();
        assert!(matches!(err, Error::NotFound { kind: "ControllerRevision", .. }));
    }
}
