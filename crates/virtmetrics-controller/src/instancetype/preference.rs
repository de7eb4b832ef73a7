//! Preference lookup.

use virtmetrics_api::meta::object_key;
use virtmetrics_api::{
    ControllerRevision, PreferenceSpec, VirtualMachine, VirtualMachineClusterPreference,
    VirtualMachinePreference,
};

use super::{find_revision, lookup, Scope};
use crate::cache::{SharedStore, Stores};
use crate::client::SharedClient;
use crate::error::Error;

const NAMESPACED_KIND: &str = "VirtualMachinePreference";
const CLUSTER_KIND: &str = "VirtualMachineClusterPreference";

/// Resolves the preference spec a VM references.
pub struct PreferenceSpecFinder {
    preference_store: SharedStore<VirtualMachinePreference>,
    cluster_preference_store: SharedStore<VirtualMachineClusterPreference>,
    revision_store: SharedStore<ControllerRevision>,
    client: SharedClient,
}

impl PreferenceSpecFinder {
    pub fn new(stores: &Stores, client: SharedClient) -> Self {
        Self {
            preference_store: stores.preference.clone(),
            cluster_preference_store: stores.cluster_preference.clone(),
            revision_store: stores.controller_revision.clone(),
            client,
        }
    }

    /// The preference spec of `vm`, or `None` when it references none.
    pub fn find(&self, vm: &VirtualMachine) -> Result<Option<PreferenceSpec>, Error> {
        let Some(matcher) = &vm.spec.preference else {
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
        let spec = match Scope::of("preference", &matcher.kind, NAMESPACED_KIND, CLUSTER_KIND)? {
            Scope::Namespaced => {
                lookup(
                    self.preference_store.as_ref(),
                    &object_key(Some(namespace), name),
                    || self.client.get_preference(namespace, name),
                )?
                .spec
            }
            Scope::Cluster => {
                lookup(self.cluster_preference_store.as_ref(), name, || {
                    self.client.get_cluster_preference(name)
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

    use virtmetrics_api::{
        CpuPreferences, MachinePreferences, ObjectMeta, PreferenceMatcher, PreferredCpuTopology,
    };

    use crate::cache::InMemoryStore;
    use crate::client::{ClientError, OfflineClient, VirtClient};

    fn spec(machine: &str) -> PreferenceSpec {
        PreferenceSpec {
            cpu: Some(CpuPreferences {
                preferred_cpu_topology: Some(PreferredCpuTopology::Cores),
            }),
            machine: Some(MachinePreferences {
                preferred_machine_type: machine.to_string(),
            }),
        }
    }

    fn vm(kind: &str, name: &str) -> VirtualMachine {
        VirtualMachine::new(ObjectMeta::namespaced("team-a", "vm-a")).with_preference(
            PreferenceMatcher {
                name: name.to_string(),
                kind: kind.to_string(),
                revision_name: None,
            },
        )
    }

    /// Serves one cluster preference from the API.
    struct ApiWithPreference;

    impl VirtClient for ApiWithPreference {
        fn host(&self) -> &str {
            "api"
        }

        fn get_instancetype(
            &self,
            namespace: &str,
            name: &str,
        ) -> Result<virtmetrics_api::VirtualMachineInstancetype, ClientError> {
            OfflineClient.get_instancetype(namespace, name)
        }

        fn get_cluster_instancetype(
            &self,
            name: &str,
        ) -> Result<virtmetrics_api::VirtualMachineClusterInstancetype, ClientError> {
            OfflineClient.get_cluster_instancetype(name)
        }

        fn get_preference(
            &self,
            namespace: &str,
            name: &str,
        ) -> Result<VirtualMachinePreference, ClientError> {
            OfflineClient.get_preference(namespace, name)
        }

        fn get_cluster_preference(
            &self,
            name: &str,
        ) -> Result<VirtualMachineClusterPreference, ClientError> {
            if name == "windows" {
                return Ok(VirtualMachineClusterPreference {
                    metadata: ObjectMeta::cluster("windows"),
                    spec: spec("pc-q35-rhel9"),
                });
            }
            OfflineClient.get_cluster_preference(name)
        }

        fn get_controller_revision(
            &self,
            namespace: &str,
            name: &str,
        ) -> Result<ControllerRevision, ClientError> {
            OfflineClient.get_controller_revision(namespace, name)
        }
    }

    #[test]
    fn test_cache_hit() {
        let mut stores = Stores::empty();
        stores.preference = InMemoryStore::with_objects(vec![VirtualMachinePreference {
            metadata: ObjectMeta::namespaced("team-a", "linux"),
            spec: spec("q35"),
        }])
        .shared();
        let finder = PreferenceSpecFinder::new(&stores, Arc::new(OfflineClient));

        let found = finder.find(&vm("VirtualMachinePreference", "linux")).unwrap();
        assert_eq!(found, Some(spec("q35")));
    }

    #[test]
    fn test_client_fallback() {
        let finder = PreferenceSpecFinder::new(&Stores::empty(), Arc::new(ApiWithPreference));
        let found = finder.find(&vm("VirtualMachineClusterPreference", "windows")).unwrap();
        assert_eq!(found, Some(spec("pc-q35-rhel9")));

        let err = finder.find(&vm("", "solaris")).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_unsupported_kind() {
        let finder = PreferenceSpecFinder::new(&Stores::empty(), Arc::new(OfflineClient));
        let err = finder.find(&vm("VirtualMachineInstancetype", "linux")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedKind { matcher: "preference", .. }));
    }
}
