//! Instance type and preference resolution.
//!
//! A VM may reference an instance type (guest resources) and a preference
//! (defaults for unset VM settings). Both are resolved from the caches first
//! and from the API on a miss. A matcher carrying a revision name resolves to
//! the snapshot stored in that controller revision instead of the live object.

mod apply;
mod find;
mod preference;

pub use apply::{VmApplier, VmApplyHandler};
pub use find::InstancetypeSpecFinder;
pub use preference::PreferenceSpecFinder;

use virtmetrics_api::meta::object_key;
use virtmetrics_api::ControllerRevision;

use crate::cache::ObjectStore;
use crate::client::{ClientError, VirtClient};
use crate::error::Error;

/// Whether a matcher selects a namespaced or a cluster-scoped object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scope {
    Namespaced,
    Cluster,
}

impl Scope {
    /// Resolve a matcher kind. An empty kind selects the cluster-scoped object.
    pub(crate) fn of(
        matcher: &'static str,
        kind: &str,
        namespaced: &str,
        cluster: &str,
    ) -> Result<Self, Error> {
        if kind.is_empty() || kind.eq_ignore_ascii_case(cluster) {
            Ok(Scope::Cluster)
        } else if kind.eq_ignore_ascii_case(namespaced) {
            Ok(Scope::Namespaced)
        } else {
            Err(Error::UnsupportedKind {
                matcher,
                kind: kind.to_string(),
            })
        }
    }
}

/// Look `key` up in `store`, falling back to `fetch` on a miss.
pub(crate) fn lookup<T>(
    store: &dyn ObjectStore<T>,
    key: &str,
    fetch: impl FnOnce() -> Result<T, ClientError>,
) -> Result<T, Error> {
    if let Some(object) = store.get_by_key(key) {
        return Ok(object);
    }
    tracing::debug!(key, "cache miss, querying the API");
    Ok(fetch()?)
}

/// Find the controller revision `name` in `namespace`.
pub(crate) fn find_revision(
    store: &dyn ObjectStore<ControllerRevision>,
    client: &dyn VirtClient,
    namespace: &str,
    name: &str,
) -> Result<ControllerRevision, Error> {
    lookup(store, &object_key(Some(namespace), name), || {
        client.get_controller_revision(namespace, name)
    })
}
