//! Cluster API client handle.
//!
//! Spec finders fall back to the API when an object is missing from the
//! caches. Requests go through [`InstrumentedClient`], which counts and times
//! them with the REST client metrics.

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use virtmetrics_api::{
    ControllerRevision, VirtualMachineClusterInstancetype, VirtualMachineClusterPreference,
    VirtualMachineInstancetype, VirtualMachinePreference,
};

use crate::metrics::RestClientMetrics;

/// Errors returned by the API.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// The object does not exist.
    #[error("{kind} {key} not found")]
    NotFound { kind: &'static str, key: String },

    /// The request failed.
    #[error("request failed with status {code}: {message}")]
    Request { code: u16, message: String },
}

impl ClientError {
    /// HTTP status code of the failed request.
    pub fn code(&self) -> u16 {
        match self {
            ClientError::NotFound { .. } => 404,
            ClientError::Request { code, .. } => *code,
        }
    }
}

/// Read-only lookups against the cluster API.
pub trait VirtClient: Send + Sync {
    /// API host, used as a metric label.
    fn host(&self) -> &str;

    fn get_instancetype(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<VirtualMachineInstancetype, ClientError>;

    fn get_cluster_instancetype(
        &self,
        name: &str,
    ) -> Result<VirtualMachineClusterInstancetype, ClientError>;

    fn get_preference(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<VirtualMachinePreference, ClientError>;

    fn get_cluster_preference(
        &self,
        name: &str,
    ) -> Result<VirtualMachineClusterPreference, ClientError>;

    fn get_controller_revision(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<ControllerRevision, ClientError>;
}

/// Shared client handle.
pub type SharedClient = Arc<dyn VirtClient>;

/// Client for running without an API server: every lookup misses.
#[derive(Debug, Clone, Default)]
pub struct OfflineClient;

fn not_found<T>(kind: &'static str, namespace: Option<&str>, name: &str) -> Result<T, ClientError> {
    Err(ClientError::NotFound {
        kind,
        key: virtmetrics_api::meta::object_key(namespace, name),
    })
}

impl VirtClient for OfflineClient {
    fn host(&self) -> &str {
        "offline"
    }

    fn get_instancetype(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<VirtualMachineInstancetype, ClientError> {
        not_found("VirtualMachineInstancetype", Some(namespace), name)
    }

    fn get_cluster_instancetype(
        &self,
        name: &str,
    ) -> Result<VirtualMachineClusterInstancetype, ClientError> {
        not_found("VirtualMachineClusterInstancetype", None, name)
    }

    fn get_preference(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<VirtualMachinePreference, ClientError> {
        not_found("VirtualMachinePreference", Some(namespace), name)
    }

    fn get_cluster_preference(
        &self,
        name: &str,
    ) -> Result<VirtualMachineClusterPreference, ClientError> {
        not_found("VirtualMachineClusterPreference", None, name)
    }

    fn get_controller_revision(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<ControllerRevision, ClientError> {
        not_found("ControllerRevision", Some(namespace), name)
    }
}

/// Client wrapper recording REST client metrics for every request.
pub struct InstrumentedClient {
    inner: SharedClient,
    metrics: RestClientMetrics,
}

impl InstrumentedClient {
    pub fn new(inner: SharedClient, metrics: RestClientMetrics) -> Self {
        Self { inner, metrics }
    }

    fn instrument<T>(
        &self,
        resource: &str,
        request: impl FnOnce(&dyn VirtClient) -> Result<T, ClientError>,
    ) -> Result<T, ClientError> {
        let start = Instant::now();
        let result = request(self.inner.as_ref());
        let code = match &result {
            Ok(_) => 200,
            Err(e) => e.code(),
        };
        self.metrics.observe_request(
            "GET",
            "get",
            self.inner.host(),
            resource,
            code,
            start.elapsed(),
        );
        result
    }
}

impl VirtClient for InstrumentedClient {
    fn host(&self) -> &str {
        self.inner.host()
    }

    fn get_instancetype(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<VirtualMachineInstancetype, ClientError> {
        self.instrument("virtualmachineinstancetypes", |c| {
            c.get_instancetype(namespace, name)
        })
    }

    fn get_cluster_instancetype(
        &self,
        name: &str,
    ) -> Result<VirtualMachineClusterInstancetype, ClientError> {
        self.instrument("virtualmachineclusterinstancetypes", |c| {
            c.get_cluster_instancetype(name)
        })
    }

    fn get_preference(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<VirtualMachinePreference, ClientError> {
        self.instrument("virtualmachinepreferences", |c| {
            c.get_preference(namespace, name)
        })
    }

    fn get_cluster_preference(
        &self,
        name: &str,
    ) -> Result<VirtualMachineClusterPreference, ClientError> {
        self.instrument("virtualmachineclusterpreferences", |c| {
            c.get_cluster_preference(name)
        })
    }

    fn get_controller_revision(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<ControllerRevision, ClientError> {
        self.instrument("controllerrevisions", |c| {
            c.get_controller_revision(namespace, name)
        })
    }
}
