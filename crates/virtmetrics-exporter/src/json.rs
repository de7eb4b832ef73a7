//! JSON response types.

use serde::Serialize;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Health status.
    pub status: String,
    /// Exporter version.
    pub version: String,
    /// Seconds since the registry was created.
    pub uptime_secs: u64,
    /// Number of registered metric definitions.
    pub metrics: usize,
    /// Names of registered collectors.
    pub collectors: Vec<String>,
    /// Whether this instance acts as leader.
    pub leading: bool,
}

/// Leader promotion response.
#[derive(Debug, Serialize)]
pub struct LeaderResponse {
    /// Whether this instance acts as leader.
    pub leading: bool,
    /// Instances running an outdated launcher.
    pub outdated_vmis: usize,
}
