//! Cluster-wide configuration.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Default CPU architecture when neither the VM nor the cluster sets one.
pub const DEFAULT_ARCHITECTURE: &str = "amd64";

/// Cluster configuration values read by the metrics subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClusterConfigSpec {
    /// Enabled feature gates.
    pub feature_gates: Vec<String>,
    /// Architecture assumed for instances that do not set one.
    pub default_architecture: String,
}

impl Default for ClusterConfigSpec {
    fn default() -> Self {
        Self {
            feature_gates: Vec::new(),
            default_architecture: DEFAULT_ARCHITECTURE.to_string(),
        }
    }
}

impl ClusterConfigSpec {
    /// Enable a feature gate.
    pub fn with_feature_gate(mut self, gate: impl Into<String>) -> Self {
        self.feature_gates.push(gate.into());
        self
    }

    /// Set the default architecture.
    pub fn with_default_architecture(mut self, arch: impl Into<String>) -> Self {
        self.default_architecture = arch.into();
        self
    }
}

/// Live view of the cluster configuration.
///
/// Readers always see the latest value passed to [`ClusterConfig::update`].
#[derive(Debug, Default)]
pub struct ClusterConfig {
    spec: RwLock<ClusterConfigSpec>,
}

impl ClusterConfig {
    pub fn new(spec: ClusterConfigSpec) -> Self {
        Self {
            spec: RwLock::new(spec),
        }
    }

    /// Replace the configuration.
    pub fn update(&self, spec: ClusterConfigSpec) {
        *self.spec.write() = spec;
        tracing::debug!("cluster configuration updated");
    }

    /// Copy of the current configuration.
    pub fn snapshot(&self) -> ClusterConfigSpec {
        self.spec.read().clone()
    }

    /// Whether a feature gate is enabled.
    pub fn is_feature_gate_enabled(&self, gate: &str) -> bool {
        self.spec.read().feature_gates.iter().any(|g| g == gate)
    }

    /// Enabled feature gates.
    pub fn feature_gates(&self) -> Vec<String> {
        self.spec.read().feature_gates.clone()
    }

    /// Architecture for instances that do not set one.
    pub fn default_architecture(&self) -> String {
        let spec = self.spec.read();
        if spec.default_architecture.is_empty() {
            DEFAULT_ARCHITECTURE.to_string()
        } else {
            spec.default_architecture.clone()
        }
    }
}

/// Shared cluster configuration handle.
pub type SharedClusterConfig = Arc<ClusterConfig>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClusterConfig::default();
        assert_eq!(config.default_architecture(), "amd64");
        assert!(!config.is_feature_gate_enabled("Snapshot"));
    }

    #[test]
    fn test_update_is_visible() {
        let config = Arc::new(ClusterConfig::default());
        let reader = Arc::clone(&config);
        config.update(
            ClusterConfigSpec::default()
                .with_feature_gate("Snapshot")
                .with_default_architecture("arm64"),
        );
        assert!(reader.is_feature_gate_enabled("Snapshot"));
        assert_eq!(reader.default_architecture(), "arm64");
        assert_eq!(reader.feature_gates(), vec!["Snapshot".to_string()]);
    }

    #[test]
    fn test_empty_architecture_falls_back() {
        let config = ClusterConfig::new(ClusterConfigSpec::default().with_default_architecture(""));
        assert_eq!(config.default_architecture(), DEFAULT_ARCHITECTURE);
    }

    #[test]
    fn test_deserialize_partial() {
        let spec: ClusterConfigSpec =
            serde_json::from_str(r#"{"featureGates": ["Snapshot"]}"#).unwrap();
        assert_eq!(spec.default_architecture, "amd64");
        assert_eq!(spec.feature_gates, vec!["Snapshot".to_string()]);
    }
}
