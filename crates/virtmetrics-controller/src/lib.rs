//! virtmetrics controller - metrics of the virtualization controller.
//!
//! This crate wires the controller's metric groups and collectors into a
//! metrics registry:
//!
//! - REST client and work queue instrumentation
//! - component status and leader-only metrics
//! - VMI and migration phase transition latencies
//! - snapshot completion timestamps
//! - polled VM, VMI and migration collectors
//!
//! Everything is built from an explicit [`MetricsContext`] holding the caches,
//! cluster configuration and VM spec applier. [`setup_metrics`] registers it
//! all or nothing.

pub mod cache;
pub mod client;
pub mod collectors;
pub mod config;
pub mod context;
pub mod error;
pub mod instancetype;
pub mod metrics;
pub mod setup;

pub use cache::{InMemoryStore, Informers, ObjectStore, SharedStore, Stores};
pub use client::{ClientError, InstrumentedClient, OfflineClient, SharedClient, VirtClient};
pub use collectors::{MigrationStatsCollector, VmStatsCollector, VmiStatsCollector, NONE_LABEL};
pub use config::{ClusterConfig, ClusterConfigSpec, SharedClusterConfig};
pub use context::MetricsContext;
pub use error::Error;
pub use instancetype::{InstancetypeSpecFinder, PreferenceSpecFinder, VmApplier, VmApplyHandler};
pub use metrics::MetricGroup;
pub use setup::{list_metrics, setup_metrics, ControllerMetrics, ControllerMetricsBuilder};
