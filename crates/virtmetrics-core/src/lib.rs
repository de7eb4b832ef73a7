//! virtmetrics core - phase transition timing and the metrics registry layer.
//!
//! This crate provides the pieces every virtualization metric is built from:
//! the elapsed-time computation between lifecycle phases, the shared latency
//! bucket ladder, and metric definitions, collectors and registry.

pub mod buckets;
pub mod error;
pub mod metrics;
pub mod transition;

pub use buckets::{phase_transition_time_buckets, BucketLadder, PHASE_TRANSITION_TIME_BUCKETS};
pub use error::{Error, MissingEndpoint};
pub use metrics::{
    new_shared_registry, render_markdown, Collector, CollectorResult, Metric, MetricDescriptor,
    MetricKind, MetricsRegistry, Registrar, SharedMetricsRegistry,
};
pub use transition::{transition_time, transition_time_seconds, Transition};

/// Error reported by the underlying metrics registry.
pub use prometheus::Error as RegistrationError;
