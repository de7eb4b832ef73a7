//! Metrics collection infrastructure.
//!
//! This module is the thin operator-metrics layer the controller wiring is
//! built on: metric definitions with live values, polled collectors, and the
//! registry both are registered with.
//!
//! # Usage
//!
//! ```ignore
//! use virtmetrics_core::metrics::{new_shared_registry, Metric, Registrar};
//! use virtmetrics_core::BucketLadder;
//!
//! let registry = new_shared_registry();
//!
//! let latency = Metric::histogram_vec(
//!     "kubevirt_vmi_phase_transition_time_seconds",
//!     "Time between phase transitions.",
//!     &BucketLadder::phase_transition(),
//!     &["phase"],
//! )?;
//! registry.register_metrics(&[latency.clone()])?;
//!
//! latency.record(&["running"], 2.5)?;
//!
//! let prometheus_text = registry.to_prometheus();
//! ```

mod collector;
mod definition;
mod docs;
mod registry;

pub use collector::{Collector, CollectorResult};
pub use definition::{Metric, MetricDescriptor, MetricKind};
pub use docs::render_markdown;
pub use registry::{new_shared_registry, MetricsRegistry, Registrar, SharedMetricsRegistry};
