//! Metric groups of the virtualization controller.
//!
//! Each group owns a set of metric definitions that are registered together,
//! plus the update helpers that record observations from object updates.
//! Phase transition latencies use the shared bucket ladder; an update whose
//! timestamps are incomplete is skipped with a debug log.

mod client;
mod component;
mod leader;
mod migration;
mod perfscale;
mod vm_snapshot;
mod vmi;
mod workqueue;

pub use client::RestClientMetrics;
pub use component::ComponentMetrics;
pub use leader::LeaderMetrics;
pub use migration::MigrationMetrics;
pub use perfscale::PerfscaleMetrics;
pub use vm_snapshot::VmSnapshotMetrics;
pub use vmi::VmiMetrics;
pub use workqueue::WorkqueueMetrics;

use chrono::{DateTime, Utc};
use virtmetrics_core::{transition_time, Metric, Transition};

/// A set of metric definitions registered as a unit.
pub trait MetricGroup {
    /// Group name, used in logs.
    fn name(&self) -> &'static str;

    /// Definitions of the group.
    fn metrics(&self) -> Vec<Metric>;
}

/// Observe the transition between `old_time` and `new_time` into `metric`
/// for `phase`. Returns the observed transition, or `None` when skipped.
pub(crate) fn observe_transition(
    metric: &Metric,
    phase: &str,
    old_time: Option<DateTime<Utc>>,
    new_time: Option<DateTime<Utc>>,
) -> Option<Transition> {
    let transition = match transition_time(old_time, new_time) {
        Ok(transition) => transition,
        Err(e) => {
            tracing::debug!(
                metric = metric.name(),
                phase,
                error = %e,
                "skipping phase transition observation"
            );
            return None;
        }
    };

    if let Err(e) = metric.record(&[phase], transition.seconds) {
        tracing::warn!(metric = metric.name(), phase, error = %e, "failed to record transition");
        return None;
    }
    Some(transition)
}

/// Number of clamped transitions among `observed`.
pub(crate) fn clamped_count(observed: &[Option<Transition>]) -> u64 {
    observed
        .iter()
        .flatten()
        .filter(|t| t.clamped)
        .count() as u64
}
