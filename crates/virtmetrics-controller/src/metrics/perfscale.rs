//! VMI phase transition latencies used for performance and scale testing.

use virtmetrics_api::{VirtualMachineInstance, VmiPhase};
use virtmetrics_core::{BucketLadder, Metric};

use super::{clamped_count, observe_transition, MetricGroup};
use crate::error::Error;

pub const PHASE_TRANSITION_TIME_FROM_CREATION_SECONDS: &str =
    "kubevirt_vmi_phase_transition_time_from_creation_seconds";
pub const PHASE_TRANSITION_TIME_SECONDS: &str = "kubevirt_vmi_phase_transition_time_seconds";
pub const PHASE_TRANSITION_TIME_FROM_DELETION_SECONDS: &str =
    "kubevirt_vmi_phase_transition_time_from_deletion_seconds";

#[derive(Debug, Clone)]
pub struct PerfscaleMetrics {
    from_creation: Metric,
    between_phases: Metric,
    from_deletion: Metric,
}

impl PerfscaleMetrics {
    pub fn new() -> Result<Self, Error> {
        let buckets = BucketLadder::phase_transition();
        Ok(Self {
            from_creation: Metric::histogram_vec(
                PHASE_TRANSITION_TIME_FROM_CREATION_SECONDS,
                "Histogram of VM phase transitions duration from creation time in seconds.",
                &buckets,
                &["phase"],
            )?,
            between_phases: Metric::histogram_vec(
                PHASE_TRANSITION_TIME_SECONDS,
                "Histogram of VM phase transitions duration between different phases in seconds.",
                &buckets,
                &["phase"],
            )?,
            from_deletion: Metric::histogram_vec(
                PHASE_TRANSITION_TIME_FROM_DELETION_SECONDS,
                "Histogram of VM phase transitions duration from deletion time in seconds.",
                &buckets,
                &["phase"],
            )?,
        })
    }

    /// Observe a VMI update.
    ///
    /// On a phase change, records the time from creation, from the previous
    /// phase and, for instances being deleted, from deletion until the new
    /// phase was entered. Returns how many observations were clamped to zero.
    pub fn update_vmi(&self, old: &VirtualMachineInstance, new: &VirtualMachineInstance) -> u64 {
        let phase = new.status.phase;
        if phase == VmiPhase::Unset || old.status.phase == phase {
            return 0;
        }

        let label = phase.as_label();
        let entered = new.phase_transition_time(phase);
        let mut observed = vec![
            observe_transition(&self.from_creation, label, new.metadata.creation_timestamp, entered),
            observe_transition(
                &self.between_phases,
                label,
                new.phase_transition_time(old.status.phase),
                entered,
            ),
        ];
        if new.metadata.deletion_timestamp.is_some() {
            observed.push(observe_transition(
                &self.from_deletion,
                label,
                new.metadata.deletion_timestamp,
                entered,
            ));
        }

        clamped_count(&observed)
    }

    pub fn from_creation(&self) -> &Metric {
        &self.from_creation
    }

    pub fn between_phases(&self) -> &Metric {
        &self.between_phases
    }

    pub fn from_deletion(&self) -> &Metric {
        &self.from_deletion
    }
}

impl MetricGroup for PerfscaleMetrics {
    fn name(&self) -> &'static str {
        "perfscale"
    }

    fn metrics(&self) -> Vec<Metric> {
        vec![
            self.from_creation.clone(),
            self.between_phases.clone(),
            self.from_deletion.clone(),
        ]
    }
}
