//! Migration phase transition latencies.

use virtmetrics_api::{MigrationPhase, VirtualMachineInstanceMigration};
use virtmetrics_core::{BucketLadder, Metric, Transition};

use super::{observe_transition, MetricGroup};
use crate::error::Error;

pub const PHASE_TRANSITION_TIME_FROM_CREATION_SECONDS: &str =
    "kubevirt_vmi_migration_phase_transition_time_from_creation_seconds";

#[derive(Debug, Clone)]
pub struct MigrationMetrics {
    from_creation: Metric,
}

impl MigrationMetrics {
    pub fn new() -> Result<Self, Error> {
        Ok(Self {
            from_creation: Metric::histogram_vec(
                PHASE_TRANSITION_TIME_FROM_CREATION_SECONDS,
                "Histogram of VM migration phase transitions duration from creation time in seconds.",
                &BucketLadder::phase_transition(),
                &["phase"],
            )?,
        })
    }

    /// Observe a migration update.
    ///
    /// When the phase changed, the time from creation until the new phase was
    /// entered is recorded under the new phase.
    pub fn update_migration(
        &self,
        old: Option<&VirtualMachineInstanceMigration>,
        new: &VirtualMachineInstanceMigration,
    ) -> Option<Transition> {
        let phase = new.status.phase;
        if phase == MigrationPhase::Unset || old.is_some_and(|old| old.status.phase == phase) {
            return None;
        }

        observe_transition(
            &self.from_creation,
            phase.as_str(),
            new.metadata.creation_timestamp,
            new.phase_transition_time(phase),
        )
    }

    pub fn from_creation(&self) -> &Metric {
        &self.from_creation
    }
}

impl MetricGroup for MigrationMetrics {
    fn name(&self) -> &'static str {
        "migration"
    }

    fn metrics(&self) -> Vec<Metric> {
        vec![self.from_creation.clone()]
    }
}
