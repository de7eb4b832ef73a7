//! VM snapshot completion times.

use virtmetrics_api::{SnapshotPhase, VirtualMachineSnapshot};
use virtmetrics_core::Metric;

use super::MetricGroup;
use crate::error::Error;

pub const SUCCEEDED_TIMESTAMP_SECONDS: &str = "kubevirt_vmsnapshot_succeeded_timestamp_seconds";

#[derive(Debug, Clone)]
pub struct VmSnapshotMetrics {
    succeeded_timestamp: Metric,
}

impl VmSnapshotMetrics {
    pub fn new() -> Result<Self, Error> {
        Ok(Self {
            succeeded_timestamp: Metric::gauge_vec(
                SUCCEEDED_TIMESTAMP_SECONDS,
                "Returns the timestamp of successful virtual machine snapshot.",
                &["name", "snapshot_name", "namespace"],
            )?,
        })
    }

    /// Record the creation time of a snapshot that succeeded.
    ///
    /// Returns whether a value was recorded.
    pub fn handle_succeeded(&self, snapshot: &VirtualMachineSnapshot) -> bool {
        if snapshot.status.phase != SnapshotPhase::Succeeded {
            return false;
        }
        let Some(created) = snapshot.status.creation_time else {
            tracing::debug!(
                snapshot = %snapshot.metadata.key(),
                "succeeded snapshot has no creation time"
            );
            return false;
        };

        let labels = [
            snapshot.spec.source_name.as_str(),
            snapshot.metadata.name.as_str(),
            snapshot.metadata.namespace_or_default(),
        ];
        match self
            .succeeded_timestamp
            .record(&labels, created.timestamp() as f64)
        {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "failed to record snapshot timestamp");
                false
            }
        }
    }

    pub fn succeeded_timestamp(&self) -> &Metric {
        &self.succeeded_timestamp
    }
}

impl MetricGroup for VmSnapshotMetrics {
    fn name(&self) -> &'static str {
        "vm_snapshot"
    }

    fn metrics(&self) -> Vec<Metric> {
        vec![self.succeeded_timestamp.clone()]
    }
}
