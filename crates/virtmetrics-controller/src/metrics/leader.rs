//! Metrics only the elected leader reports.

use virtmetrics_core::Metric;

use super::MetricGroup;
use crate::error::Error;

pub const NUMBER_OF_OUTDATED: &str = "kubevirt_vmi_number_of_outdated";

#[derive(Debug, Clone)]
pub struct LeaderMetrics {
    outdated_vmis: Metric,
}

impl LeaderMetrics {
    pub fn new() -> Result<Self, Error> {
        Ok(Self {
            outdated_vmis: Metric::gauge(
                NUMBER_OF_OUTDATED,
                "Indication for the total number of VirtualMachineInstance workloads that are not running within the most up-to-date version of the virt-launcher environment.",
            )?,
        })
    }

    pub fn set_outdated_vmis(&self, count: usize) {
        if let Err(e) = self.outdated_vmis.record(&[], count as f64) {
            tracing::warn!(error = %e, "failed to set outdated VMI count");
        }
    }

    pub fn outdated_vmis(&self) -> &Metric {
        &self.outdated_vmis
    }
}

impl MetricGroup for LeaderMetrics {
    fn name(&self) -> &'static str {
        "leader"
    }

    fn metrics(&self) -> Vec<Metric> {
        vec![self.outdated_vmis.clone()]
    }
}
