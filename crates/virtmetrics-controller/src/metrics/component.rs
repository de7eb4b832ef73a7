//! Controller component status.

use virtmetrics_core::Metric;

use super::MetricGroup;
use crate::error::Error;

pub const LEADING_STATUS: &str = "kubevirt_virt_controller_leading_status";
pub const READY_STATUS: &str = "kubevirt_virt_controller_ready_status";

#[derive(Debug, Clone)]
pub struct ComponentMetrics {
    leading_status: Metric,
    ready_status: Metric,
}

impl ComponentMetrics {
    pub fn new() -> Result<Self, Error> {
        Ok(Self {
            leading_status: Metric::gauge(
                LEADING_STATUS,
                "Indication for an operating virt-controller.",
            )?,
            ready_status: Metric::gauge(READY_STATUS, "Indication for a virt-controller that is ready to take the lead.")?,
        })
    }

    /// Whether this controller holds the leader lease.
    pub fn set_leading(&self, leading: bool) {
        self.set(&self.leading_status, leading);
    }

    /// Whether this controller is ready.
    pub fn set_ready(&self, ready: bool) {
        self.set(&self.ready_status, ready);
    }

    pub fn leading_status(&self) -> &Metric {
        &self.leading_status
    }

    pub fn ready_status(&self) -> &Metric {
        &self.ready_status
    }

    fn set(&self, metric: &Metric, on: bool) {
        let value = if on { 1.0 } else { 0.0 };
        if let Err(e) = metric.record(&[], value) {
            tracing::warn!(metric = metric.name(), error = %e, "failed to set status");
        }
    }
}

impl MetricGroup for ComponentMetrics {
    fn name(&self) -> &'static str {
        "component"
    }

    fn metrics(&self) -> Vec<Metric> {
        vec![self.leading_status.clone(), self.ready_status.clone()]
    }
}
