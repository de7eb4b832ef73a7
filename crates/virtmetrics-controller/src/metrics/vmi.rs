//! VMI phase transition counters.

use virtmetrics_api::VmiPhase;
use virtmetrics_core::Metric;

use super::MetricGroup;
use crate::error::Error;

pub const PHASE_TRANSITIONS_TOTAL: &str = "kubevirt_vmi_phase_transitions_total";
pub const PHASE_TRANSITION_SKEW_CLAMPED_TOTAL: &str =
    "kubevirt_vmi_phase_transition_skew_clamped_total";

#[derive(Debug, Clone)]
pub struct VmiMetrics {
    phase_transitions: Metric,
    skew_clamped: Metric,
}

impl VmiMetrics {
    pub fn new() -> Result<Self, Error> {
        Ok(Self {
            phase_transitions: Metric::counter_vec(
                PHASE_TRANSITIONS_TOTAL,
                "Number of VMI phase transitions, by the phase entered.",
                &["phase"],
            )?,
            skew_clamped: Metric::counter(
                PHASE_TRANSITION_SKEW_CLAMPED_TOTAL,
                "Number of VMI and migration phase transition observations recorded as zero because the later timestamp preceded the earlier one.",
            )?,
        })
    }

    /// Count a VMI entering `phase`.
    pub fn record_phase_transition(&self, phase: VmiPhase) {
        if let Err(e) = self.phase_transitions.inc(&[phase.as_label()]) {
            tracing::warn!(phase = %phase, error = %e, "failed to count phase transition");
        }
    }

    /// Count observations that were floored at zero.
    pub fn record_clamped(&self, count: u64) {
        if count == 0 {
            return;
        }
        tracing::debug!(count, "phase transition timestamps were skewed");
        if let Err(e) = self.skew_clamped.record(&[], count as f64) {
            tracing::warn!(error = %e, "failed to count clamped transitions");
        }
    }

    pub fn phase_transitions(&self) -> &Metric {
        &self.phase_transitions
    }

    pub fn skew_clamped(&self) -> &Metric {
        &self.skew_clamped
    }
}

impl MetricGroup for VmiMetrics {
    fn name(&self) -> &'static str {
        "vmi"
    }

    fn metrics(&self) -> Vec<Metric> {
        vec![self.phase_transitions.clone(), self.skew_clamped.clone()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let metrics = VmiMetrics::new().unwrap();
        metrics.record_phase_transition(VmiPhase::Running);
        metrics.record_phase_transition(VmiPhase::Running);
        metrics.record_clamped(0);
        metrics.record_clamped(2);

        assert_eq!(metrics.phase_transitions().value(&["running"]), Some(2.0));
        assert_eq!(metrics.skew_clamped().value(&[]), Some(2.0));
    }
}
