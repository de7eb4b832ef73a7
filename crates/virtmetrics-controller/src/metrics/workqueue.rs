//! Work queue metrics.
//!
//! Every controller loop drains a named work queue. These metrics are labelled
//! by queue name and follow the usual controller work queue set.

use std::time::Duration;

use virtmetrics_core::{BucketLadder, Metric};

use super::MetricGroup;
use crate::error::Error;

pub const DEPTH: &str = "kubevirt_workqueue_depth";
pub const ADDS_TOTAL: &str = "kubevirt_workqueue_adds_total";
pub const QUEUE_DURATION_SECONDS: &str = "kubevirt_workqueue_queue_duration_seconds";
pub const WORK_DURATION_SECONDS: &str = "kubevirt_workqueue_work_duration_seconds";
pub const UNFINISHED_WORK_SECONDS: &str = "kubevirt_workqueue_unfinished_work_seconds";
pub const LONGEST_RUNNING_PROCESSOR_SECONDS: &str =
    "kubevirt_workqueue_longest_running_processor_seconds";
pub const RETRIES_TOTAL: &str = "kubevirt_workqueue_retries_total";

/// Ten exponential buckets from 10ns to 10s.
fn duration_buckets() -> Result<BucketLadder, Error> {
    let bounds = (0..10).map(|i| 1e-8 * 10f64.powi(i)).collect();
    Ok(BucketLadder::new(bounds)?)
}

#[derive(Debug, Clone)]
pub struct WorkqueueMetrics {
    depth: Metric,
    adds_total: Metric,
    queue_duration: Metric,
    work_duration: Metric,
    unfinished_work: Metric,
    longest_running_processor: Metric,
    retries_total: Metric,
}

impl WorkqueueMetrics {
    pub fn new() -> Result<Self, Error> {
        let buckets = duration_buckets()?;
        Ok(Self {
            depth: Metric::gauge_vec(DEPTH, "Current depth of workqueue", &["name"])?,
            adds_total: Metric::counter_vec(
                ADDS_TOTAL,
                "Total number of adds handled by workqueue",
                &["name"],
            )?,
            queue_duration: Metric::histogram_vec(
                QUEUE_DURATION_SECONDS,
                "How long in seconds an item stays in workqueue before being requested.",
                &buckets,
                &["name"],
            )?,
            work_duration: Metric::histogram_vec(
                WORK_DURATION_SECONDS,
                "How long in seconds processing an item from workqueue takes.",
                &buckets,
                &["name"],
            )?,
            unfinished_work: Metric::gauge_vec(
                UNFINISHED_WORK_SECONDS,
                "How many seconds of work has done that is in progress and hasn't been observed by work_duration.",
                &["name"],
            )?,
            longest_running_processor: Metric::gauge_vec(
                LONGEST_RUNNING_PROCESSOR_SECONDS,
                "How many seconds has the longest running processor for workqueue been running.",
                &["name"],
            )?,
            retries_total: Metric::counter_vec(
                RETRIES_TOTAL,
                "Total number of retries handled by workqueue",
                &["name"],
            )?,
        })
    }

    /// An item was added to queue `name`.
    pub fn add(&self, name: &str) {
        log_failure(self.adds_total.inc(&[name]));
    }

    /// An item was re-queued after a failed attempt.
    pub fn retry(&self, name: &str) {
        log_failure(self.retries_total.inc(&[name]));
    }

    pub fn set_depth(&self, name: &str, depth: usize) {
        log_failure(self.depth.record(&[name], depth as f64));
    }

    /// Time an item waited before being picked up.
    pub fn observe_queue_duration(&self, name: &str, waited: Duration) {
        log_failure(self.queue_duration.record(&[name], waited.as_secs_f64()));
    }

    /// Time spent processing an item.
    pub fn observe_work_duration(&self, name: &str, worked: Duration) {
        log_failure(self.work_duration.record(&[name], worked.as_secs_f64()));
    }

    /// Work in progress that has not finished yet.
    pub fn set_unfinished_work(&self, name: &str, in_progress: Duration, longest: Duration) {
        log_failure(self.unfinished_work.record(&[name], in_progress.as_secs_f64()));
        log_failure(
            self.longest_running_processor
                .record(&[name], longest.as_secs_f64()),
        );
    }

    pub fn depth(&self) -> &Metric {
        &self.depth
    }

    pub fn adds_total(&self) -> &Metric {
        &self.adds_total
    }

    pub fn retries_total(&self) -> &Metric {
        &self.retries_total
    }

    pub fn work_duration(&self) -> &Metric {
        &self.work_duration
    }
}

fn log_failure(result: Result<(), virtmetrics_core::Error>) {
    if let Err(e) = result {
        tracing::warn!(error = %e, "failed to record workqueue metric");
    }
}

impl MetricGroup for WorkqueueMetrics {
    fn name(&self) -> &'static str {
        "workqueue"
    }

    fn metrics(&self) -> Vec<Metric> {
        vec![
            self.depth.clone(),
            self.adds_total.clone(),
            self.queue_duration.clone(),
            self.work_duration.clone(),
            self.unfinished_work.clone(),
            self.longest_running_processor.clone(),
            self.retries_total.clone(),
        ]
    }
}
