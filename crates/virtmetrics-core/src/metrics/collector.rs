//! Polled collectors.
//!
//! A collector computes the current value of its metrics on demand, usually by
//! reading shared caches. The registry polls it on every scrape: the
//! collector's metrics are reset, the freshly computed results are recorded,
//! and the resulting families are exported.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use prometheus::core::Desc;
use prometheus::proto::MetricFamily;

use super::definition::Metric;

/// A single value produced by a collector poll.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectorResult {
    /// Name of the metric the value belongs to.
    pub metric: String,
    /// Label values, in the metric's label order.
    pub labels: Vec<String>,
    pub value: f64,
}

impl CollectorResult {
    /// A value for a labelled series of `metric`.
    pub fn new(metric: &Metric, labels: Vec<String>, value: f64) -> Self {
        Self {
            metric: metric.name().to_string(),
            labels,
            value,
        }
    }

    /// A value for a scalar `metric`.
    pub fn scalar(metric: &Metric, value: f64) -> Self {
        Self::new(metric, Vec::new(), value)
    }
}

/// Computes metric values when polled.
pub trait Collector: Send + Sync {
    /// Collector name, unique within a registry.
    fn name(&self) -> &str;

    /// Metrics this collector reports.
    fn metrics(&self) -> Vec<Metric>;

    /// Compute the current values.
    fn collect(&self) -> Vec<CollectorResult>;
}

/// Bridges a [`Collector`] to the `prometheus` collector interface.
#[derive(Clone)]
pub(crate) struct CollectorAdapter {
    source: Arc<dyn Collector>,
    metrics: Arc<Vec<Metric>>,
    index: Arc<HashMap<String, usize>>,
    poll: Arc<Mutex<()>>,
}

impl CollectorAdapter {
    pub(crate) fn new(source: Arc<dyn Collector>) -> Self {
        let metrics = source.metrics();
        let index = metrics
            .iter()
            .enumerate()
            .map(|(i, m)| (m.name().to_string(), i))
            .collect();
        Self {
            source,
            metrics: Arc::new(metrics),
            index: Arc::new(index),
            poll: Arc::new(Mutex::new(())),
        }
    }

    pub(crate) fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    fn apply(&self, result: &CollectorResult) {
        let Some(&i) = self.index.get(&result.metric) else {
            tracing::warn!(
                collector = self.source.name(),
                metric = %result.metric,
                "collector produced a value for an undeclared metric"
            );
            return;
        };

        let labels: Vec<&str> = result.labels.iter().map(String::as_str).collect();
        if let Err(e) = self.metrics[i].record(&labels, result.value) {
            tracing::warn!(
                collector = self.source.name(),
                metric = %result.metric,
                error = %e,
                "dropping collector result"
            );
        }
    }
}

impl prometheus::core::Collector for CollectorAdapter {
    fn desc(&self) -> Vec<&Desc> {
        self.metrics.iter().flat_map(|m| m.desc()).collect()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        // Reset and refill must not interleave with a concurrent scrape.
        let _guard = self.poll.lock();

        for metric in self.metrics.iter() {
            metric.reset();
        }

        let results = self.source.collect();
        tracing::trace!(
            collector = self.source.name(),
            results = results.len(),
            "collector polled"
        );
        for result in &results {
            self.apply(result);
        }

        self.metrics.iter().flat_map(|m| m.collect()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::core::Collector as _;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct CountingCollector {
        gauge: Metric,
        polls: AtomicU64,
    }

    impl Collector for CountingCollector {
        fn name(&self) -> &str {
            "counting"
        }

        fn metrics(&self) -> Vec<Metric> {
            vec![self.gauge.clone()]
        }

        fn collect(&self) -> Vec<CollectorResult> {
            let poll = self.polls.fetch_add(1, Ordering::SeqCst);
            let node = format!("node-{}", poll);
            vec![
                CollectorResult::new(&self.gauge, vec![node], 1.0),
                CollectorResult {
                    metric: "undeclared".to_string(),
                    labels: vec![],
                    value: 1.0,
                },
            ]
        }
    }

    #[test]
    fn test_poll_resets_previous_series() {
        let gauge = Metric::gauge_vec("test_nodes", "Nodes.", &["node"]).unwrap();
        let adapter = CollectorAdapter::new(Arc::new(CountingCollector {
            gauge: gauge.clone(),
            polls: AtomicU64::new(0),
        }));

        let first = adapter.collect();
        assert_eq!(first[0].get_metric().len(), 1);
        assert_eq!(gauge.value(&["node-0"]), Some(1.0));

        adapter.collect();
        // node-0 was dropped by the reset before the second poll.
        let families = gauge.collect();
        assert_eq!(families[0].get_metric().len(), 1);
        assert_eq!(gauge.value(&["node-1"]), Some(1.0));
    }

    #[test]
    fn test_desc_covers_declared_metrics() {
        let gauge = Metric::gauge_vec("test_desc", "Desc.", &["node"]).unwrap();
        let adapter = CollectorAdapter::new(Arc::new(CountingCollector {
            gauge,
            polls: AtomicU64::new(0),
        }));
        assert_eq!(adapter.desc().len(), 1);
        assert_eq!(adapter.metrics().len(), 1);
    }
}
