//! Central metrics registry.
//!
//! This module provides the registry that metric groups and collectors are
//! registered with, and the [`Registrar`] seam startup wiring is written
//! against so that it can be exercised with test doubles.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use prometheus::proto::MetricFamily;
use prometheus::{Encoder, TextEncoder};

use super::collector::{Collector, CollectorAdapter};
use super::definition::{Metric, MetricDescriptor};
use crate::error::Error;

/// Something metric definitions and collectors can be registered with.
pub trait Registrar: Send + Sync {
    /// Register a group of metric definitions.
    ///
    /// Either the whole group is registered or none of it is.
    fn register_metrics(&self, metrics: &[Metric]) -> Result<(), Error>;

    /// Remove a previously registered group. Unknown metrics are ignored.
    fn unregister_metrics(&self, metrics: &[Metric]);

    /// Register a polled collector.
    fn register_collector(&self, collector: Arc<dyn Collector>) -> Result<(), Error>;

    /// Remove a collector by name. Unknown names are ignored.
    fn unregister_collector(&self, name: &str);

    /// Every registered metric, sorted by name.
    fn list_metrics(&self) -> Vec<MetricDescriptor>;

    /// Whether a metric with this name is registered.
    fn is_registered(&self, name: &str) -> bool {
        self.list_metrics().iter().any(|m| m.name == name)
    }
}

/// Registry backed by a `prometheus::Registry`.
pub struct MetricsRegistry {
    /// Registry start time.
    started_at: Instant,
    registry: prometheus::Registry,
    metrics: RwLock<BTreeMap<String, MetricDescriptor>>,
    collectors: RwLock<BTreeMap<String, CollectorAdapter>>,
}

impl MetricsRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            registry: prometheus::Registry::new(),
            metrics: RwLock::new(BTreeMap::new()),
            collectors: RwLock::new(BTreeMap::new()),
        }
    }

    /// Get uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    /// Number of registered metric definitions.
    pub fn metric_count(&self) -> usize {
        self.metrics.read().len()
    }

    /// Names of registered collectors.
    pub fn collector_names(&self) -> Vec<String> {
        self.collectors.read().keys().cloned().collect()
    }

    /// Poll every collector and gather all metric families.
    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Export to Prometheus text format.
    pub fn to_prometheus(&self) -> String {
        let families = self.gather();
        let mut buffer = Vec::new();
        if let Err(e) = TextEncoder::new().encode(&families, &mut buffer) {
            tracing::warn!(error = %e, "failed to encode metric families");
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }

    fn unregister_one(&self, metric: &Metric) {
        // Unknown collectors are reported as errors; nothing to undo then.
        let _ = self.registry.unregister(metric.boxed_collector());
    }
}

impl Registrar for MetricsRegistry {
    fn register_metrics(&self, metrics: &[Metric]) -> Result<(), Error> {
        for (i, metric) in metrics.iter().enumerate() {
            if let Err(e) = self.registry.register(metric.boxed_collector()) {
                tracing::debug!(metric = metric.name(), error = %e, "metric registration failed");
                for registered in &metrics[..i] {
                    self.unregister_one(registered);
                }
                return Err(Error::Registration(e));
            }
        }

        let mut index = self.metrics.write();
        for metric in metrics {
            index.insert(metric.name().to_string(), metric.descriptor().clone());
        }
        Ok(())
    }

    fn unregister_metrics(&self, metrics: &[Metric]) {
        let mut index = self.metrics.write();
        for metric in metrics {
            if index.remove(metric.name()).is_some() {
                self.unregister_one(metric);
            }
        }
    }

    fn register_collector(&self, collector: Arc<dyn Collector>) -> Result<(), Error> {
        let name = collector.name().to_string();
        let mut collectors = self.collectors.write();
        if collectors.contains_key(&name) {
            return Err(Error::Registration(prometheus::Error::AlreadyReg));
        }

        let adapter = CollectorAdapter::new(collector);
        self.registry.register(Box::new(adapter.clone()))?;

        let mut index = self.metrics.write();
        for metric in adapter.metrics() {
            index.insert(metric.name().to_string(), metric.descriptor().clone());
        }
        collectors.insert(name, adapter);
        Ok(())
    }

    fn unregister_collector(&self, name: &str) {
        let Some(adapter) = self.collectors.write().remove(name) else {
            return;
        };

        let mut index = self.metrics.write();
        for metric in adapter.metrics() {
            index.remove(metric.name());
        }
        let _ = self.registry.unregister(Box::new(adapter));
    }

    fn list_metrics(&self) -> Vec<MetricDescriptor> {
        self.metrics.read().values().cloned().collect()
    }

    fn is_registered(&self, name: &str) -> bool {
        self.metrics.read().contains_key(name)
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared metrics registry handle.
pub type SharedMetricsRegistry = Arc<MetricsRegistry>;

/// Create a new shared metrics registry.
pub fn new_shared_registry() -> SharedMetricsRegistry {
    Arc::new(MetricsRegistry::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::CollectorResult;

    struct StaticCollector {
        name: String,
        gauge: Metric,
    }

    impl Collector for StaticCollector {
        fn name(&self) -> &str {
            &self.name
        }

        fn metrics(&self) -> Vec<Metric> {
            vec![self.gauge.clone()]
        }

        fn collect(&self) -> Vec<CollectorResult> {
            vec![CollectorResult::new(&self.gauge, vec!["node-a".to_string()], 4.0)]
        }
    }

    fn static_collector(name: &str, metric: &str) -> Arc<dyn Collector> {
        Arc::new(StaticCollector {
            name: name.to_string(),
            gauge: Metric::gauge_vec(metric, "Static.", &["node"]).unwrap(),
        })
    }

    #[test]
    fn test_register_and_list() {
        let registry = MetricsRegistry::new();
        let group = vec![
            Metric::counter("b_total", "B.").unwrap(),
            Metric::gauge("a_gauge", "A.").unwrap(),
        ];
        registry.register_metrics(&group).unwrap();

        let names: Vec<String> = registry.list_metrics().into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["a_gauge", "b_total"]);
        assert!(registry.is_registered("a_gauge"));
        assert_eq!(registry.metric_count(), 2);
    }

    #[test]
    fn test_duplicate_group_is_rejected_atomically() {
        let registry = MetricsRegistry::new();
        registry
            .register_metrics(&[Metric::gauge("dup_gauge", "Dup.").unwrap()])
            .unwrap();

        let group = vec![
            Metric::gauge("fresh_gauge", "Fresh.").unwrap(),
            Metric::gauge("dup_gauge", "Dup again.").unwrap(),
        ];
        let err = registry.register_metrics(&group).unwrap_err();
        assert!(matches!(err, Error::Registration(_)));

        // The first metric of the rejected group was rolled back.
        assert!(!registry.is_registered("fresh_gauge"));
        registry
            .register_metrics(&[Metric::gauge("fresh_gauge", "Fresh.").unwrap()])
            .unwrap();
    }

    #[test]
    fn test_unregister_metrics() {
        let registry = MetricsRegistry::new();
        let group = vec![Metric::gauge("gone_gauge", "Gone.").unwrap()];
        registry.register_metrics(&group).unwrap();
        registry.unregister_metrics(&group);
        assert!(!registry.is_registered("gone_gauge"));
        registry.register_metrics(&group).unwrap();
    }

    #[test]
    fn test_collector_registration() {
        let registry = MetricsRegistry::new();
        registry
            .register_collector(static_collector("static", "static_nodes"))
            .unwrap();

        assert!(registry.is_registered("static_nodes"));
        assert_eq!(registry.collector_names(), vec!["static".to_string()]);

        let text = registry.to_prometheus();
        assert!(text.contains("# TYPE static_nodes gauge"));
        assert!(text.contains("static_nodes{node=\"node-a\"} 4"));
    }

    #[test]
    fn test_duplicate_collector_name() {
        let registry = MetricsRegistry::new();
        registry
            .register_collector(static_collector("static", "first_nodes"))
            .unwrap();
        let err = registry
            .register_collector(static_collector("static", "second_nodes"))
            .unwrap_err();
        assert!(matches!(err, Error::Registration(_)));
        assert!(!registry.is_registered("second_nodes"));
    }

    #[test]
    fn test_collector_metric_clashes_with_definition() {
        let registry = MetricsRegistry::new();
        registry
            .register_metrics(&[Metric::gauge("clash_nodes", "Clash.").unwrap()])
            .unwrap();
        assert!(registry
            .register_collector(static_collector("static", "clash_nodes"))
            .is_err());
        assert!(registry.collector_names().is_empty());
    }

    #[test]
    fn test_unregister_collector() {
        let registry = MetricsRegistry::new();
        registry
            .register_collector(static_collector("static", "static_nodes"))
            .unwrap();
        registry.unregister_collector("static");
        assert!(!registry.is_registered("static_nodes"));
        registry
            .register_collector(static_collector("static", "static_nodes"))
            .unwrap();
    }

    #[test]
    fn test_prometheus_format() {
        let registry = MetricsRegistry::new();
        let counter = Metric::counter("queries_total", "Queries.").unwrap();
        registry.register_metrics(&[counter.clone()]).unwrap();
        counter.inc(&[]).unwrap();

        let text = registry.to_prometheus();
        assert!(text.contains("# HELP queries_total Queries."));
        assert!(text.contains("# TYPE queries_total counter"));
        assert!(text.contains("queries_total 1"));
    }

    #[test]
    fn test_shared_registry() {
        let registry = new_shared_registry();
        let registry2 = Arc::clone(&registry);
        registry2
            .register_metrics(&[Metric::gauge("shared_gauge", "Shared.").unwrap()])
            .unwrap();
        assert!(registry.is_registered("shared_gauge"));
    }
}
