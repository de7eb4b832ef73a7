//! Metric definitions.
//!
//! A [`Metric`] pairs a descriptor (name, help, kind, labels, buckets) with a
//! live `prometheus` value. Definitions are cheap to clone; clones share the
//! same underlying value.

use std::fmt;

use prometheus::core::{Collector as _, Desc};
use prometheus::proto::{Metric as ProtoMetric, MetricFamily};
use prometheus::{
    Counter, CounterVec, Gauge, GaugeVec, Histogram, HistogramOpts, HistogramVec, Opts,
};
use serde::Serialize;

use crate::buckets::BucketLadder;
use crate::error::Error;

/// Kind of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
}

impl MetricKind {
    /// Kind name as used in the text exposition format.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static description of a metric, used for listing and documentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricDescriptor {
    pub name: String,
    pub help: String,
    pub kind: MetricKind,
    /// Variable label names, empty for scalar metrics.
    pub labels: Vec<String>,
    /// Bucket bounds, for histograms.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buckets: Option<Vec<f64>>,
}

#[derive(Clone)]
enum Handle {
    Counter(Counter),
    Gauge(Gauge),
    Histogram(Histogram),
    CounterVec(CounterVec),
    GaugeVec(GaugeVec),
    HistogramVec(HistogramVec),
}

/// A metric definition backed by a live value.
#[derive(Clone)]
pub struct Metric {
    descriptor: MetricDescriptor,
    handle: Handle,
}

fn invalid(name: &str, err: prometheus::Error) -> Error {
    Error::InvalidMetric(format!("{}: {}", name, err))
}

impl Metric {
    fn new(
        name: &str,
        help: &str,
        kind: MetricKind,
        labels: &[&str],
        buckets: Option<Vec<f64>>,
        handle: Handle,
    ) -> Self {
        Self {
            descriptor: MetricDescriptor {
                name: name.to_string(),
                help: help.to_string(),
                kind,
                labels: labels.iter().map(|l| l.to_string()).collect(),
                buckets,
            },
            handle,
        }
    }

    /// Define a scalar counter.
    pub fn counter(name: &str, help: &str) -> Result<Self, Error> {
        let counter = Counter::with_opts(Opts::new(name, help)).map_err(|e| invalid(name, e))?;
        Ok(Self::new(name, help, MetricKind::Counter, &[], None, Handle::Counter(counter)))
    }

    /// Define a scalar gauge.
    pub fn gauge(name: &str, help: &str) -> Result<Self, Error> {
        let gauge = Gauge::with_opts(Opts::new(name, help)).map_err(|e| invalid(name, e))?;
        Ok(Self::new(name, help, MetricKind::Gauge, &[], None, Handle::Gauge(gauge)))
    }

    /// Define a scalar histogram over `buckets`.
    pub fn histogram(name: &str, help: &str, buckets: &BucketLadder) -> Result<Self, Error> {
        let opts = HistogramOpts::new(name, help).buckets(buckets.to_vec());
        let histogram = Histogram::with_opts(opts).map_err(|e| invalid(name, e))?;
        Ok(Self::new(
            name,
            help,
            MetricKind::Histogram,
            &[],
            Some(buckets.to_vec()),
            Handle::Histogram(histogram),
        ))
    }

    /// Define a counter with variable labels.
    pub fn counter_vec(name: &str, help: &str, labels: &[&str]) -> Result<Self, Error> {
        let vec = CounterVec::new(Opts::new(name, help), labels).map_err(|e| invalid(name, e))?;
        Ok(Self::new(name, help, MetricKind::Counter, labels, None, Handle::CounterVec(vec)))
    }

    /// Define a gauge with variable labels.
    pub fn gauge_vec(name: &str, help: &str, labels: &[&str]) -> Result<Self, Error> {
        let vec = GaugeVec::new(Opts::new(name, help), labels).map_err(|e| invalid(name, e))?;
        Ok(Self::new(name, help, MetricKind::Gauge, labels, None, Handle::GaugeVec(vec)))
    }

    /// Define a histogram over `buckets` with variable labels.
    pub fn histogram_vec(
        name: &str,
        help: &str,
        buckets: &BucketLadder,
        labels: &[&str],
    ) -> Result<Self, Error> {
        let opts = HistogramOpts::new(name, help).buckets(buckets.to_vec());
        let vec = HistogramVec::new(opts, labels).map_err(|e| invalid(name, e))?;
        Ok(Self::new(
            name,
            help,
            MetricKind::Histogram,
            labels,
            Some(buckets.to_vec()),
            Handle::HistogramVec(vec),
        ))
    }

    /// Metric name.
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// Help text.
    pub fn help(&self) -> &str {
        &self.descriptor.help
    }

    /// Metric kind.
    pub fn kind(&self) -> MetricKind {
        self.descriptor.kind
    }

    /// Variable label names.
    pub fn labels(&self) -> &[String] {
        &self.descriptor.labels
    }

    /// Static description of this metric.
    pub fn descriptor(&self) -> &MetricDescriptor {
        &self.descriptor
    }

    /// Record `value` for the series identified by `label_values`.
    ///
    /// Gauges are set, counters are incremented and histograms observe the value.
    pub fn record(&self, label_values: &[&str], value: f64) -> Result<(), Error> {
        let name = self.name();
        match &self.handle {
            Handle::Gauge(g) => {
                self.expect_scalar(label_values)?;
                g.set(value);
            }
            Handle::Counter(c) => {
                self.expect_scalar(label_values)?;
                Self::expect_non_negative(name, value)?;
                c.inc_by(value);
            }
            Handle::Histogram(h) => {
                self.expect_scalar(label_values)?;
                h.observe(value);
            }
            Handle::GaugeVec(v) => v
                .get_metric_with_label_values(label_values)
                .map_err(|e| invalid(name, e))?
                .set(value),
            Handle::CounterVec(v) => {
                Self::expect_non_negative(name, value)?;
                v.get_metric_with_label_values(label_values)
                    .map_err(|e| invalid(name, e))?
                    .inc_by(value)
            }
            Handle::HistogramVec(v) => v
                .get_metric_with_label_values(label_values)
                .map_err(|e| invalid(name, e))?
                .observe(value),
        }
        Ok(())
    }

    /// Increment a counter series by one.
    pub fn inc(&self, label_values: &[&str]) -> Result<(), Error> {
        self.record(label_values, 1.0)
    }

    /// Current value of a counter or gauge series, for inspection.
    ///
    /// Returns `None` for a labelled series that does not exist. Looking a
    /// series up never creates it.
    pub fn value(&self, label_values: &[&str]) -> Option<f64> {
        match &self.handle {
            Handle::Gauge(g) if label_values.is_empty() => Some(g.get()),
            Handle::Counter(c) if label_values.is_empty() => Some(c.get()),
            Handle::GaugeVec(_) => self
                .find_series(label_values)
                .map(|m| m.get_gauge().get_value()),
            Handle::CounterVec(_) => self
                .find_series(label_values)
                .map(|m| m.get_counter().get_value()),
            _ => None,
        }
    }

    /// Number of observations of a histogram series, for inspection.
    ///
    /// Returns `None` for a labelled series that does not exist.
    pub fn sample_count(&self, label_values: &[&str]) -> Option<u64> {
        match &self.handle {
            Handle::Histogram(h) if label_values.is_empty() => Some(h.get_sample_count()),
            Handle::HistogramVec(_) => self
                .find_series(label_values)
                .map(|m| m.get_histogram().get_sample_count()),
            _ => None,
        }
    }

    /// The collected sample of an existing labelled series.
    fn find_series(&self, label_values: &[&str]) -> Option<ProtoMetric> {
        let labels = self.labels();
        if labels.len() != label_values.len() {
            return None;
        }
        let matches = |sample: &ProtoMetric| {
            labels.iter().zip(label_values).all(|(name, value)| {
                sample
                    .get_label()
                    .iter()
                    .any(|pair| pair.get_name() == name && pair.get_value() == *value)
            })
        };
        self.collect()
            .into_iter()
            .flat_map(|mut family| family.take_metric().into_vec())
            .find(matches)
    }

    /// Drop every labelled series, or zero a scalar counter or gauge.
    ///
    /// Scalar histograms keep their observations.
    pub fn reset(&self) {
        match &self.handle {
            Handle::Gauge(g) => g.set(0.0),
            Handle::Counter(c) => c.reset(),
            Handle::Histogram(_) => {}
            Handle::GaugeVec(v) => v.reset(),
            Handle::CounterVec(v) => v.reset(),
            Handle::HistogramVec(v) => v.reset(),
        }
    }

    fn expect_scalar(&self, label_values: &[&str]) -> Result<(), Error> {
        if label_values.is_empty() {
            Ok(())
        } else {
            Err(Error::InvalidMetric(format!(
                "{}: scalar metric given {} label values",
                self.name(),
                label_values.len()
            )))
        }
    }

    fn expect_non_negative(name: &str, value: f64) -> Result<(), Error> {
        if value < 0.0 {
            return Err(Error::InvalidMetric(format!(
                "{}: counter cannot decrease by {}",
                name, value
            )));
        }
        Ok(())
    }

    /// A boxed collector sharing this metric's value, for registration.
    pub(crate) fn boxed_collector(&self) -> Box<dyn prometheus::core::Collector> {
        match &self.handle {
            Handle::Counter(m) => Box::new(m.clone()),
            Handle::Gauge(m) => Box::new(m.clone()),
            Handle::Histogram(m) => Box::new(m.clone()),
            Handle::CounterVec(m) => Box::new(m.clone()),
            Handle::GaugeVec(m) => Box::new(m.clone()),
            Handle::HistogramVec(m) => Box::new(m.clone()),
        }
    }

    pub(crate) fn desc(&self) -> Vec<&Desc> {
        match &self.handle {
            Handle::Counter(m) => m.desc(),
            Handle::Gauge(m) => m.desc(),
            Handle::Histogram(m) => m.desc(),
            Handle::CounterVec(m) => m.desc(),
            Handle::GaugeVec(m) => m.desc(),
            Handle::HistogramVec(m) => m.desc(),
        }
    }

    pub(crate) fn collect(&self) -> Vec<MetricFamily> {
        match &self.handle {
            Handle::Counter(m) => m.collect(),
            Handle::Gauge(m) => m.collect(),
            Handle::Histogram(m) => m.collect(),
            Handle::CounterVec(m) => m.collect(),
            Handle::GaugeVec(m) => m.collect(),
            Handle::HistogramVec(m) => m.collect(),
        }
    }
}

impl fmt::Debug for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metric")
            .field("descriptor", &self.descriptor)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gauge_vec_record() {
        let metric = Metric::gauge_vec("test_phase_count", "Phases.", &["phase"]).unwrap();
        metric.record(&["running"], 3.0).unwrap();
        metric.record(&["running"], 5.0).unwrap();
        assert_eq!(metric.value(&["running"]), Some(5.0));
        assert_eq!(metric.kind(), MetricKind::Gauge);
        assert_eq!(metric.labels(), &["phase".to_string()]);
    }

    #[test]
    fn test_counter_accumulates() {
        let metric = Metric::counter("test_total", "Total.").unwrap();
        metric.inc(&[]).unwrap();
        metric.record(&[], 2.0).unwrap();
        assert_eq!(metric.value(&[]), Some(3.0));
        assert!(metric.record(&[], -1.0).is_err());
    }

    #[test]
    fn test_histogram_vec_observe() {
        let ladder = BucketLadder::phase_transition();
        let metric =
            Metric::histogram_vec("test_seconds", "Latency.", &ladder, &["phase"]).unwrap();
        metric.record(&["running"], 2.5).unwrap();
        metric.record(&["running"], 0.0).unwrap();
        assert_eq!(metric.sample_count(&["running"]), Some(2));
        assert_eq!(metric.descriptor().buckets.as_ref().map(Vec::len), Some(18));
    }

    #[test]
    fn test_label_arity_mismatch() {
        let metric = Metric::gauge_vec("test_info", "Info.", &["a", "b"]).unwrap();
        assert!(metric.record(&["only-one"], 1.0).is_err());

        let scalar = Metric::gauge("test_scalar", "Scalar.").unwrap();
        assert!(scalar.record(&["x"], 1.0).is_err());
    }

    #[test]
    fn test_invalid_name() {
        let err = Metric::gauge("bad name", "Bad.").unwrap_err();
        assert!(matches!(err, Error::InvalidMetric(_)));
    }

    #[test]
    fn test_reset_drops_series() {
        let metric = Metric::gauge_vec("test_reset", "Reset.", &["node"]).unwrap();
        metric.record(&["a"], 1.0).unwrap();
        assert_eq!(metric.collect()[0].get_metric().len(), 1);
        metric.reset();
        assert!(metric.collect().is_empty() || metric.collect()[0].get_metric().is_empty());
    }

    #[test]
    fn test_missing_series_is_not_created() {
        let gauges = Metric::gauge_vec("test_lookup", "Lookup.", &["node"]).unwrap();
        gauges.record(&["a"], 1.0).unwrap();
        assert_eq!(gauges.value(&["b"]), None);
        assert_eq!(gauges.value(&["a", "extra"]), None);
        assert_eq!(gauges.collect()[0].get_metric().len(), 1);

        let ladder = BucketLadder::phase_transition();
        let histograms =
            Metric::histogram_vec("test_lookup_seconds", "Lookup.", &ladder, &["phase"]).unwrap();
        assert_eq!(histograms.sample_count(&["running"]), None);
        assert!(histograms.collect().iter().all(|f| f.get_metric().is_empty()));
    }

    #[test]
    fn test_clones_share_value() {
        let metric = Metric::gauge("test_shared", "Shared.").unwrap();
        let clone = metric.clone();
        clone.record(&[], 7.0).unwrap();
        assert_eq!(metric.value(&[]), Some(7.0));
    }
}
