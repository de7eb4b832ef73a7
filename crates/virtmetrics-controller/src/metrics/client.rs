//! REST client request metrics.

use std::time::Duration;

use virtmetrics_core::{BucketLadder, Metric};

use super::MetricGroup;
use crate::error::Error;

pub const REQUESTS_TOTAL: &str = "kubevirt_rest_client_requests_total";
pub const REQUEST_LATENCY_SECONDS: &str = "kubevirt_rest_client_request_latency_seconds";

/// Request latency bucket bounds, in seconds.
const REQUEST_LATENCY_BUCKETS: [f64; 12] =
    [0.005, 0.025, 0.1, 0.25, 0.5, 1.0, 2.0, 4.0, 8.0, 15.0, 30.0, 60.0];

/// Counts and times requests made to the cluster API.
#[derive(Debug, Clone)]
pub struct RestClientMetrics {
    requests_total: Metric,
    request_latency: Metric,
}

impl RestClientMetrics {
    pub fn new() -> Result<Self, Error> {
        Ok(Self {
            requests_total: Metric::counter_vec(
                REQUESTS_TOTAL,
                "Number of HTTP requests, partitioned by status code, method, and host.",
                &["code", "method", "host", "resource", "verb"],
            )?,
            request_latency: Metric::histogram_vec(
                REQUEST_LATENCY_SECONDS,
                "Request latency in seconds. Broken down by verb and resource.",
                &BucketLadder::new(REQUEST_LATENCY_BUCKETS.to_vec())?,
                &["verb", "resource"],
            )?,
        })
    }

    /// Record one finished request.
    pub fn observe_request(
        &self,
        method: &str,
        verb: &str,
        host: &str,
        resource: &str,
        code: u16,
        elapsed: Duration,
    ) {
        let code = code.to_string();
        if let Err(e) = self
            .requests_total
            .inc(&[&code, method, host, resource, verb])
        {
            tracing::warn!(error = %e, "failed to count request");
        }
        if let Err(e) = self
            .request_latency
            .record(&[verb, resource], elapsed.as_secs_f64())
        {
            tracing::warn!(error = %e, "failed to record request latency");
        }
    }

    pub fn requests_total(&self) -> &Metric {
        &self.requests_total
    }

    pub fn request_latency(&self) -> &Metric {
        &self.request_latency
    }
}

impl MetricGroup for RestClientMetrics {
    fn name(&self) -> &'static str {
        "rest_client"
    }

    fn metrics(&self) -> Vec<Metric> {
        vec![self.requests_total.clone(), self.request_latency.clone()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observe_request() {
        let metrics = RestClientMetrics::new().unwrap();
        metrics.observe_request("GET", "get", "api", "controllerrevisions", 404, Duration::from_millis(30));
        metrics.observe_request("GET", "get", "api", "controllerrevisions", 404, Duration::from_millis(10));

        assert_eq!(
            metrics
                .requests_total()
                .value(&["404", "GET", "api", "controllerrevisions", "get"]),
            Some(2.0)
        );
        assert_eq!(
            metrics.request_latency().sample_count(&["get", "controllerrevisions"]),
            Some(2)
        );
    }

    #[test]
    fn test_group_names() {
        let metrics = RestClientMetrics::new().unwrap();
        let names: Vec<String> = metrics.metrics().iter().map(|m| m.name().to_string()).collect();
        assert_eq!(names, vec![REQUESTS_TOTAL, REQUEST_LATENCY_SECONDS]);
    }
}
