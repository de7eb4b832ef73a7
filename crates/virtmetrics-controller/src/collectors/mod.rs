//! Collectors computing metrics from the caches on every scrape.

mod migration_stats;
mod vm_stats;
mod vmi_stats;

pub use migration_stats::MigrationStatsCollector;
pub use vm_stats::VmStatsCollector;
pub use vmi_stats::VmiStatsCollector;

use std::collections::BTreeMap;

/// Label value used when an attribute is not set.
pub const NONE_LABEL: &str = "<none>";

fn label_or_none(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => NONE_LABEL.to_string(),
    }
}

fn label_from(map: &BTreeMap<String, String>, key: &str) -> String {
    label_or_none(map.get(key).map(String::as_str))
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use virtmetrics_core::CollectorResult;

    use crate::cache::{Informers, Stores};
    use crate::client::OfflineClient;
    use crate::config::ClusterConfig;
    use crate::context::MetricsContext;
    use crate::instancetype::{InstancetypeSpecFinder, PreferenceSpecFinder, VmApplier};

    /// Context over the given caches with an offline client.
    pub(crate) fn context(informers: Informers, stores: Stores) -> Arc<MetricsContext> {
        let client = Arc::new(OfflineClient);
        let applier = VmApplier::new(
            InstancetypeSpecFinder::new(&stores, client.clone()),
            PreferenceSpecFinder::new(&stores, client),
        );
        Arc::new(MetricsContext::new(
            informers,
            stores,
            Arc::new(ClusterConfig::default()),
            Arc::new(applier),
        ))
    }

    /// Value reported for `metric` with exactly `labels`.
    pub(crate) fn value(results: &[CollectorResult], metric: &str, labels: &[&str]) -> Option<f64> {
        results
            .iter()
            .find(|r| r.metric == metric && r.labels == labels)
            .map(|r| r.value)
    }
}
