//! Migration counts by phase.

use std::collections::BTreeMap;
use std::sync::Arc;

use virtmetrics_api::MigrationPhase;
use virtmetrics_core::{Collector, CollectorResult, Metric};

use crate::context::MetricsContext;
use crate::error::Error;

pub const IN_PENDING_PHASE: &str = "kubevirt_vmi_migrations_in_pending_phase";
pub const IN_SCHEDULING_PHASE: &str = "kubevirt_vmi_migrations_in_scheduling_phase";
pub const IN_UNSET_PHASE: &str = "kubevirt_vmi_migrations_in_unset_phase";
pub const IN_RUNNING_PHASE: &str = "kubevirt_vmi_migrations_in_running_phase";
pub const SUCCEEDED: &str = "kubevirt_vmi_migration_succeeded";
pub const FAILED: &str = "kubevirt_vmi_migration_failed";

/// Reports how many migrations are in each phase.
///
/// Always reads the current migration cache of the context, so a replaced
/// cache takes effect on the next scrape.
pub struct MigrationStatsCollector {
    context: Arc<MetricsContext>,
    pending: Metric,
    scheduling: Metric,
    unset: Metric,
    running: Metric,
    succeeded: Metric,
    failed: Metric,
}

impl MigrationStatsCollector {
    pub fn new(context: Arc<MetricsContext>) -> Result<Self, Error> {
        Ok(Self {
            context,
            pending: Metric::gauge(
                IN_PENDING_PHASE,
                "Number of current pending migrations.",
            )?,
            scheduling: Metric::gauge(
                IN_SCHEDULING_PHASE,
                "Number of current scheduling migrations.",
            )?,
            unset: Metric::gauge(IN_UNSET_PHASE, "Number of current unset migrations.")?,
            running: Metric::gauge(
                IN_RUNNING_PHASE,
                "Number of current running migrations.",
            )?,
            succeeded: Metric::gauge_vec(
                SUCCEEDED,
                "Indicates if the VMI migration succeeded.",
                &["vmi", "namespace"],
            )?,
            failed: Metric::gauge_vec(
                FAILED,
                "Indicates if the VMI migration failed.",
                &["vmi", "namespace"],
            )?,
        })
    }
}

impl Collector for MigrationStatsCollector {
    fn name(&self) -> &str {
        "migration_stats"
    }

    fn metrics(&self) -> Vec<Metric> {
        vec![
            self.pending.clone(),
            self.scheduling.clone(),
            self.unset.clone(),
            self.running.clone(),
            self.succeeded.clone(),
            self.failed.clone(),
        ]
    }

    fn collect(&self) -> Vec<CollectorResult> {
        let (mut pending, mut scheduling, mut unset, mut running) = (0u64, 0u64, 0u64, 0u64);
        let mut succeeded: BTreeMap<(String, String), u64> = BTreeMap::new();
        let mut failed: BTreeMap<(String, String), u64> = BTreeMap::new();

        for migration in self.context.vmi_migration_informer().list() {
            let vmi = (
                migration.spec.vmi_name.clone(),
                migration.metadata.namespace_or_default().to_string(),
            );
            match migration.status.phase {
                MigrationPhase::Unset => unset += 1,
                MigrationPhase::Pending => pending += 1,
                MigrationPhase::Scheduling
                | MigrationPhase::Scheduled
                | MigrationPhase::PreparingTarget
                | MigrationPhase::TargetReady => scheduling += 1,
                MigrationPhase::Running => running += 1,
                MigrationPhase::Succeeded => *succeeded.entry(vmi).or_default() += 1,
                MigrationPhase::Failed => *failed.entry(vmi).or_default() += 1,
            }
        }

        let mut results = vec![
            CollectorResult::scalar(&self.pending, pending as f64),
            CollectorResult::scalar(&self.scheduling, scheduling as f64),
            CollectorResult::scalar(&self.unset, unset as f64),
            CollectorResult::scalar(&self.running, running as f64),
        ];
        for ((vmi, namespace), count) in succeeded {
            results.push(CollectorResult::new(&self.succeeded, vec![vmi, namespace], count as f64));
        }
        for ((vmi, namespace), count) in failed {
            results.push(CollectorResult::new(&self.failed, vec![vmi, namespace], count as f64));
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use virtmetrics_api::{ObjectMeta, VirtualMachineInstanceMigration};

    use crate::cache::{InMemoryStore, Informers, Stores};
    use crate::collectors::testing::value;

    fn migration(name: &str, vmi: &str, phase: MigrationPhase) -> VirtualMachineInstanceMigration {
        VirtualMachineInstanceMigration::new(ObjectMeta::namespaced("default", name), vmi, phase)
    }

    fn context(migrations: Vec<VirtualMachineInstanceMigration>) -> Arc<MetricsContext> {
        let mut informers = Informers::empty();
        informers.vmi_migration = InMemoryStore::with_objects(migrations).shared();
        crate::collectors::testing::context(informers, Stores::empty())
    }

    #[test]
    fn test_phase_counts() {
        let ctx = context(vec![
            migration("m1", "vmi-a", MigrationPhase::Pending),
            migration("m2", "vmi-b", MigrationPhase::TargetReady),
            migration("m3", "vmi-c", MigrationPhase::Scheduling),
            migration("m4", "vmi-d", MigrationPhase::Running),
            migration("m5", "vmi-e", MigrationPhase::Unset),
            migration("m6", "vmi-a", MigrationPhase::Succeeded),
            migration("m7", "vmi-a", MigrationPhase::Succeeded),
            migration("m8", "vmi-b", MigrationPhase::Failed),
        ]);
        let collector = MigrationStatsCollector::new(ctx).unwrap();
        let results = collector.collect();

        assert_eq!(value(&results, IN_PENDING_PHASE, &[]), Some(1.0));
        assert_eq!(value(&results, IN_SCHEDULING_PHASE, &[]), Some(2.0));
        assert_eq!(value(&results, IN_RUNNING_PHASE, &[]), Some(1.0));
        assert_eq!(value(&results, IN_UNSET_PHASE, &[]), Some(1.0));
        assert_eq!(value(&results, SUCCEEDED, &["vmi-a", "default"]), Some(2.0));
        assert_eq!(value(&results, FAILED, &["vmi-b", "default"]), Some(1.0));
    }

    #[test]
    fn test_reads_replaced_informer() {
        let ctx = context(vec![migration("m1", "vmi-a", MigrationPhase::Pending)]);
        let collector = MigrationStatsCollector::new(Arc::clone(&ctx)).unwrap();
        assert_eq!(value(&collector.collect(), IN_PENDING_PHASE, &[]), Some(1.0));

        ctx.update_vmi_migration_informer(
            InMemoryStore::with_objects(vec![
                migration("m2", "vmi-b", MigrationPhase::Running),
                migration("m3", "vmi-c", MigrationPhase::Running),
            ])
            .shared(),
        );
        let results = collector.collect();
        assert_eq!(value(&results, IN_PENDING_PHASE, &[]), Some(0.0));
        assert_eq!(value(&results, IN_RUNNING_PHASE, &[]), Some(2.0));
    }
}
