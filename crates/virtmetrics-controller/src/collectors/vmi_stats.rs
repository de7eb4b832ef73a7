//! Per-instance information and phase counts.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use virtmetrics_api::{
    EvictionStrategy, VirtualMachineInstance, CLUSTER_INSTANCETYPE_NAME_LABEL,
    CLUSTER_PREFERENCE_NAME_LABEL, FLAVOR_ANNOTATION, INSTANCETYPE_NAME_LABEL, OS_ANNOTATION,
    PREFERENCE_NAME_LABEL, WORKLOAD_ANNOTATION,
};
use virtmetrics_core::{Collector, CollectorResult, Metric};

use super::{label_from, label_or_none};
use crate::context::{is_outdated, MetricsContext};
use crate::error::Error;

pub const PHASE_COUNT: &str = "kubevirt_vmi_phase_count";
pub const INFO: &str = "kubevirt_vmi_info";
pub const NON_EVICTABLE: &str = "kubevirt_vmi_non_evictable";

/// Attributes shared by the phase count and info series of an instance.
struct VmiAttributes {
    os: String,
    workload: String,
    flavor: String,
    instance_type: String,
    preference: String,
}

impl VmiAttributes {
    fn of(vmi: &VirtualMachineInstance) -> Self {
        let labels = &vmi.metadata.labels;
        let annotations = &vmi.metadata.annotations;
        Self {
            os: label_from(annotations, OS_ANNOTATION),
            workload: label_from(annotations, WORKLOAD_ANNOTATION),
            flavor: label_from(annotations, FLAVOR_ANNOTATION),
            instance_type: label_or_none(
                labels
                    .get(INSTANCETYPE_NAME_LABEL)
                    .or_else(|| labels.get(CLUSTER_INSTANCETYPE_NAME_LABEL))
                    .map(String::as_str),
            ),
            preference: label_or_none(
                labels
                    .get(PREFERENCE_NAME_LABEL)
                    .or_else(|| labels.get(CLUSTER_PREFERENCE_NAME_LABEL))
                    .map(String::as_str),
            ),
        }
    }
}

/// Reports instance phase counts, per-instance information and instances
/// that block node drains.
pub struct VmiStatsCollector {
    context: Arc<MetricsContext>,
    phase_count: Metric,
    info: Metric,
    non_evictable: Metric,
}

impl VmiStatsCollector {
    pub fn new(context: Arc<MetricsContext>) -> Result<Self, Error> {
        Ok(Self {
            context,
            phase_count: Metric::gauge_vec(
                PHASE_COUNT,
                "Sum of VMIs per phase and node.",
                &["node", "phase", "os", "workload", "flavor", "instance_type", "preference"],
            )?,
            info: Metric::gauge_vec(
                INFO,
                "Information about VirtualMachineInstances.",
                &[
                    "node",
                    "namespace",
                    "name",
                    "phase",
                    "os",
                    "workload",
                    "flavor",
                    "instance_type",
                    "preference",
                    "guest_os_name",
                    "guest_os_version_id",
                    "arch",
                    "outdated",
                ],
            )?,
            non_evictable: Metric::gauge_vec(
                NON_EVICTABLE,
                "Indication for a VirtualMachine that its eviction strategy is set to Live Migration but is not migratable.",
                &["node", "namespace", "name"],
            )?,
        })
    }

    fn info_result(
        &self,
        vmi: &VirtualMachineInstance,
        attrs: &VmiAttributes,
        default_arch: &str,
        handler_images: &HashMap<String, String>,
    ) -> CollectorResult {
        let guest = &vmi.status.guest_os_info;
        let arch = if vmi.spec.architecture.is_empty() {
            default_arch
        } else {
            vmi.spec.architecture.as_str()
        };
        let labels = vec![
            vmi.status.node_name.clone(),
            vmi.metadata.namespace_or_default().to_string(),
            vmi.metadata.name.clone(),
            vmi.status.phase.as_label().to_string(),
            attrs.os.clone(),
            attrs.workload.clone(),
            attrs.flavor.clone(),
            attrs.instance_type.clone(),
            attrs.preference.clone(),
            label_or_none(Some(guest.name.as_str())),
            label_or_none(Some(guest.version_id.as_str())),
            arch.to_string(),
            is_outdated(vmi, handler_images).to_string(),
        ];
        CollectorResult::new(&self.info, labels, 1.0)
    }
}

impl Collector for VmiStatsCollector {
    fn name(&self) -> &str {
        "vmi_stats"
    }

    fn metrics(&self) -> Vec<Metric> {
        vec![
            self.phase_count.clone(),
            self.info.clone(),
            self.non_evictable.clone(),
        ]
    }

    fn collect(&self) -> Vec<CollectorResult> {
        let vmis = self.context.vmi_informer().list();
        let handler_images = self.context.handler_images_by_node();
        let default_arch = self.context.cluster_config().default_architecture();

        let mut phase_counts: BTreeMap<Vec<String>, u64> = BTreeMap::new();
        let mut results = Vec::with_capacity(vmis.len());

        for vmi in &vmis {
            let attrs = VmiAttributes::of(vmi);
            let key = vec![
                vmi.status.node_name.clone(),
                vmi.status.phase.as_label().to_string(),
                attrs.os.clone(),
                attrs.workload.clone(),
                attrs.flavor.clone(),
                attrs.instance_type.clone(),
                attrs.preference.clone(),
            ];
            *phase_counts.entry(key).or_default() += 1;

            results.push(self.info_result(vmi, &attrs, &default_arch, &handler_images));

            if vmi.spec.eviction_strategy == Some(EvictionStrategy::LiveMigrate)
                && vmi.is_not_migratable()
            {
                results.push(CollectorResult::new(
                    &self.non_evictable,
                    vec![
                        vmi.status.node_name.clone(),
                        vmi.metadata.namespace_or_default().to_string(),
                        vmi.metadata.name.clone(),
                    ],
                    1.0,
                ));
            }
        }

        for (labels, count) in phase_counts {
            results.push(CollectorResult::new(&self.phase_count, labels, count as f64));
        }
        results
    }
}
