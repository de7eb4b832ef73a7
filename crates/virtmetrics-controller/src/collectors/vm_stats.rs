//! Per-VM information, resource requests and disk allocations.

use std::sync::Arc;

use virtmetrics_api::meta::object_key;
use virtmetrics_api::{
    parse_quantity, VirtualMachine, FLAVOR_ANNOTATION, OS_ANNOTATION, WORKLOAD_ANNOTATION,
};
use virtmetrics_core::{Collector, CollectorResult, Metric};

use super::label_or_none;
use crate::context::MetricsContext;
use crate::error::Error;

pub const INFO: &str = "kubevirt_vm_info";
pub const CREATED_TIMESTAMP_SECONDS: &str = "kubevirt_vm_created_timestamp_seconds";
pub const RESOURCE_REQUESTS: &str = "kubevirt_vm_resource_requests";
pub const DISK_ALLOCATED_SIZE_BYTES: &str = "kubevirt_vm_disk_allocated_size_bytes";

/// Reports information about every VM.
///
/// Resource requests are computed after expanding the VM with its instance
/// type and preference, so they reflect what the instance will request.
pub struct VmStatsCollector {
    context: Arc<MetricsContext>,
    info: Metric,
    created_timestamp: Metric,
    resource_requests: Metric,
    disk_allocated_size: Metric,
}

impl VmStatsCollector {
    pub fn new(context: Arc<MetricsContext>) -> Result<Self, Error> {
        Ok(Self {
            context,
            info: Metric::gauge_vec(
                INFO,
                "Information about Virtual Machines.",
                &[
                    "name",
                    "namespace",
                    "status",
                    "status_group",
                    "instance_type",
                    "preference",
                    "os",
                    "workload",
                    "flavor",
                    "machine_type",
                ],
            )?,
            created_timestamp: Metric::gauge_vec(
                CREATED_TIMESTAMP_SECONDS,
                "Virtual Machine creation timestamp.",
                &["name", "namespace"],
            )?,
            resource_requests: Metric::gauge_vec(
                RESOURCE_REQUESTS,
                "Resources requested by Virtual Machine.",
                &["name", "namespace", "resource", "unit", "source"],
            )?,
            disk_allocated_size: Metric::gauge_vec(
                DISK_ALLOCATED_SIZE_BYTES,
                "Allocated disk size of a Virtual Machine in bytes.",
                &["name", "namespace", "persistentvolumeclaim", "volume_mode"],
            )?,
        })
    }

    fn info_result(&self, vm: &VirtualMachine) -> CollectorResult {
        let status = vm.status.printable_status;
        let machine_type = vm
            .spec
            .template
            .spec
            .domain
            .machine
            .as_ref()
            .map(|m| m.machine_type.as_str());
        let labels = vec![
            vm.metadata.name.clone(),
            vm.metadata.namespace_or_default().to_string(),
            status.as_str().to_string(),
            status.group().to_string(),
            label_or_none(vm.spec.instancetype.as_ref().map(|m| m.name.as_str())),
            label_or_none(vm.spec.preference.as_ref().map(|m| m.name.as_str())),
            label_or_none(vm.template_annotation(OS_ANNOTATION)),
            label_or_none(vm.template_annotation(WORKLOAD_ANNOTATION)),
            label_or_none(vm.template_annotation(FLAVOR_ANNOTATION)),
            label_or_none(machine_type),
        ];
        CollectorResult::new(&self.info, labels, 1.0)
    }

    /// Expand `vm` with its instance type and preference. On failure the VM
    /// is reported as written.
    fn applied(&self, vm: &VirtualMachine) -> VirtualMachine {
        let mut expanded = vm.clone();
        if let Err(e) = self.context.vm_applier().apply_to_vm(&mut expanded) {
            tracing::debug!(vm = %vm.metadata.key(), error = %e, "failed to apply instance type");
            return vm.clone();
        }
        expanded
    }

    fn resource_request_results(&self, vm: &VirtualMachine) -> Vec<CollectorResult> {
        let domain = &vm.spec.template.spec.domain;
        let mut requests: Vec<(&str, &str, &str, f64)> = Vec::new();

        let mut quantity = |resource, unit, source, raw: &str| match parse_quantity(raw) {
            Ok(value) => requests.push((resource, unit, source, value)),
            Err(e) => tracing::debug!(vm = %vm.metadata.key(), error = %e, "skipping resource request"),
        };
        if let Some(raw) = domain.resources.requests.get("memory") {
            quantity("memory", "bytes", "requests", raw);
        }
        if let Some(raw) = domain.memory.as_ref().and_then(|m| m.guest.as_deref()) {
            quantity("memory", "bytes", "guest", raw);
        }
        if let Some(raw) = domain.resources.requests.get("cpu") {
            quantity("cpu", "cores", "requests", raw);
        }
        if let Some(cpu) = &domain.cpu {
            requests.push(("cpu", "cores", "domain", cpu.cores.max(1) as f64));
            requests.push(("cpu", "sockets", "domain", cpu.sockets.max(1) as f64));
            requests.push(("cpu", "threads", "domain", cpu.threads.max(1) as f64));
        }

        requests
            .into_iter()
            .map(|(resource, unit, source, value)| {
                CollectorResult::new(
                    &self.resource_requests,
                    vec![
                        vm.metadata.name.clone(),
                        vm.metadata.namespace_or_default().to_string(),
                        resource.to_string(),
                        unit.to_string(),
                        source.to_string(),
                    ],
                    value,
                )
            })
            .collect()
    }

    fn disk_results(&self, vm: &VirtualMachine) -> Vec<CollectorResult> {
        let namespace = vm.metadata.namespace_or_default();
        let claims = self.context.persistent_volume_claim_informer();

        vm.spec
            .template
            .spec
            .volumes
            .iter()
            .filter_map(|volume| volume.claim_name())
            .filter_map(|claim_name| {
                let claim = claims.get_by_key(&object_key(Some(namespace), claim_name))?;
                let size = match claim.storage_capacity().map(parse_quantity) {
                    Some(Ok(size)) => size,
                    Some(Err(e)) => {
                        tracing::debug!(claim = claim_name, error = %e, "invalid claim capacity");
                        return None;
                    }
                    None => return None,
                };
                Some(CollectorResult::new(
                    &self.disk_allocated_size,
                    vec![
                        vm.metadata.name.clone(),
                        namespace.to_string(),
                        claim_name.to_string(),
                        claim.volume_mode().to_string(),
                    ],
                    size,
                ))
            })
            .collect()
    }
}

impl Collector for VmStatsCollector {
    fn name(&self) -> &str {
        "vm_stats"
    }

    fn metrics(&self) -> Vec<Metric> {
        vec![
            self.info.clone(),
            self.created_timestamp.clone(),
            self.resource_requests.clone(),
            self.disk_allocated_size.clone(),
        ]
    }

    fn collect(&self) -> Vec<CollectorResult> {
        let mut results = Vec::new();
        for vm in self.context.vm_informer().list() {
            results.push(self.info_result(&vm));

            if let Some(created) = vm.metadata.creation_timestamp {
                results.push(CollectorResult::new(
                    &self.created_timestamp,
                    vec![
                        vm.metadata.name.clone(),
                        vm.metadata.namespace_or_default().to_string(),
                    ],
                    created.timestamp() as f64,
                ));
            }

            let expanded = self.applied(&vm);
            results.extend(self.resource_request_results(&expanded));
            results.extend(self.disk_results(&vm));
        }
        results
    }
}
