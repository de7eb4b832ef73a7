//! Applying instance types and preferences to a VM.

use virtmetrics_api::{
    Cpu, DomainSpec, InstancetypeSpec, Machine, Memory, PreferenceSpec, PreferredCpuTopology,
    VirtualMachine,
};

use super::{InstancetypeSpecFinder, PreferenceSpecFinder};
use crate::error::Error;

/// Expands a VM with the settings of its instance type and preference.
pub trait VmApplyHandler: Send + Sync {
    /// Apply the referenced instance type and preference to `vm` in place.
    fn apply_to_vm(&self, vm: &mut VirtualMachine) -> Result<(), Error>;
}

/// Resolves and applies instance types and preferences.
pub struct VmApplier {
    instancetype_finder: InstancetypeSpecFinder,
    preference_finder: PreferenceSpecFinder,
}

impl VmApplier {
    pub fn new(
        instancetype_finder: InstancetypeSpecFinder,
        preference_finder: PreferenceSpecFinder,
    ) -> Self {
        Self {
            instancetype_finder,
            preference_finder,
        }
    }
}

impl VmApplyHandler for VmApplier {
    fn apply_to_vm(&self, vm: &mut VirtualMachine) -> Result<(), Error> {
        let instancetype = self.instancetype_finder.find(vm)?;
        let preference = self.preference_finder.find(vm)?;

        let instancetype_name = vm
            .spec
            .instancetype
            .as_ref()
            .map(|m| m.name.clone())
            .unwrap_or_default();

        let domain = &mut vm.spec.template.spec.domain;
        if let Some(spec) = &instancetype {
            check_conflicts(domain, &instancetype_name)?;
            let topology = preference
                .as_ref()
                .and_then(|p| p.cpu.as_ref())
                .and_then(|c| c.preferred_cpu_topology)
                .unwrap_or(PreferredCpuTopology::Sockets);
            apply_instancetype(domain, spec, topology);
        }
        if let Some(spec) = &preference {
            apply_preference(domain, spec);
        }
        Ok(())
    }
}

/// Fail if the VM already sets something the instance type controls.
fn check_conflicts(domain: &DomainSpec, instancetype: &str) -> Result<(), Error> {
    let conflict = if domain.cpu.is_some() {
        Some("spec.template.spec.domain.cpu")
    } else if domain.memory.as_ref().is_some_and(|m| m.guest.is_some()) {
        Some("spec.template.spec.domain.memory.guest")
    } else if domain.resources.requests.contains_key("cpu") {
        Some("spec.template.spec.domain.resources.requests.cpu")
    } else if domain.resources.requests.contains_key("memory") {
        Some("spec.template.spec.domain.resources.requests.memory")
    } else {
        None
    };

    match conflict {
        Some(field) => Err(Error::Conflict {
            field: field.to_string(),
            instancetype: instancetype.to_string(),
        }),
        None => Ok(()),
    }
}

/// Lay out `vcpus` guest CPUs according to the preferred topology.
///
/// `Spread` places two cores on each socket when the count divides evenly.
fn cpu_topology(vcpus: u32, topology: PreferredCpuTopology) -> Cpu {
    let (sockets, cores, threads) = match topology {
        PreferredCpuTopology::Sockets | PreferredCpuTopology::Any => (vcpus, 1, 1),
        PreferredCpuTopology::Cores => (1, vcpus, 1),
        PreferredCpuTopology::Threads => (1, 1, vcpus),
        PreferredCpuTopology::Spread if vcpus >= 2 && vcpus % 2 == 0 => (vcpus / 2, 2, 1),
        PreferredCpuTopology::Spread => (vcpus, 1, 1),
    };
    Cpu {
        cores,
        sockets,
        threads,
    }
}

fn apply_instancetype(domain: &mut DomainSpec, spec: &InstancetypeSpec, topology: PreferredCpuTopology) {
    if spec.cpu.guest > 0 {
        domain.cpu = Some(cpu_topology(spec.cpu.guest, topology));
        domain
            .resources
            .requests
            .insert("cpu".to_string(), spec.cpu.guest.to_string());
    }
    if !spec.memory.guest.is_empty() {
        domain.memory = Some(Memory {
            guest: Some(spec.memory.guest.clone()),
        });
        domain
            .resources
            .requests
            .insert("memory".to_string(), spec.memory.guest.clone());
    }
}

fn apply_preference(domain: &mut DomainSpec, spec: &PreferenceSpec) {
    let preferred_machine = spec
        .machine
        .as_ref()
        .map(|m| m.preferred_machine_type.as_str())
        .filter(|m| !m.is_empty());
    if let (None, Some(machine_type)) = (&domain.machine, preferred_machine) {
        domain.machine = Some(Machine {
            machine_type: machine_type.to_string(),
        });
    }
}
