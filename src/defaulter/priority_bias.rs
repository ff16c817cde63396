//! Pod priority bias by requested CPU
//!
//! Adds the sum of a Pod's container CPU requests, in milli-CPU, to the
//! priority the cluster's priority admission already assigned. Pods without
//! a name or without a priority are left alone; the admission chain is
//! expected to reinvoke this hook once the priority has been populated.

use k8s_openapi::api::core::v1::{Container, Pod};
use kube::api::DynamicObject;
use tracing::{info, warn};

use super::{pod_from_object, CustomDefaulter};
use crate::quantity::milli_value;
use crate::Result;

/// Resource name of CPU requests
const CPU_RESOURCE: &str = "cpu";

/// What a single defaulting call did to a Pod
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiasOutcome {
    /// Pod has no name yet, left untouched
    SkippedUnnamed,
    /// Pod has no priority yet, left untouched until reinvocation
    SkippedNoPriority,
    /// Priority was biased by the CPU request sum
    Biased {
        /// Sum of container CPU requests in milli-CPU
        cpu_request_milli: i64,
        /// Priority before the bias
        previous: i32,
        /// Priority after the bias
        priority: i32,
    },
}

/// Defaulter that biases Pod priority by the Pod's requested CPU
///
/// Not idempotent: every invocation on an already biased Pod adds the bias
/// again, including admission reinvocations.
#[derive(Debug, Clone, Copy, Default)]
pub struct PodPriorityRequestBias;

impl PodPriorityRequestBias {
    /// Create the defaulter
    pub fn new() -> Self {
        Self
    }

    /// Bias the priority of `pod` in place
    pub fn default_pod(&self, pod: &mut Pod) -> BiasOutcome {
        let name = pod.metadata.name.as_deref().unwrap_or_default();

        info!(name = %name, "default");

        if name.is_empty() {
            info!("ignore pod without name");
            return BiasOutcome::SkippedUnnamed;
        }

        // Priority admission fills this in; wait for reinvocation
        let Some(spec) = pod.spec.as_mut() else {
            info!(name = %name, "ignore pod without priority");
            return BiasOutcome::SkippedNoPriority;
        };
        let Some(previous) = spec.priority else {
            info!(name = %name, "ignore pod without priority");
            return BiasOutcome::SkippedNoPriority;
        };

        let cpu_request_milli = cpu_request_milli(&spec.containers);
        info!(name = %name, cpu_request = cpu_request_milli, "cpu request");

        // Truncate to 32 bits, then wrap
        let priority = previous.wrapping_add(cpu_request_milli as i32);
        info!(name = %name, priority, "set priority");

        spec.priority = Some(priority);

        BiasOutcome::Biased {
            cpu_request_milli,
            previous,
            priority,
        }
    }
}

impl CustomDefaulter for PodPriorityRequestBias {
    fn default(&self, obj: &mut DynamicObject) -> Result<()> {
        let mut pod = pod_from_object(obj)?;

        if let BiasOutcome::Biased { priority, .. } = self.default_pod(&mut pod) {
            if let Some(slot) = obj.data.pointer_mut("/spec/priority") {
                *slot = priority.into();
            }
        }

        Ok(())
    }
}

/// Sum the CPU requests of `containers` in milli-CPU
///
/// Missing requests count as zero.
pub fn cpu_request_milli(containers: &[Container]) -> i64 {
    containers
        .iter()
        .fold(0i64, |sum, c| sum.wrapping_add(container_cpu_milli(c)))
}

fn container_cpu_milli(container: &Container) -> i64 {
    let Some(qty) = container
        .resources
        .as_ref()
        .and_then(|r| r.requests.as_ref())
        .and_then(|r| r.get(CPU_RESOURCE))
    else {
        return 0;
    };

    match milli_value(qty) {
        Ok(milli) => milli,
        Err(e) => {
            warn!(container = %container.name, error = %e, "ignoring unparseable cpu request");
            0
        }
    }
}
