//! Defaulting hooks for admitted objects
//!
//! A defaulter receives the object under admission and mutates it in place.
//! The webhook layer diffs the object before and after the call to build the
//! JSON patch returned to the API server.

mod priority_bias;

pub use priority_bias::{cpu_request_milli, BiasOutcome, PodPriorityRequestBias};

use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::Resource;
use kube::api::DynamicObject;

use crate::{Error, Result};

/// A defaulting hook invoked for every admitted object of its kind
pub trait CustomDefaulter: Send + Sync {
    /// Mutate `obj` in place
    ///
    /// Returns [`Error::TypeMismatch`] without touching `obj` when the object
    /// is not of the kind this defaulter handles.
    fn default(&self, obj: &mut DynamicObject) -> Result<()>;
}

/// Decode a dynamic object into a Pod, checking its apiVersion and kind first
pub fn pod_from_object(obj: &DynamicObject) -> Result<Pod> {
    match &obj.types {
        Some(t) if t.api_version == Pod::API_VERSION && t.kind == Pod::KIND => {}
        Some(t) => {
            return Err(Error::type_mismatch(
                Pod::KIND,
                format!("{}/{}", t.api_version, t.kind),
            ))
        }
        None => return Err(Error::type_mismatch(Pod::KIND, "an untyped object")),
    }

    let value = serde_json::to_value(obj)?;
    Ok(serde_json::from_value(value)?)
}
