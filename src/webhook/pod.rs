//! Pod Mutation Webhook
//!
//! Handles AdmissionReview requests for Pods, running the registered
//! defaulter and answering with the resulting JSON patch.

use std::sync::Arc;

use axum::{extract::State, Json};
use kube::{
    api::DynamicObject,
    core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview, Operation},
};
use tracing::{debug, error, info, warn};

use crate::defaulter::CustomDefaulter;
use crate::Result;

use super::WebhookState;

/// Handle mutating admission review for Pods
///
/// This handler:
/// 1. Extracts the admission request from the review
/// 2. Runs the defaulter on a copy of the admitted object
/// 3. Returns the difference as a JSON patch in the admission response
pub async fn mutate_handler(
    State(state): State<Arc<WebhookState>>,
    Json(body): Json<AdmissionReview<DynamicObject>>,
) -> Json<AdmissionReview<DynamicObject>> {
    let req: AdmissionRequest<DynamicObject> = match body.try_into() {
        Ok(req) => req,
        Err(e) => {
            error!(error = %e, "Failed to parse admission request");
            return Json(AdmissionResponse::invalid(e.to_string()).into_review());
        }
    };

    let response = mutate(state.defaulter.as_ref(), &req);
    Json(response.into_review())
}

/// Process a single admission request with `defaulter`
pub fn mutate(
    defaulter: &dyn CustomDefaulter,
    request: &AdmissionRequest<DynamicObject>,
) -> AdmissionResponse {
    let uid = &request.uid;

    if !matches!(request.operation, Operation::Create | Operation::Update) {
        debug!(uid = %uid, operation = ?request.operation, "Operation not defaulted, allowing unchanged");
        return AdmissionResponse::from(request);
    }

    let original = match &request.object {
        Some(obj) => obj,
        None => {
            debug!(uid = %uid, "No object in request, allowing unchanged");
            return AdmissionResponse::from(request);
        }
    };

    let mut mutated = original.clone();
    if let Err(e) = defaulter.default(&mut mutated) {
        warn!(
            uid = %uid,
            kind = %request.kind.kind,
            name = ?original.metadata.name,
            error = %e,
            "Defaulter rejected object"
        );
        return AdmissionResponse::from(request).deny(e.to_string());
    }

    let patch = match build_patch(original, &mutated) {
        Ok(patch) => patch,
        Err(e) => {
            error!(uid = %uid, error = %e, "Failed to diff defaulted object");
            return AdmissionResponse::from(request).deny(e.to_string());
        }
    };

    if patch.0.is_empty() {
        debug!(uid = %uid, name = ?original.metadata.name, "Nothing defaulted, allowing unchanged");
        return AdmissionResponse::from(request);
    }

    info!(
        uid = %uid,
        name = ?original.metadata.name,
        patch_ops = patch.0.len(),
        "Applying patch to pod"
    );

    match AdmissionResponse::from(request).with_patch(patch) {
        Ok(response) => response,
        Err(e) => {
            error!(uid = %uid, error = %e, "Failed to serialize patch");
            AdmissionResponse::from(request).deny(format!("patch serialization error: {e}"))
        }
    }
}

/// Build the JSON patch turning `original` into `mutated`
fn build_patch(original: &DynamicObject, mutated: &DynamicObject) -> Result<json_patch::Patch> {
    let before = serde_json::to_value(original)?;
    let after = serde_json::to_value(mutated)?;
    Ok(json_patch::diff(&before, &after))
}
