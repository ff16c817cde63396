//! Mutating Admission Webhook for Pod priority bias
//!
//! This module serves the AdmissionReview endpoint the API server calls for
//! Pod create/update. The registered defaulter mutates a copy of the admitted
//! object; the difference between the two is returned as a JSON patch.
//!
//! Routes:
//! - POST `/mutate--v1-pod` - default Pods
//! - GET `/healthz`, `/readyz` - probes

pub mod pod;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::defaulter::{CustomDefaulter, PodPriorityRequestBias};

/// Path the API server posts Pod AdmissionReviews to
pub const POD_MUTATE_PATH: &str = "/mutate--v1-pod";

/// Shared state for webhook handlers
#[derive(Clone)]
pub struct WebhookState {
    /// Defaulter applied to every admitted Pod
    pub defaulter: Arc<dyn CustomDefaulter>,
}

impl WebhookState {
    /// Create webhook state around the given defaulter
    pub fn new(defaulter: Arc<dyn CustomDefaulter>) -> Self {
        Self { defaulter }
    }
}

impl Default for WebhookState {
    fn default() -> Self {
        Self::new(Arc::new(PodPriorityRequestBias::new()))
    }
}

/// Create the webhook router with the mutation endpoint and probes
pub fn webhook_router(state: Arc<WebhookState>) -> Router {
    Router::new()
        .route(POD_MUTATE_PATH, post(pod::mutate_handler))
        .route("/healthz", get(|| async { "ok" }))
        .route("/readyz", get(|| async { "ok" }))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_probes_respond_ok() {
        for path in ["/healthz", "/readyz"] {
            let router = webhook_router(Arc::new(WebhookState::default()));
            let request = Request::builder()
                .method("GET")
                .uri(path)
                .body(Body::empty())
                .unwrap();

            let response = router.oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{path}");
        }
    }

    #[tokio::test]
    async fn test_mutate_path_rejects_get() {
        let router = webhook_router(Arc::new(WebhookState::default()));
        let request = Request::builder()
            .method("GET")
            .uri(POD_MUTATE_PATH)
            .body(Body::empty())
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
