//! Pod priority request bias - mutating admission webhook
//!
//! Raises a Pod's scheduling priority by the sum of its containers' CPU
//! requests in milli-CPU, on top of the priority the cluster's priority
//! admission already assigned.
//!
//! # Architecture
//!
//! The API server posts Pod AdmissionReviews to the webhook. The webhook runs
//! the [`defaulter::PodPriorityRequestBias`] defaulter on a copy of the Pod and
//! answers with a JSON patch. Pods whose priority is still unset are allowed
//! unchanged; the registration's `IfNeeded` reinvocation policy brings them
//! back once priority admission has filled the field in.
//!
//! # Modules
//!
//! - [`defaulter`] - Defaulting hooks (the CPU request priority bias)
//! - [`quantity`] - Kubernetes quantity to milli-unit conversion
//! - [`webhook`] - AdmissionReview HTTP handlers
//! - [`registration`] - MutatingWebhookConfiguration generation and install
//! - [`server`] - HTTPS server
//! - [`config`] - Command line configuration
//! - [`telemetry`] - Logging setup
//! - [`error`] - Error types

#![deny(missing_docs)]

pub mod config;
pub mod defaulter;
pub mod error;
pub mod quantity;
pub mod registration;
pub mod server;
pub mod telemetry;
pub mod webhook;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Default HTTPS port of the webhook server
pub const DEFAULT_WEBHOOK_PORT: u16 = 9443;

/// Default directory holding `tls.crt` and `tls.key`
pub const DEFAULT_CERT_DIR: &str = "/tmp/k8s-webhook-server/serving-certs";
