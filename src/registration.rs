//! MutatingWebhookConfiguration for the Pod priority bias webhook
//!
//! Declares which admissions the API server routes to this webhook:
//! Pod CREATE/UPDATE in the core v1 API, ignored on failure, no side effects,
//! and reinvoked if later webhooks change the Pod. Reinvocation is what lets
//! the defaulter skip Pods whose priority has not been populated yet.

use k8s_openapi::api::admissionregistration::v1::{
    MutatingWebhook, MutatingWebhookConfiguration, RuleWithOperations, ServiceReference,
    WebhookClientConfig,
};
use kube::api::{Api, ObjectMeta, Patch, PatchParams};
use kube::Client;
use tracing::info;

use crate::webhook::POD_MUTATE_PATH;
use crate::Result;

/// Name of the single webhook inside the configuration
pub const WEBHOOK_NAME: &str = "mpod-prority-request-bias.barpilot.io";

/// Field manager used for server-side apply
pub const FIELD_MANAGER: &str = "pod-priority-request-bias";

/// Where the API server reaches the webhook and how it trusts it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationConfig {
    /// Name of the MutatingWebhookConfiguration object
    pub config_name: String,
    /// Service fronting the webhook pods
    pub service_name: String,
    /// Namespace of that Service
    pub service_namespace: String,
    /// Service port
    pub service_port: i32,
    /// PEM CA bundle the API server uses to verify the serving certificate
    pub ca_bundle: Option<Vec<u8>>,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            config_name: "pod-priority-request-bias".to_string(),
            service_name: "pod-priority-request-bias-webhook".to_string(),
            service_namespace: "default".to_string(),
            service_port: 443,
            ca_bundle: None,
        }
    }
}

/// Build the MutatingWebhookConfiguration for `config`
pub fn webhook_configuration(config: &RegistrationConfig) -> MutatingWebhookConfiguration {
    MutatingWebhookConfiguration {
        metadata: ObjectMeta {
            name: Some(config.config_name.clone()),
            ..Default::default()
        },
        webhooks: Some(vec![MutatingWebhook {
            name: WEBHOOK_NAME.to_string(),
            admission_review_versions: vec!["v1".to_string()],
            side_effects: "None".to_string(),
            failure_policy: Some("Ignore".to_string()),
            reinvocation_policy: Some("IfNeeded".to_string()),
            rules: Some(vec![RuleWithOperations {
                operations: Some(vec!["CREATE".to_string(), "UPDATE".to_string()]),
                // "" is the core API group
                api_groups: Some(vec![String::new()]),
                api_versions: Some(vec!["v1".to_string()]),
                resources: Some(vec!["pods".to_string()]),
                ..Default::default()
            }]),
            client_config: WebhookClientConfig {
                service: Some(ServiceReference {
                    name: config.service_name.clone(),
                    namespace: config.service_namespace.clone(),
                    path: Some(POD_MUTATE_PATH.to_string()),
                    port: Some(config.service_port),
                }),
                ca_bundle: config.ca_bundle.clone().map(k8s_openapi::ByteString),
                ..Default::default()
            },
            ..Default::default()
        }]),
    }
}

/// Render the configuration as YAML
pub fn webhook_manifest(config: &RegistrationConfig) -> Result<String> {
    serde_yaml::to_string(&webhook_configuration(config))
        .map_err(|e| crate::Error::serialization(e.to_string()))
}

/// Ensure the MutatingWebhookConfiguration is installed
///
/// Uses server-side apply so repeated starts converge on the same object.
pub async fn ensure_webhook_config(client: &Client, config: &RegistrationConfig) -> Result<()> {
    let params = PatchParams::apply(FIELD_MANAGER).force();
    let webhook_config = webhook_configuration(config);

    let webhooks: Api<MutatingWebhookConfiguration> = Api::all(client.clone());
    webhooks
        .patch(&config.config_name, &params, &Patch::Apply(&webhook_config))
        .await?;

    info!(name = %config.config_name, "Webhook configuration installed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn only_webhook(config: &MutatingWebhookConfiguration) -> &MutatingWebhook {
        let webhooks = config.webhooks.as_ref().expect("webhooks");
        assert_eq!(webhooks.len(), 1);
        &webhooks[0]
    }

    #[test]
    fn test_webhook_targets_pod_create_update() {
        let config = webhook_configuration(&RegistrationConfig::default());
        let webhook = only_webhook(&config);

        let rules = webhook.rules.as_ref().expect("rules");
        assert_eq!(rules.len(), 1);
        let rule = &rules[0];
        assert_eq!(
            rule.operations.as_deref(),
            Some(&["CREATE".to_string(), "UPDATE".to_string()][..])
        );
        assert_eq!(rule.api_groups.as_deref(), Some(&[String::new()][..]));
        assert_eq!(rule.api_versions.as_deref(), Some(&["v1".to_string()][..]));
        assert_eq!(rule.resources.as_deref(), Some(&["pods".to_string()][..]));
    }

    #[test]
    fn test_webhook_policies() {
        let config = webhook_configuration(&RegistrationConfig::default());
        let webhook = only_webhook(&config);

        assert_eq!(webhook.name, WEBHOOK_NAME);
        assert_eq!(webhook.failure_policy.as_deref(), Some("Ignore"));
        assert_eq!(webhook.side_effects, "None");
        assert_eq!(webhook.reinvocation_policy.as_deref(), Some("IfNeeded"));
        assert_eq!(webhook.admission_review_versions, vec!["v1".to_string()]);
    }

    #[test]
    fn test_client_config_points_at_service() {
        let registration = RegistrationConfig {
            config_name: "bias".to_string(),
            service_name: "bias-webhook".to_string(),
            service_namespace: "kube-system".to_string(),
            service_port: 8443,
            ca_bundle: Some(b"-----BEGIN CERTIFICATE-----".to_vec()),
        };

        let config = webhook_configuration(&registration);
        assert_eq!(config.metadata.name.as_deref(), Some("bias"));

        let client_config = &only_webhook(&config).client_config;
        let service = client_config.service.as_ref().expect("service");
        assert_eq!(service.name, "bias-webhook");
        assert_eq!(service.namespace, "kube-system");
        assert_eq!(service.path.as_deref(), Some("/mutate--v1-pod"));
        assert_eq!(service.port, Some(8443));
        assert_eq!(
            client_config.ca_bundle.as_ref().map(|b| b.0.clone()),
            registration.ca_bundle
        );
    }

    #[test]
    fn test_manifest_is_yaml() {
        let yaml = webhook_manifest(&RegistrationConfig::default()).unwrap();

        let parsed: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(
            parsed["kind"],
            serde_yaml::Value::String("MutatingWebhookConfiguration".to_string())
        );
        assert!(yaml.contains("reinvocationPolicy: IfNeeded"));
        assert!(yaml.contains("failurePolicy: Ignore"));
        assert!(yaml.contains(WEBHOOK_NAME));
    }
}
