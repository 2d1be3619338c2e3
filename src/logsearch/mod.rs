//! Log search API workload
//!
//! The log search API indexes audit events into the tenant's log database and
//! serves queries over them. Its Deployment is a deterministic function of the
//! tenant spec: credentials reach the container only through `secretKeyRef`
//! entries naming the tenant's log Secret, never as literal values.

use crate::config::OperatorConfig;
use crate::crd::Tenant;
use crate::secrets::{LOG_AUDIT_TOKEN_KEY, LOG_PG_CONN_STR_KEY};
use crate::workload::{
    Container, ContainerPort, Deployment, DeploymentSpec, EnvVar, LabelSelector,
    LocalObjectReference, ObjectMeta, PodMeta, PodSpec, PodTemplateSpec, Secret,
};
use crate::{Error, Result};

/// Name of the log search API container
pub const LOG_SEARCH_API_CONTAINER: &str = "log-search-api";

/// Env var carrying the audit retention period in days
pub const LOG_RETENTION_PERIOD_KEY: &str = "LOG_RETENTION_PERIOD";

/// Prefix of the audit webhook target identifier
pub const AUDIT_WEBHOOK_PREFIX: &str = "audit_webhook";

/// Build the log search API Deployment for a tenant
pub fn log_search_api_deployment(tenant: &Tenant, config: &OperatorConfig) -> Deployment {
    let labels = tenant.log_search_api_pod_labels();
    let secret_name = tenant.log_secret_name();

    let retention = tenant.spec.retention_period().unwrap_or(0).to_string();

    let container = Container {
        name: LOG_SEARCH_API_CONTAINER.to_string(),
        image: config.log_search_api_image.clone(),
        image_pull_policy: tenant.spec.image_pull_policy.to_string(),
        env: vec![
            EnvVar::literal(LOG_RETENTION_PERIOD_KEY, retention),
            EnvVar::from_secret(LOG_PG_CONN_STR_KEY, &secret_name, LOG_PG_CONN_STR_KEY),
            EnvVar::from_secret(LOG_AUDIT_TOKEN_KEY, &secret_name, LOG_AUDIT_TOKEN_KEY),
        ],
        ports: vec![ContainerPort {
            name: Some("http".to_string()),
            container_port: config.log_search_api_port,
        }],
    };

    let image_pull_secrets = tenant
        .spec
        .image_pull_secret
        .iter()
        .map(|name| LocalObjectReference { name: name.clone() })
        .collect();

    let mut metadata = ObjectMeta::owned_by(tenant, tenant.log_search_api_deployment_name());
    metadata.labels.extend(labels.clone());

    Deployment {
        api_version: "apps/v1".to_string(),
        kind: "Deployment".to_string(),
        metadata,
        spec: DeploymentSpec {
            replicas: 1,
            selector: LabelSelector {
                match_labels: labels.clone(),
            },
            template: PodTemplateSpec {
                metadata: PodMeta { labels },
                spec: PodSpec {
                    service_account_name: tenant.spec.service_account_name.clone(),
                    containers: vec![container],
                    restart_policy: "Always".to_string(),
                    image_pull_secrets,
                },
            },
        },
    }
}

/// In-cluster URL of the log search API
pub fn log_search_api_addr(tenant: &Tenant, config: &OperatorConfig) -> String {
    format!(
        "http://{}.{}.svc.{}:{}",
        tenant.log_search_api_deployment_name(),
        tenant.tenant_namespace(),
        config.cluster_domain,
        config.log_search_api_port
    )
}

/// Audit webhook target the object-store servers ship events to
///
/// `args` embeds the audit token, so `Debug` prints the target only.
#[derive(Clone, PartialEq, Eq)]
pub struct AuditWebhookConfig {
    /// Target identifier, `audit_webhook:<deployment>`
    pub target: String,
    /// Server-side configuration line for the target
    pub args: String,
}

impl AuditWebhookConfig {
    /// Build the webhook configuration from the tenant's log Secret
    pub fn new(tenant: &Tenant, secret: &Secret, config: &OperatorConfig) -> Result<Self> {
        let token = secret.value(LOG_AUDIT_TOKEN_KEY).ok_or_else(|| {
            Error::secret(format!(
                "secret {} has no readable {LOG_AUDIT_TOKEN_KEY}",
                secret.metadata.name
            ))
        })?;

        let target = format!(
            "{AUDIT_WEBHOOK_PREFIX}:{}",
            tenant.log_search_api_deployment_name()
        );
        let args = format!(
            r#"{target} auth_token="{token}" endpoint="{}""#,
            log_search_api_addr(tenant, config)
        );

        Ok(Self { target, args })
    }
}

impl std::fmt::Debug for AuditWebhookConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditWebhookConfig")
            .field("target", &self.target)
            .field("args", &"[REDACTED]")
            .finish()
    }
}
