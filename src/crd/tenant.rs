//! Tenant Custom Resource Definition
//!
//! A Tenant is one object-store deployment: a set of server pools plus the
//! auxiliary components (Prometheus scrape config, audit log search API) the
//! operator derives from it. Every derived resource name is computed here so the
//! builders never invent names of their own.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::{CustomResource, Resource, ResourceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::{ImagePullPolicy, LogConfig, Pool};

/// Label applied to all components of a tenant
pub const TENANT_LABEL: &str = "objectstore.dev/tenant";

/// Label applied to log search API pods
pub const LOG_SEARCH_API_INSTANCE_LABEL: &str = "objectstore.dev/log-search-api";

/// Suffix of the headless service fronting the server pods
pub const HEADLESS_SERVICE_SUFFIX: &str = "-hl";

/// Suffix of the Prometheus ConfigMap
pub const PROMETHEUS_CONFIG_MAP_SUFFIX: &str = "-prometheus-config-map";

/// Suffix of the log Secret
pub const LOG_SECRET_SUFFIX: &str = "-log-secret";

/// Suffix of the log search API Deployment and Service
pub const LOG_SEARCH_API_SUFFIX: &str = "-log-search-api";

/// Suffix of the log database headless service
pub const LOG_DB_SERVICE_SUFFIX: &str = "-log-hl-svc";

/// Specification for a Tenant
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "objectstore.dev",
    version = "v1",
    kind = "Tenant",
    plural = "tenants",
    shortname = "tenant",
    namespaced,
    printcolumn = r#"{"name":"AutoCert","type":"boolean","jsonPath":".spec.requestAutoCert"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct TenantSpec {
    /// Server pools, in the order their StatefulSets are created
    pub pools: Vec<Pool>,

    /// Have the operator issue TLS certificates for the servers
    #[serde(default)]
    pub request_auto_cert: bool,

    /// Name of a user-provided TLS Secret for the servers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_cert_secret: Option<String>,

    /// Image pull policy for operator-managed containers
    #[serde(default)]
    pub image_pull_policy: ImagePullPolicy,

    /// Image pull Secret for operator-managed pods
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_pull_secret: Option<String>,

    /// Service account for operator-managed pods
    #[serde(default)]
    pub service_account_name: String,

    /// Audit log subsystem configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<LogConfig>,
}

impl TenantSpec {
    /// Returns true if the servers serve TLS
    pub fn tls(&self) -> bool {
        self.request_auto_cert || self.external_cert_secret.is_some()
    }

    /// Returns true if the audit log subsystem is enabled
    pub fn log_enabled(&self) -> bool {
        self.log.is_some()
    }

    /// Audit retention period in days, if configured
    pub fn retention_period(&self) -> Option<u32> {
        self.log
            .as_ref()
            .and_then(|log| log.audit.as_ref())
            .and_then(|audit| audit.retention_period)
    }

    /// Total number of server replicas across all pools
    pub fn total_servers(&self) -> u32 {
        self.pools.iter().map(|p| p.servers).sum()
    }

    /// Validate pool layout
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.pools.is_empty() {
            return Err(crate::Error::validation(
                "tenant must declare at least one pool",
            ));
        }

        let mut seen = BTreeSet::new();
        for pool in &self.pools {
            if pool.name.is_empty() {
                return Err(crate::Error::validation("pool name must not be empty"));
            }
            if pool.servers == 0 {
                return Err(crate::Error::validation(format!(
                    "pool '{}' must have at least 1 server",
                    pool.name
                )));
            }
            if !seen.insert(pool.name.as_str()) {
                return Err(crate::Error::validation(format!(
                    "duplicate pool name '{}'",
                    pool.name
                )));
            }
        }

        Ok(())
    }
}

impl Tenant {
    /// Tenant name
    pub fn tenant_name(&self) -> String {
        self.name_any()
    }

    /// Tenant namespace (empty if the object was never persisted)
    pub fn tenant_namespace(&self) -> String {
        self.namespace().unwrap_or_default()
    }

    /// StatefulSet name for a pool
    pub fn pool_statefulset_name(&self, pool: &Pool) -> String {
        format!("{}-{}", self.name_any(), pool.name)
    }

    /// Headless service name fronting all server pods
    pub fn headless_service_name(&self) -> String {
        format!("{}{}", self.name_any(), HEADLESS_SERVICE_SUFFIX)
    }

    /// Prometheus ConfigMap name
    pub fn prometheus_config_map_name(&self) -> String {
        format!("{}{}", self.name_any(), PROMETHEUS_CONFIG_MAP_SUFFIX)
    }

    /// Log Secret name
    pub fn log_secret_name(&self) -> String {
        format!("{}{}", self.name_any(), LOG_SECRET_SUFFIX)
    }

    /// Log search API Deployment (and Service) name
    pub fn log_search_api_deployment_name(&self) -> String {
        format!("{}{}", self.name_any(), LOG_SEARCH_API_SUFFIX)
    }

    /// Log database headless service name
    pub fn log_db_service_name(&self) -> String {
        format!("{}{}", self.name_any(), LOG_DB_SERVICE_SUFFIX)
    }

    /// Pod labels selecting the log search API
    pub fn log_search_api_pod_labels(&self) -> BTreeMap<String, String> {
        BTreeMap::from([(
            LOG_SEARCH_API_INSTANCE_LABEL.to_string(),
            self.log_search_api_deployment_name(),
        )])
    }

    /// Owner references binding derived resources to this tenant
    ///
    /// Empty until the API server has assigned a uid.
    pub fn owner_references(&self) -> Vec<OwnerReference> {
        self.controller_owner_ref(&()).into_iter().collect()
    }
}
