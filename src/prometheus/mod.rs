//! Prometheus scrape configuration synthesis
//!
//! Builds the `prometheus.yml` the tenant's Prometheus instance runs with: fixed
//! global intervals plus one scrape job per monitored workload type, each with
//! its own bearer token and the full list of server pod addresses.
//!
//! Every field except `bearer_token` is a deterministic function of the tenant
//! spec and [`OperatorConfig`]. The token embeds its issue time, so two
//! syntheses a second apart differ there and only there.

mod duration;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use duration::PromDuration;

use crate::config::OperatorConfig;
use crate::credential::CredentialMinter;
use crate::crd::Tenant;
use crate::topology::tenant_endpoints;
use crate::workload::{ConfigMap, ObjectMeta};
use crate::{Error, Result, OPERATOR_NAME};

/// ConfigMap key holding the rendered configuration
pub const PROMETHEUS_CONFIG_KEY: &str = "prometheus.yml";

/// Scrape job covering the tenant's object-store servers
pub const SERVER_JOB_NAME: &str = "minio";

/// Global Prometheus settings
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct GlobalConfig {
    /// How often targets are scraped
    pub scrape_interval: PromDuration,
    /// How often rules are evaluated
    pub evaluation_interval: PromDuration,
}

/// Static target group
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StaticConfig {
    /// `host:port` targets
    pub targets: Vec<String>,
}

/// TLS settings for a scrape job
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TlsConfig {
    /// CA bundle used to verify targets
    pub ca_file: String,
}

/// One scrape job
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScrapeConfig {
    /// Job name
    pub job_name: String,
    /// Bearer token presented to targets
    pub bearer_token: String,
    /// Metrics path on every target
    pub metrics_path: String,
    /// `http` or `https`
    pub scheme: String,
    /// TLS settings, present only for `https`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_config: Option<TlsConfig>,
    /// Target groups
    pub static_configs: Vec<StaticConfig>,
}

impl ScrapeConfig {
    /// Field-by-field comparison, bearer token included
    pub fn structurally_equal(&self, other: &Self) -> bool {
        self.job_name == other.job_name
            && self.bearer_token == other.bearer_token
            && self.metrics_path == other.metrics_path
            && self.scheme == other.scheme
            && self.tls_config == other.tls_config
            && self.static_configs == other.static_configs
    }
}

/// The complete scrape configuration document
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrometheusConfig {
    /// Global settings
    pub global: GlobalConfig,
    /// Scrape jobs
    pub scrape_configs: Vec<ScrapeConfig>,
}

impl PrometheusConfig {
    /// Synthesize the desired configuration, minting a fresh bearer token
    pub fn synthesize(
        tenant: &Tenant,
        access_key: &str,
        secret_key: &str,
        config: &OperatorConfig,
    ) -> Result<Self> {
        let minter = CredentialMinter::new(&config.token_issuer, config.token_validity);
        let bearer_token = minter.issue(access_key, secret_key)?;
        Ok(Self::with_bearer_token(tenant, bearer_token, config))
    }

    /// Build the configuration around an already-minted bearer token
    pub fn with_bearer_token(
        tenant: &Tenant,
        bearer_token: String,
        config: &OperatorConfig,
    ) -> Self {
        let targets = tenant_endpoints(tenant, config);
        let tls = tenant.spec.tls();
        let (scheme, tls_config) = if tls {
            (
                "https",
                Some(TlsConfig {
                    ca_file: config.ca_file.clone(),
                }),
            )
        } else {
            ("http", None)
        };

        debug!(
            tenant = %tenant.tenant_name(),
            targets = targets.len(),
            tls,
            "synthesized prometheus config"
        );

        Self {
            global: GlobalConfig {
                scrape_interval: PromDuration(config.scrape_interval),
                evaluation_interval: PromDuration(config.evaluation_interval),
            },
            scrape_configs: vec![ScrapeConfig {
                job_name: SERVER_JOB_NAME.to_string(),
                bearer_token,
                metrics_path: config.metrics_path.clone(),
                scheme: scheme.to_string(),
                tls_config,
                static_configs: vec![StaticConfig { targets }],
            }],
        }
    }

    /// Parse a rendered configuration file
    pub fn parse(raw: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Parse the configuration stored in a ConfigMap
    pub fn from_config_map(config_map: &ConfigMap) -> Result<Self> {
        let raw = config_map.data.get(PROMETHEUS_CONFIG_KEY).ok_or_else(|| {
            Error::serialization(format!(
                "config map {} has no {PROMETHEUS_CONFIG_KEY} key",
                config_map.metadata.name
            ))
        })?;
        Self::parse(raw)
    }

    /// Render the configuration file, prefixed with a do-not-edit header
    pub fn config_file(&self) -> Result<String> {
        let body = serde_yaml::to_string(self)?;
        Ok(format!(
            "# This file and config-map is generated by {OPERATOR_NAME}.\n# DO NOT EDIT.\n\n{body}"
        ))
    }

    /// Wrap the rendered configuration in the tenant's ConfigMap
    pub fn to_config_map(&self, tenant: &Tenant) -> Result<ConfigMap> {
        Ok(ConfigMap::new(
            ObjectMeta::owned_by(tenant, tenant.prometheus_config_map_name()),
            BTreeMap::from([(PROMETHEUS_CONFIG_KEY.to_string(), self.config_file()?)]),
        ))
    }

    /// Copy of this configuration with every bearer token cleared
    pub fn masked(&self) -> Self {
        let mut masked = self.clone();
        for scrape in &mut masked.scrape_configs {
            scrape.bearer_token.clear();
        }
        masked
    }

    /// Field-by-field comparison of two configurations, bearer tokens included
    pub fn structurally_equal(&self, other: &Self) -> bool {
        self.global == other.global
            && self.scrape_configs.len() == other.scrape_configs.len()
            && self
                .scrape_configs
                .iter()
                .zip(&other.scrape_configs)
                .all(|(a, b)| a.structurally_equal(b))
    }
}

/// Synthesize the tenant's Prometheus ConfigMap
pub fn prometheus_config_map(
    tenant: &Tenant,
    access_key: &str,
    secret_key: &str,
    config: &OperatorConfig,
) -> Result<ConfigMap> {
    PrometheusConfig::synthesize(tenant, access_key, secret_key, config)?.to_config_map(tenant)
}
