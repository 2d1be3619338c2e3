//! Operator policy configuration
//!
//! All interval, port and path constants consumed by the artifact builders live
//! in [`OperatorConfig`]. The struct is immutable once built and passed
//! explicitly into every builder, so synthesis stays a pure function of its
//! arguments.

use std::time::Duration;

/// Default Kubernetes cluster DNS suffix
pub const DEFAULT_CLUSTER_DOMAIN: &str = "cluster.local";

/// Environment variable overriding the cluster DNS suffix
pub const CLUSTER_DOMAIN_ENV: &str = "CLUSTER_DOMAIN";

/// Object-store server port exposed by every pool pod
pub const DEFAULT_SERVER_PORT: u16 = 9000;

/// Log search API container/service port
pub const DEFAULT_LOG_SEARCH_API_PORT: u16 = 8080;

/// Postgres port of the log database
pub const DEFAULT_LOG_DB_PORT: u16 = 5432;

/// Default log search API image
pub const DEFAULT_LOG_SEARCH_API_IMAGE: &str = "minio/log-search-api";

/// CA bundle mounted into every pod by the service account admission plugin
pub const DEFAULT_CA_FILE: &str = "/var/run/secrets/kubernetes.io/serviceaccount/ca.crt";

/// Metrics path served by the object-store servers
pub const DEFAULT_METRICS_PATH: &str = "/minio/prometheus/metrics";

/// Issuer claim on bearer tokens minted for the scraper
pub const DEFAULT_TOKEN_ISSUER: &str = "prometheus";

/// Bearer token lifetime. Effectively non-expiring by policy; rotation happens
/// through the secret key, not through expiry.
pub const DEFAULT_TOKEN_VALIDITY: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Policy inputs for artifact synthesis
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperatorConfig {
    /// Cluster DNS suffix used in every pod/service address
    pub cluster_domain: String,
    /// Port the object-store servers listen on
    pub server_port: u16,
    /// Prometheus global scrape interval
    pub scrape_interval: Duration,
    /// Prometheus global rule evaluation interval
    pub evaluation_interval: Duration,
    /// Path scraped on every server
    pub metrics_path: String,
    /// Trust anchor used when the tenant serves TLS
    pub ca_file: String,
    /// Issuer claim on minted bearer tokens
    pub token_issuer: String,
    /// Lifetime of minted bearer tokens
    pub token_validity: Duration,
    /// Log search API image
    pub log_search_api_image: String,
    /// Log search API port
    pub log_search_api_port: u16,
    /// Log database port
    pub log_db_port: u16,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            cluster_domain: DEFAULT_CLUSTER_DOMAIN.to_string(),
            server_port: DEFAULT_SERVER_PORT,
            scrape_interval: Duration::from_secs(10),
            evaluation_interval: Duration::from_secs(30),
            metrics_path: DEFAULT_METRICS_PATH.to_string(),
            ca_file: DEFAULT_CA_FILE.to_string(),
            token_issuer: DEFAULT_TOKEN_ISSUER.to_string(),
            token_validity: DEFAULT_TOKEN_VALIDITY,
            log_search_api_image: DEFAULT_LOG_SEARCH_API_IMAGE.to_string(),
            log_search_api_port: DEFAULT_LOG_SEARCH_API_PORT,
            log_db_port: DEFAULT_LOG_DB_PORT,
        }
    }
}

impl OperatorConfig {
    /// Build the default config, honoring `CLUSTER_DOMAIN` when set
    pub fn from_env() -> Self {
        let config = Self::default();
        match std::env::var(CLUSTER_DOMAIN_ENV) {
            Ok(domain) if !domain.trim().is_empty() => config.with_cluster_domain(domain),
            _ => config,
        }
    }

    /// Override the cluster DNS suffix
    pub fn with_cluster_domain(mut self, domain: impl Into<String>) -> Self {
        self.cluster_domain = domain.into();
        self
    }
}
