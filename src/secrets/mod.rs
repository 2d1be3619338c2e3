//! Log subsystem credentials
//!
//! The audit log pipeline needs two secrets per tenant: the Postgres password
//! of the log database and the token the object-store servers present to the
//! log search API. Both are generated here, once, from the system CSPRNG and
//! stored in the tenant's log Secret. Consumers reference the Secret by name
//! and key; no plaintext value ever leaves this module except inside the
//! returned [`Secret`].

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use tracing::debug;

use crate::config::OperatorConfig;
use crate::crd::Tenant;
use crate::workload::{ObjectMeta, Secret};
use crate::{Error, Result};

/// Postgres superuser of the log database
pub const LOG_PG_USER: &str = "postgres";

/// Database holding audit events
pub const LOG_AUDIT_DB: &str = "minio_logs";

/// Secret key holding the Postgres password
pub const LOG_PG_PASS_KEY: &str = "POSTGRES_PASSWORD";

/// Secret key holding the audit webhook token
pub const LOG_AUDIT_TOKEN_KEY: &str = "LOG_AUDIT_TOKEN";

/// Secret key holding the full Postgres connection string
pub const LOG_PG_CONN_STR_KEY: &str = "LOG_PG_CONNSTR";

/// Bytes of entropy in every generated value
const RANDOM_BYTES: usize = 32;

/// Generate a URL-safe random string with 256 bits of entropy
pub fn random_token() -> Result<String> {
    let mut raw = [0u8; RANDOM_BYTES];
    aws_lc_rs::rand::fill(&mut raw)
        .map_err(|_| Error::secret("system random generator unavailable"))?;
    Ok(URL_SAFE_NO_PAD.encode(raw))
}

/// `host:port` of the tenant's log database
pub fn log_db_addr(tenant: &Tenant, config: &OperatorConfig) -> String {
    format!(
        "{}.{}.svc.{}:{}",
        tenant.log_db_service_name(),
        tenant.tenant_namespace(),
        config.cluster_domain,
        config.log_db_port
    )
}

/// Admin connection string without a database, for preparing the database
pub fn log_db_conn_str(tenant: &Tenant, password: &str, config: &OperatorConfig) -> String {
    format!(
        "postgres://{LOG_PG_USER}:{password}@{}",
        log_db_addr(tenant, config)
    )
}

/// Connection string the log search API uses
pub fn log_search_conn_str(tenant: &Tenant, password: &str, config: &OperatorConfig) -> String {
    format!(
        "{}/{LOG_AUDIT_DB}?sslmode=disable",
        log_db_conn_str(tenant, password, config)
    )
}

/// Build the tenant's log Secret with freshly generated credentials
///
/// Every call generates new values. The Secret is created once per tenant and
/// never regenerated, since rotating it would orphan the database password.
pub fn materialize_log_secret(tenant: &Tenant, config: &OperatorConfig) -> Result<Secret> {
    let password = random_token()?;
    let audit_token = random_token()?;
    let conn_str = log_search_conn_str(tenant, &password, config);

    let secret = Secret::opaque(ObjectMeta::owned_by(tenant, tenant.log_secret_name()))
        .with_value(LOG_PG_PASS_KEY, &password)
        .with_value(LOG_AUDIT_TOKEN_KEY, &audit_token)
        .with_value(LOG_PG_CONN_STR_KEY, &conn_str);

    debug!(
        tenant = %tenant.tenant_name(),
        secret = %secret.metadata.name,
        "materialized log secret"
    );
    Ok(secret)
}
