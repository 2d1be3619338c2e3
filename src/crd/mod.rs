//! Custom Resource Definitions for the objectstore operator
//!
//! This module contains the `Tenant` CRD and its supporting types.

mod tenant;
mod types;

pub use tenant::{
    Tenant, TenantSpec, HEADLESS_SERVICE_SUFFIX, LOG_DB_SERVICE_SUFFIX,
    LOG_SEARCH_API_INSTANCE_LABEL, LOG_SEARCH_API_SUFFIX, LOG_SECRET_SUFFIX,
    PROMETHEUS_CONFIG_MAP_SUFFIX, TENANT_LABEL,
};
pub use types::{AuditConfig, ImagePullPolicy, LogConfig, Pool};
