//! Supporting types for the Tenant CRD

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A named, sized group of homogeneous object-store servers
///
/// Each pool is realized as one StatefulSet whose pods are addressable through
/// the tenant's headless service.
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pool {
    /// Pool name, unique within the tenant
    pub name: String,

    /// Number of server replicas in the pool
    pub servers: u32,
}

impl Pool {
    /// Create a pool with the given name and replica count
    pub fn new(name: impl Into<String>, servers: u32) -> Self {
        Self {
            name: name.into(),
            servers,
        }
    }
}

/// Container image pull policy
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[non_exhaustive]
pub enum ImagePullPolicy {
    /// Always pull the image
    Always,
    /// Pull only when the image is not cached on the node
    #[default]
    IfNotPresent,
    /// Never pull, the image must already be present
    Never,
}

impl ImagePullPolicy {
    /// Kubernetes wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Always => "Always",
            Self::IfNotPresent => "IfNotPresent",
            Self::Never => "Never",
        }
    }
}

impl std::str::FromStr for ImagePullPolicy {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Always" => Ok(Self::Always),
            "IfNotPresent" => Ok(Self::IfNotPresent),
            "Never" => Ok(Self::Never),
            _ => Err(crate::Error::validation(format!(
                "invalid image pull policy: {s}, expected one of: Always, IfNotPresent, Never"
            ))),
        }
    }
}

impl std::fmt::Display for ImagePullPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log subsystem configuration
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LogConfig {
    /// Audit log settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit: Option<AuditConfig>,
}

/// Audit log settings
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuditConfig {
    /// Days to keep audit events; unset means keep forever
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retention_period: Option<u32>,
}
