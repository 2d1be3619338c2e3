//! Drift detection for the Prometheus ConfigMap
//!
//! Plain structural equality would report drift on every pass, because each
//! synthesis mints a token with a new issue time. Masking tokens blindly would
//! hide a key rotation. The detector therefore gates masking on verification:
//!
//! 1. Observed config does not parse → replace (recovers corrupt or foreign edits).
//! 2. Any observed token fails verification under the current secret key → replace.
//! 3. Otherwise compare both documents with tokens masked → replace iff different.

use tracing::{debug, info};

use crate::config::OperatorConfig;
use crate::credential::CredentialMinter;
use crate::crd::Tenant;
use crate::prometheus::PrometheusConfig;
use crate::workload::ConfigMap;
use crate::Result;

/// Why an observed artifact must be replaced
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriftReason {
    /// Observed document failed to parse
    Corrupt,
    /// Observed bearer token does not verify under the current secret key
    TokenInvalid,
    /// Tokens are valid but the rest of the document differs
    Changed,
}

impl std::fmt::Display for DriftReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Corrupt => write!(f, "corrupt"),
            Self::TokenInvalid => write!(f, "token-invalid"),
            Self::Changed => write!(f, "changed"),
        }
    }
}

/// Outcome of comparing desired and observed configuration
#[derive(Clone, Debug)]
pub enum DriftDecision {
    /// Observed artifact already matches; nothing to write
    Unchanged,
    /// Observed artifact must be replaced by `desired`
    Replace {
        /// The configuration to write
        desired: PrometheusConfig,
        /// Why the write is needed
        reason: DriftReason,
    },
}

impl DriftDecision {
    /// Returns true if a write is required
    pub fn needs_update(&self) -> bool {
        matches!(self, Self::Replace { .. })
    }

    /// Reason for replacement, if any
    pub fn reason(&self) -> Option<DriftReason> {
        match self {
            Self::Unchanged => None,
            Self::Replace { reason, .. } => Some(*reason),
        }
    }

    /// The configuration to write, if any
    pub fn into_desired(self) -> Option<PrometheusConfig> {
        match self {
            Self::Unchanged => None,
            Self::Replace { desired, .. } => Some(desired),
        }
    }
}

/// Compares desired and observed scrape configuration
#[derive(Clone, Debug)]
pub struct DriftDetector {
    minter: CredentialMinter,
}

impl DriftDetector {
    /// Create a detector verifying tokens with the given minter's issuer
    pub fn new(minter: CredentialMinter) -> Self {
        Self { minter }
    }

    /// Create a detector from operator policy
    pub fn from_config(config: &OperatorConfig) -> Self {
        Self::new(CredentialMinter::new(
            &config.token_issuer,
            config.token_validity,
        ))
    }

    /// Decide whether `observed_raw` must be replaced by `desired`
    pub fn needs_update(
        &self,
        desired: PrometheusConfig,
        observed_raw: &str,
        secret_key: &str,
    ) -> DriftDecision {
        match PrometheusConfig::parse(observed_raw) {
            Ok(observed) => self.compare(desired, &observed, secret_key),
            Err(e) => {
                debug!(error = %e, "observed prometheus config does not parse");
                DriftDecision::Replace {
                    desired,
                    reason: DriftReason::Corrupt,
                }
            }
        }
    }

    /// Decide against an already-parsed observed configuration
    pub fn compare(
        &self,
        desired: PrometheusConfig,
        observed: &PrometheusConfig,
        secret_key: &str,
    ) -> DriftDecision {
        if !self.tokens_valid(observed, secret_key) {
            return DriftDecision::Replace {
                desired,
                reason: DriftReason::TokenInvalid,
            };
        }

        if desired.masked().structurally_equal(&observed.masked()) {
            DriftDecision::Unchanged
        } else {
            DriftDecision::Replace {
                desired,
                reason: DriftReason::Changed,
            }
        }
    }

    /// Every scrape job must carry a token signed with the current key.
    /// A document without jobs has nothing to vouch for it.
    fn tokens_valid(&self, observed: &PrometheusConfig, secret_key: &str) -> bool {
        !observed.scrape_configs.is_empty()
            && observed
                .scrape_configs
                .iter()
                .all(|scrape| self.minter.verify(&scrape.bearer_token, secret_key))
    }
}

/// Returns the ConfigMap to write if `existing` has drifted, `None` otherwise
pub fn update_prometheus_config_map(
    tenant: &Tenant,
    access_key: &str,
    secret_key: &str,
    existing: &ConfigMap,
    config: &OperatorConfig,
) -> Result<Option<ConfigMap>> {
    let desired = PrometheusConfig::synthesize(tenant, access_key, secret_key, config)?;
    let detector = DriftDetector::from_config(config);

    let decision = match PrometheusConfig::from_config_map(existing) {
        Ok(observed) => detector.compare(desired, &observed, secret_key),
        Err(e) => {
            debug!(error = %e, "existing prometheus config map is unreadable");
            DriftDecision::Replace {
                desired,
                reason: DriftReason::Corrupt,
            }
        }
    };

    match decision {
        DriftDecision::Unchanged => {
            debug!(tenant = %tenant.tenant_name(), "prometheus config up to date");
            Ok(None)
        }
        DriftDecision::Replace { desired, reason } => {
            info!(
                tenant = %tenant.tenant_name(),
                %reason,
                "prometheus config needs update"
            );
            desired.to_config_map(tenant).map(Some)
        }
    }
}
