//! Pod topology resolution
//!
//! Every server replica of a tenant is reachable at a stable DNS name through
//! the tenant's headless service:
//!
//! ```text
//! <statefulset>-<index>.<headless-service>.<namespace>.svc.<cluster-domain>:<port>
//! ```
//!
//! Order matters: pools in declaration order, replicas in index order. The
//! scrape config embeds this list verbatim and drift detection compares it
//! structurally, so a reordering would read as drift.

use crate::config::OperatorConfig;
use crate::crd::Tenant;

/// Resolve endpoints for `(statefulset name, replica count)` pairs
pub fn resolve_endpoints<'a, I>(
    pools: I,
    headless_service: &str,
    namespace: &str,
    cluster_domain: &str,
    port: u16,
) -> Vec<String>
where
    I: IntoIterator<Item = (&'a str, u32)>,
{
    pools
        .into_iter()
        .flat_map(|(statefulset, servers)| {
            (0..servers).map(move |index| {
                format!(
                    "{statefulset}-{index}.{headless_service}.{namespace}.svc.{cluster_domain}:{port}"
                )
            })
        })
        .collect()
}

/// Stable server pod addresses for a tenant
pub fn tenant_endpoints(tenant: &Tenant, config: &OperatorConfig) -> Vec<String> {
    let statefulsets: Vec<(String, u32)> = tenant
        .spec
        .pools
        .iter()
        .map(|pool| (tenant.pool_statefulset_name(pool), pool.servers))
        .collect();

    resolve_endpoints(
        statefulsets.iter().map(|(name, servers)| (name.as_str(), *servers)),
        &tenant.headless_service_name(),
        &tenant.tenant_namespace(),
        &config.cluster_domain,
        config.server_port,
    )
}
