//! End-to-end reconcile passes over the public API
//!
//! Each story drives the same path a controller would: synthesize the desired
//! ConfigMap, hand it back as the "live" object, mutate the world (time, keys,
//! topology, the object itself) and check what the next pass decides.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use rstest::rstest;
use sha2::Sha256;

use objectstore_operator::credential::CredentialMinter;
use objectstore_operator::crd::{ImagePullPolicy, Pool, Tenant, TenantSpec};
use objectstore_operator::drift::{update_prometheus_config_map, DriftDetector, DriftReason};
use objectstore_operator::logsearch::log_search_api_deployment;
use objectstore_operator::prometheus::{
    prometheus_config_map, PrometheusConfig, PROMETHEUS_CONFIG_KEY,
};
use objectstore_operator::secrets::{materialize_log_secret, LOG_AUDIT_TOKEN_KEY, LOG_PG_PASS_KEY};
use objectstore_operator::topology::resolve_endpoints;
use objectstore_operator::OperatorConfig;

const ACCESS_KEY: &str = "tenant-access";
const SECRET_KEY: &str = "tenant-secret";

fn tenant(pools: &[(&str, u32)], tls: bool) -> Tenant {
    let mut tenant = Tenant::new(
        "storage",
        TenantSpec {
            pools: pools
                .iter()
                .map(|(name, servers)| Pool::new(*name, *servers))
                .collect(),
            request_auto_cert: tls,
            external_cert_secret: None,
            image_pull_policy: ImagePullPolicy::IfNotPresent,
            image_pull_secret: None,
            service_account_name: String::new(),
            log: None,
        },
    );
    tenant.metadata.namespace = Some("tenant-ns".to_string());
    tenant
}

fn live_config(tenant: &Tenant, secret_key: &str, issued_at: u64) -> PrometheusConfig {
    let config = OperatorConfig::default();
    let token = CredentialMinter::new(&config.token_issuer, config.token_validity)
        .issue_at(ACCESS_KEY, secret_key, issued_at)
        .unwrap();
    PrometheusConfig::with_bearer_token(tenant, token, &config)
}

// =============================================================================
// Determinism and idempotence
// =============================================================================

#[test]
fn story_synthesis_is_deterministic_apart_from_the_token() {
    let tenant = tenant(&[("pool-0", 4)], true);
    let first = live_config(&tenant, SECRET_KEY, 1_700_000_000);
    let second = live_config(&tenant, SECRET_KEY, 1_700_000_777);

    assert_ne!(
        first.scrape_configs[0].bearer_token,
        second.scrape_configs[0].bearer_token
    );
    assert_eq!(
        first.masked().config_file().unwrap(),
        second.masked().config_file().unwrap()
    );
}

#[test]
fn story_second_pass_over_own_output_is_a_no_op() {
    let tenant = tenant(&[("pool-0", 4), ("pool-1", 4)], false);
    let config = OperatorConfig::default();

    let live = prometheus_config_map(&tenant, ACCESS_KEY, SECRET_KEY, &config).unwrap();
    let update =
        update_prometheus_config_map(&tenant, ACCESS_KEY, SECRET_KEY, &live, &config).unwrap();

    assert!(update.is_none());
}

#[test]
fn story_older_token_under_same_key_is_not_drift() {
    let tenant = tenant(&[("pool-0", 4)], false);
    let config = OperatorConfig::default();
    let live = live_config(&tenant, SECRET_KEY, 1_600_000_000)
        .to_config_map(&tenant)
        .unwrap();

    let update =
        update_prometheus_config_map(&tenant, ACCESS_KEY, SECRET_KEY, &live, &config).unwrap();
    assert!(update.is_none());
}

// =============================================================================
// Key rotation
// =============================================================================

#[test]
fn story_secret_key_rotation_rewrites_config() {
    let tenant = tenant(&[("pool-0", 4)], false);
    let config = OperatorConfig::default();
    let live = prometheus_config_map(&tenant, ACCESS_KEY, "old-secret", &config).unwrap();

    let update = update_prometheus_config_map(&tenant, ACCESS_KEY, "new-secret", &live, &config)
        .unwrap()
        .expect("rotated key must force a rewrite");

    let rewritten = PrometheusConfig::from_config_map(&update).unwrap();
    let minter = CredentialMinter::new(&config.token_issuer, config.token_validity);
    assert!(minter.verify(&rewritten.scrape_configs[0].bearer_token, "new-secret"));
    assert!(!minter.verify(&rewritten.scrape_configs[0].bearer_token, "old-secret"));
}

// =============================================================================
// Topology and scheme
// =============================================================================

#[test]
fn story_topology_scenario_lists_every_replica_in_order() {
    let endpoints = resolve_endpoints([("pool0", 3), ("pool1", 2)], "h", "ns", "cluster.local", 9000);

    assert_eq!(endpoints.len(), 5);
    assert_eq!(endpoints.first().unwrap(), "pool0-0.h.ns.svc.cluster.local:9000");
    assert_eq!(endpoints[3], "pool1-0.h.ns.svc.cluster.local:9000");
    assert_eq!(endpoints.last().unwrap(), "pool1-1.h.ns.svc.cluster.local:9000");
}

#[test]
fn story_scaling_out_a_pool_is_drift() {
    let config = OperatorConfig::default();
    let before = tenant(&[("pool-0", 4)], false);
    let after = tenant(&[("pool-0", 4), ("pool-1", 4)], false);
    let live = prometheus_config_map(&before, ACCESS_KEY, SECRET_KEY, &config).unwrap();

    let update = update_prometheus_config_map(&after, ACCESS_KEY, SECRET_KEY, &live, &config)
        .unwrap()
        .expect("new pool must be scraped");

    let rewritten = PrometheusConfig::from_config_map(&update).unwrap();
    assert_eq!(rewritten.scrape_configs[0].static_configs[0].targets.len(), 8);
}

#[rstest]
#[case::plain(false, "http")]
#[case::tls(true, "https")]
fn story_scheme_follows_tls(#[case] tls: bool, #[case] scheme: &str) {
    let config = live_config(&tenant(&[("pool-0", 4)], tls), SECRET_KEY, 1_700_000_000);
    let job = &config.scrape_configs[0];

    assert_eq!(job.scheme, scheme);
    assert_eq!(job.tls_config.is_some(), tls);
}

// =============================================================================
// Corruption and tampering
// =============================================================================

#[rstest]
#[case::truncated("global:\n  scrape_interval: 10s\n")]
#[case::hand_edited_extra_field(
    "global:\n  scrape_interval: 10s\n  evaluation_interval: 30s\n  external_labels: {}\nscrape_configs: []\n"
)]
#[case::binary_noise("\u{0}\u{1}\u{2}")]
fn story_corrupt_live_config_is_rewritten(#[case] raw: &str) {
    let tenant = tenant(&[("pool-0", 4)], false);
    let config = OperatorConfig::default();
    let mut live = prometheus_config_map(&tenant, ACCESS_KEY, SECRET_KEY, &config).unwrap();
    live.data
        .insert(PROMETHEUS_CONFIG_KEY.to_string(), raw.to_string());

    let update =
        update_prometheus_config_map(&tenant, ACCESS_KEY, SECRET_KEY, &live, &config).unwrap();
    assert!(update.is_some());

    let desired = live_config(&tenant, SECRET_KEY, 1_700_000_000);
    let decision = DriftDetector::from_config(&config).needs_update(desired, raw, SECRET_KEY);
    assert_eq!(decision.reason(), Some(DriftReason::Corrupt));
}

#[rstest]
#[case::rs256("RS256")]
#[case::es256("ES256")]
#[case::none("none")]
fn story_token_with_asymmetric_header_is_replaced(#[case] alg: &str) {
    let tenant = tenant(&[("pool-0", 4)], false);
    let config = OperatorConfig::default();

    // HMAC-signed with the right key, but labelled as another algorithm
    let header = format!(r#"{{"alg":"{alg}","typ":"JWT"}}"#);
    let claims = r#"{"sub":"tenant-access","iss":"prometheus","iat":1700000000,"exp":4000000000}"#;
    let signing_input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header),
        URL_SAFE_NO_PAD.encode(claims)
    );
    let mut mac = Hmac::<Sha256>::new_from_slice(SECRET_KEY.as_bytes()).unwrap();
    mac.update(signing_input.as_bytes());
    let forged = format!(
        "{signing_input}.{}",
        URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
    );

    let observed = PrometheusConfig::with_bearer_token(&tenant, forged, &config);
    let desired = live_config(&tenant, SECRET_KEY, 1_700_000_000);
    let decision = DriftDetector::from_config(&config).compare(desired, &observed, SECRET_KEY);

    assert_eq!(decision.reason(), Some(DriftReason::TokenInvalid));
}

// =============================================================================
// Log subsystem
// =============================================================================

#[test]
fn story_log_artifacts_share_secret_by_name_only() {
    let tenant = tenant(&[("pool-0", 4)], false);
    let config = OperatorConfig::default();

    let secret = materialize_log_secret(&tenant, &config).unwrap();
    let deployment = serde_yaml::to_string(&log_search_api_deployment(&tenant, &config)).unwrap();

    assert!(deployment.contains(&secret.metadata.name));
    for key in [LOG_PG_PASS_KEY, LOG_AUDIT_TOKEN_KEY] {
        assert!(!deployment.contains(&secret.value(key).unwrap()));
    }
}
