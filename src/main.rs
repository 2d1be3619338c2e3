//! Objectstore Operator - tenant artifact rendering and drift checks

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use kube::CustomResourceExt;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use objectstore_operator::crd::Tenant;
use objectstore_operator::drift::update_prometheus_config_map;
use objectstore_operator::logsearch::log_search_api_deployment;
use objectstore_operator::prometheus::prometheus_config_map;
use objectstore_operator::secrets::materialize_log_secret;
use objectstore_operator::workload::ConfigMap;
use objectstore_operator::OperatorConfig;

/// Objectstore Operator - derive and reconcile tenant configuration artifacts
#[derive(Parser, Debug)]
#[command(name = "objectstore-operator", version, about, long_about = None)]
struct Cli {
    /// Generate CRD manifests and exit
    #[arg(long)]
    crd: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render every artifact derived from a Tenant as multi-document YAML
    ///
    /// Emits the Prometheus ConfigMap and, when the tenant enables audit
    /// logging, a freshly generated log Secret and the log search API
    /// Deployment.
    Render(RenderArgs),

    /// Check a live Prometheus ConfigMap for drift
    ///
    /// Prints `unchanged`, or the replacement ConfigMap when the live one is
    /// corrupt, carries a token signed with a stale key, or differs
    /// structurally.
    Diff(DiffArgs),
}

/// Tenant inputs shared by all subcommands
#[derive(Parser, Debug)]
struct TenantArgs {
    /// Path to the Tenant YAML manifest
    #[arg(short = 'f', long = "tenant")]
    tenant_file: PathBuf,

    /// Tenant access key
    #[arg(long, env = "TENANT_ACCESS_KEY", hide_env_values = true)]
    access_key: String,

    /// Tenant secret key, used to sign the scraper bearer token
    #[arg(long, env = "TENANT_SECRET_KEY", hide_env_values = true)]
    secret_key: String,

    /// Kubernetes cluster DNS suffix
    #[arg(long, env = "CLUSTER_DOMAIN")]
    cluster_domain: Option<String>,
}

impl TenantArgs {
    fn operator_config(&self) -> OperatorConfig {
        match &self.cluster_domain {
            Some(domain) => OperatorConfig::default().with_cluster_domain(domain),
            None => OperatorConfig::from_env(),
        }
    }
}

/// Render mode arguments
#[derive(Parser, Debug)]
struct RenderArgs {
    #[command(flatten)]
    tenant: TenantArgs,
}

/// Diff mode arguments
#[derive(Parser, Debug)]
struct DiffArgs {
    #[command(flatten)]
    tenant: TenantArgs,

    /// Path to the live Prometheus ConfigMap YAML
    #[arg(long = "config-map")]
    config_map_file: PathBuf,
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so rendered YAML on stdout stays pipeable
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if cli.crd {
        let crd = serde_yaml::to_string(&Tenant::crd())
            .map_err(|e| anyhow::anyhow!("Failed to serialize CRD: {}", e))?;
        println!("{crd}");
        return Ok(());
    }

    match cli.command {
        Some(Commands::Render(args)) => run_render(args),
        Some(Commands::Diff(args)) => run_diff(args),
        None => {
            anyhow::bail!("no command given; use --crd, render or diff (see --help)")
        }
    }
}

fn load_tenant(path: &Path) -> anyhow::Result<Tenant> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read tenant file {:?}: {}", path, e))?;

    let tenant: Tenant = serde_yaml::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Failed to parse Tenant manifest: {}", e))?;

    if tenant.metadata.name.is_none() {
        anyhow::bail!("Tenant must have metadata.name");
    }
    if tenant.metadata.namespace.is_none() {
        anyhow::bail!("Tenant must have metadata.namespace");
    }
    tenant.spec.validate()?;

    Ok(tenant)
}

/// Render all derived artifacts for a tenant
fn run_render(args: RenderArgs) -> anyhow::Result<()> {
    let tenant = load_tenant(&args.tenant.tenant_file)?;
    let config = args.tenant.operator_config();

    let mut documents = vec![serde_yaml::to_string(&prometheus_config_map(
        &tenant,
        &args.tenant.access_key,
        &args.tenant.secret_key,
        &config,
    )?)?];

    if tenant.spec.log_enabled() {
        documents.push(serde_yaml::to_string(&materialize_log_secret(
            &tenant, &config,
        )?)?);
        documents.push(serde_yaml::to_string(&log_search_api_deployment(
            &tenant, &config,
        ))?);
    }

    info!(
        tenant = %tenant.tenant_name(),
        artifacts = documents.len(),
        "rendered tenant artifacts"
    );
    print!("{}", documents.join("---\n"));
    Ok(())
}

/// Compare a live Prometheus ConfigMap against the desired one
fn run_diff(args: DiffArgs) -> anyhow::Result<()> {
    let tenant = load_tenant(&args.tenant.tenant_file)?;
    let config = args.tenant.operator_config();

    let content = std::fs::read_to_string(&args.config_map_file).map_err(|e| {
        anyhow::anyhow!(
            "Failed to read config map file {:?}: {}",
            args.config_map_file,
            e
        )
    })?;
    let existing: ConfigMap = serde_yaml::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Failed to parse ConfigMap: {}", e))?;

    match update_prometheus_config_map(
        &tenant,
        &args.tenant.access_key,
        &args.tenant.secret_key,
        &existing,
        &config,
    )? {
        Some(replacement) => print!("{}", serde_yaml::to_string(&replacement)?),
        None => println!("unchanged"),
    }
    Ok(())
}
