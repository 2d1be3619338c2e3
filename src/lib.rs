//! Objectstore Operator - artifact synthesis and drift reconciliation for tenants
//!
//! Given a `Tenant` custom resource and its secret material, this crate computes the
//! derived configuration artifacts the operator owns and decides whether a live
//! artifact has drifted far enough from the desired one to be replaced.
//!
//! # Architecture
//!
//! Every operation is a pure, synchronous function of its explicit inputs:
//! - Tenant spec → pod topology → Prometheus scrape config (with a signed bearer token)
//! - Desired scrape config + observed ConfigMap → unchanged | replace
//! - Tenant spec → log Secret (random credentials) and log search API Deployment
//!
//! The caller owns the control loop, the API server round-trips and the
//! serialization of reconcile passes for a single tenant.
//!
//! # Modules
//!
//! - [`crd`] - The `Tenant` Custom Resource Definition and derived names
//! - [`config`] - Immutable policy configuration (intervals, ports, paths)
//! - [`topology`] - Stable pod addresses for every pool replica
//! - [`credential`] - HMAC-signed bearer tokens for the Prometheus scraper
//! - [`prometheus`] - Scrape configuration synthesis and its ConfigMap encoding
//! - [`drift`] - Verification-gated masked comparison of desired vs. observed config
//! - [`secrets`] - Log Secret materialization
//! - [`logsearch`] - Log search API Deployment and audit webhook configuration
//! - [`workload`] - Typed Kubernetes manifests emitted by the builders
//! - [`error`] - Error types for the operator

#![deny(missing_docs)]

pub mod config;
pub mod credential;
pub mod crd;
pub mod drift;
pub mod error;
pub mod logsearch;
pub mod prometheus;
pub mod secrets;
pub mod topology;
pub mod workload;

pub use config::OperatorConfig;
pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Field manager / managed-by value stamped on every generated resource
pub const OPERATOR_NAME: &str = "objectstore-operator";
