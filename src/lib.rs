//! ekstack - Terraform configuration for EKS clusters.
//!
//! Loads a per-cluster JSON configuration and composes the desired-state
//! graph for each project in it:
//! - VPC and private subnet lookups
//! - EKS control plane and managed node groups
//! - Managed add-ons, optionally with Cilium as the CNI
//! - Cross-account external-dns role
//! - AWX bootstrap job
//!
//! The graph is validated and written as `cdk.tf.json` for Terraform to plan and apply.

pub mod bootstrap;
pub mod config;
pub mod eks;
pub mod error;
pub mod iam;
pub mod infra;
pub mod logging;
pub mod network;
pub mod output;
pub mod providers;
pub mod secrets;
pub mod stack;
pub mod terraform;
