//! EKS control plane declaration.

use serde_json::json;

use crate::error::Result;
use crate::infra::Environment;
use crate::network::Network;
use crate::terraform::{Address, Block, Stack};

pub const MODULE_SOURCE: &str = "terraform-aws-modules/eks/aws";
pub const MODULE_VERSION: &str = "~> 20.0";

/// Internal range allowed to reach the private API endpoint.
pub const INTERNAL_CIDR: &str = "10.0.0.0/8";

/// Handle on a declared cluster, used to reference its outputs.
#[derive(Debug, Clone)]
pub struct Cluster {
    pub name: String,
    pub address: Address,
}

impl Cluster {
    pub fn endpoint(&self) -> String {
        self.address.attr("cluster_endpoint")
    }

    pub fn version(&self) -> String {
        self.address.attr("cluster_version")
    }

    pub fn oidc_provider(&self) -> String {
        self.address.attr("oidc_provider")
    }

    pub fn oidc_provider_arn(&self) -> String {
        self.address.attr("oidc_provider_arn")
    }

    /// Bare traversal of a module output, for use inside function calls.
    pub fn output(&self, name: &str) -> String {
        self.address.traversal(name)
    }
}

/// Declare the control plane for one project: private endpoint only, API and
/// ConfigMap authentication, and HTTPS ingress from the internal range.
pub fn build(
    stack: &mut Stack,
    name: &str,
    k8s_version: &str,
    project: &str,
    environment: Environment,
    network: &Network,
) -> Result<Cluster> {
    let block = Block::module(name, MODULE_SOURCE, MODULE_VERSION)
        .attr("authentication_mode", "API_AND_CONFIG_MAP")
        .attr("cluster_name", name)
        .attr("cluster_version", k8s_version)
        .attr("cluster_endpoint_private_access", true)
        .attr("cluster_endpoint_public_access", false)
        .attr("enable_cluster_creator_admin_permissions", true)
        .attr("vpc_id", network.vpc_id.as_str())
        .attr("subnet_ids", network.subnet_ids())
        .attr(
            "cluster_security_group_additional_rules",
            json!({
                "ingress_epo_https_tcp": {
                    "description": "Allow inbound HTTPS from EPO",
                    "protocol": "tcp",
                    "from_port": 443,
                    "to_port": 443,
                    "type": "ingress",
                    "cidr_blocks": [INTERNAL_CIDR],
                }
            }),
        )
        .attr(
            "tags",
            json!({
                "environment": environment.label(),
                "project": project,
            }),
        );

    let address = stack.add(block)?;
    Ok(Cluster {
        name: name.to_string(),
        address,
    })
}
