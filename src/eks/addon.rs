//! Managed EKS add-ons, versioned against the cluster's Kubernetes version.

use serde_json::{Map, Value, json};
use tracing::info;

use super::cilium;
use super::cluster::Cluster;
use crate::error::Result;
use crate::terraform::{Address, Block, Stack};

pub const ADDONS_MODULE_SOURCE: &str = "aws-ia/eks-blueprints-addons/aws";
pub const ADDONS_MODULE_VERSION: &str = "~> 1.16";

pub const IRSA_MODULE_SOURCE: &str =
    "terraform-aws-modules/iam/aws//modules/iam-role-for-service-accounts-eks";
pub const IRSA_MODULE_VERSION: &str = "~> 5.0";

pub const EBS_CSI_DRIVER: &str = "aws-ebs-csi-driver";
pub const EBS_CSI_SERVICE_ACCOUNT: &str = "kube-system:ebs-csi-controller-sa";

/// Every add-on whose latest compatible version is looked up.
pub const CATALOG: [&str; 5] = [
    "coredns",
    EBS_CSI_DRIVER,
    "eks-pod-identity-agent",
    "vpc-cni",
    "kube-proxy",
];

/// Installed on every cluster.
pub const BASELINE: [&str; 3] = ["coredns", EBS_CSI_DRIVER, "eks-pod-identity-agent"];

/// Installed only when Cilium is not the CNI.
pub const DEFAULT_CNI: [&str; 2] = ["vpc-cni", "kube-proxy"];

/// Handle on the add-ons module and what it installs.
#[derive(Debug, Clone)]
pub struct Addons {
    pub address: Address,
    pub installed: Vec<&'static str>,
    pub cilium: Option<cilium::Cilium>,
}

/// Add-on names to install: the baseline plus either the default CNI pair or nothing.
pub fn selected(install_cilium: bool) -> Vec<&'static str> {
    let mut names = BASELINE.to_vec();
    if !install_cilium {
        names.extend(DEFAULT_CNI);
    }
    names
}

/// Declare version lookups, the EBS CSI driver role and the add-ons module.
///
/// With `install_cilium`, the Cilium chain is declared as well and the add-ons
/// module waits for its Helm release.
pub fn build(
    stack: &mut Stack,
    cluster: &Cluster,
    nodegroups: &[Address],
    install_cilium: bool,
) -> Result<Addons> {
    let name = cluster.name.as_str();

    let mut versions = Map::new();
    for addon in CATALOG {
        let data = stack.add(
            Block::data("aws_eks_addon_version", &format!("addon-{}-{}", addon, name))
                .attr("addon_name", addon)
                .attr("kubernetes_version", cluster.version())
                .attr("most_recent", true),
        )?;
        versions.insert(addon.to_string(), Value::String(data.attr("version")));
    }

    let ebs_role = stack.add(
        Block::module(
            &format!("ebs-csi-driver-{}", name),
            IRSA_MODULE_SOURCE,
            IRSA_MODULE_VERSION,
        )
        .attr("role_name_prefix", "ebs-csi-driver-")
        .attr("attach_ebs_csi_policy", true)
        .attr(
            "oidc_providers",
            json!({
                "main": {
                    "provider_arn": cluster.oidc_provider_arn(),
                    "namespace_service_accounts": [EBS_CSI_SERVICE_ACCOUNT],
                }
            }),
        ),
    )?;

    let installed = selected(install_cilium);
    let mut addons = Map::new();
    for addon in &installed {
        let mut config = Map::new();
        if let Some(version) = versions.get(*addon) {
            config.insert("addon_version".to_string(), version.clone());
        }
        if *addon == EBS_CSI_DRIVER {
            config.insert(
                "service_account_role_arn".to_string(),
                Value::String(ebs_role.attr("iam_role_arn")),
            );
        }
        addons.insert(addon.to_string(), Value::Object(config));
    }

    let cilium = if install_cilium {
        Some(cilium::install(stack, cluster, nodegroups)?)
    } else {
        None
    };

    let mut block = Block::module(
        &format!("eksaddons-{}", name),
        ADDONS_MODULE_SOURCE,
        ADDONS_MODULE_VERSION,
    )
    .attr("cluster_endpoint", cluster.endpoint())
    .attr("cluster_name", name)
    .attr("cluster_version", cluster.version())
    .attr("oidc_provider_arn", cluster.oidc_provider_arn())
    .attr("eks_addons", Value::Object(addons))
    .depends_on(&cluster.address)
    .depends_on_all(nodegroups);
    if let Some(cilium) = &cilium {
        block = block.depends_on(&cilium.release);
    }

    let address = stack.add(block)?;
    info!(cluster = name, addons = ?installed, cilium = install_cilium, "Declared add-ons");

    Ok(Addons {
        address,
        installed,
        cilium,
    })
}
