//! Managed node groups and the per-cluster SSH key pair.

use serde_json::json;
use tracing::debug;

use super::cluster::Cluster;
use crate::error::Result;
use crate::infra::NodegroupConfig;
use crate::network::Network;
use crate::secrets::declare;
use crate::terraform::{Address, Block, Stack, expr};

pub const MODULE_SOURCE: &str = "terraform-aws-modules/eks/aws//modules/eks-managed-node-group";
pub const MODULE_VERSION: &str = "~> 20.0";

pub const SSH_SECRET_PATH: &str = "secret/all-clusters/kube-system/ssh";
pub const SSH_PUBLIC_KEY_FIELD: &str = "id_rsa.pub";

pub const MIN_SIZE: u32 = 1;
pub const CAPACITY_TYPE: &str = "SPOT";

/// Runs before the EKS bootstrap script: containerd runtime, 110 pods per node.
pub const PRE_BOOTSTRAP_USER_DATA: &str = r#"#!/bin/bash
set -ex
cat <<-EOF > /etc/profile.d/bootstrap.sh
export CONTAINER_RUNTIME="containerd"
export USE_MAX_PODS=false
export KUBELET_EXTRA_ARGS="--max-pods=110"
EOF
# Source extra environment variables in bootstrap script
sed -i '/^set -o errexit/a\nsource /etc/profile.d/bootstrap.sh' /etc/eks/bootstrap.sh
"#;

/// Key pair named after the cluster, holding the shared public key from Vault.
///
/// Created once per cluster and reused by every node group.
pub fn key_pair(stack: &mut Stack, cluster_name: &str) -> Address {
    let secret = declare::read_secret(stack, "idrsa", SSH_SECRET_PATH);
    let key_name = format!("ssh-keypair-{}", cluster_name);
    stack.ensure(
        Block::resource("aws_key_pair", &key_name)
            .attr("key_name", key_name.as_str())
            .attr("public_key", declare::field(&secret, SSH_PUBLIC_KEY_FIELD)),
    )
}

/// Declare one managed node group per entry, in config order.
///
/// Groups are addressed `nodegroup-<project>-<index>` and each depends on the
/// cluster and the key pair.
pub fn build(
    stack: &mut Stack,
    cluster: &Cluster,
    k8s_version: &str,
    project: &str,
    network: &Network,
    nodegroups: &[NodegroupConfig],
) -> Result<Vec<Address>> {
    let key_pair = key_pair(stack, &cluster.name);
    let mut declared = Vec::with_capacity(nodegroups.len());

    for (index, nodegroup) in nodegroups.iter().enumerate() {
        let instance_types = nodegroup.instance_types()?;
        let max_size = nodegroup.max_capacity();
        debug!(
            nodegroup = %nodegroup.node_name,
            size = %nodegroup.node_size,
            ?instance_types,
            max_size,
            "Resolved node group sizing"
        );

        let block = Block::module(
            &format!("nodegroup-{}-{}", project, index),
            MODULE_SOURCE,
            MODULE_VERSION,
        )
        .attr("cluster_name", cluster.name.as_str())
        .attr("cluster_version", k8s_version)
        .attr("subnet_ids", network.subnet_ids())
        .attr("name", nodegroup.node_name.as_str())
        .attr("min_size", MIN_SIZE)
        .attr("max_size", max_size)
        .attr("desired_size", nodegroup.desire_number_nodes)
        .attr("instance_types", instance_types)
        .attr("capacity_type", CAPACITY_TYPE)
        .attr("cluster_service_cidr", network.cidr_block())
        .attr("pre_bootstrap_user_data", expr::escape_literal(PRE_BOOTSTRAP_USER_DATA))
        .attr("use_custom_launch_template", false)
        .attr("taints", json!({}))
        .attr(
            "remote_access",
            json!({ "ec2_ssh_key": key_pair.attr("key_name") }),
        )
        .depends_on(&cluster.address)
        .depends_on(&key_pair);

        declared.push(stack.add(block)?);
    }

    Ok(declared)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eks::cluster;
    use crate::error::StackError;
    use crate::infra::Environment;

    fn setup(stack: &mut Stack) -> (Cluster, Network) {
        let network = Network::lookup(stack, "vpc-1");
        let cluster = cluster::build(
            stack,
            "np-demo",
            "1.30",
            "demo",
            Environment::NonProduction,
            &network,
        )
        .unwrap();
        (cluster, network)
    }

    fn nodegroups(json: &str) -> Vec<NodegroupConfig> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_nodegroup_body() {
        let mut stack = Stack::new("test");
        let (cluster, network) = setup(&mut stack);
        let groups =
            nodegroups(r#"[{"nodeName": "workers", "nodeSize": "L", "desireNumberNodes": 3}]"#);

        let declared = build(&mut stack, &cluster, "1.30", "demo", &network, &groups).unwrap();
        assert_eq!(declared[0].to_string(), "module.nodegroup-demo-0");

        let block = stack.get(&declared[0]).unwrap();
        assert_eq!(block.get("max_size").unwrap(), 31);
        assert_eq!(block.get("min_size").unwrap(), 1);
        assert_eq!(block.get("desired_size").unwrap(), 3);
        assert_eq!(block.get("instance_types").unwrap(), &json!(["m6a.4xlarge"]));
        assert_eq!(block.get("capacity_type").unwrap(), "SPOT");
        assert_eq!(
            block.get("cluster_service_cidr").unwrap(),
            "${data.aws_vpc.vpc-vpc-1.cidr_block}"
        );
        assert_eq!(
            block.get("remote_access").unwrap()["ec2_ssh_key"],
            "${aws_key_pair.ssh-keypair-np-demo.key_name}"
        );
        assert_eq!(
            block.dependencies(),
            &[
                cluster.address.clone(),
                Address::resource("aws_key_pair", "ssh-keypair-np-demo")
            ]
        );
    }

    #[test]
    fn test_user_data_forces_containerd() {
        assert!(PRE_BOOTSTRAP_USER_DATA.contains(r#"CONTAINER_RUNTIME="containerd""#));
        assert!(PRE_BOOTSTRAP_USER_DATA.contains("--max-pods=110"));
    }

    #[test]
    fn test_key_pair_shared_across_groups() {
        let mut stack = Stack::new("test");
        let (cluster, network) = setup(&mut stack);
        let groups = nodegroups(
            r#"[
                {"nodeName": "a", "nodeSize": "XS", "desireNumberNodes": 1},
                {"nodeName": "b", "nodeSize": "S", "desireNumberNodes": 1}
            ]"#,
        );
        let declared = build(&mut stack, &cluster, "1.30", "demo", &network, &groups).unwrap();
        assert_eq!(declared.len(), 2);

        let key_pairs = stack
            .blocks()
            .filter(|b| matches!(b.address(), Address::Resource { kind, .. } if kind == "aws_key_pair"))
            .count();
        assert_eq!(key_pairs, 1);

        let key_pair = stack
            .get(&Address::resource("aws_key_pair", "ssh-keypair-np-demo"))
            .unwrap();
        assert_eq!(
            key_pair.get("public_key").unwrap(),
            r#"${lookup(data.vault_generic_secret.secret-idrsa.data, "id_rsa.pub", "")}"#
        );
    }

    #[test]
    fn test_unknown_size_without_override_fails() {
        let mut stack = Stack::new("test");
        let (cluster, network) = setup(&mut stack);
        let groups =
            nodegroups(r#"[{"nodeName": "odd", "nodeSize": "XXXL", "desireNumberNodes": 1}]"#);
        let err = build(&mut stack, &cluster, "1.30", "demo", &network, &groups).unwrap_err();
        assert!(matches!(err, StackError::UnknownNodeSize { nodegroup, .. } if nodegroup == "odd"));
    }

    #[test]
    fn test_unknown_size_with_override_uses_default_ceiling() {
        let mut stack = Stack::new("test");
        let (cluster, network) = setup(&mut stack);
        let groups = nodegroups(
            r#"[{"nodeName": "odd", "nodeSize": "XXXL", "desireNumberNodes": 1, "instanceType": ["c6a.xlarge"]}]"#,
        );
        let declared = build(&mut stack, &cluster, "1.30", "demo", &network, &groups).unwrap();
        let block = stack.get(&declared[0]).unwrap();
        assert_eq!(block.get("max_size").unwrap(), 4);
        assert_eq!(block.get("instance_types").unwrap(), &json!(["c6a.xlarge"]));
    }
}
