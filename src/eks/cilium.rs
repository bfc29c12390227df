//! Cilium as the cluster CNI, replacing the managed `vpc-cni` and `kube-proxy` add-ons.
//!
//! The chain declared here is:
//!
//! 1. `data.aws_eks_cluster_auth` for a short-lived API token
//! 2. `local_sensitive_file` rendering the kubeconfig template
//! 3. `null_resource` patching the `aws-node` daemon set so it only runs on
//!    nodes labelled `io.cilium/aws-node-enabled=true`
//! 4. `helm_release` installing the chart, after the patch
//! 5. `vault_generic_secret` storing the rendered kubeconfig

use serde_json::json;

use super::cluster::Cluster;
use crate::error::Result;
use crate::providers;
use crate::secrets::declare;
use crate::terraform::{Address, Block, Stack, expr};

pub const CHART_REPOSITORY: &str = "https://helm.cilium.io/";
pub const CHART_NAME: &str = "cilium";
pub const CHART_VERSION: &str = "1.16.1";
pub const NAMESPACE: &str = "kube-system";

pub const KUBECONFIG_TEMPLATE_PATH: &str = "assets/kubeconfig.tpl";
pub const VALUES_PATH: &str = "assets/cilium-values.yaml";

pub const KUBECONFIG_TEMPLATE: &str = include_str!("../../assets/kubeconfig.tpl");
pub const VALUES: &str = include_str!("../../assets/cilium-values.yaml");

const AWS_NODE_PATCH: &str = r#"{"spec":{"template":{"spec":{"nodeSelector":{"io.cilium/aws-node-enabled":"true"}}}}}"#;

/// Blocks declared for one cluster's Cilium installation.
#[derive(Debug, Clone)]
pub struct Cilium {
    pub auth: Address,
    pub kubeconfig: Address,
    pub patch: Address,
    pub release: Address,
    pub secret: Address,
}

/// Local path the kubeconfig is rendered to during apply.
pub fn kubeconfig_filename(cluster_name: &str) -> String {
    format!("./kubeconfig-{}", cluster_name)
}

/// Vault path holding the rendered kubeconfig.
pub fn kubeconfig_secret_path(cluster_name: &str) -> String {
    format!("secret/{}/kube-system/kubeconfig", cluster_name)
}

fn patch_command(filename: &str) -> String {
    format!(
        "kubectl -n kube-system patch daemonset aws-node --type='strategic' -p='{}' --kubeconfig={}",
        AWS_NODE_PATCH, filename
    )
}

/// Declare the Cilium chain for `cluster`. The patch waits for every node group.
pub fn install(stack: &mut Stack, cluster: &Cluster, nodegroups: &[Address]) -> Result<Cilium> {
    let name = cluster.name.as_str();

    stack.add_asset(KUBECONFIG_TEMPLATE_PATH, KUBECONFIG_TEMPLATE);
    stack.add_asset(VALUES_PATH, VALUES);
    providers::local(stack);
    providers::null(stack);

    let auth = stack.add(
        Block::data("aws_eks_cluster_auth", &format!("cluster-data-auth-{}", name))
            .attr("name", cluster.address.attr("cluster_name")),
    )?;

    let filename = kubeconfig_filename(name);
    let kubeconfig = stack.add(
        Block::resource("local_sensitive_file", &format!("kubeconfig-{}", name))
            .attr(
                "content",
                expr::templatefile(
                    KUBECONFIG_TEMPLATE_PATH,
                    &[
                        ("cluster_name", cluster.output("cluster_name")),
                        ("clusterca", cluster.output("cluster_certificate_authority_data")),
                        ("endpoint", cluster.output("cluster_endpoint")),
                        ("token", auth.traversal("token")),
                    ],
                ),
            )
            .attr("filename", filename.as_str()),
    )?;

    let patch = stack.add(
        Block::resource("null_resource", &format!("patch-aws-node-{}", name))
            .attr(
                "provisioner",
                json!([{
                    "local-exec": {
                        "command": patch_command(&filename),
                        "environment": { "KUBECONFIG": filename },
                    }
                }]),
            )
            .depends_on(&cluster.address)
            .depends_on_all(nodegroups)
            .depends_on(&kubeconfig),
    )?;

    let helm = providers::helm(
        stack,
        &format!("eks-{}", name),
        cluster.endpoint(),
        expr::base64decode(&cluster.output("cluster_certificate_authority_data")),
        auth.attr("token"),
    );

    let release = stack.add(
        Block::resource("helm_release", &format!("cilium-{}", name))
            .provider(&helm)
            .attr("name", CHART_NAME)
            .attr("namespace", NAMESPACE)
            .attr("repository", CHART_REPOSITORY)
            .attr("chart", CHART_NAME)
            .attr("version", CHART_VERSION)
            .attr("values", json!([expr::file(VALUES_PATH)]))
            .attr(
                "set",
                json!([
                    { "name": "eni.enabled", "value": "false" },
                    {
                        "name": "k8sServiceHost",
                        "value": expr::replace(&cluster.output("cluster_endpoint"), "https://", ""),
                    },
                    { "name": "k8sServicePort", "value": "443" },
                ]),
            )
            .depends_on(&patch),
    )?;

    let secret = declare::write_secret(
        stack,
        &format!("kubeconfig-{}", name),
        &kubeconfig_secret_path(name),
        expr::jsonencode_object(&[("kubeconfig", kubeconfig.traversal("content"))]),
    )?;

    Ok(Cilium {
        auth,
        kubeconfig,
        patch,
        release,
        secret,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eks::cluster;
    use crate::infra::Environment;
    use crate::network::Network;

    fn installed() -> (Stack, Cilium) {
        let mut stack = Stack::new("test");
        let network = Network::lookup(&mut stack, "vpc-1");
        let cluster =
            cluster::build(&mut stack, "np-demo", "1.30", "demo", Environment::NonProduction, &network)
                .unwrap();
        let nodegroup = stack
            .add(Block::module("nodegroup-demo-0", "src", "1").depends_on(&cluster.address))
            .unwrap();
        let cilium = install(&mut stack, &cluster, &[nodegroup]).unwrap();
        (stack, cilium)
    }

    #[test]
    fn test_release_waits_for_patch() {
        let (stack, cilium) = installed();
        let release = stack.get(&cilium.release).unwrap();
        assert_eq!(release.dependencies(), &[cilium.patch.clone()]);
        assert_eq!(release.provider_ref().unwrap().to_string(), "helm.eks-np-demo");

        let patch = stack.get(&cilium.patch).unwrap();
        assert!(patch.dependencies().contains(&Address::module("nodegroup-demo-0")));
        assert!(patch.dependencies().contains(&cilium.kubeconfig));
    }

    #[test]
    fn test_release_overrides() {
        let (stack, cilium) = installed();
        let release = stack.get(&cilium.release).unwrap();
        let set = release.get("set").unwrap();
        assert_eq!(set[0]["name"], "eni.enabled");
        assert_eq!(set[0]["value"], "false");
        assert_eq!(
            set[1]["value"],
            r#"${replace(module.np-demo.cluster_endpoint, "https://", "")}"#
        );
        assert_eq!(set[2]["value"], "443");
        assert_eq!(release.get("version").unwrap(), "1.16.1");
    }

    #[test]
    fn test_patch_command() {
        let (stack, cilium) = installed();
        let patch = stack.get(&cilium.patch).unwrap();
        let exec = &patch.get("provisioner").unwrap()[0]["local-exec"];
        let command = exec["command"].as_str().unwrap();
        assert!(command.starts_with("kubectl -n kube-system patch daemonset aws-node"));
        assert!(command.contains(r#""io.cilium/aws-node-enabled":"true""#));
        assert!(command.ends_with("--kubeconfig=./kubeconfig-np-demo"));
        assert_eq!(exec["environment"]["KUBECONFIG"], "./kubeconfig-np-demo");
    }

    #[test]
    fn test_kubeconfig_persisted_to_vault() {
        let (stack, cilium) = installed();
        let secret = stack.get(&cilium.secret).unwrap();
        assert_eq!(secret.get("path").unwrap(), "secret/np-demo/kube-system/kubeconfig");
        assert_eq!(
            secret.get("data_json").unwrap(),
            "${jsonencode({ kubeconfig = local_sensitive_file.kubeconfig-np-demo.content })}"
        );
        assert!(stack.edges(secret).contains(&cilium.kubeconfig));
    }

    #[test]
    fn test_assets_and_providers_registered() {
        let (stack, _) = installed();
        assert!(stack.assets().contains_key(KUBECONFIG_TEMPLATE_PATH));
        assert!(stack.assets().contains_key(VALUES_PATH));
        let doc = stack.to_json();
        assert!(doc["provider"].get("local").is_some());
        assert!(doc["provider"].get("null").is_some());
        assert_eq!(doc["provider"]["helm"][0]["alias"], "eks-np-demo");
        assert!(stack.validate().is_ok());
    }

    #[test]
    fn test_template_variables() {
        for var in ["${cluster_name}", "${clusterca}", "${endpoint}", "${token}"] {
            assert!(KUBECONFIG_TEMPLATE.contains(var), "missing {}", var);
        }
    }
}
