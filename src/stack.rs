//! Composes the whole stack from a loaded configuration.
//!
//! Each project goes through the same sequence: network lookup, cluster, node
//! groups, add-ons, DNS role, then the optional bootstrap job.

use tracing::info;

use crate::bootstrap::{self, BootstrapParams};
use crate::config::{Config, Mode};
use crate::eks::{addon, cluster, nodegroup};
use crate::error::Result;
use crate::iam;
use crate::infra::{Environment, InfraConfig, ProjectConfig};
use crate::network::Network;
use crate::providers;
use crate::secrets::RequiredSecret;
use crate::terraform::Stack;

/// Run settings that shape the stack beyond the config file.
#[derive(Debug, Clone)]
pub struct ComposeOptions {
    /// Cluster identifier from `CLUSTER`.
    pub cluster: String,
    pub mode: Mode,
    pub profile: Option<String>,
    pub vault_addr: String,
    pub awx_host: String,
}

impl ComposeOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            cluster: config.cluster.clone(),
            mode: config.mode,
            profile: config.profile.clone(),
            vault_addr: config.vault_addr.clone(),
            awx_host: config.awx_host.clone(),
        }
    }
}

/// Build the desired-state graph for every project in `infra`.
pub fn compose(infra: &InfraConfig, options: &ComposeOptions) -> Result<Stack> {
    let mut stack = Stack::new(infra.stack.stack_name());
    let region = infra.stack.region.as_str();

    providers::aws(&mut stack, region, options.profile.as_deref());
    providers::backend(&mut stack, &infra.stack.account, region, &options.cluster);
    providers::vault(&mut stack, &options.vault_addr);

    let environment = Environment::from_cluster(&options.cluster);
    for (name, project) in &infra.projects {
        compose_project(&mut stack, infra, options, environment, name, project)?;
    }

    info!(
        stack = stack.name(),
        blocks = stack.len(),
        projects = infra.projects.len(),
        "Composed stack"
    );
    Ok(stack)
}

fn compose_project(
    stack: &mut Stack,
    infra: &InfraConfig,
    options: &ComposeOptions,
    environment: Environment,
    project_name: &str,
    project: &ProjectConfig,
) -> Result<()> {
    project.check_cluster_name(project_name, &options.cluster)?;
    let cluster_name = options.cluster.as_str();
    info!(project = project_name, cluster = cluster_name, "Composing project");

    let network = Network::lookup(stack, &project.vpc_id);
    let cluster = cluster::build(
        stack,
        cluster_name,
        &project.k8s_version,
        project_name,
        environment,
        &network,
    )?;
    let nodegroups = nodegroup::build(
        stack,
        &cluster,
        &project.k8s_version,
        project_name,
        &network,
        &project.nodegroups,
    )?;
    let addons = addon::build(stack, &cluster, &nodegroups, project.install_cilium)?;
    iam::build(stack, &cluster, environment)?;

    if project.bootstrap {
        let params = BootstrapParams {
            cluster_name: cluster_name.to_string(),
            environment,
            region: infra.stack.region.clone(),
            cluster_url: cluster.endpoint(),
            aws_account: infra.stack.account.clone(),
        };
        let mut after = vec![cluster.address.clone()];
        after.extend(nodegroups.iter().cloned());
        after.push(addons.address.clone());
        bootstrap::trigger(stack, options.mode, &params, &options.awx_host, &after)?;
    }

    stack.add_output(&format!("{}-endpoint", cluster_name), cluster.endpoint(), false);
    stack.add_output(
        &format!("{}-oidc-provider-arn", cluster_name),
        cluster.oidc_provider_arn(),
        false,
    );
    Ok(())
}

/// Vault fields the stack reads during apply in `mode`.
pub fn required_secrets(infra: &InfraConfig, mode: Mode) -> Vec<RequiredSecret> {
    let mut required = Vec::new();
    if !infra.projects.is_empty() {
        required.push(RequiredSecret::new(
            nodegroup::SSH_SECRET_PATH,
            nodegroup::SSH_PUBLIC_KEY_FIELD,
        ));
    }
    let bootstraps = infra.projects.values().any(|p| p.bootstrap);
    if bootstraps && bootstrap::job_template(mode).is_some() {
        required.push(RequiredSecret::new(
            providers::AWX_SECRET_PATH,
            providers::AWX_PASSWORD_FIELD,
        ));
    }
    required
}
