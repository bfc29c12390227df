//! Locates and parses the cluster configuration file.

use std::path::{Path, PathBuf};

use tracing::info;

use super::environment::{ConfigTier, Environment};
use super::model::InfraConfig;
use crate::error::{Result, StackError};

/// `<config_dir>/<tier>/<cluster>.json`, with the tier taken from the cluster prefix.
pub fn config_path(config_dir: &Path, cluster: &str) -> PathBuf {
    config_dir
        .join(ConfigTier::from_cluster(cluster).dir_name())
        .join(format!("{}.json", cluster))
}

/// Read and parse the configuration for `cluster`, then log a summary of it.
pub fn load(config_dir: &Path, cluster: &str) -> Result<InfraConfig> {
    let path = config_path(config_dir, cluster);
    let raw = std::fs::read_to_string(&path).map_err(|source| StackError::ConfigRead {
        path: path.clone(),
        source,
    })?;
    let config: InfraConfig =
        serde_json::from_str(&raw).map_err(|source| StackError::ConfigParse {
            path: path.clone(),
            source,
        })?;

    log_summary(&config, cluster);
    Ok(config)
}

fn log_summary(config: &InfraConfig, cluster: &str) {
    let environment = Environment::from_cluster(cluster);
    info!(
        stack_name = config.stack.stack_name(),
        account = %config.stack.account,
        region = %config.stack.region,
        tag_environment = %config.tags.environment,
        tag_project = %config.tags.project,
        projects = config.projects.len(),
        "Config loaded"
    );

    for (name, project) in &config.projects {
        info!(
            project = %name,
            vpc_id = %project.vpc_id,
            k8s_version = %project.k8s_version,
            cluster_name = cluster,
            environment = %environment,
            install_cilium = project.install_cilium,
            bootstrap = project.bootstrap,
            "Project"
        );
        for nodegroup in &project.nodegroups {
            info!(
                project = %name,
                node_name = %nodegroup.node_name,
                node_size = %nodegroup.node_size,
                desired = nodegroup.desire_number_nodes,
                "Node group"
            );
        }
    }
}
