//! Configuration file types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::sizing::NodeSize;
use crate::error::{Result, StackError};

/// Stack name used when the file does not set one.
pub const DEFAULT_STACK_NAME: &str = "ekscdktf";

/// Deployment target shared by every project in the file.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StackConfig {
    pub account: String,
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_name: Option<String>,
}

impl StackConfig {
    pub fn stack_name(&self) -> &str {
        self.stack_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_STACK_NAME)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Tags {
    #[serde(default)]
    pub environment: String,
    #[serde(default)]
    pub project: String,
}

/// Whole contents of `config/<tier>/<cluster>.json`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfraConfig {
    #[serde(flatten)]
    pub stack: StackConfig,
    #[serde(default)]
    pub tags: Tags,
    /// Projects keyed by name, iterated in name order.
    #[serde(default)]
    pub projects: BTreeMap<String, ProjectConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    pub vpc_id: String,
    pub k8s_version: String,
    #[serde(default)]
    pub cluster_name: String,
    #[serde(default)]
    pub install_cilium: bool,
    #[serde(default)]
    pub bootstrap: bool,
    #[serde(default)]
    pub nodegroups: Vec<NodegroupConfig>,
}

impl ProjectConfig {
    /// Every cluster-scoped name comes from `CLUSTER`. A `clusterName` that
    /// disagrees with it is rejected; an empty one is treated as unset.
    pub fn check_cluster_name(&self, project: &str, cluster: &str) -> Result<()> {
        if self.cluster_name.is_empty() || self.cluster_name == cluster {
            return Ok(());
        }
        Err(StackError::ClusterNameMismatch {
            project: project.to_string(),
            configured: self.cluster_name.clone(),
            cluster: cluster.to_string(),
        })
    }
}

/// `instanceType` accepts a single type or a list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum InstanceTypes {
    One(String),
    Many(Vec<String>),
}

impl InstanceTypes {
    /// Override as a list, `None` when it carries nothing usable.
    pub fn to_list(&self) -> Option<Vec<String>> {
        match self {
            InstanceTypes::One(t) if t.is_empty() => None,
            InstanceTypes::One(t) => Some(vec![t.clone()]),
            InstanceTypes::Many(list) if list.is_empty() => None,
            InstanceTypes::Many(list) => Some(list.clone()),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodegroupConfig {
    pub node_name: String,
    pub node_size: NodeSize,
    pub desire_number_nodes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_type: Option<InstanceTypes>,
}

impl NodegroupConfig {
    /// Instance types for the group. An explicit override wins over the size tier.
    pub fn instance_types(&self) -> Result<Vec<String>> {
        if let Some(list) = self.instance_type.as_ref().and_then(InstanceTypes::to_list) {
            return Ok(list);
        }
        self.node_size
            .instance_type()
            .map(|t| vec![t.to_string()])
            .ok_or_else(|| StackError::UnknownNodeSize {
                nodegroup: self.node_name.clone(),
                size: self.node_size.to_string(),
            })
    }

    pub fn max_capacity(&self) -> u32 {
        self.node_size.max_capacity()
    }
}
