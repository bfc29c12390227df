//! Custom error types for ekstack.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while composing or synthesizing a cluster stack.
#[derive(Error, Debug)]
pub enum StackError {
    #[error("CLUSTER is not set. Set the CLUSTER environment variable or pass --cluster")]
    MissingCluster,

    #[error("Project {project}: clusterName '{configured}' does not match CLUSTER '{cluster}'")]
    ClusterNameMismatch {
        project: String,
        configured: String,
        cluster: String,
    },

    #[error("VAULT_TOKEN is required for this command")]
    MissingVaultToken,

    #[error("Failed to read config file {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Node group {nodegroup}: unknown node size '{size}' and no instanceType override")]
    UnknownNodeSize { nodegroup: String, size: String },

    #[error("Block already declared: {0}")]
    DuplicateBlock(String),

    #[error("{from} depends on undeclared block {to}")]
    UnknownDependency { from: String, to: String },

    #[error("{block} uses unconfigured provider {provider}")]
    UnknownProvider { block: String, provider: String },

    #[error("Dependency cycle between: {}", .0.join(", "))]
    DependencyCycle(Vec<String>),

    #[error("[vault] {0}")]
    Vault(String),

    #[error("Secret not found: {0}")]
    SecretNotFound(String),

    #[error("Secret {path} has no value for field '{field}'")]
    SecretFieldMissing { path: String, field: String },

    #[error("Failed to render configuration: {0}")]
    Render(#[source] serde_json::Error),

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StackError {
    /// Create a Vault transport error from any error type.
    pub fn vault<E: std::fmt::Display>(err: E) -> Self {
        StackError::Vault(err.to_string())
    }
}

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, StackError>;
