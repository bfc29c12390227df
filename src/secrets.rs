//! Vault secrets: declared blocks for Terraform, and a runtime gateway.
//!
//! [`declare`] produces the `vault_generic_secret` blocks Terraform reads and
//! writes during apply. The [`SecretStore`] trait is the runtime side used by
//! the `preflight` and `kubeconfig` commands.

pub mod declare;
pub mod memory;
pub mod vault;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::eks::cilium::kubeconfig_secret_path;
use crate::error::{Result, StackError};

pub use memory::MemoryStore;
pub use vault::VaultClient;

/// Field set of one secret.
pub type SecretData = Map<String, Value>;

/// Path-addressed secret backend.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Read the fields stored at `path`.
    async fn read(&self, path: &str) -> Result<SecretData>;

    /// Replace the secret at `path` with `data`, which must be a JSON object.
    async fn write(&self, path: &str, data: &Value) -> Result<()>;

    fn name(&self) -> &str;
}

/// Field value as a string, empty when the field is missing or null.
pub fn lookup(data: &SecretData, key: &str) -> String {
    match data.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Field value, failing when it is missing or empty.
pub fn require(data: &SecretData, path: &str, key: &str) -> Result<String> {
    let value = lookup(data, key);
    if value.is_empty() {
        return Err(StackError::SecretFieldMissing {
            path: path.to_string(),
            field: key.to_string(),
        });
    }
    Ok(value)
}

/// A secret field the synthesized stack reads during apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredSecret {
    pub path: String,
    pub field: String,
}

impl RequiredSecret {
    pub fn new(path: &str, field: &str) -> Self {
        Self {
            path: path.to_string(),
            field: field.to_string(),
        }
    }
}

/// Read every required secret and fail on the first missing or empty field.
pub async fn check_required(store: &dyn SecretStore, required: &[RequiredSecret]) -> Result<()> {
    for secret in required {
        debug!(store = store.name(), path = %secret.path, field = %secret.field, "Checking secret");
        let data = store.read(&secret.path).await?;
        require(&data, &secret.path, &secret.field)?;
        info!(path = %secret.path, field = %secret.field, "Secret present");
    }
    Ok(())
}

/// Kubeconfig persisted for `cluster` by the Cilium installation.
pub async fn fetch_kubeconfig(store: &dyn SecretStore, cluster: &str) -> Result<String> {
    let path = kubeconfig_secret_path(cluster);
    let data = store.read(&path).await?;
    require(&data, &path, "kubeconfig")
}
