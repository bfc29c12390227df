use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{SecretData, SecretStore};
use crate::error::{Result, StackError};

/// In-process secret store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    secrets: RwLock<HashMap<String, SecretData>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SecretStore for MemoryStore {
    async fn read(&self, path: &str) -> Result<SecretData> {
        self.secrets
            .read()
            .await
            .get(path)
            .cloned()
            .ok_or_else(|| StackError::SecretNotFound(path.to_string()))
    }

    async fn write(&self, path: &str, data: &Value) -> Result<()> {
        let fields = data
            .as_object()
            .cloned()
            .ok_or_else(|| StackError::Vault(format!("secret {} must be a JSON object", path)))?;
        self.secrets.write().await.insert(path.to_string(), fields);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
