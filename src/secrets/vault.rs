//! Vault KV (v1) client.

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{SecretData, SecretStore};
use crate::error::{Result, StackError};

const TOKEN_HEADER: &str = "X-Vault-Token";

#[derive(Debug, Deserialize)]
struct ReadResponse {
    #[serde(default)]
    data: SecretData,
}

/// HTTP client for a Vault KV v1 mount.
pub struct VaultClient {
    address: String,
    token: SecretString,
    client: reqwest::Client,
}

impl VaultClient {
    /// Client with certificate verification disabled, matching the internal Vault setup.
    pub fn new(address: &str, token: SecretString) -> Result<Self> {
        Self::with_tls_verification(address, token, false)
    }

    /// Client that verifies the server certificate when `verify` is set.
    pub fn with_tls_verification(address: &str, token: SecretString, verify: bool) -> Result<Self> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(!verify)
            .build()
            .map_err(StackError::vault)?;
        Ok(Self {
            address: address.trim_end_matches('/').to_string(),
            token,
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.address, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl SecretStore for VaultClient {
    async fn read(&self, path: &str) -> Result<SecretData> {
        debug!(path, "Reading Vault secret");
        let response = self
            .client
            .get(self.url(path))
            .header(TOKEN_HEADER, self.token.expose_secret())
            .send()
            .await
            .map_err(StackError::vault)?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(StackError::SecretNotFound(path.to_string())),
            status if !status.is_success() => Err(StackError::Vault(format!(
                "GET {} returned {}",
                path, status
            ))),
            _ => {
                let body: ReadResponse = response.json().await.map_err(StackError::vault)?;
                Ok(body.data)
            }
        }
    }

    async fn write(&self, path: &str, data: &Value) -> Result<()> {
        if !data.is_object() {
            return Err(StackError::Vault(format!(
                "secret {} must be a JSON object",
                path
            )));
        }
        debug!(path, "Writing Vault secret");
        let response = self
            .client
            .post(self.url(path))
            .header(TOKEN_HEADER, self.token.expose_secret())
            .json(data)
            .send()
            .await
            .map_err(StackError::vault)?;

        let status = response.status();
        if !status.is_success() {
            return Err(StackError::Vault(format!("POST {} returned {}", path, status)));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "vault"
    }
}
