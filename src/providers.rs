//! Provider configurations and the remote state backend.

use serde_json::json;

use crate::secrets::declare;
use crate::terraform::{Provider, ProviderRef, Stack};

pub const NETWORKING_ALIAS: &str = "networking";
pub const NETWORKING_REGION: &str = "eu-central-1";
pub const NETWORKING_PROFILE: &str = "epo_networking";
/// Account owning the private hosted zones and the cross-account DNS roles.
pub const NETWORKING_ACCOUNT: &str = "733565320759";

pub const AWX_USERNAME: &str = "awxadmin";
pub const AWX_SECRET_PATH: &str = "secret/pequod/ansible-awx/web-administrator-credentials";
pub const AWX_PASSWORD_FIELD: &str = "password";

pub const STATE_LOCK_TABLE: &str = "tf-lock-table";

/// Default `aws` provider for the cluster account.
pub fn aws(stack: &mut Stack, region: &str, profile: Option<&str>) -> ProviderRef {
    let mut provider = Provider::new("aws").attr("region", region);
    if let Some(profile) = profile {
        provider = provider.attr("profile", profile);
    }
    stack.add_provider(provider)
}

/// S3 state backend keyed by cluster, locked through DynamoDB.
pub fn backend(stack: &mut Stack, account: &str, region: &str, cluster: &str) {
    stack.set_backend(
        "s3",
        json!({
            "bucket": format!("tf-bucket-{}", account),
            "key": format!("eks-cluster-cdktf/{}.tfstate", cluster),
            "region": region,
            "dynamodb_table": STATE_LOCK_TABLE,
        }),
    );
}

/// Vault provider. The token comes from `VAULT_TOKEN` in Terraform's environment.
pub fn vault(stack: &mut Stack, address: &str) -> ProviderRef {
    stack.add_provider(
        Provider::new("vault")
            .attr("address", address)
            .attr("skip_tls_verify", true),
    )
}

/// `aws.networking`, the provider for the shared networking account.
pub fn networking(stack: &mut Stack) -> ProviderRef {
    stack.add_provider(
        Provider::aliased("aws", NETWORKING_ALIAS)
            .attr("region", NETWORKING_REGION)
            .attr("profile", NETWORKING_PROFILE),
    )
}

/// AWX provider, authenticating with the admin password stored in Vault.
pub fn awx(stack: &mut Stack, host: &str) -> ProviderRef {
    let secret = declare::read_secret(stack, "awx-secret", AWX_SECRET_PATH);
    stack.add_provider(
        Provider::new("awx")
            .attr("hostname", host)
            .attr("username", AWX_USERNAME)
            .attr("password", declare::field(&secret, AWX_PASSWORD_FIELD)),
    )
}

pub fn local(stack: &mut Stack) -> ProviderRef {
    stack.add_provider(Provider::new("local"))
}

pub fn null(stack: &mut Stack) -> ProviderRef {
    stack.add_provider(Provider::new("null"))
}

/// Helm provider talking to one cluster's API server.
pub fn helm(stack: &mut Stack, alias: &str, host: String, ca_certificate: String, token: String) -> ProviderRef {
    stack.add_provider(Provider::aliased("helm", alias).attr(
        "kubernetes",
        json!({
            "host": host,
            "cluster_ca_certificate": ca_certificate,
            "token": token,
        }),
    ))
}
