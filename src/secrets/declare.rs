//! Vault secrets as declared Terraform blocks, read and written at apply time.

use serde_json::Value;

use crate::error::Result;
use crate::terraform::{Address, Block, Stack, expr};

/// Declare a `vault_generic_secret` data source named `secret-<name>`.
///
/// Declaring the same name twice returns the existing block.
pub fn read_secret(stack: &mut Stack, name: &str, path: &str) -> Address {
    stack.ensure(Block::data("vault_generic_secret", &format!("secret-{}", name)).attr("path", path))
}

/// Field of a declared secret, empty when the field is missing at apply time.
pub fn field(secret: &Address, key: &str) -> String {
    expr::lookup(&secret.traversal("data"), key, "")
}

/// Declare a `vault_generic_secret` resource storing `data_json` at `path`.
pub fn write_secret(
    stack: &mut Stack,
    name: &str,
    path: &str,
    data_json: impl Into<Value>,
) -> Result<Address> {
    stack.add(
        Block::resource("vault_generic_secret", name)
            .attr("path", path)
            .attr("data_json", data_json),
    )
}
