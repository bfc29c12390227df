//! Block addresses and provider references.

use std::fmt;

/// Address of a declared block inside a stack.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Address {
    Resource { kind: String, name: String },
    Data { kind: String, name: String },
    Module { name: String },
}

impl Address {
    pub fn resource(kind: &str, name: &str) -> Self {
        Address::Resource {
            kind: kind.to_string(),
            name: sanitize_id(name),
        }
    }

    pub fn data(kind: &str, name: &str) -> Self {
        Address::Data {
            kind: kind.to_string(),
            name: sanitize_id(name),
        }
    }

    pub fn module(name: &str) -> Self {
        Address::Module {
            name: sanitize_id(name),
        }
    }

    /// Local name of the block (last address segment).
    pub fn name(&self) -> &str {
        match self {
            Address::Resource { name, .. } | Address::Data { name, .. } | Address::Module { name } => {
                name
            }
        }
    }

    /// Short label for tables: `resource`, `data` or `module`.
    pub fn category(&self) -> &'static str {
        match self {
            Address::Resource { .. } => "resource",
            Address::Data { .. } => "data",
            Address::Module { .. } => "module",
        }
    }

    /// Attribute reference without interpolation markers, for use inside larger expressions.
    pub fn traversal(&self, attr: &str) -> String {
        format!("{}.{}", self, attr)
    }

    /// Attribute reference as a Terraform interpolation, e.g. `${module.x.cluster_endpoint}`.
    pub fn attr(&self, attr: &str) -> String {
        format!("${{{}}}", self.traversal(attr))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Resource { kind, name } => write!(f, "{}.{}", kind, name),
            Address::Data { kind, name } => write!(f, "data.{}.{}", kind, name),
            Address::Module { name } => write!(f, "module.{}", name),
        }
    }
}

/// Reference to a configured provider, optionally aliased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProviderRef {
    pub name: String,
    pub alias: Option<String>,
}

impl ProviderRef {
    pub fn default_for(name: &str) -> Self {
        Self {
            name: name.to_string(),
            alias: None,
        }
    }

    pub fn aliased(name: &str, alias: &str) -> Self {
        Self {
            name: name.to_string(),
            alias: Some(sanitize_id(alias)),
        }
    }
}

impl fmt::Display for ProviderRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.alias {
            Some(alias) => write!(f, "{}.{}", self.name, alias),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Turn an arbitrary name into a valid Terraform identifier.
///
/// Letters, digits, `_` and `-` are kept; anything else becomes `_`.
/// Identifiers cannot start with a digit.
pub fn sanitize_id(raw: &str) -> String {
    let mut id: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    match id.chars().next() {
        None => "_".to_string(),
        Some(c) if c.is_ascii_digit() || c == '-' => {
            id.insert(0, '_');
            id
        }
        Some(_) => id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_display() {
        assert_eq!(
            Address::resource("aws_key_pair", "ssh-keypair-np-demo").to_string(),
            "aws_key_pair.ssh-keypair-np-demo"
        );
        assert_eq!(
            Address::data("aws_vpc", "vpc-0abc").to_string(),
            "data.aws_vpc.vpc-0abc"
        );
        assert_eq!(Address::module("np-demo").to_string(), "module.np-demo");
    }

    #[test]
    fn test_address_attr_interpolation() {
        let cluster = Address::module("np-demo");
        assert_eq!(
            cluster.attr("cluster_endpoint"),
            "${module.np-demo.cluster_endpoint}"
        );
        assert_eq!(
            cluster.traversal("oidc_provider"),
            "module.np-demo.oidc_provider"
        );
    }

    #[test]
    fn test_provider_ref_display() {
        assert_eq!(ProviderRef::default_for("aws").to_string(), "aws");
        assert_eq!(
            ProviderRef::aliased("aws", "networking").to_string(),
            "aws.networking"
        );
    }

    #[test]
    fn test_sanitize_id() {
        assert_eq!(sanitize_id("np-demo"), "np-demo");
        assert_eq!(sanitize_id("cluster.v1/a"), "cluster_v1_a");
        assert_eq!(sanitize_id("1st"), "_1st");
        assert_eq!(sanitize_id(""), "_");
    }

    #[test]
    fn test_address_category() {
        assert_eq!(Address::module("x").category(), "module");
        assert_eq!(Address::data("a", "b").category(), "data");
        assert_eq!(Address::resource("a", "b").category(), "resource");
    }
}
