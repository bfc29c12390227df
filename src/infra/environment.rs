//! Environment classification by cluster-name prefix.

use std::fmt;

/// Environment label attached to tags and bootstrap parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    NonProduction,
    Production,
    Lab,
}

impl Environment {
    /// `np-` is non-production, `p-` is production, anything else is lab.
    pub fn from_cluster(cluster: &str) -> Self {
        if cluster.starts_with("np-") {
            Environment::NonProduction
        } else if cluster.starts_with("p-") {
            Environment::Production
        } else {
            Environment::Lab
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Environment::NonProduction => "Non-Production",
            Environment::Production => "Production",
            Environment::Lab => "Lab",
        }
    }

    /// Private hosted zone holding the cluster's DNS records.
    pub fn hosted_zone(&self) -> &'static str {
        match self {
            Environment::NonProduction => "platform-staging.aws.internal.epo.org",
            Environment::Production => "platform.aws.internal.epo.org",
            Environment::Lab => "platform-lab.aws.internal.epo.org",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Directory under the config root holding the cluster's file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigTier {
    NonProd,
    Sandbox,
    Prod,
}

impl ConfigTier {
    /// `np-` reads `nonprod/`, `lab-` reads `sandbox/`, anything else reads `prod/`.
    pub fn from_cluster(cluster: &str) -> Self {
        if cluster.starts_with("np-") {
            ConfigTier::NonProd
        } else if cluster.starts_with("lab-") {
            ConfigTier::Sandbox
        } else {
            ConfigTier::Prod
        }
    }

    pub fn dir_name(&self) -> &'static str {
        match self {
            ConfigTier::NonProd => "nonprod",
            ConfigTier::Sandbox => "sandbox",
            ConfigTier::Prod => "prod",
        }
    }
}
