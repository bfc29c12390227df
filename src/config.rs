//! CLI configuration and argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use secrecy::SecretString;

use crate::error::{Result, StackError};
use crate::secrets::VaultClient;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const COMMIT: &str = env!("BUILD_COMMIT");
pub const BUILD_DATE: &str = env!("BUILD_DATE");

pub const DEFAULT_VAULT_ADDR: &str = "https://vault.internal.epo.org";
pub const DEFAULT_AWX_HOST: &str = "https://ansible-awx.platform-staging.internal.epo.org/";

/// Synthesizes Terraform configuration for an EKS cluster.
///
/// Reads `config/<tier>/<cluster>.json` and writes the cluster, node groups,
/// add-ons, DNS role and bootstrap job as `cdk.tf.json` for Terraform to apply.
#[derive(Parser, Debug, Clone)]
#[command(name = "ekstack")]
#[command(about = "Synthesizes Terraform configuration for EKS clusters")]
#[command(version = const_format::formatcp!(
    "{} (commit: {}, build date: {})",
    VERSION, COMMIT, BUILD_DATE
))]
pub struct Args {
    /// Cluster identifier, selects the config file
    #[arg(short, long, env = "CLUSTER")]
    pub cluster: Option<String>,

    /// Terraform run mode (apply, destroy), selects the bootstrap job
    #[arg(short, long, env = "CDKTF_MODE")]
    pub mode: Option<String>,

    /// AWS profile for the default provider
    #[arg(short, long, env = "AWS_PROFILE")]
    pub profile: Option<String>,

    /// Vault address
    #[arg(long, env = "VAULT_ADDR", default_value = DEFAULT_VAULT_ADDR)]
    pub vault_addr: String,

    /// Vault token, used by preflight and kubeconfig only
    #[arg(long, env = "VAULT_TOKEN", hide_env_values = true)]
    pub vault_token: Option<String>,

    /// Verify the Vault server certificate
    #[arg(long, env = "VAULT_VERIFY_TLS")]
    pub vault_verify_tls: bool,

    /// AWX host for the bootstrap job
    #[arg(long, env = "AWX_HOST", default_value = DEFAULT_AWX_HOST)]
    pub awx_host: String,

    /// Directory holding nonprod/, sandbox/ and prod/ config files
    #[arg(long, default_value = "config")]
    pub config_dir: PathBuf,

    /// Output directory for synthesized stacks
    #[arg(short, long, default_value = "cdktf.out")]
    pub out: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log format (pretty, json)
    #[arg(long, env = "LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Compose the stack and write cdk.tf.json (default)
    Synth,
    /// Check that the secrets the stack reads exist in Vault
    Preflight,
    /// Fetch the cluster kubeconfig persisted in Vault
    Kubeconfig {
        /// Destination file (default: ./kubeconfig-<cluster>)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Terraform run mode taken from `CDKTF_MODE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Apply,
    Destroy,
    /// Plan, synth-only or unset. No bootstrap job is launched.
    Other,
}

impl Mode {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("apply") => Mode::Apply,
            Some("destroy") => Mode::Destroy,
            _ => Mode::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Apply => "apply",
            Mode::Destroy => "destroy",
            Mode::Other => "other",
        }
    }
}

/// Application configuration derived from CLI args.
#[derive(Debug)]
pub struct Config {
    pub cluster: String,
    pub mode: Mode,
    pub profile: Option<String>,
    pub vault_addr: String,
    pub vault_token: Option<SecretString>,
    pub vault_verify_tls: bool,
    pub awx_host: String,
    pub config_dir: PathBuf,
    pub out_dir: PathBuf,
    pub command: Command,
}

impl Config {
    /// Create config from CLI arguments. A missing or empty cluster identifier is an error.
    pub fn from_args(args: Args) -> Result<Self> {
        let cluster = args
            .cluster
            .filter(|c| !c.trim().is_empty())
            .ok_or(StackError::MissingCluster)?;

        Ok(Self {
            cluster,
            mode: Mode::parse(args.mode.as_deref()),
            profile: args.profile.filter(|p| !p.is_empty()),
            vault_addr: args.vault_addr,
            vault_token: args
                .vault_token
                .filter(|t| !t.is_empty())
                .map(SecretString::from),
            vault_verify_tls: args.vault_verify_tls,
            awx_host: args.awx_host,
            config_dir: args.config_dir,
            out_dir: args.out,
            command: args.command.unwrap_or(Command::Synth),
        })
    }

    /// Vault client for the runtime commands. Requires a token.
    pub fn vault_client(&self) -> Result<VaultClient> {
        let token = self
            .vault_token
            .clone()
            .ok_or(StackError::MissingVaultToken)?;
        VaultClient::with_tls_verification(&self.vault_addr, token, self.vault_verify_tls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_args(cluster: Option<&str>, mode: Option<&str>) -> Args {
        Args {
            cluster: cluster.map(String::from),
            mode: mode.map(String::from),
            profile: None,
            vault_addr: DEFAULT_VAULT_ADDR.to_string(),
            vault_token: None,
            vault_verify_tls: false,
            awx_host: DEFAULT_AWX_HOST.to_string(),
            config_dir: PathBuf::from("config"),
            out: PathBuf::from("cdktf.out"),
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            command: None,
        }
    }

    #[test]
    fn test_missing_cluster_is_error() {
        let err = Config::from_args(create_test_args(None, None)).unwrap_err();
        assert!(matches!(err, StackError::MissingCluster));
    }

    #[test]
    fn test_empty_cluster_is_error() {
        let err = Config::from_args(create_test_args(Some("  "), None)).unwrap_err();
        assert!(matches!(err, StackError::MissingCluster));
    }

    #[test]
    fn test_defaults_to_synth() {
        let config = Config::from_args(create_test_args(Some("np-demo"), None)).unwrap();
        assert_eq!(config.command, Command::Synth);
        assert_eq!(config.mode, Mode::Other);
        assert!(config.vault_token.is_none());
    }

    #[test]
    fn test_vault_client_requires_token() {
        let config = Config::from_args(create_test_args(Some("np-demo"), None)).unwrap();
        assert!(matches!(
            config.vault_client(),
            Err(StackError::MissingVaultToken)
        ));

        let mut args = create_test_args(Some("np-demo"), None);
        args.vault_token = Some("s.token".to_string());
        let config = Config::from_args(args).unwrap();
        assert!(config.vault_client().is_ok());
        // The config keeps its token after handing one to the client.
        assert!(config.vault_token.is_some());
    }

    #[test]
    fn test_vault_verify_tls_flag() {
        let args = Args::try_parse_from(["ekstack", "--cluster", "np-demo"]).unwrap();
        assert!(!Config::from_args(args).unwrap().vault_verify_tls);

        let args =
            Args::try_parse_from(["ekstack", "--cluster", "np-demo", "--vault-verify-tls"]).unwrap();
        assert!(Config::from_args(args).unwrap().vault_verify_tls);
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!(Mode::parse(Some("apply")), Mode::Apply);
        assert_eq!(Mode::parse(Some("destroy")), Mode::Destroy);
        assert_eq!(Mode::parse(Some("plan")), Mode::Other);
        assert_eq!(Mode::parse(Some("APPLY")), Mode::Other);
        assert_eq!(Mode::parse(None), Mode::Other);
    }

    #[test]
    fn test_parse_cli() {
        let args = Args::try_parse_from([
            "ekstack",
            "--cluster",
            "np-demo",
            "--mode",
            "apply",
            "kubeconfig",
            "--output",
            "/tmp/kc",
        ])
        .unwrap();
        let config = Config::from_args(args).unwrap();
        assert_eq!(config.mode, Mode::Apply);
        assert_eq!(
            config.command,
            Command::Kubeconfig {
                output: Some(PathBuf::from("/tmp/kc"))
            }
        );
    }
}
