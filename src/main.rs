//! ekstack - synthesizes Terraform configuration for EKS clusters.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tracing::{debug, error, info};

use ekstack::config::{Args, Command, Config};
use ekstack::eks::cilium::kubeconfig_filename;
use ekstack::secrets::{self, SecretStore};
use ekstack::stack::{self, ComposeOptions};
use ekstack::{infra, logging, output, terraform};

#[tokio::main]
async fn main() {
    let args = Args::parse();
    logging::init(&args.log_format, &args.log_level);

    debug!("Starting ekstack");

    if let Err(e) = run(args).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let config = Config::from_args(args)?;
    info!(
        cluster = %config.cluster,
        mode = config.mode.as_str(),
        config_dir = %config.config_dir.display(),
        "Configuration initialized"
    );

    match &config.command {
        Command::Synth => synth(&config),
        Command::Preflight => preflight(&config).await,
        Command::Kubeconfig { output } => kubeconfig(&config, output.clone()).await,
    }
}

fn synth(config: &Config) -> Result<()> {
    let infra = infra::load(&config.config_dir, &config.cluster)?;
    let stack = stack::compose(&infra, &ComposeOptions::from_config(config))?;
    let report = terraform::synth(&stack, &config.out_dir)?;
    output::print_summary(&stack, &report);
    Ok(())
}

async fn preflight(config: &Config) -> Result<()> {
    let infra = infra::load(&config.config_dir, &config.cluster)?;
    let client = config.vault_client()?;
    let required = stack::required_secrets(&infra, config.mode);

    secrets::check_required(&client, &required).await?;
    println!(
        "{} {} secrets present in {}",
        "OK".green().bold(),
        required.len(),
        client.name()
    );
    Ok(())
}

async fn kubeconfig(config: &Config, output: Option<PathBuf>) -> Result<()> {
    let client = config.vault_client()?;
    let contents = secrets::fetch_kubeconfig(&client, &config.cluster).await?;

    let path = output.unwrap_or_else(|| PathBuf::from(kubeconfig_filename(&config.cluster)));
    std::fs::write(&path, contents)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), "Wrote kubeconfig");
    Ok(())
}
