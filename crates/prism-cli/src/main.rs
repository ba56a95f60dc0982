//! `prism` CLI: operator checks for configuration and credential resolution.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use prism_client::{ConnectionDescriptor, CredentialStore};
use prism_core::config::PrismConfig;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "prism", version, about = "Prism analytics portal CLI")]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, default_value = "prism.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate configuration and credential resolution.
    ///
    /// Fails when the configuration could never authenticate a query, the
    /// same condition that blocks startup in the portal itself.
    Check,

    /// Show the tenant, credential and connection a principal would get.
    Resolve {
        /// Principal email to resolve.
        #[arg(long)]
        email: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = PrismConfig::from_file(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;

    match cli.cmd {
        Command::Check => check(&config),
        Command::Resolve { email } => resolve(&config, &email),
    }
}

fn check(config: &PrismConfig) -> Result<()> {
    let mut failures = 0usize;

    match config.validate() {
        Ok(()) => println!("OK    configuration is valid"),
        Err(error) => {
            failures += 1;
            println!("ERROR {error}");
        }
    }

    match CredentialStore::from_env(config.tenancy.known_tenants(), &config.credentials) {
        Ok(store) => {
            for tenant in config.tenancy.known_tenants() {
                match store.credential_for(tenant) {
                    Ok(credential) if credential.is_fallback() => println!(
                        "WARN  tenant '{tenant}' resolves to the shared fallback token ({}) — degraded isolation",
                        credential.source_env_key
                    ),
                    Ok(credential) => println!(
                        "OK    tenant '{tenant}' uses {} (token {})",
                        credential.source_env_key, credential.token
                    ),
                    Err(error) => {
                        failures += 1;
                        println!("ERROR tenant '{tenant}': {error}");
                    }
                }
            }
        }
        Err(error) => {
            failures += 1;
            println!("ERROR {error}");
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} check(s) failed");
    }
    println!("all checks passed");
    Ok(())
}

fn resolve(config: &PrismConfig, email: &str) -> Result<()> {
    config.validate()?;
    let store = CredentialStore::from_env(config.tenancy.known_tenants(), &config.credentials)?;

    let tenant = config.tenancy.resolve_tenant(email);
    let credential = store.credential_for(tenant)?;
    let descriptor =
        ConnectionDescriptor::parse(&config.routing.connection_string(&credential.token))?;

    println!("tenant:      {tenant}");
    println!(
        "credential:  {} (token {})",
        credential.source_env_key, credential.token
    );
    println!("host:        {}", descriptor.host());
    if let Some(environment) = descriptor.environment_id() {
        println!("environment: {environment}");
    }
    Ok(())
}
