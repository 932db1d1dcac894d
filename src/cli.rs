//! # Command Line Interface
//!
//! Runs lookups through a [`SecretsCache`] and prints what came back, with
//! payloads redacted. Useful for checking stage resolution and refresh
//! behaviour against a snapshot file or the environment.

use crate::cache::{GetSecretValueOptions, SecretsCache};
use crate::config::{CacheConfig, ObservabilityConfig};
use crate::observability::{init_logging, log_config_info};
use crate::secrets::{
    EnvSecretsManager, GetSecretValueOutput, InMemorySecretsManager, SecretString,
    SecretsManagerClient,
};
use crate::{APP_NAME, VERSION};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

#[derive(Parser)]
#[command(name = "secrets-cache")]
#[command(about = "Read-through cache for versioned, stage-labelled secrets")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Look up a secret through the cache
    Get(GetArgs),
}

#[derive(Args, Debug, Clone)]
pub struct GetArgs {
    /// Secret identifier
    #[arg(long)]
    pub secret_id: String,

    /// Exact version to return
    #[arg(long, conflicts_with = "version_stage")]
    pub version_id: Option<String>,

    /// Stage label to resolve (defaults to the configured default stage)
    #[arg(long)]
    pub version_stage: Option<String>,

    /// Number of lookups to perform
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub repeat: u32,

    /// Bypass cached state on every lookup
    #[arg(long)]
    pub force: bool,

    /// JSON snapshot of secrets to serve instead of environment variables
    #[arg(long)]
    pub snapshot: Option<PathBuf>,
}

impl GetArgs {
    fn options(&self) -> GetSecretValueOptions {
        GetSecretValueOptions {
            version_id: self.version_id.clone(),
            version_stage: self.version_stage.clone(),
            force: self.force,
        }
    }
}

/// Result of a `get` run
#[derive(Debug, Serialize)]
pub struct LookupSummary {
    pub secret_id: String,
    pub found: bool,
    pub version_id: Option<String>,
    pub version_stages: Vec<String>,
    /// Always serialized redacted
    pub secret_string: Option<SecretString>,
    pub secret_binary_len: Option<usize>,
    pub created_date: Option<DateTime<Utc>>,
    pub lookups: u32,
    pub cached_secrets: usize,
    /// Backend call counts, only known for snapshot-backed runs
    pub describe_calls: Option<usize>,
    pub get_value_calls: Option<usize>,
}

impl LookupSummary {
    fn new(secret_id: &str, output: Option<GetSecretValueOutput>, lookups: u32) -> Self {
        let found = output.is_some();
        let output = output.unwrap_or_default();
        Self {
            secret_id: secret_id.to_string(),
            found,
            version_id: output.version_id,
            version_stages: output.version_stages,
            secret_binary_len: output.secret_binary.as_ref().map(|bytes| bytes.len()),
            secret_string: output.secret_string,
            created_date: output.created_date,
            lookups,
            cached_secrets: 0,
            describe_calls: None,
            get_value_calls: None,
        }
    }
}

/// Run CLI commands
pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    let mut observability = ObservabilityConfig::from_env();
    if cli.verbose {
        observability.log_level = "debug".to_string();
    }
    init_logging(&observability)?;
    debug!(app_name = APP_NAME, version = VERSION, "Starting secrets-cache");

    match cli.command {
        Commands::Get(args) => {
            let config = CacheConfig::from_env().context("Failed to load cache configuration")?;
            let summary = run_get(&args, config).await?;
            print_json(&summary)?;
        }
    }

    Ok(())
}

/// Build a cache for `args` and perform the requested lookups.
pub async fn run_get(args: &GetArgs, config: CacheConfig) -> Result<LookupSummary> {
    log_config_info(&config);

    let store = match &args.snapshot {
        Some(path) => Some(InMemorySecretsManager::from_json_file(path).with_context(|| {
            format!("Failed to load secrets snapshot from {}", path.display())
        })?),
        None => None,
    };
    let client: Arc<dyn SecretsManagerClient> = match &store {
        Some(store) => Arc::new(store.clone()),
        None => Arc::new(EnvSecretsManager::with_stage(config.default_version_stage.clone())),
    };

    let cache = SecretsCache::builder().client(client).config(config).build()?;
    let options = args.options();

    let mut output = None;
    for _ in 0..args.repeat {
        output = cache
            .get_secret_value(&args.secret_id, options.clone())
            .await
            .with_context(|| format!("Failed to get secret '{}'", args.secret_id))?;
    }

    let mut summary = LookupSummary::new(&args.secret_id, output, args.repeat);
    summary.cached_secrets = cache.len().await;
    if let Some(store) = &store {
        summary.describe_calls = Some(store.describe_calls());
        summary.get_value_calls = Some(store.get_value_calls());
    }
    Ok(summary)
}

fn print_json<T: Serialize>(data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data).context("Failed to serialize to JSON")?;
    println!("{}", json);
    Ok(())
}
