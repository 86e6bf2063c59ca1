//! Lists stored profiles, optionally importing definitions first.

use crate::wiring::open_database;
use anyhow::{Context, Result};
use autotrader_core::{ConfigLoader, Profile, SymbolScope};
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct ProfilesArgs {
    /// JSON file holding an array of profile definitions to upsert
    #[arg(long)]
    pub import: Option<PathBuf>,

    /// Config file path
    #[arg(short, long, default_value = "config/Autotrader.toml")]
    pub config: PathBuf,
}

/// # Errors
/// Returns an error if the database or the import file cannot be read.
pub async fn run(args: ProfilesArgs) -> Result<()> {
    let config = ConfigLoader::load_from(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;
    let repo = open_database(&config).await?.repositories().profiles;

    if let Some(path) = &args.import {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let imported: Vec<Profile> = serde_json::from_str(&text)
            .with_context(|| format!("Invalid profile JSON in {}", path.display()))?;
        for profile in &imported {
            repo.upsert(profile).await?;
        }
        tracing::info!(count = imported.len(), path = %path.display(), "Imported profiles");
    }

    let profiles = repo.load_all().await?;
    if profiles.is_empty() {
        println!("No profiles stored");
        return Ok(());
    }

    println!(
        "{:<16} {:<20} {:<10} {:<7} {:<24} {:>8}  last run",
        "id", "name", "account", "enabled", "symbols", "interval"
    );
    for p in &profiles {
        let symbols = match &p.symbol_scope {
            SymbolScope::All => "all".to_string(),
            SymbolScope::Explicit(list) => list.join(","),
        };
        println!(
            "{:<16} {:<20} {:<10} {:<7} {:<24} {:>7}m  {}",
            p.id,
            p.name,
            p.account_id,
            p.enabled,
            symbols,
            p.interval_minutes,
            p.last_run_at
                .map_or_else(|| "never".to_string(), |t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        );
    }
    Ok(())
}
