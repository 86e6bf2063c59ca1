//! Prints the newest persisted cycle report.

use anyhow::{Context, Result};
use autotrader_core::ConfigLoader;
use autotrader_supervisor::{latest_report, RecordNode};
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    /// Report directory (defaults to `supervisor.report_dir` from the config)
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Config file path
    #[arg(short, long, default_value = "config/Autotrader.toml")]
    pub config: PathBuf,
}

/// # Errors
/// Returns an error if the config or the newest report cannot be read.
pub async fn run(args: ReportArgs) -> Result<()> {
    let dir = match args.dir {
        Some(dir) => dir,
        None => PathBuf::from(
            ConfigLoader::load_from(&args.config)
                .with_context(|| format!("Failed to load {}", args.config.display()))?
                .supervisor
                .report_dir,
        ),
    };

    let Some((path, cycle)) = latest_report(&dir).await? else {
        println!("No cycle reports in {}", dir.display());
        return Ok(());
    };

    println!("{}", path.display());
    print_report(&cycle);
    Ok(())
}

fn field<'a>(node: &'a RecordNode, key: &str) -> &'a str {
    node.field(key).unwrap_or("-")
}

fn print_report(cycle: &RecordNode) {
    println!(
        "Cycle {} ({}) {} -> {}",
        field(cycle, "id"),
        field(cycle, "trigger"),
        field(cycle, "started_at"),
        field(cycle, "finished_at")
    );
    println!(
        "  due={} not_due={} killed={} error={}",
        field(cycle, "profiles_due"),
        field(cycle, "profiles_not_due"),
        field(cycle, "killed"),
        field(cycle, "error")
    );

    if let Some(verdict) = cycle.child("verdict") {
        println!();
        for (axis, value) in &verdict.fields {
            println!("  {axis:<18} {value}");
        }
    }

    println!();
    println!(
        "  {:<16} {:<10} {:<8} {:>6} {:>6} {:>6}  reason",
        "profile", "account", "status", "placed", "failed", "skips"
    );
    for profile in cycle.children_named("profile") {
        let outcome = profile.child("outcome");
        let count = |key: &str| -> u64 {
            outcome
                .and_then(|o| o.field(key))
                .and_then(|v| v.parse().ok())
                .unwrap_or(0)
        };
        let skips = count("skipped_cooldown")
            + count("skipped_open_cap")
            + count("skipped_risk")
            + count("skipped_validation");
        println!(
            "  {:<16} {:<10} {:<8} {:>6} {:>6} {:>6}  {}",
            field(profile, "id"),
            field(profile, "account"),
            field(profile, "status"),
            count("placed"),
            count("failed"),
            skips,
            field(profile, "reason")
        );
    }
}
