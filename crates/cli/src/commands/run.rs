//! `run` (timer loop) and `once` (single cycle).

use crate::wiring::build_coordinator;
use anyhow::{Context, Result};
use autotrader_core::{AppConfig, ConfigLoader, ConfigWatcher};
use autotrader_supervisor::{spawn_timer, CycleCoordinator, CycleTelemetry, CycleTrigger};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Config file path
    #[arg(short, long, default_value = "config/Autotrader.toml")]
    pub config: PathBuf,

    /// Reload supervisor settings when the config file changes
    #[arg(long)]
    pub watch: bool,
}

#[derive(Args, Debug, Clone)]
pub struct OnceArgs {
    /// Config file path
    #[arg(short, long, default_value = "config/Autotrader.toml")]
    pub config: PathBuf,
}

/// Runs cycles on the configured timer until SIGINT/SIGTERM, then engages the
/// kill switch and waits for the in-flight cycle to finish.
///
/// # Errors
/// Returns an error if configuration or storage cannot be loaded.
pub async fn run(args: RunArgs) -> Result<()> {
    let config = ConfigLoader::load_from(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;
    let coordinator = Arc::new(build_coordinator(&config).await?);

    if args.watch {
        spawn_config_reload(coordinator.clone(), config.clone(), args.config.clone());
    }

    let period = Duration::from_secs(config.supervisor.tick_secs.max(1));
    tracing::info!(
        period_secs = period.as_secs(),
        accounts = config.accounts.len(),
        "Supervisor started"
    );
    let timer = spawn_timer(coordinator.clone(), period);

    shutdown_signal().await?;

    coordinator.engage_kill_switch();
    timer.abort();
    if coordinator.is_cycle_running() {
        tracing::info!("Waiting for the in-flight cycle to finish");
    }
    coordinator.wait_idle().await;

    let status = coordinator.status().borrow().clone();
    tracing::info!(
        cycles_run = status.cycles_run,
        last_cycle_id = status.last_cycle_id.as_deref().unwrap_or("-"),
        "Supervisor stopped"
    );
    Ok(())
}

/// Runs exactly one cycle and prints its summary.
///
/// # Errors
/// Returns an error if configuration or storage cannot be loaded.
pub async fn once(args: OnceArgs) -> Result<()> {
    let config = ConfigLoader::load_from(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;
    let coordinator = build_coordinator(&config).await?;

    match coordinator.run_cycle(CycleTrigger::Manual).await {
        Some(cycle) => print_cycle(&cycle),
        None => println!("A cycle is already running"),
    }
    Ok(())
}

fn spawn_config_reload(coordinator: Arc<CycleCoordinator>, initial: AppConfig, path: PathBuf) {
    let (watcher, mut updates) = ConfigWatcher::new(initial);

    tokio::spawn(async move {
        if let Err(e) = watcher.watch(&path).await {
            tracing::error!(error = %e, "Config watcher stopped");
        }
    });

    tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let supervisor = updates.borrow_and_update().supervisor.clone();
            coordinator.apply_config(&supervisor);
        }
    });
}

async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::select! {
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM, engaging kill switch");
            }
            res = tokio::signal::ctrl_c() => {
                res?;
                tracing::info!("Received SIGINT (Ctrl+C), engaging kill switch");
            }
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        tracing::info!("Received Ctrl+C, engaging kill switch");
    }
    Ok(())
}

fn print_cycle(cycle: &CycleTelemetry) {
    println!(
        "Cycle {} ({}) due={} not_due={} placed={}",
        cycle.short_id(),
        cycle.trigger,
        cycle.profiles_due,
        cycle.profiles_not_due,
        cycle.total_placed()
    );
    for p in &cycle.profiles {
        println!(
            "  {:<16} {:<10} {:<8} {}",
            p.profile_id, p.account_id, p.status, p.reason
        );
    }
    if let Some(error) = &cycle.error {
        println!("  error: {error}");
    }
    if let Some(verification) = &cycle.verification {
        for (axis, verdict) in verification.axes() {
            println!("  {axis:<18} {verdict}");
        }
        println!("  {:<18} {}", "overall", verification.overall);
    }
}
