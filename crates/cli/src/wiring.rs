//! Assembles a coordinator from configuration: SQLite stores, the CSV-fed
//! price book, the reference planner and one paper broker.

use anyhow::{Context, Result};
use autotrader_core::{AppConfig, BrokerAdapter, Clock, SystemClock};
use autotrader_data::{Candle, CsvStorage, Database};
use autotrader_paper::{PaperBroker, PriceBook};
use autotrader_strategy::{MaCrossoverPlanner, PlannerConfig};
use autotrader_supervisor::{CycleCoordinator, SupervisorParts};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Adapter name accounts use to route through the paper broker.
pub const PAPER_BROKER: &str = "paper";

/// Opens the database, creating the parent directory of a file-backed URL.
///
/// # Errors
/// Returns an error if the directory cannot be created or the database cannot be opened.
pub async fn open_database(config: &AppConfig) -> Result<Database> {
    let url = &config.database.url;
    if let Some(file_path) = url.strip_prefix("sqlite://") {
        if let Some(parent) = Path::new(file_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }
    }
    tracing::info!(url = %url, "Opening database");
    Database::connect(url, config.database.max_connections).await
}

fn load_candles(config: &AppConfig) -> Result<BTreeMap<String, Vec<Candle>>> {
    let Some(path) = config.paper.candles_csv.as_deref() else {
        tracing::warn!("No candle CSV configured; planner will report no-candles");
        return Ok(BTreeMap::new());
    };
    let series = CsvStorage::read_candles_by_symbol(path)?;
    tracing::info!(path, symbols = series.len(), "Loaded candles");
    Ok(series)
}

/// # Errors
/// Returns an error if the database or the candle file cannot be loaded.
pub async fn build_coordinator(config: &AppConfig) -> Result<CycleCoordinator> {
    let database = open_database(config).await?;
    let repositories = database.repositories();

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let series = load_candles(config)?;
    let book = Arc::new(PriceBook::from_candles(&series));
    let planner = MaCrossoverPlanner::from_candles(
        series,
        PlannerConfig {
            tick_size: config.paper.tick_size,
            lot_size: config.paper.lot_size,
            ..PlannerConfig::default()
        },
    );
    let broker = PaperBroker::new(
        PAPER_BROKER,
        book.clone(),
        config.paper.commission_rate,
        config.paper.slippage_bps,
    )
    .with_precision(config.paper.tick_size, config.paper.lot_size)
    .with_clock(clock.clone());

    for account in &config.accounts {
        if account.broker != PAPER_BROKER {
            tracing::warn!(
                account_id = %account.id,
                broker = %account.broker,
                "Account routes to an unknown broker; its profiles will be blocked"
            );
        }
    }

    Ok(CycleCoordinator::new(SupervisorParts {
        config: config.supervisor.clone(),
        accounts: config.accounts.clone(),
        brokers: vec![Arc::new(broker) as Arc<dyn BrokerAdapter>],
        planner: Arc::new(planner),
        profiles: Arc::new(repositories.profiles),
        history: Arc::new(repositories.trades),
        prices: book.clone(),
        universe: book,
        clock,
    }))
}
