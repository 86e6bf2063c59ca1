use crate::types::Account;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub supervisor: SupervisorConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub paper: PaperConfig,
    #[serde(default)]
    pub accounts: Vec<Account>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SupervisorConfig {
    /// Period of the cycle timer
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,
    /// Symbols scanned when a profile's scope is `All`
    #[serde(default = "default_max_all_symbols")]
    pub max_all_symbols: usize,
    /// Delay between per-symbol planner scans (external rate limits)
    #[serde(default = "default_scan_delay_ms")]
    pub scan_delay_ms: u64,
    /// Poll prices locally for brokers without native stop/target orders
    #[serde(default = "default_local_watchdog")]
    pub local_watchdog: bool,
    /// Arm switch for non-paper accounts
    #[serde(default)]
    pub live_trading_armed: bool,
    #[serde(default = "default_report_dir")]
    pub report_dir: String,
    #[serde(default = "default_granularity")]
    pub granularity: String,
    #[serde(default = "default_lookback")]
    pub lookback: usize,
}

const fn default_tick_secs() -> u64 {
    60
}

const fn default_max_all_symbols() -> usize {
    12
}

const fn default_scan_delay_ms() -> u64 {
    250
}

const fn default_local_watchdog() -> bool {
    true
}

fn default_report_dir() -> String {
    "reports".to_string()
}

fn default_granularity() -> String {
    "1h".to_string()
}

const fn default_lookback() -> usize {
    200
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            tick_secs: default_tick_secs(),
            max_all_symbols: default_max_all_symbols(),
            scan_delay_ms: default_scan_delay_ms(),
            local_watchdog: default_local_watchdog(),
            live_trading_armed: false,
            report_dir: default_report_dir(),
            granularity: default_granularity(),
            lookback: default_lookback(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

const fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://autotrader.db".to_string(),
            max_connections: default_max_connections(),
        }
    }
}

/// Simulated broker settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaperConfig {
    #[serde(default = "default_commission_rate")]
    pub commission_rate: Decimal,
    #[serde(default = "default_slippage_bps")]
    pub slippage_bps: Decimal,
    #[serde(default = "default_tick_size")]
    pub tick_size: Decimal,
    #[serde(default = "default_lot_size")]
    pub lot_size: Decimal,
    /// Candle CSV feeding the price book and the reference planner
    #[serde(default)]
    pub candles_csv: Option<String>,
}

fn default_commission_rate() -> Decimal {
    Decimal::new(25, 5) // 0.025%
}

fn default_slippage_bps() -> Decimal {
    Decimal::from(10)
}

fn default_tick_size() -> Decimal {
    Decimal::new(1, 2)
}

fn default_lot_size() -> Decimal {
    Decimal::new(1, 8)
}

impl Default for PaperConfig {
    fn default() -> Self {
        Self {
            commission_rate: default_commission_rate(),
            slippage_bps: default_slippage_bps(),
            tick_size: default_tick_size(),
            lot_size: default_lot_size(),
            candles_csv: None,
        }
    }
}
