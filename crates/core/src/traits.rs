use crate::error::BrokerError;
use crate::types::{Profile, TradePlan, TradeRecord};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a broker adapter can do natively.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BrokerCapabilities {
    pub supports_market_entry: bool,
    /// Broker can hold native stop/target orders
    pub supports_protective_exits: bool,
    pub enforces_precision_rules: bool,
}

/// Acknowledgement of an accepted order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderAck {
    pub order_id: String,
    pub fill_price: Option<Decimal>,
    pub message: String,
}

#[async_trait]
pub trait BrokerAdapter: Send + Sync {
    fn name(&self) -> &str;
    fn capabilities(&self) -> BrokerCapabilities;
    async fn validate(&self, plan: &TradePlan) -> Result<(), BrokerError>;
    async fn place(&self, plan: &TradePlan) -> Result<OrderAck, BrokerError>;
    async fn cancel_all(&self, symbol: &str) -> Result<String, BrokerError>;
}

/// A historical-expectancy row produced by `Planner::rank`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignalRow {
    pub strategy: String,
    /// Average P/L per trade in R multiples
    pub expectancy: f64,
    pub trades: u32,
    pub win_rate: f64,
}

/// Reason attached to a planner proposal, even when it yields zero plans.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ReasonCode {
    Ok,
    NoSignal,
    AdvisoryVeto,
    BiasBlocked,
    NoCandles,
    StrategyNotFound,
}

impl ReasonCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::NoSignal => "no-signal",
            Self::AdvisoryVeto => "advisory-veto",
            Self::BiasBlocked => "bias-blocked",
            Self::NoCandles => "no-candles",
            Self::StrategyNotFound => "strategy-not-found",
        }
    }

    /// A veto or bias block counts as a guardrail event for telemetry coverage.
    #[must_use]
    pub const fn is_veto(self) -> bool {
        matches!(self, Self::AdvisoryVeto | Self::BiasBlocked)
    }

    /// Rank used to pick the most informative reason across several symbols.
    #[must_use]
    pub const fn priority(self) -> u8 {
        match self {
            Self::Ok => 6,
            Self::AdvisoryVeto => 5,
            Self::BiasBlocked => 4,
            Self::NoSignal => 3,
            Self::NoCandles => 2,
            Self::StrategyNotFound => 1,
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ProposalRequest<'a> {
    pub account_id: &'a str,
    pub symbol: &'a str,
    pub granularity: &'a str,
    pub equity: Decimal,
    pub risk_pct: Decimal,
    pub ranked: &'a [SignalRow],
}

#[derive(Debug, Clone, PartialEq)]
pub struct Proposal {
    pub plans: Vec<TradePlan>,
    pub reason: ReasonCode,
    pub message: String,
}

impl Proposal {
    #[must_use]
    pub fn empty(reason: ReasonCode, message: impl Into<String>) -> Self {
        Self {
            plans: Vec::new(),
            reason,
            message: message.into(),
        }
    }
}

/// Turns market state into ranked candidate plans.
#[async_trait]
pub trait Planner: Send + Sync {
    async fn rank(&self, symbol: &str, granularity: &str, lookback: usize) -> Result<Vec<SignalRow>>;
    async fn propose(&self, request: ProposalRequest<'_>) -> Result<Proposal>;
}

/// Append-only trade log.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn save_trade(&self, record: &TradeRecord) -> Result<()>;
    async fn load_trades(&self) -> Result<Vec<TradeRecord>>;
}

/// Externally edited profiles; the supervisor only writes back last-run times.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_all(&self) -> Result<Vec<Profile>>;
    async fn mark_last_run(&self, profile_id: &str, at: DateTime<Utc>) -> Result<()>;
}

#[async_trait]
pub trait PriceFeed: Send + Sync {
    async fn current_price(&self, symbol: &str) -> Result<Decimal>;
}

/// Full tradable universe used when a profile's scope is `All`.
#[async_trait]
pub trait SymbolUniverse: Send + Sync {
    async fn tradable_symbols(&self) -> Result<Vec<String>>;
}
