use crate::scope::GuardrailScope;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Side of a plan, an open position, or a persisted trade.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Long => Self::Short,
            Self::Short => Self::Long,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Long => "long",
            Self::Short => "short",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "long" | "buy" => Ok(Self::Long),
            "short" | "sell" => Ok(Self::Short),
            other => Err(format!("unknown direction: {other}")),
        }
    }
}

/// Whether an account routes to simulated or real fills.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TradingMode {
    /// Simulated fills, no real money
    #[default]
    Paper,
    /// Real orders (requires the live-trading arm switch)
    Live,
}

impl TradingMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Paper => "paper",
            Self::Live => "live",
        }
    }
}

impl fmt::Display for TradingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "paper" => Ok(Self::Paper),
            "live" => Ok(Self::Live),
            other => Err(format!("unknown trading mode: {other}")),
        }
    }
}

/// Which symbols a profile trades.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "mode", content = "symbols", rename_all = "lowercase")]
pub enum SymbolScope {
    /// The full tradable universe, capped by `max_all_symbols`
    All,
    /// An explicit list of symbols
    Explicit(Vec<String>),
}

impl SymbolScope {
    /// Number of distinct symbols an explicit scope declares; `None` for `All`.
    #[must_use]
    pub fn declared_count(&self) -> Option<usize> {
        match self {
            Self::All => None,
            Self::Explicit(symbols) => Some(normalize_symbols(symbols).len()),
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Explicit(_) => "explicit",
        }
    }
}

/// Trims, uppercases, drops blanks and de-duplicates while keeping first-seen order.
#[must_use]
pub fn normalize_symbols(symbols: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(symbols.len());
    for raw in symbols {
        let symbol = raw.trim().to_ascii_uppercase();
        if !symbol.is_empty() && !out.contains(&symbol) {
            out.push(symbol);
        }
    }
    out
}

/// An independently configured trading profile.
///
/// Profiles are created and edited outside the supervisor. The supervisor only
/// reads enabled ones and writes back `last_run_at` after every attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub account_id: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub symbol_scope: SymbolScope,
    /// Minutes between runs
    pub interval_minutes: i64,
    pub max_trades_per_cycle: u32,
    pub cooldown_minutes: i64,
    /// Daily risk stop as a percentage of equity (3 = 3%)
    pub daily_risk_stop_pct: Decimal,
    /// Candle granularity handed to the planner; falls back to the supervisor default
    #[serde(default)]
    pub granularity: Option<String>,
    /// Candle lookback handed to the planner; falls back to the supervisor default
    #[serde(default)]
    pub lookback: Option<usize>,
    #[serde(default)]
    pub last_run_at: Option<DateTime<Utc>>,
}

const fn default_enabled() -> bool {
    true
}

impl Profile {
    /// Guardrail scope owned by this profile.
    #[must_use]
    pub fn scope(&self) -> GuardrailScope {
        GuardrailScope::for_profile(&self.id)
    }

    /// First run is always due; afterwards the interval must have fully elapsed.
    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.last_run_at.map_or(true, |last| {
            now - last >= Duration::minutes(self.interval_minutes.max(0))
        })
    }
}

/// A downstream brokerage account. Read-only input to a cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub id: String,
    /// Broker adapter name this account routes through
    pub broker: String,
    #[serde(default)]
    pub mode: TradingMode,
    #[serde(default)]
    pub max_concurrent_trades: Option<u32>,
    /// Risk per trade as a percentage of equity
    pub risk_per_trade_pct: Decimal,
    /// Equity used for sizing and the daily risk cap
    pub equity: Decimal,
    /// Reference to the credential entry; required for live accounts
    #[serde(default)]
    pub key_ref: Option<String>,
}

impl Account {
    #[must_use]
    pub fn is_paper(&self) -> bool {
        self.mode == TradingMode::Paper
    }

    /// Scope used for ad-hoc manual runs against this account.
    #[must_use]
    pub fn manual_scope(&self) -> GuardrailScope {
        GuardrailScope::for_account(&self.id)
    }
}

/// A fully specified candidate order awaiting guardrail evaluation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradePlan {
    pub account_id: String,
    pub symbol: String,
    pub strategy: String,
    pub direction: Direction,
    pub entry: Decimal,
    pub stop: Decimal,
    pub target: Decimal,
    pub quantity: Decimal,
    pub rationale: String,
}

impl TradePlan {
    /// Capital at risk if the stop is hit: `|entry - stop| * quantity`.
    #[must_use]
    pub fn risk_amount(&self) -> Decimal {
        (self.entry - self.stop).abs() * self.quantity
    }

    /// Appends a note to the rationale; the only mutation a plan allows.
    pub fn append_rationale(&mut self, note: &str) {
        if self.rationale.is_empty() {
            self.rationale = note.to_string();
        } else {
            self.rationale.push_str(" | ");
            self.rationale.push_str(note);
        }
    }

    /// Price/quantity geometry check. Long: stop < entry < target. Short mirrored.
    ///
    /// # Errors
    /// Returns a human-readable message describing the first violated rule.
    pub fn check_geometry(&self) -> Result<(), String> {
        if self.quantity <= Decimal::ZERO {
            return Err(format!("quantity {} must be positive", self.quantity));
        }
        if self.entry <= Decimal::ZERO || self.stop <= Decimal::ZERO || self.target <= Decimal::ZERO {
            return Err("entry, stop and target must be positive".to_string());
        }
        let ordered = match self.direction {
            Direction::Long => self.stop < self.entry && self.entry < self.target,
            Direction::Short => self.target < self.entry && self.entry < self.stop,
        };
        if !ordered {
            return Err(format!(
                "{} plan requires {} (entry={}, stop={}, target={})",
                self.direction,
                match self.direction {
                    Direction::Long => "stop < entry < target",
                    Direction::Short => "target < entry < stop",
                },
                self.entry,
                self.stop,
                self.target
            ));
        }
        Ok(())
    }
}

/// Why the watchdog closed a position.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ExitTrigger {
    StopLoss,
    TakeProfit,
}

impl fmt::Display for ExitTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StopLoss => write!(f, "stop_loss"),
            Self::TakeProfit => write!(f, "take_profit"),
        }
    }
}

/// A locally tracked position for brokers that cannot hold native stop/target orders.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpenPositionRecord {
    pub account_id: String,
    pub symbol: String,
    pub strategy: String,
    pub direction: Direction,
    pub entry: Decimal,
    pub stop: Decimal,
    pub target: Decimal,
    pub quantity: Decimal,
    pub opened_at: DateTime<Utc>,
    pub scope: GuardrailScope,
}

impl OpenPositionRecord {
    /// Builds a record from a filled plan. The fill price, when reported, replaces the planned entry.
    #[must_use]
    pub fn from_fill(
        plan: &TradePlan,
        fill_price: Option<Decimal>,
        scope: GuardrailScope,
        opened_at: DateTime<Utc>,
    ) -> Self {
        Self {
            account_id: plan.account_id.clone(),
            symbol: plan.symbol.clone(),
            strategy: plan.strategy.clone(),
            direction: plan.direction,
            entry: fill_price.unwrap_or(plan.entry),
            stop: plan.stop,
            target: plan.target,
            quantity: plan.quantity,
            opened_at,
            scope,
        }
    }

    /// Returns the breached level, if any. Long: price >= target or price <= stop. Short mirrored.
    #[must_use]
    pub fn exit_trigger(&self, price: Decimal) -> Option<ExitTrigger> {
        match self.direction {
            Direction::Long if price >= self.target => Some(ExitTrigger::TakeProfit),
            Direction::Long if price <= self.stop => Some(ExitTrigger::StopLoss),
            Direction::Short if price <= self.target => Some(ExitTrigger::TakeProfit),
            Direction::Short if price >= self.stop => Some(ExitTrigger::StopLoss),
            _ => None,
        }
    }

    #[must_use]
    pub fn realized_pnl(&self, exit_price: Decimal) -> Decimal {
        match self.direction {
            Direction::Long => (exit_price - self.entry) * self.quantity,
            Direction::Short => (self.entry - exit_price) * self.quantity,
        }
    }

    /// Opposite-direction plan that flattens this position at `price`.
    #[must_use]
    pub fn closing_plan(&self, price: Decimal, trigger: ExitTrigger) -> TradePlan {
        TradePlan {
            account_id: self.account_id.clone(),
            symbol: self.symbol.clone(),
            strategy: self.strategy.clone(),
            direction: self.direction.opposite(),
            entry: price,
            stop: price,
            target: price,
            quantity: self.quantity,
            rationale: format!("protective exit ({trigger}) of {} entry {}", self.direction, self.entry),
        }
    }
}

/// One row of the persisted trade log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradeRecord {
    pub account_id: String,
    pub broker: String,
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub side: Direction,
    pub quantity: Decimal,
    pub price: Decimal,
    pub executed: bool,
    #[serde(default)]
    pub fill_price: Option<Decimal>,
    #[serde(default)]
    pub realized_pnl: Option<Decimal>,
    /// Encoded `TradeTags`
    #[serde(default)]
    pub notes: String,
}

impl TradeRecord {
    #[must_use]
    pub fn tags(&self) -> crate::tags::TradeTags {
        crate::tags::TradeTags::parse(&self.notes)
    }
}

/// Counters produced once per pipeline invocation.
///
/// `placed + failed + skipped_*` always equals the number of plans that belonged
/// to the executed account. Watchdog closes are tracked separately.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub placed: u32,
    pub failed: u32,
    pub skipped_cooldown: u32,
    pub skipped_open_cap: u32,
    pub skipped_risk: u32,
    pub skipped_validation: u32,
    /// Plans never evaluated because the trade cap or kill switch stopped the batch
    pub skipped_halted: u32,
    pub watchdog_closes: u32,
    pub realized_pnl: Decimal,
}

impl ExecutionOutcome {
    /// Sum of every per-plan counter.
    #[must_use]
    pub const fn plans_accounted(&self) -> u32 {
        self.placed
            + self.failed
            + self.skipped_cooldown
            + self.skipped_open_cap
            + self.skipped_risk
            + self.skipped_validation
            + self.skipped_halted
    }

    #[must_use]
    pub const fn guardrail_rejections(&self) -> u32 {
        self.skipped_cooldown + self.skipped_open_cap + self.skipped_risk + self.skipped_validation
    }
}
