//! Scripted collaborators shared by the unit tests.

use crate::events::SupervisorEvent;
use crate::session::Services;
use anyhow::{bail, Result};
use async_trait::async_trait;
use autotrader_core::{
    Account, BrokerAdapter, BrokerCapabilities, BrokerError, Direction, ManualClock, OrderAck,
    Planner, Proposal, ProposalRequest, ReasonCode, SignalRow, TradePlan, TradingMode,
};
use autotrader_data::MemoryHistoryStore;
use autotrader_paper::price_book::PriceBook;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::broadcast;

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
}

pub struct Fixture {
    pub services: Services,
    pub prices: Arc<PriceBook>,
    pub history: Arc<MemoryHistoryStore>,
    pub clock: ManualClock,
    pub events: broadcast::Receiver<SupervisorEvent>,
}

pub fn services() -> Fixture {
    let prices = Arc::new(PriceBook::new());
    let history = Arc::new(MemoryHistoryStore::new());
    let clock = ManualClock::new(t0());
    let (events_tx, events) = broadcast::channel(64);
    Fixture {
        services: Services {
            history: history.clone(),
            prices: prices.clone(),
            clock: Arc::new(clock.clone()),
            events: events_tx,
        },
        prices,
        history,
        clock,
        events,
    }
}

pub fn account(id: &str, max_concurrent_trades: Option<u32>) -> Account {
    Account {
        id: id.to_string(),
        broker: "paper".to_string(),
        mode: TradingMode::Paper,
        max_concurrent_trades,
        risk_per_trade_pct: dec!(1),
        equity: dec!(1000),
        key_ref: None,
    }
}

/// Long plan risking `(entry - stop) * quantity`, target at 2R.
pub fn plan(account_id: &str, symbol: &str, entry: Decimal, stop: Decimal, quantity: Decimal) -> TradePlan {
    TradePlan {
        account_id: account_id.to_string(),
        symbol: symbol.to_string(),
        strategy: "scripted".to_string(),
        direction: Direction::Long,
        entry,
        stop,
        target: entry + (entry - stop) * dec!(2),
        quantity,
        rationale: String::new(),
    }
}

pub struct ScriptedBroker {
    name: String,
    capabilities: BrokerCapabilities,
    placed: Mutex<Vec<TradePlan>>,
    cancels: Mutex<Vec<String>>,
    fail_place: Mutex<HashSet<String>>,
    reject_validation: Mutex<HashSet<String>>,
}

impl ScriptedBroker {
    /// Broker without native protective exits.
    pub fn local(name: &str) -> Self {
        Self::with_capabilities(
            name,
            BrokerCapabilities {
                supports_market_entry: true,
                supports_protective_exits: false,
                enforces_precision_rules: false,
            },
        )
    }

    pub fn with_capabilities(name: &str, capabilities: BrokerCapabilities) -> Self {
        Self {
            name: name.to_string(),
            capabilities,
            placed: Mutex::new(Vec::new()),
            cancels: Mutex::new(Vec::new()),
            fail_place: Mutex::new(HashSet::new()),
            reject_validation: Mutex::new(HashSet::new()),
        }
    }

    pub fn fail_place_for(&self, symbol: &str) {
        self.fail_place.lock().insert(symbol.to_string());
    }

    pub fn reject_validation_for(&self, symbol: &str) {
        self.reject_validation.lock().insert(symbol.to_string());
    }

    pub fn placed(&self) -> Vec<TradePlan> {
        self.placed.lock().clone()
    }

    pub fn cancels(&self) -> Vec<String> {
        self.cancels.lock().clone()
    }
}

#[async_trait]
impl BrokerAdapter for ScriptedBroker {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> BrokerCapabilities {
        self.capabilities
    }

    async fn validate(&self, plan: &TradePlan) -> Result<(), BrokerError> {
        if self.reject_validation.lock().contains(&plan.symbol) {
            return Err(BrokerError::Validation(format!("{} below min notional", plan.symbol)));
        }
        Ok(())
    }

    async fn place(&self, plan: &TradePlan) -> Result<OrderAck, BrokerError> {
        if self.fail_place.lock().contains(&plan.symbol) {
            return Err(BrokerError::Transport("connection reset".to_string()));
        }
        let mut placed = self.placed.lock();
        placed.push(plan.clone());
        Ok(OrderAck {
            order_id: format!("ord-{}", placed.len()),
            fill_price: None,
            message: "accepted".to_string(),
        })
    }

    async fn cancel_all(&self, symbol: &str) -> Result<String, BrokerError> {
        self.cancels.lock().push(symbol.to_string());
        Ok(format!("cancelled {symbol}"))
    }
}

/// Planner returning canned proposals per symbol.
#[derive(Default)]
pub struct ScriptedPlanner {
    proposals: Mutex<HashMap<String, Proposal>>,
    failing: Mutex<HashSet<String>>,
    panicking: Mutex<HashSet<String>>,
}

impl ScriptedPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, symbol: &str, proposal: Proposal) {
        self.proposals.lock().insert(symbol.to_string(), proposal);
    }

    pub fn fail_for(&self, symbol: &str) {
        self.failing.lock().insert(symbol.to_string());
    }

    pub fn panic_for(&self, symbol: &str) {
        self.panicking.lock().insert(symbol.to_string());
    }
}

#[async_trait]
impl Planner for ScriptedPlanner {
    async fn rank(&self, symbol: &str, _granularity: &str, _lookback: usize) -> Result<Vec<SignalRow>> {
        if self.failing.lock().contains(symbol) {
            bail!("candle feed timed out for {symbol}");
        }
        if self.panicking.lock().contains(symbol) {
            panic!("indicator buffer overflow on {symbol}");
        }
        Ok(vec![SignalRow {
            strategy: "scripted".to_string(),
            expectancy: 0.4,
            trades: 12,
            win_rate: 0.5,
        }])
    }

    async fn propose(&self, request: ProposalRequest<'_>) -> Result<Proposal> {
        Ok(self
            .proposals
            .lock()
            .get(request.symbol)
            .cloned()
            .unwrap_or_else(|| Proposal::empty(ReasonCode::NoSignal, "flat")))
    }
}
