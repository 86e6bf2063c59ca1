//! Reference planner: MA crossover entries sized by risk, filtered by a
//! long-horizon trend bias and an optional advisor.

use crate::ma_crossover::{backtest_expectancy, crossover_state, sma, BracketRules, MaParams};
use crate::sizing::{round_to_tick, size_by_risk};
use anyhow::Result;
use async_trait::async_trait;
use autotrader_core::{Direction, Planner, Proposal, ProposalRequest, ReasonCode, SignalRow, TradePlan};
use autotrader_data::Candle;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Second opinion on a finished plan. `Some(reason)` vetoes it.
#[async_trait]
pub trait Advisor: Send + Sync {
    async fn veto(&self, plan: &TradePlan) -> Result<Option<String>>;
}

#[derive(Debug, Clone)]
pub struct PlannerConfig {
    pub param_sets: Vec<MaParams>,
    /// SMA period of the bias filter; entries against it are blocked
    pub trend_period: usize,
    pub rules: BracketRules,
    pub tick_size: Decimal,
    pub lot_size: Decimal,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            param_sets: vec![MaParams::new(5, 20), MaParams::new(10, 30), MaParams::new(20, 50)],
            trend_period: 100,
            rules: BracketRules {
                atr_period: 14,
                stop_atr_multiple: Decimal::new(15, 1),
                reward_multiple: Decimal::TWO,
            },
            tick_size: Decimal::new(1, 2),
            lot_size: Decimal::new(1, 8),
        }
    }
}

pub struct MaCrossoverPlanner {
    series: RwLock<BTreeMap<String, Vec<Candle>>>,
    config: PlannerConfig,
    advisor: Option<Arc<dyn Advisor>>,
}

impl MaCrossoverPlanner {
    #[must_use]
    pub fn new(config: PlannerConfig) -> Self {
        Self::from_candles(BTreeMap::new(), config)
    }

    #[must_use]
    pub fn from_candles(series: BTreeMap<String, Vec<Candle>>, config: PlannerConfig) -> Self {
        Self {
            series: RwLock::new(series),
            config,
            advisor: None,
        }
    }

    #[must_use]
    pub fn with_advisor(mut self, advisor: Arc<dyn Advisor>) -> Self {
        self.advisor = Some(advisor);
        self
    }

    pub async fn replace_candles(&self, symbol: &str, candles: Vec<Candle>) {
        self.series.write().await.insert(symbol.to_uppercase(), candles);
    }

    async fn candles(&self, symbol: &str, lookback: usize) -> Vec<Candle> {
        let series = self.series.read().await;
        let Some(candles) = series.get(&symbol.to_uppercase()) else {
            return Vec::new();
        };
        let start = if lookback == 0 { 0 } else { candles.len().saturating_sub(lookback) };
        candles[start..].to_vec()
    }

    fn trend_blocks(&self, closes: &[Decimal], direction: Direction) -> Option<Decimal> {
        let trend = sma(closes, self.config.trend_period)?;
        let last = *closes.last()?;
        let against = match direction {
            Direction::Long => last < trend,
            Direction::Short => last > trend,
        };
        against.then_some(trend)
    }
}

#[async_trait]
impl Planner for MaCrossoverPlanner {
    async fn rank(&self, symbol: &str, granularity: &str, lookback: usize) -> Result<Vec<SignalRow>> {
        let candles = self.candles(symbol, lookback).await;
        if candles.is_empty() {
            tracing::debug!(symbol, granularity, "No candles to rank");
            return Ok(Vec::new());
        }

        let mut rows: Vec<SignalRow> = self
            .config
            .param_sets
            .iter()
            .map(|params| backtest_expectancy(&candles, *params, &self.config.rules))
            .collect();
        rows.sort_by(|a, b| b.expectancy.total_cmp(&a.expectancy));

        tracing::debug!(
            symbol,
            granularity,
            candles = candles.len(),
            best = rows.first().map(|r| r.strategy.as_str()),
            "Ranked strategies"
        );
        Ok(rows)
    }

    async fn propose(&self, request: ProposalRequest<'_>) -> Result<Proposal> {
        let symbol = request.symbol;
        let candles = self.candles(symbol, 0).await;
        if candles.is_empty() {
            return Ok(Proposal::empty(ReasonCode::NoCandles, format!("no candles for {symbol}")));
        }

        let Some((row, params)) = request
            .ranked
            .iter()
            .filter(|row| row.trades > 0 && row.expectancy > 0.0)
            .find_map(|row| MaParams::parse(&row.strategy).map(|params| (row, params)))
        else {
            return Ok(Proposal::empty(
                ReasonCode::StrategyNotFound,
                format!("no strategy with positive expectancy for {symbol}"),
            ));
        };

        let closes: Vec<Decimal> = candles.iter().map(|c| c.close).collect();
        let Some(direction) = crossover_state(&closes, params) else {
            return Ok(Proposal::empty(
                ReasonCode::NoSignal,
                format!("{} has no directional state", params.label()),
            ));
        };

        if let Some(trend) = self.trend_blocks(&closes, direction) {
            return Ok(Proposal::empty(
                ReasonCode::BiasBlocked,
                format!("{direction} against SMA{} trend at {trend}", self.config.trend_period),
            ));
        }

        let last_close = closes.last().copied().unwrap_or_default();
        let tick = self.config.tick_size;
        let entry = round_to_tick(last_close, tick);
        let Some((stop, target)) = self.config.rules.bracket(&candles, direction, entry) else {
            return Ok(Proposal::empty(ReasonCode::NoSignal, "volatility unavailable"));
        };
        let (stop, target) = (round_to_tick(stop, tick), round_to_tick(target, tick));

        let quantity = size_by_risk(request.equity, request.risk_pct, entry, stop, self.config.lot_size);
        if quantity <= Decimal::ZERO {
            return Ok(Proposal::empty(
                ReasonCode::NoSignal,
                format!("risk budget too small to size {symbol}"),
            ));
        }

        let plan = TradePlan {
            account_id: request.account_id.to_string(),
            symbol: symbol.to_uppercase(),
            strategy: params.label(),
            direction,
            entry,
            stop,
            target,
            quantity,
            rationale: format!(
                "{} {direction} expectancy {:.2}R over {} trades",
                params.label(),
                row.expectancy,
                row.trades
            ),
        };

        if let Some(advisor) = &self.advisor {
            if let Some(reason) = advisor.veto(&plan).await? {
                return Ok(Proposal::empty(ReasonCode::AdvisoryVeto, reason));
            }
        }

        Ok(Proposal {
            plans: vec![plan],
            reason: ReasonCode::Ok,
            message: format!("{} {direction} {symbol}", params.label()),
        })
    }
}
