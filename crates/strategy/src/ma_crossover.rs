//! Moving-average crossover state and its historical expectancy.

use autotrader_core::{Direction, SignalRow};
use autotrader_data::Candle;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::cmp::Ordering;

const LABEL_PREFIX: &str = "ma_cross_";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaParams {
    pub fast: usize,
    pub slow: usize,
}

impl MaParams {
    #[must_use]
    pub const fn new(fast: usize, slow: usize) -> Self {
        Self { fast, slow }
    }

    /// Strategy label used in signal rows and trade plans, e.g. `ma_cross_10_30`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{LABEL_PREFIX}{}_{}", self.fast, self.slow)
    }

    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        let rest = label.strip_prefix(LABEL_PREFIX)?;
        let (fast, slow) = rest.split_once('_')?;
        let params = Self::new(fast.parse().ok()?, slow.parse().ok()?);
        (params.fast > 0 && params.fast < params.slow).then_some(params)
    }
}

/// Simple moving average of the last `period` values.
#[must_use]
pub fn sma(values: &[Decimal], period: usize) -> Option<Decimal> {
    if period == 0 || values.len() < period {
        return None;
    }
    let sum: Decimal = values[values.len() - period..].iter().sum();
    Some(sum / Decimal::from(period))
}

/// Mean high-low range of the last `period` candles.
#[must_use]
pub fn average_range(candles: &[Candle], period: usize) -> Option<Decimal> {
    if period == 0 || candles.len() < period {
        return None;
    }
    let sum: Decimal = candles[candles.len() - period..]
        .iter()
        .map(|c| c.high - c.low)
        .sum();
    Some(sum / Decimal::from(period))
}

/// Direction implied by fast vs slow average at the last value.
#[must_use]
pub fn crossover_state(closes: &[Decimal], params: MaParams) -> Option<Direction> {
    let fast = sma(closes, params.fast)?;
    let slow = sma(closes, params.slow)?;
    match fast.cmp(&slow) {
        Ordering::Greater => Some(Direction::Long),
        Ordering::Less => Some(Direction::Short),
        Ordering::Equal => None,
    }
}

/// Bracket geometry shared by the backtest and live proposals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BracketRules {
    pub atr_period: usize,
    pub stop_atr_multiple: Decimal,
    pub reward_multiple: Decimal,
}

impl BracketRules {
    /// Stop and target around `entry`, or `None` when volatility is unknown or zero.
    #[must_use]
    pub fn bracket(
        &self,
        candles: &[Candle],
        direction: Direction,
        entry: Decimal,
    ) -> Option<(Decimal, Decimal)> {
        let range = average_range(candles, self.atr_period)?;
        if range <= Decimal::ZERO {
            return None;
        }
        let distance = range * self.stop_atr_multiple;
        let reward = distance * self.reward_multiple;
        Some(match direction {
            Direction::Long => (entry - distance, entry + reward),
            Direction::Short => (entry + distance, entry - reward),
        })
    }
}

/// Replays candles, entering on the crossover state whenever flat and exiting
/// on stop (-1R) or target (+reward R). A bar touching both counts as a stop.
#[must_use]
pub fn backtest_expectancy(candles: &[Candle], params: MaParams, rules: &BracketRules) -> SignalRow {
    let closes: Vec<Decimal> = candles.iter().map(|c| c.close).collect();
    let mut results: Vec<Decimal> = Vec::new();
    let mut open: Option<(Direction, Decimal, Decimal)> = None;

    for (i, candle) in candles.iter().enumerate() {
        if let Some((direction, stop, target)) = open {
            let (hit_stop, hit_target) = match direction {
                Direction::Long => (candle.low <= stop, candle.high >= target),
                Direction::Short => (candle.high >= stop, candle.low <= target),
            };
            if hit_stop {
                results.push(Decimal::NEGATIVE_ONE);
                open = None;
            } else if hit_target {
                results.push(rules.reward_multiple);
                open = None;
            }
            continue;
        }

        if let Some(direction) = crossover_state(&closes[..=i], params) {
            if let Some((stop, target)) = rules.bracket(&candles[..=i], direction, candle.close) {
                open = Some((direction, stop, target));
            }
        }
    }

    let trades = results.len();
    let wins = results.iter().filter(|r| r.is_sign_positive() && !r.is_zero()).count();
    let expectancy = if trades == 0 {
        0.0
    } else {
        (results.iter().sum::<Decimal>() / Decimal::from(trades))
            .to_f64()
            .unwrap_or(0.0)
    };

    #[allow(clippy::cast_precision_loss)]
    let win_rate = if trades == 0 { 0.0 } else { wins as f64 / trades as f64 };

    SignalRow {
        strategy: params.label(),
        expectancy,
        trades: u32::try_from(trades).unwrap_or(u32::MAX),
        win_rate,
    }
}
