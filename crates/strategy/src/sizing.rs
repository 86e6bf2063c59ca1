use rust_decimal::{Decimal, RoundingStrategy};

/// Quantity that loses `risk_pct` percent of `equity` if the stop is hit,
/// rounded down to `lot_size`.
///
/// Returns zero when the stop distance is zero or inputs are non-positive.
#[must_use]
pub fn size_by_risk(
    equity: Decimal,
    risk_pct: Decimal,
    entry: Decimal,
    stop: Decimal,
    lot_size: Decimal,
) -> Decimal {
    let distance = (entry - stop).abs();
    if distance.is_zero() || equity <= Decimal::ZERO || risk_pct <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let raw = equity * risk_pct / Decimal::ONE_HUNDRED / distance;
    floor_to_step(raw, lot_size)
}

#[must_use]
pub fn floor_to_step(value: Decimal, step: Decimal) -> Decimal {
    if step <= Decimal::ZERO {
        return value;
    }
    ((value / step).floor() * step).normalize()
}

/// Nearest multiple of `tick`, half away from zero.
#[must_use]
pub fn round_to_tick(price: Decimal, tick: Decimal) -> Decimal {
    if tick <= Decimal::ZERO {
        return price;
    }
    ((price / tick).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero) * tick)
        .normalize()
}
