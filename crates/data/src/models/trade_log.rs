use anyhow::{Context, Result};
use autotrader_core::TradeRecord;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Raw `trade_log` row. Decimals are stored as text to keep full precision.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TradeLogRow {
    pub id: i64,
    pub account_id: String,
    pub broker: String,
    pub symbol: String,
    pub timestamp_ms: i64,
    pub side: String,
    pub quantity: String,
    pub price: String,
    pub executed: bool,
    pub fill_price: Option<String>,
    pub realized_pnl: Option<String>,
    pub notes: String,
}

fn parse_decimal(field: &str, raw: &str) -> Result<Decimal> {
    Decimal::from_str(raw).with_context(|| format!("Invalid decimal in {field}: {raw}"))
}

impl TryFrom<TradeLogRow> for TradeRecord {
    type Error = anyhow::Error;

    fn try_from(row: TradeLogRow) -> Result<Self> {
        let timestamp = DateTime::<Utc>::from_timestamp_millis(row.timestamp_ms)
            .with_context(|| format!("Invalid timestamp in trade_log row {}", row.id))?;

        Ok(Self {
            account_id: row.account_id,
            broker: row.broker,
            symbol: row.symbol,
            timestamp,
            side: row.side.parse().map_err(anyhow::Error::msg)?,
            quantity: parse_decimal("quantity", &row.quantity)?,
            price: parse_decimal("price", &row.price)?,
            executed: row.executed,
            fill_price: row
                .fill_price
                .as_deref()
                .map(|raw| parse_decimal("fill_price", raw))
                .transpose()?,
            realized_pnl: row
                .realized_pnl
                .as_deref()
                .map(|raw| parse_decimal("realized_pnl", raw))
                .transpose()?,
            notes: row.notes,
        })
    }
}
