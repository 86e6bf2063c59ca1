use anyhow::{Context, Result};
use autotrader_core::{tags::TradeResult, Account, HistoryStore, TradeRecord};
use std::collections::HashMap;
use std::sync::Arc;

/// Derives an account's open-position count from the persisted trade log.
#[derive(Clone)]
pub struct PositionReconciler {
    history: Arc<dyn HistoryStore>,
}

impl PositionReconciler {
    #[must_use]
    pub fn new(history: Arc<dyn HistoryStore>) -> Self {
        Self { history }
    }

    /// # Errors
    /// Returns an error if the trade log cannot be read.
    pub async fn reconciled_open_count(&self, account: &Account) -> Result<u32> {
        let records = self
            .history
            .load_trades()
            .await
            .with_context(|| format!("Failed to load trade log for account {}", account.id))?;
        Ok(open_count(&records, &account.id, &account.broker))
    }
}

/// Executed entries minus `closed=<symbol>` markers, per symbol, floored at zero.
///
/// Only rows for `account_id` routed through `broker` are considered.
#[must_use]
pub fn open_count(records: &[TradeRecord], account_id: &str, broker: &str) -> u32 {
    let mut per_symbol: HashMap<String, i64> = HashMap::new();

    for record in records
        .iter()
        .filter(|r| r.account_id == account_id && r.broker == broker)
    {
        let tags = record.tags();
        if let Some(symbol) = tags.closed_symbol() {
            *per_symbol.entry(symbol.to_string()).or_default() -= 1;
            continue;
        }
        let is_entry = match tags.result() {
            Some(result) => result == TradeResult::Placed,
            // untagged rows predate tagging; trust the executed flag
            None => true,
        };
        if record.executed && is_entry {
            *per_symbol.entry(record.symbol.clone()).or_default() += 1;
        }
    }

    let open: i64 = per_symbol.values().map(|n| (*n).max(0)).sum();
    u32::try_from(open).unwrap_or(u32::MAX)
}
