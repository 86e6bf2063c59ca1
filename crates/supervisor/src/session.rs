use crate::events::SupervisorEvent;
use crate::ledger::GuardrailLedger;
use autotrader_core::{Clock, HistoryStore, OpenPositionRecord, PriceFeed, TradeRecord};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Mutable state shared by every profile and manual run.
///
/// Always reached through the coordinator's mutex; nothing here is touched
/// concurrently.
#[derive(Debug, Default)]
pub struct SessionState {
    pub ledger: GuardrailLedger,
    pub positions: Vec<OpenPositionRecord>,
}

impl SessionState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_positions<'a>(&'a self, account_id: &'a str) -> impl Iterator<Item = &'a OpenPositionRecord> {
        self.positions.iter().filter(move |p| p.account_id == account_id)
    }
}

/// Collaborators every stage needs.
#[derive(Clone)]
pub struct Services {
    pub history: Arc<dyn HistoryStore>,
    pub prices: Arc<dyn PriceFeed>,
    pub clock: Arc<dyn Clock>,
    pub events: broadcast::Sender<SupervisorEvent>,
}

impl Services {
    /// Appends to the trade log. A storage failure is logged, never raised.
    pub(crate) async fn log_trade(&self, record: &TradeRecord) {
        if let Err(e) = self.history.save_trade(record).await {
            tracing::error!(
                account_id = %record.account_id,
                symbol = %record.symbol,
                error = %e,
                "Failed to append trade log"
            );
        }
    }

    pub(crate) fn emit(&self, event: SupervisorEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}
