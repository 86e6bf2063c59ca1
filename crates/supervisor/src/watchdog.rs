//! Local stop/target enforcement for brokers that cannot rest protective orders.

use crate::events::SupervisorEvent;
use crate::session::{Services, SessionState};
use autotrader_core::tags::{self, TradeResult};
use autotrader_core::{
    Account, BrokerAdapter, ExitTrigger, OpenPositionRecord, TradeRecord, TradeTags,
};
use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchdogReport {
    pub closes: u32,
    pub close_failures: u32,
    pub realized_pnl: Decimal,
}

pub struct ProtectiveExitWatchdog<'a> {
    services: &'a Services,
}

impl<'a> ProtectiveExitWatchdog<'a> {
    #[must_use]
    pub const fn new(services: &'a Services) -> Self {
        Self { services }
    }

    /// Checks every tracked position of `account` against the current price and
    /// flattens breached ones. Failed closes stay tracked for the next sweep.
    ///
    /// Tracked positions are only removed once the sweep completes, so an
    /// interrupted sweep leaves them all in place.
    pub async fn sweep(
        &self,
        state: &mut SessionState,
        account: &Account,
        broker: &dyn BrokerAdapter,
    ) -> WatchdogReport {
        let mut report = WatchdogReport::default();
        let mut closed = Vec::new();

        for (index, position) in state.positions.iter().enumerate() {
            if position.account_id != account.id {
                continue;
            }

            let price = match self.services.prices.current_price(&position.symbol).await {
                Ok(price) => price,
                Err(e) => {
                    tracing::warn!(
                        account_id = %account.id,
                        symbol = %position.symbol,
                        error = %e,
                        "Watchdog has no price; position stays tracked"
                    );
                    continue;
                }
            };

            let Some(trigger) = position.exit_trigger(price) else {
                continue;
            };

            if self.close(account, broker, position, price, trigger).await {
                let pnl = position.realized_pnl(price);
                report.closes += 1;
                report.realized_pnl += pnl;
                closed.push(index);
                self.services.emit(SupervisorEvent::PositionClosed {
                    account_id: account.id.clone(),
                    symbol: position.symbol.clone(),
                    trigger,
                    realized_pnl: pnl,
                });
            } else {
                report.close_failures += 1;
            }
        }

        for _ in &closed {
            state.ledger.decrement_open(&account.id);
        }
        let mut index = 0;
        state.positions.retain(|_| {
            let keep = !closed.contains(&index);
            index += 1;
            keep
        });
        report
    }

    async fn close(
        &self,
        account: &Account,
        broker: &dyn BrokerAdapter,
        position: &OpenPositionRecord,
        price: Decimal,
        trigger: ExitTrigger,
    ) -> bool {
        if let Err(e) = broker.cancel_all(&position.symbol).await {
            tracing::warn!(symbol = %position.symbol, error = %e, "cancel_all failed before protective exit");
        }

        let plan = position.closing_plan(price, trigger);
        let result = broker.place(&plan).await;
        let now = self.services.clock.now();

        let mut tags = TradeTags::new()
            .with(tags::SCOPE, position.scope.as_str())
            .with(tags::ACCOUNT, &account.id)
            .with(tags::MODE, account.mode.as_str())
            .with(tags::STRATEGY, &position.strategy)
            .with(tags::REASON, trigger.to_string());

        let (executed, fill_price, realized_pnl) = match &result {
            Ok(ack) => {
                tags = tags
                    .with(tags::RESULT, TradeResult::Closed.as_str())
                    .with(tags::CLOSED, &position.symbol);
                tracing::info!(
                    account_id = %account.id,
                    symbol = %position.symbol,
                    %trigger,
                    %price,
                    order_id = %ack.order_id,
                    "Protective exit filled"
                );
                (true, ack.fill_price, Some(position.realized_pnl(price)))
            }
            Err(e) => {
                tags = tags.with(tags::RESULT, TradeResult::CloseFailed.as_str());
                tracing::warn!(
                    account_id = %account.id,
                    symbol = %position.symbol,
                    %trigger,
                    error = %e,
                    "Protective exit failed; retrying next cycle"
                );
                (false, None, None)
            }
        };

        self.services
            .log_trade(&TradeRecord {
                account_id: account.id.clone(),
                broker: broker.name().to_string(),
                symbol: position.symbol.clone(),
                timestamp: now,
                side: plan.direction,
                quantity: plan.quantity,
                price,
                executed,
                fill_price,
                realized_pnl,
                notes: tags.to_string(),
            })
            .await;

        result.is_ok()
    }
}
