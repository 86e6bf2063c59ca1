//! Ordered guardrail chain and order placement for one account batch.

use crate::reconciler::PositionReconciler;
use crate::session::{Services, SessionState};
use crate::watchdog::ProtectiveExitWatchdog;
use autotrader_core::tags::{self, TradeResult};
use autotrader_core::{
    Account, BrokerAdapter, ExecutionOutcome, GuardrailScope, OpenPositionRecord, TradePlan,
    TradeRecord, TradeTags,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Per-batch guardrail parameters, before clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardrailLimits {
    pub max_trades_per_cycle: u32,
    pub cooldown_minutes: i64,
    pub daily_risk_stop_pct: Decimal,
}

impl GuardrailLimits {
    /// Floors: one trade, one minute of cooldown, 0.1% daily risk.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            max_trades_per_cycle: self.max_trades_per_cycle.max(1),
            cooldown_minutes: self.cooldown_minutes.max(1),
            daily_risk_stop_pct: self.daily_risk_stop_pct.max(Decimal::new(1, 1)),
        }
    }

    #[must_use]
    pub fn risk_cap(&self, equity: Decimal) -> Decimal {
        equity * self.daily_risk_stop_pct / Decimal::ONE_HUNDRED
    }
}

pub struct PipelineRequest<'a> {
    pub account: &'a Account,
    pub broker: &'a dyn BrokerAdapter,
    pub plans: Vec<TradePlan>,
    pub equity: Decimal,
    pub limits: GuardrailLimits,
    pub scope: GuardrailScope,
}

#[derive(Clone)]
pub struct ExecutionPipeline {
    services: Services,
    reconciler: PositionReconciler,
    kill_switch: Arc<AtomicBool>,
}

impl ExecutionPipeline {
    #[must_use]
    pub fn new(services: Services, kill_switch: Arc<AtomicBool>) -> Self {
        let reconciler = PositionReconciler::new(services.history.clone());
        Self {
            services,
            reconciler,
            kill_switch,
        }
    }

    /// Runs only the protective-exit watchdog for `account`. The returned
    /// outcome carries the closes and their realized P/L; every plan counter is zero.
    pub async fn sweep(
        &self,
        state: &mut SessionState,
        account: &Account,
        broker: &dyn BrokerAdapter,
    ) -> ExecutionOutcome {
        let report = ProtectiveExitWatchdog::new(&self.services)
            .sweep(state, account, broker)
            .await;
        ExecutionOutcome {
            watchdog_closes: report.closes,
            realized_pnl: report.realized_pnl,
            ..ExecutionOutcome::default()
        }
    }

    /// Runs the watchdog, then evaluates plans in ranked order.
    ///
    /// Plans for other accounts are dropped without being counted. Each remaining
    /// plan lands in exactly one outcome counter.
    pub async fn execute(&self, state: &mut SessionState, request: PipelineRequest<'_>) -> ExecutionOutcome {
        let PipelineRequest {
            account,
            broker,
            plans,
            equity,
            limits,
            scope,
        } = request;
        let limits = limits.clamped();
        let capabilities = broker.capabilities();
        let mut outcome = self.sweep(state, account, broker).await;

        let plans: Vec<TradePlan> = plans
            .into_iter()
            .filter(|plan| plan.account_id == account.id)
            .collect();
        let total = plans.len();
        let risk_cap = limits.risk_cap(equity);

        for (index, plan) in plans.into_iter().enumerate() {
            let killed = self.kill_switch.load(Ordering::SeqCst);
            if killed || outcome.placed >= limits.max_trades_per_cycle {
                let remaining = u32::try_from(total - index).unwrap_or(u32::MAX);
                outcome.skipped_halted += remaining;
                tracing::info!(
                    scope = %scope,
                    killed,
                    remaining,
                    "Batch halted"
                );
                break;
            }

            let now = self.services.clock.now();

            if state
                .ledger
                .is_on_cooldown(&scope, &plan.symbol, limits.cooldown_minutes, now)
            {
                outcome.skipped_cooldown += 1;
                tracing::debug!(scope = %scope, symbol = %plan.symbol, "Skipped: cooldown");
                continue;
            }

            if let Some(cap) = account.max_concurrent_trades {
                let open = self.effective_open_count(state, account).await;
                if open >= cap {
                    outcome.skipped_open_cap += 1;
                    tracing::debug!(scope = %scope, symbol = %plan.symbol, open, cap, "Skipped: open-position cap");
                    continue;
                }
            }

            let risk = plan.risk_amount();
            if state.ledger.would_exceed_risk(&scope, risk, risk_cap, now) {
                outcome.skipped_risk += 1;
                tracing::debug!(
                    scope = %scope,
                    symbol = %plan.symbol,
                    %risk,
                    cap = %risk_cap,
                    "Skipped: daily risk cap"
                );
                continue;
            }

            if let Err(e) = broker.validate(&plan).await {
                outcome.skipped_validation += 1;
                tracing::debug!(scope = %scope, symbol = %plan.symbol, error = %e, "Skipped: validation");
                continue;
            }

            let tags = TradeTags::new()
                .with(tags::SCOPE, scope.as_str())
                .with(tags::ACCOUNT, &account.id)
                .with(tags::MODE, account.mode.as_str())
                .with(tags::STRATEGY, &plan.strategy);

            match broker.place(&plan).await {
                Ok(ack) => {
                    outcome.placed += 1;
                    state.ledger.mark_cooldown(&scope, &plan.symbol, now);
                    state.ledger.add_daily_risk(&scope, risk, now);
                    state.ledger.increment_open(&account.id);
                    if !capabilities.supports_protective_exits || account.is_paper() {
                        state.positions.push(OpenPositionRecord::from_fill(
                            &plan,
                            ack.fill_price,
                            scope.clone(),
                            now,
                        ));
                    }
                    tracing::info!(
                        scope = %scope,
                        account_id = %account.id,
                        symbol = %plan.symbol,
                        direction = %plan.direction,
                        quantity = %plan.quantity,
                        order_id = %ack.order_id,
                        "Order placed"
                    );
                    let tags = tags.with(tags::RESULT, TradeResult::Placed.as_str());
                    self.record(account, broker, &plan, now, true, ack.fill_price, tags).await;
                }
                Err(e) => {
                    outcome.failed += 1;
                    tracing::warn!(
                        scope = %scope,
                        account_id = %account.id,
                        symbol = %plan.symbol,
                        error = %e,
                        "Order placement failed"
                    );
                    let tags = tags
                        .with(tags::RESULT, TradeResult::Failed.as_str())
                        .with(tags::REASON, e.to_string());
                    self.record(account, broker, &plan, now, false, None, tags).await;
                }
            }
        }

        outcome
    }

    /// `max(session, reconciled)`. Falls back to the session counter when the
    /// trade log is unreadable.
    async fn effective_open_count(&self, state: &SessionState, account: &Account) -> u32 {
        let session = state.ledger.session_open(&account.id);
        match self.reconciler.reconciled_open_count(account).await {
            Ok(reconciled) => session.max(reconciled),
            Err(e) => {
                tracing::warn!(account_id = %account.id, error = %e, "Reconciliation failed; using session count");
                session
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn record(
        &self,
        account: &Account,
        broker: &dyn BrokerAdapter,
        plan: &TradePlan,
        at: DateTime<Utc>,
        executed: bool,
        fill_price: Option<Decimal>,
        tags: TradeTags,
    ) {
        self.services
            .log_trade(&TradeRecord {
                account_id: account.id.clone(),
                broker: broker.name().to_string(),
                symbol: plan.symbol.clone(),
                timestamp: at,
                side: plan.direction,
                quantity: plan.quantity,
                price: plan.entry,
                executed,
                fill_price,
                realized_pnl: None,
                notes: tags.to_string(),
            })
            .await;
    }
}
