//! Per-profile processing: due check, symbol resolution, planning, capability
//! gates and delegation to the pipeline.

use crate::pipeline::{ExecutionPipeline, GuardrailLimits, PipelineRequest};
use crate::session::SessionState;
use crate::telemetry::{ProfileStatus, ProfileTelemetry};
use anyhow::Result;
use autotrader_core::{
    normalize_symbols, Account, BrokerAdapter, Clock, ExecutionOutcome, Planner, Profile,
    ProfileStore, ProposalRequest, ReasonCode, SupervisorConfig, SupervisorError, SymbolScope,
    SymbolUniverse, TradePlan, TradingMode,
};
use futures::FutureExt;
use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Runtime-adjustable scheduler knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerSettings {
    pub max_all_symbols: usize,
    pub scan_delay: Duration,
    pub local_watchdog: bool,
    pub live_trading_armed: bool,
    pub granularity: String,
    pub lookback: usize,
}

impl From<&SupervisorConfig> for SchedulerSettings {
    fn from(config: &SupervisorConfig) -> Self {
        Self {
            max_all_symbols: config.max_all_symbols,
            scan_delay: Duration::from_millis(config.scan_delay_ms),
            local_watchdog: config.local_watchdog,
            live_trading_armed: config.live_trading_armed,
            granularity: config.granularity.clone(),
            lookback: config.lookback,
        }
    }
}

/// Enabled profiles split by whether their interval has elapsed.
#[derive(Debug, Default)]
pub struct DueProfiles {
    /// Sorted by profile id
    pub due: Vec<Profile>,
    pub not_due: usize,
}

struct Planned {
    plans: Vec<TradePlan>,
    reason: ReasonCode,
    message: String,
}

pub struct ProfileScheduler {
    profiles: Arc<dyn ProfileStore>,
    planner: Arc<dyn Planner>,
    universe: Arc<dyn SymbolUniverse>,
    accounts: HashMap<String, Account>,
    brokers: HashMap<String, Arc<dyn BrokerAdapter>>,
    pipeline: ExecutionPipeline,
    clock: Arc<dyn Clock>,
    settings: RwLock<SchedulerSettings>,
    kill_switch: Arc<AtomicBool>,
}

impl ProfileScheduler {
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        planner: Arc<dyn Planner>,
        universe: Arc<dyn SymbolUniverse>,
        accounts: Vec<Account>,
        brokers: Vec<Arc<dyn BrokerAdapter>>,
        pipeline: ExecutionPipeline,
        clock: Arc<dyn Clock>,
        settings: SchedulerSettings,
        kill_switch: Arc<AtomicBool>,
    ) -> Self {
        Self {
            profiles,
            planner,
            universe,
            accounts: accounts.into_iter().map(|a| (a.id.clone(), a)).collect(),
            brokers: brokers
                .into_iter()
                .map(|b| (b.name().to_string(), b))
                .collect(),
            pipeline,
            clock,
            settings: RwLock::new(settings),
            kill_switch,
        }
    }

    pub fn update_settings(&self, settings: SchedulerSettings) {
        *self.settings.write() = settings;
    }

    #[must_use]
    pub fn settings(&self) -> SchedulerSettings {
        self.settings.read().clone()
    }

    pub(crate) fn account(&self, account_id: &str) -> Result<&Account, SupervisorError> {
        self.accounts
            .get(account_id)
            .ok_or_else(|| SupervisorError::MissingAccount {
                account_id: account_id.to_string(),
            })
    }

    pub(crate) fn broker(&self, account: &Account) -> Result<Arc<dyn BrokerAdapter>, SupervisorError> {
        self.brokers
            .get(&account.broker)
            .cloned()
            .ok_or_else(|| SupervisorError::UnsupportedBroker {
                broker: account.broker.clone(),
            })
    }

    pub(crate) const fn pipeline(&self) -> &ExecutionPipeline {
        &self.pipeline
    }

    /// # Errors
    /// Returns `SupervisorError::Storage` if the profile store cannot be read.
    pub async fn due_profiles(
        &self,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<DueProfiles, SupervisorError> {
        let mut enabled: Vec<Profile> = self
            .profiles
            .get_all()
            .await
            .map_err(|e| SupervisorError::Storage(format!("load profiles: {e:#}")))?
            .into_iter()
            .filter(|p| p.enabled)
            .collect();
        enabled.sort_by(|a, b| a.id.cmp(&b.id));

        let (due, not_due): (Vec<Profile>, Vec<Profile>) =
            enabled.into_iter().partition(|p| p.is_due(now));
        Ok(DueProfiles {
            due,
            not_due: not_due.len(),
        })
    }

    /// Processes one due profile to a terminal status. Never fails; errors and
    /// collaborator panics are folded into the returned telemetry and the
    /// last-run time always advances.
    pub async fn run_profile(&self, state: &mut SessionState, profile: &Profile) -> ProfileTelemetry {
        let started = self.clock.now();
        let mut telemetry = ProfileTelemetry::begin(profile, started);

        tracing::info!(profile_id = %profile.id, scope = %telemetry.scope, "Processing profile");

        let processed = AssertUnwindSafe(self.process(state, profile, &mut telemetry))
            .catch_unwind()
            .await;
        match processed {
            Ok(Ok((status, reason))) => {
                telemetry.status = status;
                telemetry.reason = reason;
            }
            Ok(Err(e)) if e.is_configuration() => {
                tracing::warn!(profile_id = %profile.id, error = %e, "Profile blocked");
                telemetry.status = ProfileStatus::Blocked;
                telemetry.reason = e.to_string();
            }
            Ok(Err(e)) => {
                tracing::error!(profile_id = %profile.id, error = %e, "Profile failed");
                telemetry.status = ProfileStatus::Error;
                telemetry.reason = e.to_string();
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(profile_id = %profile.id, panic = %message, "Profile panicked");
                telemetry.status = ProfileStatus::Error;
                telemetry.reason = format!("panicked: {message}");
            }
        }

        let finished = self.clock.now();
        if let Err(e) = self.profiles.mark_last_run(&profile.id, finished).await {
            tracing::error!(profile_id = %profile.id, error = %e, "Failed to record last run");
        }
        telemetry.finished_at = finished;

        tracing::info!(
            profile_id = %profile.id,
            status = %telemetry.status,
            reason = %telemetry.reason,
            placed = telemetry.outcome.placed,
            "Profile finished"
        );
        telemetry
    }

    async fn process(
        &self,
        state: &mut SessionState,
        profile: &Profile,
        telemetry: &mut ProfileTelemetry,
    ) -> Result<(ProfileStatus, String), SupervisorError> {
        let settings = self.settings();

        let symbols = self.resolve_symbols(profile, &settings).await?;
        telemetry.observed_symbols = symbols.len();
        if symbols.is_empty() {
            return Ok((ProfileStatus::Skipped, "no symbols".to_string()));
        }

        let account = self.account(&profile.account_id)?;
        let planned = self.plan(profile, account, &symbols, &settings).await?;
        telemetry.plans_proposed = planned.plans.len();
        telemetry.planner_reason = Some(planned.reason);
        telemetry.planner_message = planned.message;

        if planned.plans.is_empty() {
            // Positions opened by earlier cycles still need their brackets enforced
            if state.open_positions(&account.id).next().is_some() {
                let broker = self.broker(account)?;
                telemetry.outcome = self.pipeline.sweep(state, account, broker.as_ref()).await;
            }
            return Ok((ProfileStatus::NoPlans, planned.reason.to_string()));
        }

        let broker = self.broker(account)?;
        self.check_gates(account, broker.as_ref(), &settings)?;

        let outcome = self
            .pipeline
            .execute(
                state,
                PipelineRequest {
                    account,
                    broker: broker.as_ref(),
                    plans: planned.plans,
                    equity: account.equity,
                    limits: GuardrailLimits {
                        max_trades_per_cycle: profile.max_trades_per_cycle,
                        cooldown_minutes: profile.cooldown_minutes,
                        daily_risk_stop_pct: profile.daily_risk_stop_pct,
                    },
                    scope: profile.scope(),
                },
            )
            .await;
        telemetry.outcome = outcome;

        Ok(self.summarize(&outcome))
    }

    fn summarize(&self, outcome: &ExecutionOutcome) -> (ProfileStatus, String) {
        let reason = format!(
            "placed {} of {} (failed {}, guardrail skips {}, halted {})",
            outcome.placed,
            outcome.plans_accounted(),
            outcome.failed,
            outcome.guardrail_rejections(),
            outcome.skipped_halted
        );
        if outcome.skipped_halted > 0 && self.kill_switch.load(Ordering::SeqCst) {
            (ProfileStatus::Killed, reason)
        } else {
            (ProfileStatus::Executed, reason)
        }
    }

    async fn resolve_symbols(
        &self,
        profile: &Profile,
        settings: &SchedulerSettings,
    ) -> Result<Vec<String>, SupervisorError> {
        match &profile.symbol_scope {
            SymbolScope::Explicit(symbols) => Ok(normalize_symbols(symbols)),
            SymbolScope::All => {
                let universe = self
                    .universe
                    .tradable_symbols()
                    .await
                    .map_err(|e| SupervisorError::Planner(format!("symbol universe: {e:#}")))?;
                let mut symbols = normalize_symbols(&universe);
                symbols.truncate(settings.max_all_symbols);
                Ok(symbols)
            }
        }
    }

    /// Ranks and proposes per symbol. Plans keep symbol order; the reported
    /// reason is `ok` when any plan exists, otherwise the most informative one.
    async fn plan(
        &self,
        profile: &Profile,
        account: &Account,
        symbols: &[String],
        settings: &SchedulerSettings,
    ) -> Result<Planned, SupervisorError> {
        let granularity = profile.granularity.as_deref().unwrap_or(&settings.granularity);
        let lookback = profile.lookback.unwrap_or(settings.lookback);
        let mut plans = Vec::new();
        let mut best: Option<(ReasonCode, String)> = None;

        for (i, symbol) in symbols.iter().enumerate() {
            if self.kill_switch.load(Ordering::SeqCst) {
                break;
            }
            if i > 0 && !settings.scan_delay.is_zero() {
                tokio::time::sleep(settings.scan_delay).await;
            }

            let ranked = self
                .planner
                .rank(symbol, granularity, lookback)
                .await
                .map_err(|e| SupervisorError::Planner(format!("rank {symbol}: {e:#}")))?;
            let proposal = self
                .planner
                .propose(ProposalRequest {
                    account_id: &account.id,
                    symbol,
                    granularity,
                    equity: account.equity,
                    risk_pct: account.risk_per_trade_pct,
                    ranked: &ranked,
                })
                .await
                .map_err(|e| SupervisorError::Planner(format!("propose {symbol}: {e:#}")))?;

            tracing::debug!(
                profile_id = %profile.id,
                symbol = %symbol,
                reason = %proposal.reason,
                plans = proposal.plans.len(),
                "Planner responded"
            );

            let reason = if proposal.plans.is_empty() {
                proposal.reason
            } else {
                ReasonCode::Ok
            };
            if best.as_ref().map_or(true, |(r, _)| reason.priority() > r.priority()) {
                best = Some((reason, format!("{symbol}: {}", proposal.message)));
            }
            plans.extend(proposal.plans);
        }

        let (reason, message) =
            best.unwrap_or((ReasonCode::NoSignal, "scan interrupted".to_string()));
        Ok(Planned {
            plans,
            reason,
            message,
        })
    }

    /// Key, capability and arming checks that must pass before any order.
    pub(crate) fn check_gates(
        &self,
        account: &Account,
        broker: &dyn BrokerAdapter,
        settings: &SchedulerSettings,
    ) -> Result<(), SupervisorError> {
        if account.mode == TradingMode::Live
            && account.key_ref.as_deref().map_or(true, |k| k.trim().is_empty())
        {
            return Err(SupervisorError::MissingKey {
                account_id: account.id.clone(),
            });
        }

        let capabilities = broker.capabilities();
        if !capabilities.supports_market_entry {
            return Err(SupervisorError::MarketEntryUnsupported {
                broker: broker.name().to_string(),
            });
        }

        let needs_exits = account.mode == TradingMode::Live || account.max_concurrent_trades.is_none();
        if needs_exits && !capabilities.supports_protective_exits && !settings.local_watchdog {
            return Err(SupervisorError::ProtectiveExitsUnavailable {
                broker: broker.name().to_string(),
            });
        }

        if !account.is_paper() && !settings.live_trading_armed {
            return Err(SupervisorError::LiveTradingDisarmed {
                account_id: account.id.clone(),
            });
        }
        Ok(())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{account, plan, services, t0, ScriptedBroker, ScriptedPlanner};
    use autotrader_core::{BrokerCapabilities, Proposal};
    use autotrader_data::MemoryProfileStore;
    use autotrader_paper::price_book::PriceBook;
    use rust_decimal_macros::dec;

    fn profile(id: &str, account_id: &str, scope: SymbolScope) -> Profile {
        Profile {
            id: id.to_string(),
            name: id.to_string(),
            account_id: account_id.to_string(),
            enabled: true,
            symbol_scope: scope,
            interval_minutes: 15,
            max_trades_per_cycle: 3,
            cooldown_minutes: 30,
            daily_risk_stop_pct: dec!(5),
            granularity: None,
            lookback: None,
            last_run_at: None,
        }
    }

    fn explicit(symbols: &[&str]) -> SymbolScope {
        SymbolScope::Explicit(symbols.iter().map(ToString::to_string).collect())
    }

    fn settings() -> SchedulerSettings {
        SchedulerSettings {
            max_all_symbols: 2,
            scan_delay: Duration::ZERO,
            local_watchdog: true,
            live_trading_armed: false,
            granularity: "1h".to_string(),
            lookback: 200,
        }
    }

    struct Harness {
        scheduler: ProfileScheduler,
        store: Arc<MemoryProfileStore>,
        planner: Arc<ScriptedPlanner>,
        broker: Arc<ScriptedBroker>,
        prices: Arc<PriceBook>,
    }

    fn harness(profiles: Vec<Profile>, accounts: Vec<Account>, broker: ScriptedBroker, universe: Arc<PriceBook>) -> Harness {
        let fx = services();
        let store = Arc::new(MemoryProfileStore::new(profiles));
        let planner = Arc::new(ScriptedPlanner::new());
        let broker = Arc::new(broker);
        let kill = Arc::new(AtomicBool::new(false));
        let scheduler = ProfileScheduler::new(
            store.clone(),
            planner.clone(),
            universe,
            accounts,
            vec![broker.clone() as Arc<dyn BrokerAdapter>],
            ExecutionPipeline::new(fx.services.clone(), kill.clone()),
            fx.services.clock.clone(),
            settings(),
            kill,
        );
        Harness {
            scheduler,
            store,
            planner,
            broker,
            prices: fx.prices,
        }
    }

    fn ok(plans: Vec<TradePlan>) -> Proposal {
        Proposal {
            plans,
            reason: ReasonCode::Ok,
            message: "crossover".to_string(),
        }
    }

    #[tokio::test]
    async fn due_profiles_are_sorted_and_respect_interval() {
        let mut recent = profile("b", "a1", explicit(&["BTC-USD"]));
        recent.last_run_at = Some(t0() - chrono::Duration::minutes(5));
        let mut disabled = profile("c", "a1", explicit(&["BTC-USD"]));
        disabled.enabled = false;
        let h = harness(
            vec![profile("z", "a1", explicit(&["BTC-USD"])), recent, disabled, profile("a", "a1", explicit(&["BTC-USD"]))],
            vec![account("a1", None)],
            ScriptedBroker::local("paper"),
            Arc::new(PriceBook::new()),
        );

        let due = h.scheduler.due_profiles(t0()).await.unwrap();
        let ids: Vec<_> = due.due.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "z"]);
        assert_eq!(due.not_due, 1);
    }

    #[tokio::test]
    async fn executes_plans_and_marks_last_run() {
        let p = profile("p1", "a1", explicit(&["btc-usd", "ETH-USD"]));
        let h = harness(vec![p.clone()], vec![account("a1", None)], ScriptedBroker::local("paper"), Arc::new(PriceBook::new()));
        h.planner.script("BTC-USD", ok(vec![plan("a1", "BTC-USD", dec!(100), dec!(99), dec!(1))]));
        h.planner.script(
            "ETH-USD",
            Proposal::empty(ReasonCode::BiasBlocked, "against trend"),
        );

        let mut state = SessionState::new();
        let t = h.scheduler.run_profile(&mut state, &p).await;

        assert_eq!(t.status, ProfileStatus::Executed);
        assert_eq!(t.observed_symbols, 2);
        assert_eq!(t.plans_proposed, 1);
        assert_eq!(t.planner_reason, Some(ReasonCode::Ok));
        assert_eq!(t.outcome.placed, 1);
        assert_eq!(h.broker.placed().len(), 1);
        assert_eq!(h.store.get("p1").await.unwrap().last_run_at, Some(t0()));
    }

    #[tokio::test]
    async fn no_plans_keeps_most_informative_reason() {
        let p = profile("p1", "a1", explicit(&["BTC-USD", "ETH-USD"]));
        let h = harness(vec![p.clone()], vec![account("a1", None)], ScriptedBroker::local("paper"), Arc::new(PriceBook::new()));
        h.planner.script("ETH-USD", Proposal::empty(ReasonCode::AdvisoryVeto, "macro event"));

        let t = h.scheduler.run_profile(&mut SessionState::new(), &p).await;
        assert_eq!(t.status, ProfileStatus::NoPlans);
        assert_eq!(t.planner_reason, Some(ReasonCode::AdvisoryVeto));
        assert!(t.saw_guardrail_event());
    }

    #[tokio::test]
    async fn empty_universe_skips_with_no_symbols() {
        let p = profile("p1", "a1", SymbolScope::All);
        let h = harness(vec![p.clone()], vec![account("a1", None)], ScriptedBroker::local("paper"), Arc::new(PriceBook::new()));

        let t = h.scheduler.run_profile(&mut SessionState::new(), &p).await;
        assert_eq!(t.status, ProfileStatus::Skipped);
        assert_eq!(t.reason, "no symbols");
        assert!(h.store.get("p1").await.unwrap().last_run_at.is_some());
    }

    #[tokio::test]
    async fn all_scope_is_capped() {
        let book = Arc::new(PriceBook::new());
        for symbol in ["AAA-USD", "BBB-USD", "CCC-USD"] {
            book.set_price(symbol, dec!(1)).await;
        }
        let p = profile("p1", "a1", SymbolScope::All);
        let h = harness(vec![p.clone()], vec![account("a1", None)], ScriptedBroker::local("paper"), book);

        let t = h.scheduler.run_profile(&mut SessionState::new(), &p).await;
        assert_eq!(t.observed_symbols, 2);
    }

    #[tokio::test]
    async fn missing_account_blocks() {
        let p = profile("p1", "ghost", explicit(&["BTC-USD"]));
        let h = harness(vec![p.clone()], vec![account("a1", None)], ScriptedBroker::local("paper"), Arc::new(PriceBook::new()));

        let t = h.scheduler.run_profile(&mut SessionState::new(), &p).await;
        assert_eq!(t.status, ProfileStatus::Blocked);
        assert!(t.reason.contains("ghost"));
        assert!(h.store.get("p1").await.unwrap().last_run_at.is_some());
    }

    #[tokio::test]
    async fn planner_failure_is_an_error_status() {
        let p = profile("p1", "a1", explicit(&["BTC-USD"]));
        let h = harness(vec![p.clone()], vec![account("a1", None)], ScriptedBroker::local("paper"), Arc::new(PriceBook::new()));
        h.planner.fail_for("BTC-USD");

        let t = h.scheduler.run_profile(&mut SessionState::new(), &p).await;
        assert_eq!(t.status, ProfileStatus::Error);
        assert!(t.reason.contains("candle feed timed out"));
    }

    #[tokio::test]
    async fn planner_panic_is_an_error_status_and_marks_last_run() {
        let p = profile("p1", "a1", explicit(&["BTC-USD"]));
        let h = harness(vec![p.clone()], vec![account("a1", None)], ScriptedBroker::local("paper"), Arc::new(PriceBook::new()));
        h.planner.panic_for("BTC-USD");

        let t = h.scheduler.run_profile(&mut SessionState::new(), &p).await;
        assert_eq!(t.status, ProfileStatus::Error);
        assert!(t.reason.starts_with("panicked:"));
        assert!(t.reason.contains("indicator buffer overflow on BTC-USD"));
        assert_eq!(h.store.get("p1").await.unwrap().last_run_at, Some(t0()));
    }

    #[tokio::test]
    async fn quiet_signal_still_stops_out_earlier_positions() {
        let p = profile("p1", "a1", explicit(&["BTC-USD"]));
        let h = harness(vec![p.clone()], vec![account("a1", None)], ScriptedBroker::local("paper"), Arc::new(PriceBook::new()));
        h.planner.script("BTC-USD", ok(vec![plan("a1", "BTC-USD", dec!(100), dec!(95), dec!(1))]));

        let mut state = SessionState::new();
        let opened = h.scheduler.run_profile(&mut state, &p).await;
        assert_eq!(opened.outcome.placed, 1);
        assert_eq!(state.positions.len(), 1);
        assert_eq!(state.ledger.session_open("a1"), 1);

        h.planner.script("BTC-USD", Proposal::empty(ReasonCode::NoSignal, "flat"));
        h.prices.set_price("BTC-USD", dec!(80)).await;

        let quiet = h.scheduler.run_profile(&mut state, &p).await;
        assert_eq!(quiet.status, ProfileStatus::NoPlans);
        assert_eq!(quiet.outcome.watchdog_closes, 1);
        assert_eq!(quiet.outcome.realized_pnl, dec!(-20));
        assert_eq!(quiet.outcome.plans_accounted(), 0);
        assert!(state.positions.is_empty());
        assert_eq!(state.ledger.session_open("a1"), 0);

        let placed = h.broker.placed();
        assert_eq!(placed.len(), 2);
        assert_eq!(placed[1].direction, autotrader_core::Direction::Short);
    }

    #[tokio::test]
    async fn uncapped_account_without_exits_or_watchdog_is_blocked() {
        let p = profile("p1", "a1", explicit(&["BTC-USD"]));
        let h = harness(vec![p.clone()], vec![account("a1", None)], ScriptedBroker::local("paper"), Arc::new(PriceBook::new()));
        h.planner.script("BTC-USD", ok(vec![plan("a1", "BTC-USD", dec!(100), dec!(99), dec!(1))]));
        let mut s = settings();
        s.local_watchdog = false;
        h.scheduler.update_settings(s);

        let t = h.scheduler.run_profile(&mut SessionState::new(), &p).await;
        assert_eq!(t.status, ProfileStatus::Blocked);
        assert!(h.broker.placed().is_empty());
    }

    #[tokio::test]
    async fn live_account_needs_key_and_arming() {
        let mut live = account("live", Some(2));
        live.mode = TradingMode::Live;
        live.broker = "native".to_string();
        let native = ScriptedBroker::with_capabilities(
            "native",
            BrokerCapabilities {
                supports_market_entry: true,
                supports_protective_exits: true,
                enforces_precision_rules: true,
            },
        );
        let p = profile("p1", "live", explicit(&["BTC-USD"]));
        let h = harness(vec![p.clone()], vec![live.clone()], native, Arc::new(PriceBook::new()));
        h.planner.script("BTC-USD", ok(vec![plan("live", "BTC-USD", dec!(100), dec!(99), dec!(1))]));

        let t = h.scheduler.run_profile(&mut SessionState::new(), &p).await;
        assert_eq!(t.status, ProfileStatus::Blocked);
        assert!(t.reason.contains("key reference"));

        let gate = h.scheduler.check_gates(
            &Account {
                key_ref: Some("vault:live".to_string()),
                ..live
            },
            h.broker.as_ref(),
            &settings(),
        );
        assert!(matches!(gate, Err(SupervisorError::LiveTradingDisarmed { .. })));
    }
}
