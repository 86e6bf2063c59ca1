//! Timer-driven, single-flight cycle loop.

use crate::events::{CoordinatorState, SupervisorEvent, SupervisorStatus};
use crate::pipeline::{ExecutionPipeline, GuardrailLimits, PipelineRequest};
use crate::report;
use crate::scheduler::{ProfileScheduler, SchedulerSettings};
use crate::session::{Services, SessionState};
use crate::telemetry::{CycleTelemetry, CycleTrigger};
use crate::verifier::verify;
use autotrader_core::{
    Account, BrokerAdapter, Clock, ExecutionOutcome, HistoryStore, Planner, PriceFeed,
    ProfileStore, SupervisorConfig, SupervisorError, SymbolUniverse, TradePlan,
};
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Everything a coordinator is assembled from.
pub struct SupervisorParts {
    pub config: SupervisorConfig,
    pub accounts: Vec<Account>,
    pub brokers: Vec<Arc<dyn BrokerAdapter>>,
    pub planner: Arc<dyn Planner>,
    pub profiles: Arc<dyn ProfileStore>,
    pub history: Arc<dyn HistoryStore>,
    pub prices: Arc<dyn PriceFeed>,
    pub universe: Arc<dyn SymbolUniverse>,
    pub clock: Arc<dyn Clock>,
}

/// Holds the in-flight flag for the lifetime of one cycle.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct CycleCoordinator {
    scheduler: ProfileScheduler,
    state: Mutex<SessionState>,
    in_flight: AtomicBool,
    kill_switch: Arc<AtomicBool>,
    report_dir: RwLock<PathBuf>,
    clock: Arc<dyn Clock>,
    events: broadcast::Sender<SupervisorEvent>,
    status_tx: watch::Sender<SupervisorStatus>,
}

impl CycleCoordinator {
    #[must_use]
    pub fn new(parts: SupervisorParts) -> Self {
        let kill_switch = Arc::new(AtomicBool::new(false));
        let (events, _) = broadcast::channel(256);
        let (status_tx, _) = watch::channel(SupervisorStatus::idle(parts.clock.now()));

        let services = Services {
            history: parts.history,
            prices: parts.prices,
            clock: parts.clock.clone(),
            events: events.clone(),
        };
        let pipeline = ExecutionPipeline::new(services, kill_switch.clone());
        let scheduler = ProfileScheduler::new(
            parts.profiles,
            parts.planner,
            parts.universe,
            parts.accounts,
            parts.brokers,
            pipeline,
            parts.clock.clone(),
            SchedulerSettings::from(&parts.config),
            kill_switch.clone(),
        );

        Self {
            scheduler,
            state: Mutex::new(SessionState::new()),
            in_flight: AtomicBool::new(false),
            kill_switch,
            report_dir: RwLock::new(PathBuf::from(&parts.config.report_dir)),
            clock: parts.clock,
            events,
            status_tx,
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SupervisorEvent> {
        self.events.subscribe()
    }

    #[must_use]
    pub fn status(&self) -> watch::Receiver<SupervisorStatus> {
        self.status_tx.subscribe()
    }

    #[must_use]
    pub fn is_cycle_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn is_killed(&self) -> bool {
        self.kill_switch.load(Ordering::SeqCst)
    }

    /// Stops further profiles and plans. Orders already placed stay placed.
    pub fn engage_kill_switch(&self) {
        if self.kill_switch.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::warn!("Kill switch engaged");
        let now = self.clock.now();
        let running = self.is_cycle_running();
        self.status_tx.send_modify(|s| {
            s.kill_switch = true;
            if !running {
                s.state = CoordinatorState::Killed;
            }
            s.updated_at = now;
        });
        let _ = self.events.send(SupervisorEvent::KillSwitchEngaged { at: now });
    }

    pub fn release_kill_switch(&self) {
        if !self.kill_switch.swap(false, Ordering::SeqCst) {
            return;
        }
        tracing::info!("Kill switch released");
        let now = self.clock.now();
        let running = self.is_cycle_running();
        self.status_tx.send_modify(|s| {
            s.kill_switch = false;
            if !running {
                s.state = CoordinatorState::Idle;
            }
            s.updated_at = now;
        });
        let _ = self.events.send(SupervisorEvent::KillSwitchReleased { at: now });
    }

    /// Applies reloadable settings. The timer period is fixed at spawn time.
    pub fn apply_config(&self, config: &SupervisorConfig) {
        self.scheduler.update_settings(SchedulerSettings::from(config));
        *self.report_dir.write() = PathBuf::from(&config.report_dir);
        tracing::info!(
            max_all_symbols = config.max_all_symbols,
            live_trading_armed = config.live_trading_armed,
            "Supervisor settings updated"
        );
    }

    /// Waits for an in-flight cycle to finish.
    pub async fn wait_idle(&self) {
        while self.is_cycle_running() {
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
    }

    /// Runs one pass over every due profile. Returns `None` if another cycle
    /// is already in flight. Never fails: errors end up in the report.
    pub async fn run_cycle(&self, trigger: CycleTrigger) -> Option<CycleTelemetry> {
        let Some(_guard) = InFlight::acquire(&self.in_flight) else {
            tracing::debug!(%trigger, "Cycle already in flight; tick dropped");
            return None;
        };

        let mut cycle = CycleTelemetry::start(trigger, self.clock.now());
        let cycle_id = cycle.cycle_id.clone();
        tracing::info!(cycle_id = %cycle_id, %trigger, "Cycle started");
        self.status_tx.send_modify(|s| {
            s.state = CoordinatorState::Running;
            s.updated_at = cycle.started_at;
        });
        let _ = self.events.send(SupervisorEvent::CycleStarted {
            cycle_id: cycle_id.clone(),
            trigger,
            at: cycle.started_at,
        });

        match self.scheduler.due_profiles(cycle.started_at).await {
            Ok(due) => {
                cycle.profiles_due = due.due.len();
                cycle.profiles_not_due = due.not_due;
                for profile in &due.due {
                    if self.is_killed() {
                        break;
                    }
                    let telemetry = {
                        let mut state = self.state.lock().await;
                        self.scheduler.run_profile(&mut state, profile).await
                    };
                    let _ = self.events.send(SupervisorEvent::ProfileFinished {
                        cycle_id: cycle_id.clone(),
                        profile_id: telemetry.profile_id.clone(),
                        status: telemetry.status,
                        reason: telemetry.reason.clone(),
                    });
                    cycle.profiles.push(telemetry);
                }
            }
            Err(e) => {
                tracing::error!(cycle_id = %cycle_id, error = %e, "Cycle failed before processing profiles");
                cycle.error = Some(format!("{e:#}"));
            }
        }

        cycle.killed = self.is_killed();
        cycle.finished_at = Some(self.clock.now());
        let verification = verify(&cycle);
        cycle.verification = Some(verification);

        let dir = self.report_dir.read().clone();
        let report_path = match report::persist(&dir, &cycle).await {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::error!(cycle_id = %cycle_id, error = %e, "Failed to persist cycle report");
                None
            }
        };

        tracing::info!(
            cycle_id = %cycle_id,
            profiles = cycle.profiles.len(),
            placed = cycle.total_placed(),
            verdict = %verification.overall,
            killed = cycle.killed,
            "Cycle finished"
        );

        let killed = cycle.killed;
        let finished_at = cycle.finished_at.unwrap_or(cycle.started_at);
        self.status_tx.send_modify(|s| {
            s.state = if killed {
                CoordinatorState::Killed
            } else {
                CoordinatorState::Idle
            };
            s.cycles_run += 1;
            s.last_cycle_id = Some(cycle_id.clone());
            s.last_verdict = Some(verification.overall);
            s.kill_switch = killed;
            s.updated_at = finished_at;
        });
        let _ = self.events.send(SupervisorEvent::CycleFinished {
            cycle_id,
            verdict: verification.overall,
            profiles: cycle.profiles.len(),
            report: report_path,
            error: cycle.error.clone(),
        });

        Some(cycle)
    }

    /// Executes an ad-hoc batch for one account under its `account:<id>` scope.
    ///
    /// Shares the session state with timer cycles; the two serialize on it.
    ///
    /// # Errors
    /// Returns a configuration error if the account, broker, key or arming
    /// checks fail. Guardrail rejections and broker failures are counters.
    pub async fn run_manual(
        &self,
        account_id: &str,
        plans: Vec<TradePlan>,
        limits: GuardrailLimits,
    ) -> Result<ExecutionOutcome, SupervisorError> {
        let account = self.scheduler.account(account_id)?;
        let broker = self.scheduler.broker(account)?;
        self.scheduler.check_gates(account, broker.as_ref(), &self.scheduler.settings())?;

        let scope = account.manual_scope();
        tracing::info!(account_id, scope = %scope, plans = plans.len(), "Manual run");

        let mut state = self.state.lock().await;
        let outcome = self
            .pipeline()
            .execute(
                &mut state,
                PipelineRequest {
                    account,
                    broker: broker.as_ref(),
                    plans,
                    equity: account.equity,
                    limits,
                    scope,
                },
            )
            .await;
        Ok(outcome)
    }

    fn pipeline(&self) -> &ExecutionPipeline {
        self.scheduler.pipeline()
    }

    /// Session open-position count for an account, for dashboards.
    pub async fn session_open(&self, account_id: &str) -> u32 {
        self.state.lock().await.ledger.session_open(account_id)
    }

    pub async fn tracked_positions(&self) -> usize {
        self.state.lock().await.positions.len()
    }
}

/// Drives `run_cycle` every `period`. Each tick runs on its own task so a tick
/// landing mid-cycle is dropped by the in-flight guard. Stops once the kill
/// switch is engaged.
pub fn spawn_timer(coordinator: Arc<CycleCoordinator>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if coordinator.is_killed() {
                tracing::info!("Kill switch engaged; timer stopped");
                break;
            }
            let coordinator = coordinator.clone();
            tokio::spawn(async move {
                coordinator.run_cycle(CycleTrigger::Timer).await;
            });
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::ProfileStatus;
    use crate::testing::{account, plan, t0, ScriptedBroker, ScriptedPlanner};
    use autotrader_core::{ManualClock, Profile, Proposal, ReasonCode, SymbolScope};
    use autotrader_data::{MemoryHistoryStore, MemoryProfileStore};
    use autotrader_paper::price_book::PriceBook;
    use rust_decimal_macros::dec;

    fn profile(id: &str) -> Profile {
        Profile {
            id: id.to_string(),
            name: id.to_string(),
            account_id: "a1".to_string(),
            enabled: true,
            symbol_scope: SymbolScope::Explicit(vec!["BTC-USD".to_string()]),
            interval_minutes: 60,
            max_trades_per_cycle: 2,
            cooldown_minutes: 30,
            daily_risk_stop_pct: dec!(5),
            granularity: None,
            lookback: None,
            last_run_at: None,
        }
    }

    struct LockedProfileStore;

    #[async_trait::async_trait]
    impl ProfileStore for LockedProfileStore {
        async fn get_all(&self) -> anyhow::Result<Vec<Profile>> {
            anyhow::bail!("database is locked")
        }

        async fn mark_last_run(&self, _profile_id: &str, _at: chrono::DateTime<chrono::Utc>) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn coordinator(
        report_dir: &std::path::Path,
        profiles: Vec<Profile>,
    ) -> (CycleCoordinator, Arc<ScriptedPlanner>, Arc<ScriptedBroker>) {
        coordinator_with(report_dir, Arc::new(MemoryProfileStore::new(profiles)))
    }

    fn coordinator_with(
        report_dir: &std::path::Path,
        profiles: Arc<dyn ProfileStore>,
    ) -> (CycleCoordinator, Arc<ScriptedPlanner>, Arc<ScriptedBroker>) {
        let planner = Arc::new(ScriptedPlanner::new());
        let broker = Arc::new(ScriptedBroker::local("paper"));
        let config = SupervisorConfig {
            scan_delay_ms: 0,
            report_dir: report_dir.display().to_string(),
            ..SupervisorConfig::default()
        };
        let coordinator = CycleCoordinator::new(SupervisorParts {
            config,
            accounts: vec![account("a1", None)],
            brokers: vec![broker.clone() as Arc<dyn BrokerAdapter>],
            planner: planner.clone(),
            profiles,
            history: Arc::new(MemoryHistoryStore::new()),
            prices: Arc::new(PriceBook::new()),
            universe: Arc::new(PriceBook::new()),
            clock: Arc::new(ManualClock::new(t0())),
        });
        (coordinator, planner, broker)
    }

    fn manual_limits() -> GuardrailLimits {
        GuardrailLimits {
            max_trades_per_cycle: 5,
            cooldown_minutes: 30,
            daily_risk_stop_pct: dec!(5),
        }
    }

    #[tokio::test]
    async fn cycle_runs_profiles_and_persists_report() {
        let dir = tempfile::tempdir().unwrap();
        let (coordinator, planner, broker) = coordinator(dir.path(), vec![profile("p2"), profile("p1")]);
        planner.script(
            "BTC-USD",
            Proposal {
                plans: vec![plan("a1", "BTC-USD", dec!(100), dec!(99), dec!(1))],
                reason: ReasonCode::Ok,
                message: "crossover".to_string(),
            },
        );
        let mut events = coordinator.subscribe();

        let cycle = coordinator.run_cycle(CycleTrigger::Manual).await.unwrap();
        let ids: Vec<_> = cycle.profiles.iter().map(|p| p.profile_id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2"]);
        // separate scopes: both profiles may trade the same symbol
        assert_eq!(broker.placed().len(), 2);
        assert_eq!(coordinator.session_open("a1").await, 2);

        let (_, root) = report::latest_report(dir.path()).await.unwrap().unwrap();
        assert_eq!(root.field("id"), Some(cycle.cycle_id.as_str()));
        assert_eq!(root.children_named("profile").count(), 2);

        assert!(matches!(events.recv().await.unwrap(), SupervisorEvent::CycleStarted { .. }));

        let status = coordinator.status().borrow().clone();
        assert_eq!(status.cycles_run, 1);
        assert_eq!(status.state, CoordinatorState::Idle);
    }

    #[tokio::test]
    async fn panicking_profile_does_not_stop_later_profiles_or_the_report() {
        let dir = tempfile::tempdir().unwrap();
        let mut first = profile("p1");
        first.symbol_scope = SymbolScope::Explicit(vec!["ETH-USD".to_string()]);
        let (coordinator, planner, broker) = coordinator(dir.path(), vec![first, profile("p2")]);
        planner.panic_for("ETH-USD");
        planner.script(
            "BTC-USD",
            Proposal {
                plans: vec![plan("a1", "BTC-USD", dec!(100), dec!(99), dec!(1))],
                reason: ReasonCode::Ok,
                message: "crossover".to_string(),
            },
        );

        let cycle = coordinator.run_cycle(CycleTrigger::Timer).await.unwrap();
        let statuses: Vec<_> = cycle.profiles.iter().map(|p| p.status).collect();
        assert_eq!(statuses, vec![ProfileStatus::Error, ProfileStatus::Executed]);
        assert!(cycle.profiles[0].reason.contains("ETH-USD"));
        assert_eq!(broker.placed().len(), 1);
        assert!(!coordinator.is_cycle_running());

        let (_, root) = report::latest_report(dir.path()).await.unwrap().unwrap();
        assert_eq!(root.field("id"), Some(cycle.cycle_id.as_str()));
        assert_eq!(root.children_named("profile").count(), 2);
    }

    #[tokio::test]
    async fn unreadable_profile_store_is_reported_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        let (coordinator, _, broker) = coordinator_with(dir.path(), Arc::new(LockedProfileStore));

        let cycle = coordinator.run_cycle(CycleTrigger::Timer).await.unwrap();
        let error = cycle.error.clone().unwrap();
        assert!(error.contains("storage error"));
        assert!(error.contains("database is locked"));
        assert!(cycle.profiles.is_empty());
        assert!(broker.placed().is_empty());

        let (_, root) = report::latest_report(dir.path()).await.unwrap().unwrap();
        assert_eq!(root.field("id"), Some(cycle.cycle_id.as_str()));
        let recorded = root.field("error").unwrap();
        assert_ne!(recorded, "-");
        assert!(recorded.contains("database is locked"));
        assert_eq!(coordinator.status().borrow().cycles_run, 1);
    }

    #[tokio::test]
    async fn profiles_not_due_are_counted_not_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut recent = profile("p1");
        recent.last_run_at = Some(t0());
        let (coordinator, _, _) = coordinator(dir.path(), vec![recent]);

        let cycle = coordinator.run_cycle(CycleTrigger::Timer).await.unwrap();
        assert!(cycle.profiles.is_empty());
        assert_eq!(cycle.profiles_not_due, 1);
    }

    #[tokio::test]
    async fn second_cycle_is_dropped_while_one_is_in_flight() {
        let dir = tempfile::tempdir().unwrap();
        let (coordinator, _, _) = coordinator(dir.path(), vec![]);

        let guard = InFlight::acquire(&coordinator.in_flight).unwrap();
        assert!(coordinator.run_cycle(CycleTrigger::Timer).await.is_none());
        drop(guard);
        assert!(coordinator.run_cycle(CycleTrigger::Timer).await.is_some());
    }

    #[tokio::test]
    async fn kill_switch_stops_profiles_and_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let (coordinator, _, broker) = coordinator(dir.path(), vec![profile("p1")]);
        coordinator.engage_kill_switch();
        assert_eq!(coordinator.status().borrow().state, CoordinatorState::Killed);

        let cycle = coordinator.run_cycle(CycleTrigger::Timer).await.unwrap();
        assert!(cycle.killed);
        assert!(cycle.profiles.is_empty());
        assert!(broker.placed().is_empty());

        coordinator.release_kill_switch();
        assert!(!coordinator.is_killed());
        assert_eq!(coordinator.status().borrow().state, CoordinatorState::Idle);
    }

    #[tokio::test]
    async fn manual_run_uses_account_scope() {
        let dir = tempfile::tempdir().unwrap();
        let (coordinator, _, broker) = coordinator(dir.path(), vec![]);

        let plans = vec![
            plan("a1", "BTC-USD", dec!(100), dec!(99), dec!(1)),
            plan("a1", "BTC-USD", dec!(100), dec!(99), dec!(1)),
        ];
        let outcome = coordinator.run_manual("a1", plans, manual_limits()).await.unwrap();
        assert_eq!(outcome.placed, 1);
        assert_eq!(outcome.skipped_cooldown, 1);
        assert_eq!(broker.placed().len(), 1);

        assert!(matches!(
            coordinator.run_manual("nope", vec![], manual_limits()).await,
            Err(SupervisorError::MissingAccount { .. })
        ));
    }
}
