//! End-to-end cycles against the paper broker and in-memory stores.

use anyhow::{bail, Result};
use async_trait::async_trait;
use autotrader_core::{
    Account, BrokerAdapter, Direction, HistoryStore, ManualClock, Planner, Profile, Proposal,
    ProposalRequest, ReasonCode, SignalRow, SupervisorConfig, SymbolScope, TradePlan, TradingMode,
};
use autotrader_data::{MemoryHistoryStore, MemoryProfileStore};
use autotrader_paper::{PaperBroker, PriceBook};
use autotrader_supervisor::{
    latest_report, CycleCoordinator, CycleTrigger, GuardrailLimits, ProfileStatus, SupervisorParts,
};
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Proposes two identical longs per symbol. `FAIL-USD` errors in `rank`;
/// `SLOW-USD` parks in `propose` until released.
struct StubPlanner {
    entered: Notify,
    release: Notify,
}

impl StubPlanner {
    fn new() -> Self {
        Self {
            entered: Notify::new(),
            release: Notify::new(),
        }
    }
}

fn long(account_id: &str, symbol: &str) -> TradePlan {
    TradePlan {
        account_id: account_id.to_string(),
        symbol: symbol.to_string(),
        strategy: "stub".to_string(),
        direction: Direction::Long,
        entry: dec!(100),
        stop: dec!(99),
        target: dec!(102),
        quantity: dec!(1),
        rationale: String::new(),
    }
}

#[async_trait]
impl Planner for StubPlanner {
    async fn rank(&self, symbol: &str, _granularity: &str, _lookback: usize) -> Result<Vec<SignalRow>> {
        if symbol == "FAIL-USD" {
            bail!("candle feed unavailable for {symbol}");
        }
        Ok(vec![SignalRow {
            strategy: "stub".to_string(),
            expectancy: 0.5,
            trades: 10,
            win_rate: 0.5,
        }])
    }

    async fn propose(&self, request: ProposalRequest<'_>) -> Result<Proposal> {
        if request.symbol == "SLOW-USD" {
            self.entered.notify_one();
            self.release.notified().await;
        }
        Ok(Proposal {
            plans: vec![
                long(request.account_id, request.symbol),
                long(request.account_id, request.symbol),
            ],
            reason: ReasonCode::Ok,
            message: "stub".to_string(),
        })
    }
}

fn profile(id: &str, symbol: &str) -> Profile {
    Profile {
        id: id.to_string(),
        name: id.to_string(),
        account_id: "paper-1".to_string(),
        enabled: true,
        symbol_scope: SymbolScope::Explicit(vec![symbol.to_string()]),
        interval_minutes: 15,
        max_trades_per_cycle: 3,
        cooldown_minutes: 30,
        daily_risk_stop_pct: dec!(5),
        granularity: None,
        lookback: None,
        last_run_at: None,
    }
}

struct Harness {
    coordinator: Arc<CycleCoordinator>,
    planner: Arc<StubPlanner>,
    broker: Arc<PaperBroker>,
    history: Arc<MemoryHistoryStore>,
}

async fn harness(report_dir: &Path, profiles: Vec<Profile>) -> Harness {
    let book = Arc::new(PriceBook::new());
    for symbol in ["BTC-USD", "ETH-USD", "SLOW-USD"] {
        book.set_price(symbol, dec!(100)).await;
    }
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()));
    let broker = Arc::new(
        PaperBroker::new("paper", book.clone(), Decimal::ZERO, Decimal::ZERO).with_clock(clock.clone()),
    );
    let planner = Arc::new(StubPlanner::new());
    let history = Arc::new(MemoryHistoryStore::new());

    let coordinator = CycleCoordinator::new(SupervisorParts {
        config: SupervisorConfig {
            scan_delay_ms: 0,
            report_dir: report_dir.display().to_string(),
            ..SupervisorConfig::default()
        },
        accounts: vec![Account {
            id: "paper-1".to_string(),
            broker: "paper".to_string(),
            mode: TradingMode::Paper,
            max_concurrent_trades: None,
            risk_per_trade_pct: dec!(1),
            equity: dec!(1000),
            key_ref: None,
        }],
        brokers: vec![broker.clone() as Arc<dyn BrokerAdapter>],
        planner: planner.clone(),
        profiles: Arc::new(MemoryProfileStore::new(profiles)),
        history: history.clone(),
        prices: book.clone(),
        universe: book,
        clock,
    });

    Harness {
        coordinator: Arc::new(coordinator),
        planner,
        broker,
        history,
    }
}

#[tokio::test]
async fn erroring_profile_does_not_stop_the_next_one() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(dir.path(), vec![profile("p1", "FAIL-USD"), profile("p2", "BTC-USD")]).await;

    let cycle = h.coordinator.run_cycle(CycleTrigger::Timer).await.unwrap();

    assert_eq!(cycle.profiles.len(), 2);
    assert_eq!(cycle.profiles[0].status, ProfileStatus::Error);
    assert!(cycle.profiles[0].reason.contains("candle feed unavailable"));
    assert_eq!(cycle.profiles[1].status, ProfileStatus::Executed);
    assert_eq!(cycle.profiles[1].outcome.placed, 1);
    assert_eq!(cycle.profiles[1].outcome.skipped_cooldown, 1);
    assert_eq!(h.broker.fills().len(), 1);

    let (path, root) = latest_report(dir.path()).await.unwrap().unwrap();
    assert!(path.file_name().unwrap().to_string_lossy().ends_with(".rec"));
    let verdict = root.child("verdict").unwrap();
    assert_eq!(verdict.field("failure_isolation"), Some("PASS"));
    assert_eq!(verdict.field("coverage"), Some("PASS"));
    assert_eq!(verdict.field("overall"), Some("PASS"));

    let statuses: Vec<_> = root
        .children_named("profile")
        .filter_map(|p| p.field("status"))
        .collect();
    assert_eq!(statuses, vec!["error", "executed"]);
}

#[tokio::test]
async fn manual_run_and_timer_cycle_serialize_on_session_state() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(dir.path(), vec![profile("p1", "SLOW-USD")]).await;

    let cycle = {
        let coordinator = h.coordinator.clone();
        tokio::spawn(async move { coordinator.run_cycle(CycleTrigger::Timer).await })
    };
    h.planner.entered.notified().await;
    assert!(h.coordinator.is_cycle_running());

    // a tick landing mid-cycle is dropped
    assert!(h.coordinator.run_cycle(CycleTrigger::Timer).await.is_none());

    let manual = {
        let coordinator = h.coordinator.clone();
        tokio::spawn(async move {
            coordinator
                .run_manual(
                    "paper-1",
                    vec![long("paper-1", "ETH-USD")],
                    GuardrailLimits {
                        max_trades_per_cycle: 1,
                        cooldown_minutes: 30,
                        daily_risk_stop_pct: dec!(5),
                    },
                )
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!manual.is_finished());

    h.planner.release.notify_one();
    let cycle = cycle.await.unwrap().unwrap();
    let outcome = manual.await.unwrap().unwrap();

    assert_eq!(cycle.profiles[0].outcome.placed, 1);
    assert_eq!(outcome.placed, 1);
    assert_eq!(h.coordinator.session_open("paper-1").await, 2);
    assert_eq!(h.coordinator.tracked_positions().await, 2);
    assert_eq!(h.broker.fills().len(), 2);

    let executed = h
        .history
        .load_trades()
        .await
        .unwrap()
        .into_iter()
        .filter(|t| t.executed)
        .count();
    assert_eq!(executed, 2);
    assert!(!h.coordinator.is_cycle_running());
}

#[tokio::test]
async fn profile_is_not_due_again_within_its_interval() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(dir.path(), vec![profile("p1", "BTC-USD")]).await;

    let first = h.coordinator.run_cycle(CycleTrigger::Timer).await.unwrap();
    assert_eq!(first.profiles_due, 1);

    let second = h.coordinator.run_cycle(CycleTrigger::Timer).await.unwrap();
    assert_eq!(second.profiles_due, 0);
    assert_eq!(second.profiles_not_due, 1);
    assert_eq!(h.broker.fills().len(), 1);

    // fills and the trade log share the supervisor clock
    let logged = h.history.load_trades().await.unwrap();
    assert_eq!(h.broker.fills()[0].timestamp, logged[0].timestamp);
}
