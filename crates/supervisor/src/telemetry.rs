use crate::verifier::VerificationReport;
use autotrader_core::{ExecutionOutcome, GuardrailScope, Profile, ReasonCode};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Terminal status of one profile within a cycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProfileStatus {
    /// Pipeline ran (placed may still be zero)
    Executed,
    /// Planner produced no plans
    NoPlans,
    /// Nothing to do, e.g. no symbols resolved
    Skipped,
    /// Configuration error or capability/arming check failed
    Blocked,
    Error,
    /// Kill switch stopped the batch
    Killed,
}

impl ProfileStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Executed => "executed",
            Self::NoPlans => "no_plans",
            Self::Skipped => "skipped",
            Self::Blocked => "blocked",
            Self::Error => "error",
            Self::Killed => "killed",
        }
    }

    #[must_use]
    pub const fn is_failure(self) -> bool {
        matches!(self, Self::Blocked | Self::Error)
    }
}

impl fmt::Display for ProfileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CycleTrigger {
    Timer,
    Manual,
}

impl fmt::Display for CycleTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timer => f.write_str("timer"),
            Self::Manual => f.write_str("manual"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileTelemetry {
    pub profile_id: String,
    pub profile_name: String,
    pub account_id: String,
    pub scope: GuardrailScope,
    pub symbol_scope: String,
    /// `None` for `All`
    pub declared_symbols: Option<usize>,
    pub observed_symbols: usize,
    pub max_trades_per_cycle: u32,
    pub cooldown_minutes: i64,
    pub daily_risk_stop_pct: Decimal,
    pub plans_proposed: usize,
    pub planner_reason: Option<ReasonCode>,
    pub planner_message: String,
    pub outcome: ExecutionOutcome,
    pub status: ProfileStatus,
    pub reason: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ProfileTelemetry {
    /// Record with the profile's declared inputs; the scheduler fills in the rest.
    #[must_use]
    pub fn begin(profile: &Profile, at: DateTime<Utc>) -> Self {
        Self {
            profile_id: profile.id.clone(),
            profile_name: profile.name.clone(),
            account_id: profile.account_id.clone(),
            scope: profile.scope(),
            symbol_scope: profile.symbol_scope.label().to_string(),
            declared_symbols: profile.symbol_scope.declared_count(),
            observed_symbols: 0,
            max_trades_per_cycle: profile.max_trades_per_cycle,
            cooldown_minutes: profile.cooldown_minutes,
            daily_risk_stop_pct: profile.daily_risk_stop_pct,
            plans_proposed: 0,
            planner_reason: None,
            planner_message: String::new(),
            outcome: ExecutionOutcome::default(),
            status: ProfileStatus::Skipped,
            reason: String::new(),
            started_at: at,
            finished_at: at,
        }
    }

    /// A guardrail rejection or planner veto happened.
    #[must_use]
    pub fn saw_guardrail_event(&self) -> bool {
        self.outcome.guardrail_rejections() > 0
            || self.planner_reason.is_some_and(ReasonCode::is_veto)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CycleTelemetry {
    pub cycle_id: String,
    pub trigger: CycleTrigger,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub profiles_due: usize,
    pub profiles_not_due: usize,
    /// Processing order
    pub profiles: Vec<ProfileTelemetry>,
    pub killed: bool,
    pub error: Option<String>,
    pub verification: Option<VerificationReport>,
}

impl CycleTelemetry {
    #[must_use]
    pub fn start(trigger: CycleTrigger, at: DateTime<Utc>) -> Self {
        Self {
            cycle_id: uuid::Uuid::new_v4().to_string(),
            trigger,
            started_at: at,
            finished_at: None,
            profiles_due: 0,
            profiles_not_due: 0,
            profiles: Vec::new(),
            killed: false,
            error: None,
            verification: None,
        }
    }

    /// First eight characters of the id, used in report file names.
    #[must_use]
    pub fn short_id(&self) -> &str {
        self.cycle_id.get(..8).unwrap_or(&self.cycle_id)
    }

    #[must_use]
    pub fn total_placed(&self) -> u32 {
        self.profiles.iter().map(|p| p.outcome.placed).sum()
    }
}
