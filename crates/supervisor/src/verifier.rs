//! Consistency and reliability checks over a finished cycle.

use crate::telemetry::CycleTelemetry;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AxisVerdict {
    #[serde(rename = "PASS")]
    Pass,
    #[serde(rename = "PARTIAL")]
    Partial,
}

impl AxisVerdict {
    const fn from_bool(ok: bool) -> Self {
        if ok {
            Self::Pass
        } else {
            Self::Partial
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Partial => "PARTIAL",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PASS" => Some(Self::Pass),
            "PARTIAL" => Some(Self::Partial),
            _ => None,
        }
    }
}

impl fmt::Display for AxisVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerificationReport {
    /// No two profiles share a guardrail scope
    pub scope_isolation: AxisVerdict,
    /// Every profile has positive trade cap, cooldown and risk stop
    pub guardrail_config: AxisVerdict,
    /// Observed symbol counts match the declared scope
    pub symbol_scope: AxisVerdict,
    /// Some guardrail fired and some order was placed
    pub coverage: AxisVerdict,
    /// Blocked or errored profiles did not stop the rest
    pub failure_isolation: AxisVerdict,
    pub overall: AxisVerdict,
}

impl VerificationReport {
    #[must_use]
    pub fn axes(&self) -> [(&'static str, AxisVerdict); 5] {
        [
            ("scope_isolation", self.scope_isolation),
            ("guardrail_config", self.guardrail_config),
            ("symbol_scope", self.symbol_scope),
            ("coverage", self.coverage),
            ("failure_isolation", self.failure_isolation),
        ]
    }
}

#[must_use]
pub fn verify(cycle: &CycleTelemetry) -> VerificationReport {
    let profiles = &cycle.profiles;

    let mut seen = HashSet::new();
    let scopes_unique = profiles.iter().all(|p| seen.insert(p.scope.as_str()));

    let config_complete = profiles.iter().all(|p| {
        p.max_trades_per_cycle > 0 && p.cooldown_minutes > 0 && p.daily_risk_stop_pct > Decimal::ZERO
    });

    let symbols_match = profiles.iter().all(|p| match p.declared_symbols {
        Some(declared) => p.observed_symbols == declared,
        None => p.observed_symbols > 0,
    });

    let guardrail_fired = profiles.iter().any(|p| p.saw_guardrail_event());
    let placed = profiles.iter().any(|p| p.outcome.placed > 0);

    let failure_seen = profiles.iter().any(|p| p.status.is_failure());
    let all_reached = cycle.killed || profiles.len() == cycle.profiles_due;
    let isolated = !failure_seen || all_reached;

    let mut report = VerificationReport {
        scope_isolation: AxisVerdict::from_bool(scopes_unique),
        guardrail_config: AxisVerdict::from_bool(config_complete),
        symbol_scope: AxisVerdict::from_bool(symbols_match),
        coverage: AxisVerdict::from_bool(guardrail_fired && placed),
        failure_isolation: AxisVerdict::from_bool(isolated),
        overall: AxisVerdict::Pass,
    };
    let all_pass = report.axes().iter().all(|(_, v)| *v == AxisVerdict::Pass);
    report.overall = AxisVerdict::from_bool(all_pass);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::{CycleTrigger, ProfileStatus, ProfileTelemetry};
    use autotrader_core::{Profile, SymbolScope};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn profile(id: &str, scope: SymbolScope) -> Profile {
        Profile {
            id: id.to_string(),
            name: id.to_uppercase(),
            account_id: "shared".to_string(),
            enabled: true,
            symbol_scope: scope,
            interval_minutes: 15,
            max_trades_per_cycle: 2,
            cooldown_minutes: 30,
            daily_risk_stop_pct: dec!(3),
            granularity: None,
            lookback: None,
            last_run_at: None,
        }
    }

    fn telemetry(id: &str, observed: usize, status: ProfileStatus) -> ProfileTelemetry {
        let at = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        let mut t = ProfileTelemetry::begin(
            &profile(id, SymbolScope::Explicit(vec!["BTC-USD".to_string()])),
            at,
        );
        t.observed_symbols = observed;
        t.status = status;
        t
    }

    fn cycle(profiles: Vec<ProfileTelemetry>) -> CycleTelemetry {
        let mut c = CycleTelemetry::start(CycleTrigger::Timer, Utc::now());
        c.profiles_due = profiles.len();
        c.profiles = profiles;
        c
    }

    #[test]
    fn healthy_cycle_passes_every_axis() {
        let mut placed = telemetry("p1", 1, ProfileStatus::Executed);
        placed.outcome.placed = 1;
        let mut rejected = telemetry("p2", 1, ProfileStatus::Executed);
        rejected.outcome.skipped_risk = 1;

        let report = verify(&cycle(vec![placed, rejected]));
        assert_eq!(report.overall, AxisVerdict::Pass);
    }

    #[test]
    fn quiet_cycle_is_partial_on_coverage_only() {
        let report = verify(&cycle(vec![telemetry("p1", 1, ProfileStatus::NoPlans)]));
        assert_eq!(report.coverage, AxisVerdict::Partial);
        assert_eq!(report.scope_isolation, AxisVerdict::Pass);
        assert_eq!(report.overall, AxisVerdict::Partial);
    }

    #[test]
    fn duplicate_scope_is_flagged() {
        let report = verify(&cycle(vec![
            telemetry("p1", 1, ProfileStatus::NoPlans),
            telemetry("p1", 1, ProfileStatus::NoPlans),
        ]));
        assert_eq!(report.scope_isolation, AxisVerdict::Partial);
    }

    #[test]
    fn config_and_symbol_mismatches_are_flagged() {
        let mut zero_cooldown = telemetry("p1", 1, ProfileStatus::Executed);
        zero_cooldown.cooldown_minutes = 0;
        let short = telemetry("p2", 0, ProfileStatus::Skipped);

        let report = verify(&cycle(vec![zero_cooldown, short]));
        assert_eq!(report.guardrail_config, AxisVerdict::Partial);
        assert_eq!(report.symbol_scope, AxisVerdict::Partial);
    }

    #[test]
    fn all_scope_needs_a_positive_count() {
        let at = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        let mut t = ProfileTelemetry::begin(&profile("p1", SymbolScope::All), at);
        t.observed_symbols = 12;
        assert_eq!(verify(&cycle(vec![t])).symbol_scope, AxisVerdict::Pass);
    }

    #[test]
    fn error_that_stops_later_profiles_is_flagged() {
        let mut c = cycle(vec![telemetry("p1", 1, ProfileStatus::Error)]);
        c.profiles_due = 3;
        assert_eq!(verify(&c).failure_isolation, AxisVerdict::Partial);

        c.profiles.push(telemetry("p2", 1, ProfileStatus::NoPlans));
        c.profiles.push(telemetry("p3", 1, ProfileStatus::Blocked));
        assert_eq!(verify(&c).failure_isolation, AxisVerdict::Pass);
    }
}
