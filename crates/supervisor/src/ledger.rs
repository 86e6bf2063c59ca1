//! Per-scope cooldown and daily-risk bookkeeping plus per-account session
//! open-position counters.
//!
//! Daily risk resets lazily: the first call after a UTC date change clears every
//! scope's counter. There is no background timer.

use autotrader_core::GuardrailScope;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;

#[derive(Debug, Default, Clone)]
struct ScopeBook {
    last_trade: HashMap<String, DateTime<Utc>>,
    risk_used: Decimal,
}

#[derive(Debug, Default)]
pub struct GuardrailLedger {
    scopes: HashMap<GuardrailScope, ScopeBook>,
    session_open: HashMap<String, u32>,
    day: Option<NaiveDate>,
}

impl GuardrailLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears daily risk if `now` falls on a later UTC date than the last call.
    /// Returns `true` when a reset happened.
    pub fn reset_if_new_utc_day(&mut self, now: DateTime<Utc>) -> bool {
        let today = now.date_naive();
        match self.day {
            Some(day) if day >= today => false,
            previous => {
                self.day = Some(today);
                if previous.is_none() {
                    return false;
                }
                for book in self.scopes.values_mut() {
                    book.risk_used = Decimal::ZERO;
                }
                tracing::info!(date = %today, scopes = self.scopes.len(), "Daily risk reset");
                true
            }
        }
    }

    pub fn is_on_cooldown(
        &mut self,
        scope: &GuardrailScope,
        symbol: &str,
        minutes: i64,
        now: DateTime<Utc>,
    ) -> bool {
        self.reset_if_new_utc_day(now);
        self.scopes
            .get(scope)
            .and_then(|book| book.last_trade.get(symbol))
            .is_some_and(|last| now - *last < Duration::minutes(minutes))
    }

    pub fn mark_cooldown(&mut self, scope: &GuardrailScope, symbol: &str, now: DateTime<Utc>) {
        self.reset_if_new_utc_day(now);
        self.scopes
            .entry(scope.clone())
            .or_default()
            .last_trade
            .insert(symbol.to_string(), now);
    }

    /// Risk spent today under `scope`; zero for an unknown scope.
    pub fn daily_risk_used(&mut self, scope: &GuardrailScope, now: DateTime<Utc>) -> Decimal {
        self.reset_if_new_utc_day(now);
        self.scopes.get(scope).map_or(Decimal::ZERO, |book| book.risk_used)
    }

    /// Adds spent risk. Negative amounts are ignored.
    pub fn add_daily_risk(&mut self, scope: &GuardrailScope, amount: Decimal, now: DateTime<Utc>) {
        self.reset_if_new_utc_day(now);
        if amount <= Decimal::ZERO {
            return;
        }
        self.scopes.entry(scope.clone()).or_default().risk_used += amount;
    }

    /// True when adding `amount` would push the scope past `cap`.
    pub fn would_exceed_risk(
        &mut self,
        scope: &GuardrailScope,
        amount: Decimal,
        cap: Decimal,
        now: DateTime<Utc>,
    ) -> bool {
        self.daily_risk_used(scope, now) + amount > cap
    }

    #[must_use]
    pub fn session_open(&self, account_id: &str) -> u32 {
        self.session_open.get(account_id).copied().unwrap_or(0)
    }

    pub fn increment_open(&mut self, account_id: &str) {
        *self.session_open.entry(account_id.to_string()).or_default() += 1;
    }

    pub fn decrement_open(&mut self, account_id: &str) {
        if let Some(count) = self.session_open.get_mut(account_id) {
            *count = count.saturating_sub(1);
        }
    }
}
