//! Annotation codec for the trade log's free-text `notes` channel.
//!
//! Tags are `key=value` pairs joined by `;`. Reconciliation reads them back to
//! attribute trades to accounts, scopes, and outcomes.

use crate::scope::GuardrailScope;
use crate::types::TradingMode;
use std::fmt;

pub const SCOPE: &str = "scope";
pub const ACCOUNT: &str = "account";
pub const MODE: &str = "mode";
pub const RESULT: &str = "result";
pub const STRATEGY: &str = "strategy";
pub const CLOSED: &str = "closed";
pub const REASON: &str = "reason";

/// Outcome tag written with every trade-log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeResult {
    /// Entry accepted by the broker
    Placed,
    /// Entry attempted and rejected or lost in transport
    Failed,
    /// Protective exit accepted by the broker
    Closed,
    /// Protective exit attempted and failed; the position stays tracked
    CloseFailed,
}

impl TradeResult {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Placed => "placed",
            Self::Failed => "failed",
            Self::Closed => "closed",
            Self::CloseFailed => "close_failed",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "placed" => Some(Self::Placed),
            "failed" => Some(Self::Failed),
            "closed" => Some(Self::Closed),
            "close_failed" => Some(Self::CloseFailed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TradeTags {
    entries: Vec<(String, String)>,
}

impl TradeTags {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a tag. Separator characters in values are replaced with `_`.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl AsRef<str>) -> Self {
        let value: String = value
            .as_ref()
            .chars()
            .map(|c| if c == ';' || c == '=' { '_' } else { c })
            .collect();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| k == key) {
            slot.1 = value;
        } else {
            self.entries.push((key.to_string(), value));
        }
        self
    }

    /// Parses notes leniently: malformed fragments are ignored.
    #[must_use]
    pub fn parse(notes: &str) -> Self {
        let entries = notes
            .split(';')
            .filter_map(|part| {
                let (key, value) = part.split_once('=')?;
                let key = key.trim();
                (!key.is_empty()).then(|| (key.to_string(), value.trim().to_string()))
            })
            .collect();
        Self { entries }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn result(&self) -> Option<TradeResult> {
        self.get(RESULT).and_then(TradeResult::parse)
    }

    #[must_use]
    pub fn scope(&self) -> Option<GuardrailScope> {
        self.get(SCOPE).map(GuardrailScope::from_key)
    }

    #[must_use]
    pub fn mode(&self) -> Option<TradingMode> {
        self.get(MODE).and_then(|m| m.parse().ok())
    }

    /// Symbol referenced by an explicit close marker.
    #[must_use]
    pub fn closed_symbol(&self) -> Option<&str> {
        self.get(CLOSED)
    }
}

impl fmt::Display for TradeTags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}
