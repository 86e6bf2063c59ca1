//! Typed errors for broker adapters and the supervisor.

use thiserror::Error;

/// Failures reported by a broker adapter. The pipeline treats every variant as "not placed".
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BrokerError {
    /// Exchange refused the order.
    #[error("order rejected: {0}")]
    Rejected(String),

    /// Plan failed price/quantity geometry or exchange precision rules.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Network or API failure.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Errors raised while processing a profile.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("account not found: {account_id}")]
    MissingAccount { account_id: String },

    #[error("unsupported broker: {broker}")]
    UnsupportedBroker { broker: String },

    #[error("missing or invalid key reference for account {account_id}")]
    MissingKey { account_id: String },

    #[error("broker {broker} cannot enter at market")]
    MarketEntryUnsupported { broker: String },

    #[error("broker {broker} has no protective exits and the local watchdog is disabled")]
    ProtectiveExitsUnavailable { broker: String },

    #[error("live trading is not armed for account {account_id}")]
    LiveTradingDisarmed { account_id: String },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("planner error: {0}")]
    Planner(String),

    #[error("price unavailable for {symbol}")]
    PriceUnavailable { symbol: String },

    #[error("report error: {0}")]
    Report(String),
}

impl SupervisorError {
    /// Configuration errors block a profile for the current cycle instead of failing it.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingAccount { .. }
                | Self::UnsupportedBroker { .. }
                | Self::MissingKey { .. }
                | Self::MarketEntryUnsupported { .. }
                | Self::ProtectiveExitsUnavailable { .. }
                | Self::LiveTradingDisarmed { .. }
        )
    }
}
