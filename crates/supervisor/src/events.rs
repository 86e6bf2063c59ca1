use crate::telemetry::{CycleTrigger, ProfileStatus};
use crate::verifier::AxisVerdict;
use autotrader_core::ExitTrigger;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Observer stream; the supervisor keeps no state for subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SupervisorEvent {
    CycleStarted {
        cycle_id: String,
        trigger: CycleTrigger,
        at: DateTime<Utc>,
    },

    /// A profile reached a terminal status within a cycle
    ProfileFinished {
        cycle_id: String,
        profile_id: String,
        status: ProfileStatus,
        reason: String,
    },

    CycleFinished {
        cycle_id: String,
        verdict: AxisVerdict,
        profiles: usize,
        report: Option<PathBuf>,
        error: Option<String>,
    },

    KillSwitchEngaged {
        at: DateTime<Utc>,
    },

    KillSwitchReleased {
        at: DateTime<Utc>,
    },

    /// Watchdog flattened a locally tracked position
    PositionClosed {
        account_id: String,
        symbol: String,
        trigger: ExitTrigger,
        realized_pnl: Decimal,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CoordinatorState {
    Idle,
    Running,
    Killed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorStatus {
    pub state: CoordinatorState,
    pub cycles_run: u64,
    pub last_cycle_id: Option<String>,
    pub last_verdict: Option<AxisVerdict>,
    pub kill_switch: bool,
    pub updated_at: DateTime<Utc>,
}

impl SupervisorStatus {
    #[must_use]
    pub fn idle(at: DateTime<Utc>) -> Self {
        Self {
            state: CoordinatorState::Idle,
            cycles_run: 0,
            last_cycle_id: None,
            last_verdict: None,
            kill_switch: false,
            updated_at: at,
        }
    }
}
