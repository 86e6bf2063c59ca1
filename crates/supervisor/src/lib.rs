//! Trading-profile supervisor.
//!
//! A single-flight coordinator wakes on a timer, picks the profiles whose
//! interval has elapsed, plans trades for each one and pushes the plans
//! through a guardrailed execution pipeline. Cooldowns and daily risk are
//! tracked per guardrail scope (`profile:<id>` for scheduled runs,
//! `account:<id>` for manual runs); concurrent-position caps are tracked per
//! account. Every cycle ends in a persisted, verified telemetry report.

pub mod coordinator;
pub mod events;
pub mod ledger;
pub mod pipeline;
pub mod reconciler;
pub mod report;
pub mod scheduler;
pub mod session;
pub mod telemetry;
pub mod verifier;
pub mod watchdog;

#[cfg(test)]
mod testing;

pub use coordinator::{spawn_timer, CycleCoordinator, SupervisorParts};
pub use events::{CoordinatorState, SupervisorEvent, SupervisorStatus};
pub use ledger::GuardrailLedger;
pub use pipeline::{ExecutionPipeline, GuardrailLimits, PipelineRequest};
pub use reconciler::PositionReconciler;
pub use report::{latest_report, RecordNode};
pub use scheduler::{DueProfiles, ProfileScheduler, SchedulerSettings};
pub use session::SessionState;
pub use telemetry::{CycleTelemetry, CycleTrigger, ProfileStatus, ProfileTelemetry};
pub use verifier::{verify, AxisVerdict, VerificationReport};
pub use watchdog::WatchdogReport;
