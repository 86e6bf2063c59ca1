//! CLI commands for the trading-profile supervisor.

pub mod profiles;
pub mod report;
pub mod run;

pub use profiles::ProfilesArgs;
pub use report::ReportArgs;
pub use run::{OnceArgs, RunArgs};
