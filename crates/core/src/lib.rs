pub mod clock;
pub mod config;
pub mod config_loader;
pub mod config_watcher;
pub mod error;
pub mod scope;
pub mod tags;
pub mod traits;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AppConfig, DatabaseConfig, PaperConfig, SupervisorConfig};
pub use config_loader::ConfigLoader;
pub use config_watcher::{ConfigWatcher, ReloadDiff};
pub use error::{BrokerError, SupervisorError};
pub use scope::GuardrailScope;
pub use tags::{TradeResult, TradeTags};
pub use traits::{
    BrokerAdapter, BrokerCapabilities, HistoryStore, OrderAck, Planner, PriceFeed, ProfileStore,
    Proposal, ProposalRequest, ReasonCode, SignalRow, SymbolUniverse,
};
pub use types::{
    normalize_symbols, Account, Direction, ExecutionOutcome, ExitTrigger, OpenPositionRecord,
    Profile, SymbolScope, TradePlan, TradeRecord, TradingMode,
};
