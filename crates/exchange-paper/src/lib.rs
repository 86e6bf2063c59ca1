//! Paper trading: a simulated broker adapter plus the price book it fills against.
//!
//! The adapter makes zero network calls and never holds native stop/target
//! orders, so profiles routed through it rely on the supervisor's local
//! protective-exit watchdog.

pub mod paper_execution;
pub mod price_book;

pub use paper_execution::{PaperBroker, PaperFill};
pub use price_book::PriceBook;
