//! Row models mapping stored data to domain types.

pub mod candle;
pub mod trade_log;

pub use candle::Candle;
pub use trade_log::TradeLogRow;
