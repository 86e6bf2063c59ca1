//! Storage for the trading-profile supervisor.
//!
//! This crate provides:
//! - `SQLite` database with embedded migrations
//! - Repositories implementing the trade log and profile store
//! - In-memory stores for paper sessions and tests
//! - CSV candle loading

pub mod csv_storage;
pub mod database;
pub mod memory;
pub mod models;
pub mod repositories;

pub use csv_storage::CsvStorage;
pub use database::Database;
pub use memory::{MemoryHistoryStore, MemoryProfileStore};
pub use models::{Candle, TradeLogRow};
pub use repositories::{ProfileRepository, Repositories, TradeLogRepository};
