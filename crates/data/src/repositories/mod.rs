//! Typed repositories over the supervisor database.

pub mod profile_repo;
pub mod trade_log_repo;

pub use profile_repo::ProfileRepository;
pub use trade_log_repo::TradeLogRepository;

use sqlx::SqlitePool;

/// Creates all repositories from a single database pool.
#[derive(Clone)]
pub struct Repositories {
    pub profiles: ProfileRepository,
    pub trades: TradeLogRepository,
}

impl Repositories {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            profiles: ProfileRepository::new(pool.clone()),
            trades: TradeLogRepository::new(pool),
        }
    }
}
