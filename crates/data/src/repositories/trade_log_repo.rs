//! Append-only trade log.

use anyhow::Result;
use async_trait::async_trait;
use autotrader_core::{HistoryStore, TradeRecord};
use sqlx::SqlitePool;

use crate::models::TradeLogRow;

#[derive(Debug, Clone)]
pub struct TradeLogRepository {
    pool: SqlitePool,
}

impl TradeLogRepository {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Appends a trade and returns its row id.
    ///
    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn insert(&self, record: &TradeRecord) -> Result<i64> {
        let result = sqlx::query(
            r"
            INSERT INTO trade_log
                (account_id, broker, symbol, timestamp_ms, side, quantity, price,
                 executed, fill_price, realized_pnl, notes)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ",
        )
        .bind(&record.account_id)
        .bind(&record.broker)
        .bind(&record.symbol)
        .bind(record.timestamp.timestamp_millis())
        .bind(record.side.as_str())
        .bind(record.quantity.to_string())
        .bind(record.price.to_string())
        .bind(record.executed)
        .bind(record.fill_price.map(|p| p.to_string()))
        .bind(record.realized_pnl.map(|p| p.to_string()))
        .bind(&record.notes)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Loads the full log in insertion order.
    ///
    /// # Errors
    /// Returns an error if the query fails or a row cannot be decoded.
    pub async fn all(&self) -> Result<Vec<TradeRecord>> {
        let rows = sqlx::query_as::<_, TradeLogRow>(
            r"
            SELECT id, account_id, broker, symbol, timestamp_ms, side, quantity, price,
                   executed, fill_price, realized_pnl, notes
            FROM trade_log
            ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TradeRecord::try_from).collect()
    }

    /// Loads trades for one account routed through one broker.
    ///
    /// # Errors
    /// Returns an error if the query fails or a row cannot be decoded.
    pub async fn for_account(&self, account_id: &str, broker: &str) -> Result<Vec<TradeRecord>> {
        let rows = sqlx::query_as::<_, TradeLogRow>(
            r"
            SELECT id, account_id, broker, symbol, timestamp_ms, side, quantity, price,
                   executed, fill_price, realized_pnl, notes
            FROM trade_log
            WHERE account_id = ?1 AND broker = ?2
            ORDER BY id ASC
            ",
        )
        .bind(account_id)
        .bind(broker)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TradeRecord::try_from).collect()
    }
}

#[async_trait]
impl HistoryStore for TradeLogRepository {
    async fn save_trade(&self, record: &TradeRecord) -> Result<()> {
        self.insert(record).await?;
        Ok(())
    }

    async fn load_trades(&self) -> Result<Vec<TradeRecord>> {
        self.all().await
    }
}
