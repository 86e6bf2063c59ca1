//! In-process stores for paper sessions and tests.

use anyhow::Result;
use async_trait::async_trait;
use autotrader_core::{HistoryStore, Profile, ProfileStore, TradeRecord};
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    trades: RwLock<Vec<TradeRecord>>,
}

impl MemoryHistoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the log, e.g. with trades from a previous process.
    #[must_use]
    pub fn with_trades(trades: Vec<TradeRecord>) -> Self {
        Self {
            trades: RwLock::new(trades),
        }
    }

    pub async fn len(&self) -> usize {
        self.trades.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.trades.read().await.is_empty()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn save_trade(&self, record: &TradeRecord) -> Result<()> {
        self.trades.write().await.push(record.clone());
        Ok(())
    }

    async fn load_trades(&self) -> Result<Vec<TradeRecord>> {
        Ok(self.trades.read().await.clone())
    }
}

#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    profiles: RwLock<Vec<Profile>>,
}

impl MemoryProfileStore {
    #[must_use]
    pub fn new(profiles: Vec<Profile>) -> Self {
        Self {
            profiles: RwLock::new(profiles),
        }
    }

    pub async fn get(&self, profile_id: &str) -> Option<Profile> {
        self.profiles
            .read()
            .await
            .iter()
            .find(|p| p.id == profile_id)
            .cloned()
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn get_all(&self) -> Result<Vec<Profile>> {
        Ok(self.profiles.read().await.clone())
    }

    async fn mark_last_run(&self, profile_id: &str, at: DateTime<Utc>) -> Result<()> {
        let mut profiles = self.profiles.write().await;
        let Some(profile) = profiles.iter_mut().find(|p| p.id == profile_id) else {
            anyhow::bail!("Profile {profile_id} not found");
        };
        profile.last_run_at = Some(at);
        Ok(())
    }
}
