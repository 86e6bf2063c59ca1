//! Profile storage.
//!
//! Profiles are stored as JSON blobs (edited outside the supervisor); the
//! `last_run_at` column is owned by the supervisor and merged in on load.

use anyhow::Result;
use async_trait::async_trait;
use autotrader_core::{Profile, ProfileStore};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

#[derive(Debug, Clone)]
pub struct ProfileRepository {
    pool: SqlitePool,
}

impl ProfileRepository {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts or updates a profile definition. `last_run_at` is left untouched on update.
    ///
    /// # Errors
    ///
    /// Returns error if serialization or database operation fails.
    pub async fn upsert(&self, profile: &Profile) -> Result<()> {
        let config_json = serde_json::to_string(profile)?;
        let now = Utc::now().timestamp();

        sqlx::query(
            r"
            INSERT INTO profiles (profile_id, config_json, enabled, last_run_at, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            ON CONFLICT(profile_id) DO UPDATE SET
                config_json = excluded.config_json,
                enabled = excluded.enabled,
                updated_at = excluded.updated_at
            ",
        )
        .bind(&profile.id)
        .bind(config_json)
        .bind(profile.enabled)
        .bind(profile.last_run_at.map(|t| t.timestamp_millis()))
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Deletes a profile.
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails.
    pub async fn delete(&self, profile_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM profiles WHERE profile_id = ?1")
            .bind(profile_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Loads every profile ordered by id.
    ///
    /// # Errors
    ///
    /// Returns error if database query or deserialization fails.
    pub async fn load_all(&self) -> Result<Vec<Profile>> {
        let rows = sqlx::query_as::<_, (String, bool, Option<i64>)>(
            "SELECT config_json, enabled, last_run_at FROM profiles ORDER BY profile_id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut profiles = Vec::with_capacity(rows.len());
        for (config_json, enabled, last_run_at) in rows {
            let mut profile: Profile = serde_json::from_str(&config_json)?;
            profile.enabled = enabled;
            profile.last_run_at = last_run_at.and_then(DateTime::<Utc>::from_timestamp_millis);
            profiles.push(profile);
        }

        Ok(profiles)
    }
}

#[async_trait]
impl ProfileStore for ProfileRepository {
    async fn get_all(&self) -> Result<Vec<Profile>> {
        self.load_all().await
    }

    async fn mark_last_run(&self, profile_id: &str, at: DateTime<Utc>) -> Result<()> {
        let result = sqlx::query("UPDATE profiles SET last_run_at = ?1 WHERE profile_id = ?2")
            .bind(at.timestamp_millis())
            .bind(profile_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            anyhow::bail!("Profile {profile_id} not found");
        }
        Ok(())
    }
}
