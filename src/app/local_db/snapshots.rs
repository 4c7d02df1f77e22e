//! Club and membership snapshots.
//!
//! One row per user in each table, holding the JSON payload of the last live
//! fetch. Rows are replaced wholesale on every store.

use super::{LocalDatabase, Result};
use crate::shared::clubs::UserClubMembership;
use crate::shared::{Club, UserId};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A cached payload and the time it was fetched
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    pub data: T,
    pub fetched_at: DateTime<Utc>,
}

fn encode<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value)
        .map_err(|e| sqlx::Error::Protocol(format!("Failed to encode snapshot: {}", e)))
}

fn decode<T: DeserializeOwned>(payload: &str, fetched_at: &str) -> Result<Snapshot<T>> {
    let data = serde_json::from_str(payload).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
    let fetched_at = DateTime::parse_from_rfc3339(fetched_at)
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))?
        .with_timezone(&Utc);
    Ok(Snapshot { data, fetched_at })
}

impl LocalDatabase {
    /// Replace the cached club list of `user_id`
    pub async fn store_club_snapshot(&self, user_id: &UserId, clubs: &[Club]) -> Result<()> {
        self.store("club_snapshots", user_id, encode(&clubs)?).await?;
        tracing::debug!("[CACHE] stored {} clubs for {}", clubs.len(), user_id);
        Ok(())
    }

    /// Last cached club list of `user_id`
    pub async fn load_club_snapshot(&self, user_id: &UserId) -> Result<Option<Snapshot<Vec<Club>>>> {
        self.load("club_snapshots", user_id).await
    }

    /// Replace the cached membership list of `user_id`
    pub async fn store_membership_snapshot(
        &self,
        user_id: &UserId,
        memberships: &[UserClubMembership],
    ) -> Result<()> {
        self.store("membership_snapshots", user_id, encode(&memberships)?)
            .await
    }

    pub async fn load_membership_snapshot(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Snapshot<Vec<UserClubMembership>>>> {
        self.load("membership_snapshots", user_id).await
    }

    /// Forget everything cached for `user_id`
    pub async fn clear_snapshots(&self, user_id: &UserId) -> Result<()> {
        let mut tx = self.pool().begin().await?;
        sqlx::query("DELETE FROM club_snapshots WHERE user_id = ?")
            .bind(user_id.as_str())
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM membership_snapshots WHERE user_id = ?")
            .bind(user_id.as_str())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        tracing::debug!("[CACHE] cleared snapshots for {}", user_id);
        Ok(())
    }

    // `table` is always one of the two snapshot tables named above.
    async fn store(&self, table: &str, user_id: &UserId, payload: String) -> Result<()> {
        let sql = format!(
            "INSERT OR REPLACE INTO {} (user_id, payload, fetched_at) VALUES (?, ?, ?)",
            table
        );
        sqlx::query(&sql)
            .bind(user_id.as_str())
            .bind(payload)
            .bind(Utc::now().to_rfc3339())
            .execute(self.pool())
            .await?;
        Ok(())
    }

    async fn load<T: DeserializeOwned>(&self, table: &str, user_id: &UserId) -> Result<Option<Snapshot<T>>> {
        let sql = format!("SELECT payload, fetched_at FROM {} WHERE user_id = ?", table);
        let row: Option<(String, String)> = sqlx::query_as(&sql)
            .bind(user_id.as_str())
            .fetch_optional(self.pool())
            .await?;

        row.map(|(payload, fetched_at)| decode(&payload, &fetched_at))
            .transpose()
    }
}
