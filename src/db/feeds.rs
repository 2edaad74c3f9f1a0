//! Feed registry database operations

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::sqlite_helpers::{
    int_to_bool, now_iso8601, str_to_datetime, str_to_datetime_opt, str_to_uuid, uuid_to_str,
};

/// A registered RSS feed
#[derive(Debug, Clone)]
pub struct FeedRecord {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    pub enabled: bool,
    pub last_polled_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl sqlx::FromRow<'_, sqlx::sqlite::SqliteRow> for FeedRecord {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> sqlx::Result<Self> {
        use sqlx::Row;

        let id_str: String = row.try_get("id")?;
        let enabled_int: i32 = row.try_get("enabled")?;
        let last_polled_str: Option<String> = row.try_get("last_polled_at")?;
        let created_str: String = row.try_get("created_at")?;

        Ok(Self {
            id: str_to_uuid(&id_str).map_err(|e| sqlx::Error::Decode(e.into()))?,
            name: row.try_get("name")?,
            url: row.try_get("url")?,
            enabled: int_to_bool(enabled_int),
            last_polled_at: str_to_datetime_opt(last_polled_str.as_deref())
                .map_err(|e| sqlx::Error::Decode(e.into()))?,
            last_error: row.try_get("last_error")?,
            created_at: str_to_datetime(&created_str).map_err(|e| sqlx::Error::Decode(e.into()))?,
        })
    }
}

/// Input for registering a feed
#[derive(Debug)]
pub struct CreateFeed {
    pub name: String,
    pub url: String,
}

/// Feed repository for database operations
pub struct FeedRepository {
    pool: SqlitePool,
}

impl FeedRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Register a new feed (enabled by default)
    pub async fn create(&self, input: CreateFeed) -> Result<FeedRecord> {
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO feeds (id, name, url, enabled, created_at)
            VALUES (?1, ?2, ?3, 1, ?4)
            "#,
        )
        .bind(uuid_to_str(id))
        .bind(&input.name)
        .bind(&input.url)
        .bind(now_iso8601())
        .execute(&self.pool)
        .await?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve feed after insert"))
    }

    /// Get a feed by ID
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<FeedRecord>> {
        let record = sqlx::query_as::<_, FeedRecord>("SELECT * FROM feeds WHERE id = ?1")
            .bind(uuid_to_str(id))
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    /// Get a feed by its url
    pub async fn get_by_url(&self, url: &str) -> Result<Option<FeedRecord>> {
        let record = sqlx::query_as::<_, FeedRecord>("SELECT * FROM feeds WHERE url = ?1")
            .bind(url)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    /// All feeds that should be polled
    pub async fn list_enabled(&self) -> Result<Vec<FeedRecord>> {
        let records = sqlx::query_as::<_, FeedRecord>(
            "SELECT * FROM feeds WHERE enabled = 1 ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Record the outcome of a poll attempt
    pub async fn record_poll(&self, id: Uuid, error: Option<&str>) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE feeds
            SET last_polled_at = ?2,
                last_error = ?3
            WHERE id = ?1
            "#,
        )
        .bind(uuid_to_str(id))
        .bind(now_iso8601())
        .bind(error)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
