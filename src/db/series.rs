//! Series database operations
//!
//! A series is a tracked show: stable id, canonical and raw titles, and the
//! season currently being followed. Series are never deleted while releases
//! reference them.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::sqlite_helpers::{now_iso8601, str_to_datetime, str_to_uuid, uuid_to_str};

/// A series record in the database
#[derive(Debug, Clone)]
pub struct SeriesRecord {
    pub id: Uuid,
    pub official_title: String,
    pub title_raw: String,
    pub season: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl sqlx::FromRow<'_, sqlx::sqlite::SqliteRow> for SeriesRecord {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> sqlx::Result<Self> {
        use sqlx::Row;

        let id_str: String = row.try_get("id")?;
        let created_str: String = row.try_get("created_at")?;
        let updated_str: String = row.try_get("updated_at")?;

        Ok(Self {
            id: str_to_uuid(&id_str).map_err(|e| sqlx::Error::Decode(e.into()))?,
            official_title: row.try_get("official_title")?,
            title_raw: row.try_get("title_raw")?,
            season: row.try_get("season")?,
            created_at: str_to_datetime(&created_str).map_err(|e| sqlx::Error::Decode(e.into()))?,
            updated_at: str_to_datetime(&updated_str).map_err(|e| sqlx::Error::Decode(e.into()))?,
        })
    }
}

/// Input for registering a new series
#[derive(Debug)]
pub struct CreateSeries {
    pub official_title: String,
    pub title_raw: String,
    pub season: i32,
}

/// Series repository for database operations
pub struct SeriesRepository {
    pool: SqlitePool,
}

impl SeriesRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new series record
    pub async fn create(&self, input: CreateSeries) -> Result<SeriesRecord> {
        let id = Uuid::new_v4();
        let now = now_iso8601();

        sqlx::query(
            r#"
            INSERT INTO series (id, official_title, title_raw, season, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            "#,
        )
        .bind(uuid_to_str(id))
        .bind(&input.official_title)
        .bind(&input.title_raw)
        .bind(input.season)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve series after insert"))
    }

    /// Get a series by ID
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<SeriesRecord>> {
        let record = sqlx::query_as::<_, SeriesRecord>("SELECT * FROM series WHERE id = ?1")
            .bind(uuid_to_str(id))
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    /// List all tracked series
    pub async fn list_all(&self) -> Result<Vec<SeriesRecord>> {
        let records =
            sqlx::query_as::<_, SeriesRecord>("SELECT * FROM series ORDER BY official_title ASC")
                .fetch_all(&self.pool)
                .await?;

        Ok(records)
    }
}
