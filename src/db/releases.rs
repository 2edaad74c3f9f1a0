//! Release database operations — the acquisition ledger
//!
//! Every feed entry ever observed gets a row here, keyed by its source url so
//! re-ingesting the same feed is idempotent. The `acquired` flag records that
//! the download collaborator fetched the file; once set it is never cleared
//! by this crate.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::sqlite_helpers::{
    int_to_bool, now_iso8601, str_to_datetime, str_to_datetime_opt, str_to_uuid, str_to_uuid_opt,
    uuid_to_str,
};

/// A release record in the database
#[derive(Debug, Clone)]
pub struct ReleaseRecord {
    pub id: Uuid,
    /// Owning series; NULL until the release is matched to one
    pub series_id: Option<Uuid>,
    /// Raw display name from the feed, e.g. "[Group] Show - 01 [1080p].mkv"
    pub name: String,
    /// Source locator, unique per release
    pub url: String,
    pub acquired: bool,
    pub acquired_at: Option<DateTime<Utc>>,
    pub skipped_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl sqlx::FromRow<'_, sqlx::sqlite::SqliteRow> for ReleaseRecord {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> sqlx::Result<Self> {
        use sqlx::Row;

        let id_str: String = row.try_get("id")?;
        let series_id_str: Option<String> = row.try_get("series_id")?;
        let acquired_int: i32 = row.try_get("acquired")?;
        let acquired_at_str: Option<String> = row.try_get("acquired_at")?;
        let created_str: String = row.try_get("created_at")?;

        Ok(Self {
            id: str_to_uuid(&id_str).map_err(|e| sqlx::Error::Decode(e.into()))?,
            series_id: str_to_uuid_opt(series_id_str.as_deref())
                .map_err(|e| sqlx::Error::Decode(e.into()))?,
            name: row.try_get("name")?,
            url: row.try_get("url")?,
            acquired: int_to_bool(acquired_int),
            acquired_at: str_to_datetime_opt(acquired_at_str.as_deref())
                .map_err(|e| sqlx::Error::Decode(e.into()))?,
            skipped_reason: row.try_get("skipped_reason")?,
            created_at: str_to_datetime(&created_str).map_err(|e| sqlx::Error::Decode(e.into()))?,
        })
    }
}

/// Input for recording a newly observed release
#[derive(Debug)]
pub struct CreateRelease {
    pub series_id: Option<Uuid>,
    pub name: String,
    pub url: String,
}

/// Release repository for database operations
pub struct ReleaseRepository {
    pool: SqlitePool,
}

impl ReleaseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a release, or return the existing row for the same url.
    ///
    /// Re-observation updates the display name (feeds occasionally retitle
    /// entries) but never touches the acquired flag.
    pub async fn upsert_by_url(&self, input: CreateRelease) -> Result<ReleaseRecord> {
        if let Some(existing) = self.get_by_url(&input.url).await? {
            sqlx::query("UPDATE releases SET name = ?2 WHERE url = ?1")
                .bind(&input.url)
                .bind(&input.name)
                .execute(&self.pool)
                .await?;

            return self
                .get_by_url(&input.url)
                .await?
                .ok_or_else(|| anyhow::anyhow!("Release vanished during upsert: {}", existing.url));
        }

        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO releases (id, series_id, name, url, acquired, created_at)
            VALUES (?1, ?2, ?3, ?4, 0, ?5)
            "#,
        )
        .bind(uuid_to_str(id))
        .bind(input.series_id.map(uuid_to_str))
        .bind(&input.name)
        .bind(&input.url)
        .bind(now_iso8601())
        .execute(&self.pool)
        .await?;

        self.get_by_url(&input.url)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve release after insert"))
    }

    /// Get a release by its source url
    pub async fn get_by_url(&self, url: &str) -> Result<Option<ReleaseRecord>> {
        let record = sqlx::query_as::<_, ReleaseRecord>("SELECT * FROM releases WHERE url = ?1")
            .bind(url)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    /// Get a release by ID
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<ReleaseRecord>> {
        let record = sqlx::query_as::<_, ReleaseRecord>("SELECT * FROM releases WHERE id = ?1")
            .bind(uuid_to_str(id))
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    /// All acquired releases for a series.
    ///
    /// Ordered by url so first-match scans over the result are deterministic
    /// for a fixed ledger snapshot.
    pub async fn find_acquired(&self, series_id: Uuid) -> Result<Vec<ReleaseRecord>> {
        let records = sqlx::query_as::<_, ReleaseRecord>(
            r#"
            SELECT * FROM releases
            WHERE series_id = ?1 AND acquired = 1
            ORDER BY url ASC
            "#,
        )
        .bind(uuid_to_str(series_id))
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Flag a release as acquired. One-way: there is no inverse operation.
    pub async fn mark_acquired(&self, id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE releases
            SET acquired = 1,
                acquired_at = COALESCE(acquired_at, ?2),
                skipped_reason = NULL
            WHERE id = ?1
            "#,
        )
        .bind(uuid_to_str(id))
        .bind(now_iso8601())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Record why a release was not handed to the download trigger
    pub async fn mark_skipped(&self, id: Uuid, reason: &str) -> Result<()> {
        sqlx::query("UPDATE releases SET skipped_reason = ?2 WHERE id = ?1 AND acquired = 0")
            .bind(uuid_to_str(id))
            .bind(reason)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Tie a release to its resolved series
    pub async fn assign_series(&self, id: Uuid, series_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE releases SET series_id = ?2 WHERE id = ?1")
            .bind(uuid_to_str(id))
            .bind(uuid_to_str(series_id))
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// All releases for a series, acquired or not
    pub async fn list_by_series(&self, series_id: Uuid) -> Result<Vec<ReleaseRecord>> {
        let records = sqlx::query_as::<_, ReleaseRecord>(
            "SELECT * FROM releases WHERE series_id = ?1 ORDER BY created_at ASC",
        )
        .bind(uuid_to_str(series_id))
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}
