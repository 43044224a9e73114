//! Record operations: pending insert, upsert, lookups.

use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::db::{unix_timestamp, MetadataStore};
use super::error::StoreError;
use super::types::{RecordStatus, RecordUpdate, RunRecord, StatusCounts};
use crate::fetch::PostMetadata;
use crate::url_model::{PostIdentifier, UrlEntry};

const RECORD_COLUMNS: &str = "post_key, url, author_id, post_id, status, metadata_json, \
                              last_error, attempts, created_at, last_attempt_at";

fn row_to_record(row: &SqliteRow) -> Result<RunRecord, StoreError> {
    let key: String = row.get("post_key");
    let metadata_json: Option<String> = row.get("metadata_json");
    let metadata = metadata_json
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(|s| serde_json::from_str::<PostMetadata>(s))
        .transpose()
        .map_err(|source| StoreError::CorruptMetadata {
            key: key.clone(),
            source,
        })?;
    let status_str: String = row.get("status");

    Ok(RunRecord {
        key,
        url: row.get("url"),
        author_id: row.get("author_id"),
        post_id: row.get("post_id"),
        status: RecordStatus::from_str(&status_str),
        metadata,
        last_error: row.get("last_error"),
        attempts: row.get("attempts"),
        created_at: row.get("created_at"),
        last_attempt_at: row.get("last_attempt_at"),
    })
}

impl MetadataStore {
    /// Insert a `pending` row for the entry unless one already exists.
    /// Existing rows (including their status) are left untouched.
    pub async fn ensure_pending(&self, entry: &UrlEntry) -> Result<(), StoreError> {
        let now = unix_timestamp();
        sqlx::query(
            r#"
            INSERT INTO posts (post_key, url, author_id, post_id, status, attempts, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)
            ON CONFLICT(post_key) DO NOTHING
            "#,
        )
        .bind(entry.key())
        .bind(&entry.normalized)
        .bind(entry.id.author_id())
        .bind(entry.id.post_id())
        .bind(RecordStatus::Pending.as_str())
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Atomically create or update the record for `entry`.
    ///
    /// A single `INSERT .. ON CONFLICT DO UPDATE` statement, so concurrent
    /// upserts for one key are serialized by SQLite and the last one to
    /// complete wins. Increments `attempts`; a `None` metadata keeps the
    /// previously stored metadata.
    pub async fn upsert(&self, entry: &UrlEntry, update: &RecordUpdate) -> Result<(), StoreError> {
        let now = unix_timestamp();
        let metadata_json = update
            .metadata
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(StoreError::Encode)?;

        sqlx::query(
            r#"
            INSERT INTO posts (
                post_key, url, author_id, post_id, status,
                metadata_json, last_error, attempts, created_at, last_attempt_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8, ?8)
            ON CONFLICT(post_key) DO UPDATE SET
                url = excluded.url,
                status = excluded.status,
                metadata_json = COALESCE(excluded.metadata_json, posts.metadata_json),
                last_error = excluded.last_error,
                attempts = posts.attempts + 1,
                last_attempt_at = excluded.last_attempt_at
            "#,
        )
        .bind(entry.key())
        .bind(&entry.normalized)
        .bind(entry.id.author_id())
        .bind(entry.id.post_id())
        .bind(update.status.as_str())
        .bind(metadata_json)
        .bind(&update.last_error)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// True if the post's last recorded outcome was a success.
    pub async fn is_succeeded(&self, id: &PostIdentifier) -> Result<bool, StoreError> {
        let row = sqlx::query(r#"SELECT status FROM posts WHERE post_key = ?1"#)
            .bind(id.key())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row
            .map(|r| RecordStatus::from_str(&r.get::<String, _>("status")) == RecordStatus::Succeeded)
            .unwrap_or(false))
    }

    /// Fetch a single record.
    pub async fn get(&self, id: &PostIdentifier) -> Result<Option<RunRecord>, StoreError> {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM posts WHERE post_key = ?1");
        let row = sqlx::query(&sql)
            .bind(id.key())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_record).transpose()
    }

    /// Every record in the store; no particular order.
    pub async fn load_all(&self) -> Result<Vec<RunRecord>, StoreError> {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM posts");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_record).collect()
    }

    /// Records not yet succeeded, most recently attempted first.
    pub async fn list_unfinished(&self) -> Result<Vec<RunRecord>, StoreError> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM posts WHERE status != ?1 \
             ORDER BY last_attempt_at DESC, post_key ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(RecordStatus::Succeeded.as_str())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_record).collect()
    }

    pub async fn count_by_status(&self) -> Result<StatusCounts, StoreError> {
        let rows = sqlx::query(r#"SELECT status, COUNT(*) AS n FROM posts GROUP BY status"#)
            .fetch_all(&self.pool)
            .await?;
        let mut counts = StatusCounts::default();
        for row in rows {
            let status: String = row.get("status");
            let n: i64 = row.get("n");
            let n = n.max(0) as u64;
            match RecordStatus::from_str(&status) {
                RecordStatus::Pending => counts.pending += n,
                RecordStatus::Succeeded => counts.succeeded += n,
                RecordStatus::Failed => counts.failed += n,
            }
        }
        Ok(counts)
    }
}
