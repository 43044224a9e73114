//! SQLite-backed metadata store: connection, migrations, timestamps.
//!
//! Record reads and writes live in `records`.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::error::StoreError;

/// How long a writer waits on a locked database before the write fails.
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// Handle to the SQLite-backed metadata store.
///
/// The database file lives under the XDG state directory:
/// `~/.local/state/postbatch/posts.db` on Linux. Cloning shares the pool.
#[derive(Clone)]
pub struct MetadataStore {
    pub(crate) pool: Pool<Sqlite>,
}

impl MetadataStore {
    /// Open (or create) the default store and run migrations.
    pub async fn open_default() -> Result<Self, StoreError> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("postbatch")
            .map_err(|e| StoreError::StateDir(e.to_string()))?;
        let db_path = xdg_dirs
            .place_state_file("posts.db")
            .map_err(|e| StoreError::StateDir(e.to_string()))?;
        Self::open_at(db_path).await
    }

    /// Open (or create) the store at a specific path. Creates parent dirs if needed.
    pub async fn open_at(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| StoreError::Dir {
                    path: parent.display().to_string(),
                    source,
                })?;
        }
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);
        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(options)
            .await?;
        let store = MetadataStore { pool };
        store.migrate().await?;
        tracing::debug!(path = %path.display(), "metadata store opened");
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        // - `post_key` is `PostIdentifier::key()`; query tokens never reach it.
        // - `metadata_json` holds the last successfully fetched `PostMetadata`.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS posts (
                post_key TEXT PRIMARY KEY NOT NULL,
                url TEXT NOT NULL,
                author_id TEXT,
                post_id TEXT,
                status TEXT NOT NULL,
                metadata_json TEXT,
                last_error TEXT,
                attempts INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL,
                last_attempt_at INTEGER NOT NULL DEFAULT 0
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Close the pool, waiting for in-flight statements.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Current time as Unix seconds (for DB timestamps).
pub(crate) fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

#[cfg(test)]
/// Open an in-memory store for tests (no disk I/O).
pub(crate) async fn open_memory() -> Result<MetadataStore, StoreError> {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    let store = MetadataStore { pool };
    store.migrate().await?;
    Ok(store)
}
