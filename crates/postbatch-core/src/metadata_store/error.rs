//! Store-level errors. Any of these aborts a run.

/// Durable storage failed (unreachable, locked, corrupt row).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("metadata store: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("metadata store: create dir {path}: {source}")]
    Dir {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("metadata store: state dir: {0}")]
    StateDir(String),
    #[error("metadata store: corrupt metadata for {key}: {source}")]
    CorruptMetadata {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("metadata store: encode metadata: {0}")]
    Encode(#[source] serde_json::Error),
}
