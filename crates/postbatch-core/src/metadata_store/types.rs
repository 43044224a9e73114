//! Types used by the metadata store.

use crate::fetch::PostMetadata;

/// Processing state of one post, stored as a string in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordStatus {
    Pending,
    Succeeded,
    Failed,
}

impl RecordStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordStatus::Pending => "pending",
            RecordStatus::Succeeded => "succeeded",
            RecordStatus::Failed => "failed",
        }
    }

    /// Unknown strings map to `Failed` so the post is retried rather than skipped.
    pub fn from_str(s: &str) -> Self {
        match s {
            "pending" => RecordStatus::Pending,
            "succeeded" => RecordStatus::Succeeded,
            _ => RecordStatus::Failed,
        }
    }
}

/// Full row as stored.
#[derive(Debug, Clone)]
pub struct RunRecord {
    /// `PostIdentifier::key()`.
    pub key: String,
    /// Normalized URL of the most recent attempt.
    pub url: String,
    pub author_id: Option<String>,
    pub post_id: Option<String>,
    pub status: RecordStatus,
    pub metadata: Option<PostMetadata>,
    pub last_error: Option<String>,
    /// Completed attempts across all runs.
    pub attempts: i64,
    pub created_at: i64,
    /// Unix seconds of the last upsert (0 while still pending).
    pub last_attempt_at: i64,
}

/// Fields written by one upsert.
#[derive(Debug, Clone)]
pub struct RecordUpdate {
    pub status: RecordStatus,
    /// `None` keeps whatever metadata the row already has.
    pub metadata: Option<PostMetadata>,
    pub last_error: Option<String>,
}

impl RecordUpdate {
    pub fn succeeded(metadata: PostMetadata) -> Self {
        Self {
            status: RecordStatus::Succeeded,
            metadata: Some(metadata),
            last_error: None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            status: RecordStatus::Failed,
            metadata: None,
            last_error: Some(reason.into()),
        }
    }
}

/// Row counts per status (for `postbatch status`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub pending: u64,
    pub succeeded: u64,
    pub failed: u64,
}

impl StatusCounts {
    pub fn total(&self) -> u64 {
        self.pending + self.succeeded + self.failed
    }
}
