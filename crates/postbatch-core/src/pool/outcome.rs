//! Per-entry outcomes.

use crate::fetch::PostResult;
use crate::url_model::UrlEntry;

/// Terminal result of one entry in one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Success(PostResult),
    Failure { reason: String, attempts: u32 },
    /// Already succeeded in an earlier run; not fetched.
    Skipped,
}

impl DownloadOutcome {
    pub fn failure(reason: impl Into<String>) -> Self {
        DownloadOutcome::Failure {
            reason: reason.into(),
            attempts: 1,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DownloadOutcome::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, DownloadOutcome::Failure { .. })
    }
}

/// An outcome paired with its entry; the pool emits these in completion order.
#[derive(Debug, Clone)]
pub struct ItemOutcome {
    pub entry: UrlEntry,
    pub outcome: DownloadOutcome,
}
