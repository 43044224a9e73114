//! Run-level errors.

use crate::metadata_store::StoreError;
use crate::retry_ledger::LedgerError;
use crate::url_model::ParseError;

/// Why a run did not reach `Done`. Item-level failures are never errors;
/// they are counted in the summary and written to the retry ledger.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// The URL list could not be read.
    #[error("{0:#}")]
    Input(anyhow::Error),
    #[error("base domain: {0}")]
    BaseDomain(ParseError),
    /// Metadata store failed; resumability can no longer be guaranteed.
    #[error(transparent)]
    StoreFatal(#[from] StoreError),
    /// Retry ledger could not be read or replaced.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    /// User abort; the retry ledger was left unchanged.
    #[error("run cancelled after {completed} item(s); retry ledger left unchanged")]
    Cancelled { completed: usize },
}

impl RunError {
    /// True for durable-storage failures (store or ledger). The CLI maps
    /// these to a distinct exit status.
    pub fn is_store_fatal(&self) -> bool {
        matches!(self, RunError::StoreFatal(_) | RunError::Ledger(_))
    }
}
