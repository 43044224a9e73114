//! Retry and backoff policy for the HTTP fetcher.
//!
//! Classifies single-attempt failures (timeouts, throttling, connection
//! errors) and decides exponential backoff, so transient failures are
//! absorbed inside one fetch and only persistent ones reach the retry ledger.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::{classify, classify_curl_error, classify_http_status};
pub use error::AttemptError;
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::run_with_retry;
