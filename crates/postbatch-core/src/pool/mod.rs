//! Bounded worker pool.
//!
//! Keeps exactly `concurrency` fetches in flight while entries remain and
//! emits one outcome per entry, in completion order, over an mpsc channel.
//! Per-item errors, panics and timeouts are converted to `Failure` here and
//! never reach the caller as errors.

mod concurrency;
mod outcome;
mod worker;

pub use concurrency::{Concurrency, InvalidConcurrency};
pub use outcome::{DownloadOutcome, ItemOutcome};
pub use worker::WorkerPool;
