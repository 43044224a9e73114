//! Run control: a shared abort token for user-initiated cancellation.
//!
//! The CLI wires Ctrl-C to [`RunControl::request_abort`]. The worker pool
//! stops submitting new entries once the token is set; fetches already in
//! flight finish (or time out) and their outcomes are still recorded.

use std::sync::atomic::{AtomicBool, Ordering};

/// Error returned when a run is stopped by the user.
#[derive(Debug)]
pub struct RunAborted;

impl std::fmt::Display for RunAborted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "run aborted by user")
    }
}

impl std::error::Error for RunAborted {}

/// Shared abort token for one run. Wrap in `Arc` to share.
#[derive(Debug, Default)]
pub struct RunControl {
    aborted: AtomicBool,
}

impl RunControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the run to stop submitting work. Idempotent.
    pub fn request_abort(&self) {
        if !self.aborted.swap(true, Ordering::AcqRel) {
            tracing::info!("abort requested; waiting for in-flight fetches");
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::Acquire)
    }

    /// `Err(RunAborted)` once abort has been requested.
    pub fn check(&self) -> Result<(), RunAborted> {
        if self.is_aborted() {
            Err(RunAborted)
        } else {
            Ok(())
        }
    }
}
