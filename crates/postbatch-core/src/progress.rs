//! Run progress: completed count, percentage, throughput-based ETA.
//!
//! The orchestrator feeds every outcome to a [`ProgressReporter`] in
//! completion order and forwards the resulting [`ProgressSnapshot`]s to the
//! CLI; consumers compute rate = completed / elapsed and
//! ETA = remaining / rate.

use std::time::Instant;

use crate::pool::DownloadOutcome;

/// Point-in-time view of a run (CLI-friendly).
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    /// Items finished so far (monotonically increasing within a run).
    pub completed: usize,
    /// Items submitted to the worker pool.
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Seconds since the reporter was created.
    pub elapsed_secs: f64,
    /// URL of the item that just finished.
    pub last_url: Option<String>,
}

impl ProgressSnapshot {
    /// Fraction complete in [0.0, 1.0].
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.completed as f64 / self.total as f64).min(1.0)
    }

    /// Completed items per second (0 if elapsed is 0).
    pub fn items_per_sec(&self) -> f64 {
        if self.elapsed_secs <= 0.0 {
            return 0.0;
        }
        self.completed as f64 / self.elapsed_secs
    }

    /// Estimated seconds remaining (None until throughput is known).
    pub fn eta_secs(&self) -> Option<f64> {
        let remaining = self.total.saturating_sub(self.completed);
        if remaining == 0 {
            return Some(0.0);
        }
        let rate = self.items_per_sec();
        if rate <= 0.0 {
            return None;
        }
        Some(remaining as f64 / rate)
    }
}

/// Aggregates outcomes for one run. Not persisted; create a new one per run.
#[derive(Debug)]
pub struct ProgressReporter {
    total: usize,
    completed: usize,
    succeeded: usize,
    failed: usize,
    started: Instant,
}

impl ProgressReporter {
    pub fn new(total: usize) -> Self {
        Self::starting_at(total, Instant::now())
    }

    pub fn starting_at(total: usize, started: Instant) -> Self {
        Self {
            total,
            completed: 0,
            succeeded: 0,
            failed: 0,
            started,
        }
    }

    /// Record one finished item.
    pub fn on_outcome(&mut self, url: &str, outcome: &DownloadOutcome) -> ProgressSnapshot {
        self.completed += 1;
        match outcome {
            DownloadOutcome::Success(_) => self.succeeded += 1,
            DownloadOutcome::Failure { .. } => self.failed += 1,
            DownloadOutcome::Skipped => {}
        }
        let mut snap = self.snapshot();
        snap.last_url = Some(url.to_string());
        snap
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            completed: self.completed,
            total: self.total,
            succeeded: self.succeeded,
            failed: self.failed,
            elapsed_secs: self.started.elapsed().as_secs_f64(),
            last_url: None,
        }
    }
}
