//! Final run summary.

use std::fmt;
use std::time::Duration;

/// How many failures the human-readable summary lists before truncating.
const SHOWN_FAILURES: usize = 10;

/// One failed item: URL (or raw input line) and reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureDetail {
    pub url: String,
    pub reason: String,
}

/// Counts for one completed run. `succeeded + failed + skipped == total`.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Entries considered: valid (deduplicated) plus invalid lines.
    pub total: usize,
    pub succeeded: usize,
    /// Fetch failures plus invalid input lines.
    pub failed: usize,
    /// Already succeeded in an earlier run.
    pub skipped: usize,
    /// Invalid input lines, counted in `failed`. They go to the ledger as
    /// comments only, so a retry run never sees them.
    pub invalid: usize,
    pub duration: Duration,
    /// Failure details in input order.
    pub failures: Vec<FailureDetail>,
}

impl RunSummary {
    /// Successes over attempted items (excludes skipped), as a percentage.
    pub fn success_rate(&self) -> f64 {
        let attempted = self.succeeded + self.failed;
        if attempted == 0 {
            return 100.0;
        }
        self.succeeded as f64 / attempted as f64 * 100.0
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Bulk download summary")?;
        writeln!(f, "  total:     {}", self.total)?;
        writeln!(f, "  succeeded: {}", self.succeeded)?;
        writeln!(f, "  failed:    {}", self.failed)?;
        writeln!(f, "  skipped:   {}", self.skipped)?;
        if self.invalid > 0 {
            writeln!(f, "  invalid:   {} (not retried)", self.invalid)?;
        }
        writeln!(f, "  success:   {:.1}%", self.success_rate())?;
        write!(f, "  duration:  {:.1}s", self.duration.as_secs_f64())?;
        if !self.failures.is_empty() {
            write!(f, "\nFailed:")?;
            for d in self.failures.iter().take(SHOWN_FAILURES) {
                write!(f, "\n  - {} - {}", d.url, d.reason)?;
            }
            if self.failures.len() > SHOWN_FAILURES {
                write!(f, "\n  ... and {} more", self.failures.len() - SHOWN_FAILURES)?;
            }
        }
        Ok(())
    }
}
