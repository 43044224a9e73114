//! Retry ledger: the failed URLs of the most recent completed run.
//!
//! Plain text in the same format as the input list, so it can be edited by
//! hand or fed back with `postbatch retry`. Every completed run replaces the
//! whole file atomically (temp file in the same directory, fsync, rename);
//! it is never appended to.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::url_model::{parse_url_list, BaseDomain, InvalidLine, ParsedList, UrlEntry};

/// Ledger read/write failure. Treated as store-level fatal by the orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("retry ledger {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Handle to the ledger file. The ledger is its only writer.
#[derive(Debug, Clone)]
pub struct RetryLedger {
    path: PathBuf,
}

impl RetryLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> LedgerError {
        LedgerError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Replace the ledger with this run's failures.
    ///
    /// `entries` are written as normalized URLs in the given order; invalid
    /// input lines are kept as comments so they stay visible without being
    /// retried. An empty call still rewrites the file, which clears entries
    /// that succeeded on retry.
    pub fn record_failures(
        &self,
        entries: &[UrlEntry],
        invalid: &[InvalidLine],
    ) -> Result<(), LedgerError> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|e| self.io_err(e))?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| self.io_err(e))?;
        {
            let f = tmp.as_file_mut();
            let mut write = || -> std::io::Result<()> {
                writeln!(f, "# Failed URLs - you can retry these")?;
                writeln!(
                    f,
                    "# {} failed, {} invalid line(s)",
                    entries.len(),
                    invalid.len()
                )?;
                for e in entries {
                    writeln!(f, "{}", e.normalized)?;
                }
                for line in invalid {
                    writeln!(f, "# invalid line {}: {} ({})", line.line_no, line.raw, line.error)?;
                }
                f.flush()?;
                f.sync_all()
            };
            write().map_err(|e| self.io_err(e))?;
        }
        tmp.persist(&self.path).map_err(|e| self.io_err(e.error))?;
        sync_dir(&dir);

        tracing::info!(
            path = %self.path.display(),
            failed = entries.len(),
            invalid = invalid.len(),
            "retry ledger replaced"
        );
        Ok(())
    }

    /// Entries from the last recorded run. A missing ledger is empty, not an error.
    pub fn load(&self, base: &BaseDomain) -> Result<ParsedList, LedgerError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ParsedList::default()),
            Err(e) => return Err(self.io_err(e)),
        };
        Ok(parse_url_list(&text, base))
    }
}

/// Persist the rename itself. Best effort; not every filesystem supports it.
fn sync_dir(dir: &Path) {
    if !cfg!(unix) {
        return;
    }
    if let Ok(d) = std::fs::File::open(dir) {
        let _ = d.sync_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::url_model::{normalize, ParseError};

    fn base() -> BaseDomain {
        BaseDomain::parse("https://host").unwrap()
    }

    fn entry(path: &str) -> UrlEntry {
        normalize(path, &base()).unwrap()
    }

    #[test]
    fn missing_ledger_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = RetryLedger::new(dir.path().join("failed_urls.txt"));
        let parsed = ledger.load(&base()).unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn record_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = RetryLedger::new(dir.path().join("failed_urls.txt"));
        let failed = vec![entry("/explore/P2?xsec_token=T"), entry("/explore/P4")];
        ledger.record_failures(&failed, &[]).unwrap();

        let loaded = ledger.load(&base()).unwrap();
        let urls: Vec<&str> = loaded.entries.iter().map(|e| e.normalized.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://host/explore/P2?xsec_token=T", "https://host/explore/P4"]
        );
        assert!(loaded.invalid.is_empty());
    }

    #[test]
    fn record_replaces_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = RetryLedger::new(dir.path().join("failed_urls.txt"));
        ledger
            .record_failures(&[entry("/explore/P2"), entry("/explore/P4")], &[])
            .unwrap();
        ledger.record_failures(&[entry("/explore/P4")], &[]).unwrap();
        let loaded = ledger.load(&base()).unwrap();
        assert_eq!(loaded.entries.len(), 1);
        assert_eq!(loaded.entries[0].normalized, "https://host/explore/P4");

        ledger.record_failures(&[], &[]).unwrap();
        assert!(ledger.load(&base()).unwrap().entries.is_empty());
        // No stray temp files left next to the ledger.
        let files: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn invalid_lines_kept_as_comments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("failed_urls.txt");
        let ledger = RetryLedger::new(&path);
        let invalid = vec![InvalidLine {
            line_no: 5,
            raw: "not-a-url".to_string(),
            error: ParseError::Malformed("not-a-url".to_string()),
        }];
        ledger.record_failures(&[entry("/explore/P1")], &invalid).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("# invalid line 5: not-a-url"));
        let loaded = ledger.load(&base()).unwrap();
        assert_eq!(loaded.entries.len(), 1);
        assert!(loaded.invalid.is_empty());
    }

    #[test]
    fn creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = RetryLedger::new(dir.path().join("nested/state/failed.txt"));
        ledger.record_failures(&[entry("/explore/P9")], &[]).unwrap();
        assert_eq!(ledger.load(&base()).unwrap().entries.len(), 1);
    }
}
