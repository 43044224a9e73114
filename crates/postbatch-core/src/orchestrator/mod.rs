//! Bulk download orchestrator.
//!
//! Turns a URL list into a bounded-concurrency, resumable batch:
//! url_model → filter against metadata_store → pool → metadata_store +
//! progress → retry_ledger → [`RunSummary`].

mod error;
mod phase;
mod summary;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use crate::control::RunControl;
use crate::fetch::PostFetcher;
use crate::metadata_store::{MetadataStore, RecordUpdate, StoreError};
use crate::pool::{Concurrency, DownloadOutcome, ItemOutcome, WorkerPool};
use crate::progress::{ProgressReporter, ProgressSnapshot};
use crate::retry_ledger::RetryLedger;
use crate::url_model::{load_url_file, BaseDomain, InvalidLine, ParsedList, UrlEntry};

pub use error::RunError;
pub use phase::RunPhase;
pub use summary::{FailureDetail, RunSummary};

/// Where a run takes its entries from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Read the input URL list.
    #[default]
    Fresh,
    /// Read the retry ledger written by the previous run.
    RetryFailedOnly,
}

/// Parameters for one run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub mode: RunMode,
    /// URL list read in `Fresh` mode.
    pub input: PathBuf,
    /// Prefix for relative (`/path`) lines.
    pub base_domain: String,
    pub concurrency: Concurrency,
    /// Fetch every entry even if it already succeeded.
    pub force_refetch: bool,
    /// Per-item ceiling enforced by the worker pool.
    pub item_timeout: Option<Duration>,
}

impl RunOptions {
    pub fn new(input: impl Into<PathBuf>, base_domain: impl Into<String>) -> Self {
        Self {
            mode: RunMode::Fresh,
            input: input.into(),
            base_domain: base_domain.into(),
            concurrency: Concurrency::default(),
            force_refetch: false,
            item_timeout: None,
        }
    }
}

/// State owned by one run; nothing here outlives `Orchestrator::run`.
struct BatchRun {
    phase: RunPhase,
    started: Instant,
    total: usize,
    succeeded: usize,
    skipped: usize,
    /// Input position of every valid entry, for ordering the failures.
    positions: HashMap<String, usize>,
    failed_entries: Vec<(usize, UrlEntry, String)>,
    invalid: Vec<InvalidLine>,
    completed: usize,
}

impl BatchRun {
    fn new() -> Self {
        Self {
            phase: RunPhase::Loading,
            started: Instant::now(),
            total: 0,
            succeeded: 0,
            skipped: 0,
            positions: HashMap::new(),
            failed_entries: Vec::new(),
            invalid: Vec::new(),
            completed: 0,
        }
    }

    fn enter(&mut self, next: RunPhase) {
        debug_assert!(self.phase.can_enter(next), "{} -> {}", self.phase, next);
        tracing::info!(from = %self.phase, to = %next, "run phase");
        self.phase = next;
    }

    fn apply(&mut self, item: ItemOutcome) {
        self.completed += 1;
        match item.outcome {
            DownloadOutcome::Success(_) => self.succeeded += 1,
            DownloadOutcome::Failure { reason, .. } => {
                let pos = self
                    .positions
                    .get(&item.entry.normalized)
                    .copied()
                    .unwrap_or(usize::MAX);
                self.failed_entries.push((pos, item.entry, reason));
            }
            DownloadOutcome::Skipped => self.skipped += 1,
        }
    }

    fn failed(&self) -> usize {
        self.failed_entries.len() + self.invalid.len()
    }

    /// Failures are listed in input order, then invalid lines.
    fn into_summary(self) -> RunSummary {
        let failed = self.failed();
        let mut failures: Vec<FailureDetail> = self
            .failed_entries
            .iter()
            .map(|(_, e, reason)| FailureDetail {
                url: e.normalized.clone(),
                reason: reason.clone(),
            })
            .collect();
        failures.extend(self.invalid.iter().map(|l| FailureDetail {
            url: l.raw.clone(),
            reason: l.error.to_string(),
        }));
        RunSummary {
            total: self.total,
            succeeded: self.succeeded,
            failed,
            skipped: self.skipped,
            invalid: self.invalid.len(),
            duration: self.started.elapsed(),
            failures,
        }
    }
}

/// Wires the URL list, metadata store, worker pool, progress reporting and
/// retry ledger into one run. Reusable across runs; each `run` call owns
/// its own state.
pub struct Orchestrator {
    store: MetadataStore,
    ledger: RetryLedger,
    fetcher: Arc<dyn PostFetcher>,
    control: Arc<RunControl>,
    progress_tx: Option<mpsc::Sender<ProgressSnapshot>>,
}

impl Orchestrator {
    pub fn new(store: MetadataStore, ledger: RetryLedger, fetcher: Arc<dyn PostFetcher>) -> Self {
        Self {
            store,
            ledger,
            fetcher,
            control: Arc::new(RunControl::new()),
            progress_tx: None,
        }
    }

    /// Progress snapshots are sent with `try_send`; a full channel drops them.
    pub fn with_progress(mut self, tx: mpsc::Sender<ProgressSnapshot>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    pub fn with_control(mut self, control: Arc<RunControl>) -> Self {
        self.control = control;
        self
    }

    pub fn ledger(&self) -> &RetryLedger {
        &self.ledger
    }

    pub fn store(&self) -> &MetadataStore {
        &self.store
    }

    /// Run one batch to completion.
    ///
    /// Item failures never make this return `Err`; they are counted and
    /// written to the retry ledger. `Err` means the run was aborted (store
    /// failure, unreadable input, or user cancel) and the ledger was left
    /// untouched.
    pub async fn run(&self, opts: &RunOptions) -> Result<RunSummary, RunError> {
        let mut run = BatchRun::new();
        match self.execute(&mut run, opts).await {
            Ok(()) => {
                let summary = run.into_summary();
                tracing::info!(
                    total = summary.total,
                    succeeded = summary.succeeded,
                    failed = summary.failed,
                    skipped = summary.skipped,
                    duration_ms = summary.duration.as_millis() as u64,
                    "run done"
                );
                debug_assert_eq!(
                    summary.succeeded + summary.failed + summary.skipped,
                    summary.total
                );
                Ok(summary)
            }
            Err(e) => {
                run.enter(RunPhase::Aborted);
                tracing::error!(phase = %run.phase, completed = run.completed, "run aborted: {}", e);
                Err(e)
            }
        }
    }

    async fn execute(&self, run: &mut BatchRun, opts: &RunOptions) -> Result<(), RunError> {
        let parsed = self.load(opts)?;
        run.total = parsed.entries.len() + parsed.invalid.len();
        for line in &parsed.invalid {
            tracing::warn!(line = line.line_no, raw = %line.raw, "skipping invalid line: {}", line.error);
        }
        run.invalid = parsed.invalid;
        for (i, e) in parsed.entries.iter().enumerate() {
            run.positions.entry(e.normalized.clone()).or_insert(i);
        }
        self.cancel_point(run)?;

        run.enter(RunPhase::Filtering);
        let to_run = self.filter(run, parsed.entries, opts.force_refetch).await?;
        self.cancel_point(run)?;

        run.enter(RunPhase::Running);
        let drained = self.run_pool(run, to_run, opts).await?;
        // An abort that lands after the last dispatch cost nothing; keep the results.
        if !drained {
            self.cancel_point(run)?;
        }

        run.enter(RunPhase::Finalizing);
        run.failed_entries.sort_by_key(|(pos, _, _)| *pos);
        let failed: Vec<UrlEntry> = run
            .failed_entries
            .iter()
            .map(|(_, e, _)| e.clone())
            .collect();
        self.ledger.record_failures(&failed, &run.invalid)?;

        run.enter(RunPhase::Done);
        Ok(())
    }

    fn cancel_point(&self, run: &BatchRun) -> Result<(), RunError> {
        self.control.check().map_err(|_| RunError::Cancelled {
            completed: run.completed,
        })
    }

    fn load(&self, opts: &RunOptions) -> Result<ParsedList, RunError> {
        let base = BaseDomain::parse(&opts.base_domain).map_err(RunError::BaseDomain)?;
        let parsed = match opts.mode {
            RunMode::Fresh => load_url_file(&opts.input, &base).map_err(RunError::Input)?,
            RunMode::RetryFailedOnly => {
                let parsed = self.ledger.load(&base)?;
                tracing::info!(
                    path = %self.ledger.path().display(),
                    entries = parsed.entries.len(),
                    "loaded retry ledger"
                );
                parsed
            }
        };
        Ok(parsed)
    }

    /// Drop entries that already succeeded (unless forced).
    async fn filter(
        &self,
        run: &mut BatchRun,
        entries: Vec<UrlEntry>,
        force_refetch: bool,
    ) -> Result<Vec<UrlEntry>, RunError> {
        if force_refetch {
            return Ok(entries);
        }
        let mut to_run = Vec::with_capacity(entries.len());
        for entry in entries {
            if self.store.is_succeeded(&entry.id).await? {
                tracing::debug!(url = %entry.normalized, "already downloaded; skipping");
                run.apply(ItemOutcome {
                    entry,
                    outcome: DownloadOutcome::Skipped,
                });
            } else {
                to_run.push(entry);
            }
        }
        Ok(to_run)
    }

    /// Returns whether every entry in `to_run` was dispatched and reported.
    ///
    /// A store row is created as `Pending` only when its entry is handed to
    /// a worker, so an aborted run leaves no rows for entries it never
    /// started.
    async fn run_pool(
        &self,
        run: &mut BatchRun,
        to_run: Vec<UrlEntry>,
        opts: &RunOptions,
    ) -> Result<bool, RunError> {
        if to_run.is_empty() {
            return Ok(true);
        }
        let expected = to_run.len();

        let mut progress = ProgressReporter::new(expected);
        tracing::info!(
            entries = expected,
            concurrency = %opts.concurrency,
            "starting worker pool"
        );
        let (dispatch_tx, mut dispatch_rx) = mpsc::unbounded_channel();
        let pool = WorkerPool::new(Arc::clone(&self.fetcher), opts.concurrency)
            .with_item_timeout(opts.item_timeout)
            .with_control(Arc::clone(&self.control))
            .with_dispatch_notify(dispatch_tx);
        let (mut rx, handle) = pool.spawn(to_run);
        let mut dispatch_open = true;

        loop {
            // Dispatch notices first: an entry's notice is always queued
            // before its outcome, so its row exists before the upsert.
            let step = tokio::select! {
                biased;
                notice = dispatch_rx.recv(), if dispatch_open => match notice {
                    Some(entry) => self.store.ensure_pending(&entry).await,
                    None => {
                        dispatch_open = false;
                        Ok(())
                    }
                },
                item = rx.recv() => match item {
                    Some(item) => {
                        let recorded = self.record(&item).await;
                        if recorded.is_ok() {
                            let snapshot = progress.on_outcome(&item.entry.normalized, &item.outcome);
                            if let Some(tx) = &self.progress_tx {
                                let _ = tx.try_send(snapshot);
                            }
                            run.apply(item);
                        }
                        recorded
                    }
                    None => break,
                },
            };
            if let Err(e) = step {
                // Stop intake; the pool sees the closed channel and submits
                // nothing new. In-flight fetches finish on their own.
                drop(rx);
                drop(dispatch_rx);
                if let Err(join) = handle.await {
                    tracing::error!("worker pool join: {}", join);
                }
                return Err(e.into());
            }
        }

        match handle.await {
            Ok(dispatched) => {
                tracing::debug!(dispatched, "worker pool finished");
                Ok(dispatched == expected)
            }
            Err(e) => {
                tracing::error!("worker pool join: {}", e);
                Ok(false)
            }
        }
    }

    /// Persist one outcome. Called only after the fetch has finished.
    async fn record(&self, item: &ItemOutcome) -> Result<(), StoreError> {
        match &item.outcome {
            DownloadOutcome::Success(post) => {
                tracing::info!(
                    url = %item.entry.normalized,
                    title = post.metadata.title.as_deref().unwrap_or("-"),
                    media = post.media_count(),
                    "downloaded"
                );
                self.store
                    .upsert(&item.entry, &RecordUpdate::succeeded(post.metadata.clone()))
                    .await
            }
            DownloadOutcome::Failure { reason, attempts } => {
                tracing::warn!(url = %item.entry.normalized, attempts, "failed: {}", reason);
                self.store
                    .upsert(&item.entry, &RecordUpdate::failed(reason.clone()))
                    .await
            }
            DownloadOutcome::Skipped => Ok(()),
        }
    }
}
