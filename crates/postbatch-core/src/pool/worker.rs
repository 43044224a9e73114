//! The pool driver: a `JoinSet` refilled up to the concurrency ceiling.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};

use super::concurrency::Concurrency;
use super::outcome::{DownloadOutcome, ItemOutcome};
use crate::control::RunControl;
use crate::fetch::PostFetcher;
use crate::url_model::UrlEntry;

/// Fixed-size set of concurrent fetch slots for one run.
pub struct WorkerPool {
    fetcher: Arc<dyn PostFetcher>,
    concurrency: Concurrency,
    item_timeout: Option<Duration>,
    control: Arc<RunControl>,
    dispatch_tx: Option<mpsc::UnboundedSender<UrlEntry>>,
}

impl WorkerPool {
    pub fn new(fetcher: Arc<dyn PostFetcher>, concurrency: Concurrency) -> Self {
        Self {
            fetcher,
            concurrency,
            item_timeout: None,
            control: Arc::new(RunControl::new()),
            dispatch_tx: None,
        }
    }

    /// Reclaim a slot after `timeout`; the outcome is `Failure("timeout")`.
    pub fn with_item_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.item_timeout = timeout;
        self
    }

    pub fn with_control(mut self, control: Arc<RunControl>) -> Self {
        self.control = control;
        self
    }

    /// Each entry is sent on `tx` just before its fetch starts, so the
    /// notice is always queued ahead of that entry's outcome.
    pub fn with_dispatch_notify(mut self, tx: mpsc::UnboundedSender<UrlEntry>) -> Self {
        self.dispatch_tx = Some(tx);
        self
    }

    /// Start processing `entries`. Outcomes arrive on the receiver in
    /// completion order; the handle resolves to the number of entries
    /// actually dispatched once every in-flight fetch has finished.
    ///
    /// Submission stops early when the run is aborted or the receiver is
    /// dropped. Entries are dispatched at most once.
    pub fn spawn(self, entries: Vec<UrlEntry>) -> (mpsc::Receiver<ItemOutcome>, JoinHandle<usize>) {
        // Sized so a send never waits and a slow consumer cannot stall refills.
        let (tx, rx) = mpsc::channel(entries.len().max(1));
        let handle = tokio::spawn(self.drive(entries, tx));
        (rx, handle)
    }

    async fn drive(self, entries: Vec<UrlEntry>, tx: mpsc::Sender<ItemOutcome>) -> usize {
        let limit = self.concurrency.get();
        let total = entries.len();
        let mut pending = entries.into_iter();
        let mut join_set: JoinSet<ItemOutcome> = JoinSet::new();
        let mut dispatched = 0usize;

        tracing::debug!(total, concurrency = limit, "worker pool started");

        loop {
            while join_set.len() < limit && !self.control.is_aborted() && !tx.is_closed() {
                let Some(entry) = pending.next() else {
                    break;
                };
                dispatched += 1;
                if let Some(notify) = &self.dispatch_tx {
                    let _ = notify.send(entry.clone());
                }
                join_set.spawn(run_item(
                    Arc::clone(&self.fetcher),
                    entry,
                    self.item_timeout,
                ));
            }

            let Some(res) = join_set.join_next().await else {
                break;
            };
            match res {
                Ok(item) => {
                    if tx.send(item).await.is_err() {
                        tracing::debug!("outcome receiver dropped; no new submissions");
                    }
                }
                // run_item contains the fetch in its own task, so this only
                // happens if the runtime is shutting down.
                Err(e) => tracing::error!("worker slot join: {}", e),
            }
        }

        if dispatched < total {
            tracing::info!(dispatched, total, "worker pool stopped before dispatching every entry");
        }
        dispatched
    }
}

/// Fetch one entry and turn every failure mode into a `DownloadOutcome`.
async fn run_item(
    fetcher: Arc<dyn PostFetcher>,
    entry: UrlEntry,
    timeout: Option<Duration>,
) -> ItemOutcome {
    let started = Instant::now();
    let url = entry.normalized.clone();
    // Separate task so a panicking fetcher cannot take the slot's entry with it.
    let mut task = tokio::spawn(async move { fetcher.fetch(&url).await });

    let joined = match timeout {
        Some(limit) => match tokio::time::timeout(limit, &mut task).await {
            Ok(joined) => joined,
            Err(_) => {
                task.abort();
                tracing::warn!(url = %entry.normalized, timeout_ms = limit.as_millis() as u64, "fetch timed out");
                return ItemOutcome {
                    entry,
                    outcome: DownloadOutcome::failure("timeout"),
                };
            }
        },
        None => task.await,
    };

    let outcome = match joined {
        Ok(Ok(post)) => DownloadOutcome::Success(post),
        Ok(Err(e)) => DownloadOutcome::failure(e.to_string()),
        Err(e) if e.is_panic() => DownloadOutcome::failure("fetcher panicked"),
        Err(e) => DownloadOutcome::failure(format!("fetch task: {}", e)),
    };
    tracing::debug!(
        url = %entry.normalized,
        ok = outcome.is_success(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "fetch finished"
    );
    ItemOutcome { entry, outcome }
}
