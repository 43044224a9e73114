//! `postbatch run` / `postbatch retry` – download a batch of posts.

use anyhow::Result;
use postbatch_core::config::BatchConfig;
use postbatch_core::control::RunControl;
use postbatch_core::fetch::{HttpFetcher, HttpFetcherOptions, PostFetcher};
use postbatch_core::metadata_store::MetadataStore;
use postbatch_core::orchestrator::{Orchestrator, RunMode, RunOptions};
use postbatch_core::pool::Concurrency;
use postbatch_core::progress::ProgressSnapshot;
use postbatch_core::retry_ledger::RetryLedger;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Flags shared by `run` and `retry`; `None` falls back to the config.
#[derive(Debug, Default)]
pub struct RunRequest {
    pub mode: RunMode,
    pub input: Option<PathBuf>,
    pub concurrency: Option<u8>,
    pub base_domain: Option<String>,
    pub force: bool,
    pub timeout_secs: Option<u64>,
}

impl RunRequest {
    /// Merge the flags over the config.
    pub fn to_options(&self, cfg: &BatchConfig) -> Result<RunOptions> {
        let concurrency = match self.concurrency {
            Some(n) => Concurrency::new(n as usize)?,
            None => Concurrency::clamped(cfg.concurrency as usize),
        };
        let input = self.input.clone().unwrap_or_else(|| cfg.input_file.clone());
        let base_domain = self
            .base_domain
            .clone()
            .unwrap_or_else(|| cfg.base_domain.clone());
        let mut opts = RunOptions::new(input, base_domain);
        opts.mode = self.mode;
        opts.concurrency = concurrency;
        opts.force_refetch = self.force;
        opts.item_timeout = cfg.item_timeout();
        Ok(opts)
    }
}

pub async fn run_batch(cfg: &BatchConfig, req: RunRequest) -> Result<()> {
    let opts = req.to_options(cfg)?;
    let store = MetadataStore::open_default().await?;
    let ledger = RetryLedger::new(&cfg.ledger_file);

    let mut fetch_opts = HttpFetcherOptions::from_config(cfg)?;
    if let Some(secs) = req.timeout_secs {
        fetch_opts.timeout = Duration::from_secs(secs.max(1));
    }
    let fetcher: Arc<dyn PostFetcher> = Arc::new(HttpFetcher::new(fetch_opts));

    let control = Arc::new(RunControl::new());
    let signal_control = Arc::clone(&control);
    let signal_handle = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nAbort requested; waiting for in-flight posts...");
            signal_control.request_abort();
        }
    });

    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::channel::<ProgressSnapshot>(16);
    const PROGRESS_INTERVAL_MS: u64 = 500;
    let progress_handle = tokio::spawn(async move {
        let mut last_print = Instant::now();
        while let Some(p) = progress_rx.recv().await {
            let now = Instant::now();
            if now.duration_since(last_print).as_millis() as u64 >= PROGRESS_INTERVAL_MS
                || p.completed >= p.total
            {
                let eta = p
                    .eta_secs()
                    .map(|s| format!("{:.0}s", s))
                    .unwrap_or_else(|| "?".to_string());
                println!(
                    "  {}/{} ({:.1}%)  ok {}  failed {}  {:.2} posts/s  ETA {}",
                    p.completed,
                    p.total,
                    p.fraction() * 100.0,
                    p.succeeded,
                    p.failed,
                    p.items_per_sec(),
                    eta
                );
                last_print = now;
            }
        }
    });

    let orchestrator = Orchestrator::new(store, ledger, fetcher)
        .with_progress(progress_tx)
        .with_control(control);
    let result = orchestrator.run(&opts).await;
    orchestrator.store().close().await;
    let ledger_path = orchestrator.ledger().path().to_path_buf();
    // Dropping the orchestrator closes the progress channel.
    drop(orchestrator);
    let _ = progress_handle.await;
    signal_handle.abort();

    let summary = result?;
    println!();
    println!("{}", summary);
    if summary.has_failures() {
        println!("Failed URLs saved to {}", ledger_path.display());
        if summary.failed > summary.invalid {
            println!("Retry them with: postbatch retry");
        }
    }
    if summary.invalid > 0 {
        println!(
            "{} invalid line(s) kept in {} as comments; retry runs skip them.",
            summary.invalid,
            ledger_path.display()
        );
    }
    Ok(())
}
