//! CLI for the postbatch bulk post downloader.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use postbatch_core::config;
use postbatch_core::orchestrator::RunMode;
use std::path::PathBuf;

use commands::{run_batch, run_completions, run_preview, run_status, RunRequest};

/// Default concurrency for `postbatch retry`.
const RETRY_CONCURRENCY: u8 = 2;

/// Top-level CLI for postbatch.
#[derive(Debug, Parser)]
#[command(name = "postbatch")]
#[command(about = "postbatch: bounded-concurrency, resumable bulk post downloader", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download every post in a URL list, skipping posts already downloaded.
    Run {
        /// URL list, one post per line (default: `input_file` from config).
        #[arg(long, short, value_name = "FILE")]
        input: Option<PathBuf>,
        /// Simultaneous downloads, 1 to 5 (default: config, normally 3).
        #[arg(long, short, value_name = "N", value_parser = clap::value_parser!(u8).range(1..=5))]
        concurrency: Option<u8>,
        /// Prefix for relative `/path` lines (default: config).
        #[arg(long, value_name = "URL")]
        base_domain: Option<String>,
        /// Download again even if a post already succeeded.
        #[arg(long)]
        force: bool,
        /// Per-request timeout in seconds (default: config, normally 15).
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
        /// Process only the URLs in the retry ledger.
        #[arg(long)]
        retry_failed: bool,
    },

    /// Retry the URLs that failed in the previous run.
    Retry {
        /// Simultaneous downloads, 1 to 5.
        #[arg(long, short, value_name = "N", default_value_t = RETRY_CONCURRENCY,
              value_parser = clap::value_parser!(u8).range(1..=5))]
        concurrency: u8,
    },

    /// Show the URLs a run would process, without downloading.
    Preview {
        /// URL list (default: `input_file` from config).
        #[arg(long, short, value_name = "FILE")]
        input: Option<PathBuf>,
        /// How many URLs to list.
        #[arg(long, default_value_t = 10, value_name = "N")]
        limit: usize,
    },

    /// Show record counts and posts that have not succeeded yet.
    Status,

    /// Print a shell completion script.
    Completions {
        /// Target shell.
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        // Completions need neither config nor state.
        if let CliCommand::Completions { shell } = cli.command {
            run_completions(shell);
            return Ok(());
        }

        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Run {
                input,
                concurrency,
                base_domain,
                force,
                timeout,
                retry_failed,
            } => {
                let mode = if retry_failed {
                    RunMode::RetryFailedOnly
                } else {
                    RunMode::Fresh
                };
                let req = RunRequest {
                    mode,
                    input,
                    concurrency,
                    base_domain,
                    force,
                    timeout_secs: timeout,
                };
                run_batch(&cfg, req).await?;
            }
            CliCommand::Retry { concurrency } => {
                let req = RunRequest {
                    mode: RunMode::RetryFailedOnly,
                    concurrency: Some(concurrency),
                    ..RunRequest::default()
                };
                run_batch(&cfg, req).await?;
            }
            CliCommand::Preview { input, limit } => run_preview(&cfg, input, limit)?,
            CliCommand::Status => run_status(&cfg).await?,
            CliCommand::Completions { .. } => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
