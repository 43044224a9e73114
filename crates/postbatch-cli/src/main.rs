use postbatch_core::logging;
use postbatch_core::metadata_store::StoreError;
use postbatch_core::orchestrator::RunError;
use postbatch_core::retry_ledger::LedgerError;

mod cli;

use crate::cli::CliCommand;

/// Exit status for a store-level fatal condition (metadata store or ledger).
const EXIT_STORE_FATAL: i32 = 2;
/// Conventional status for SIGINT.
const EXIT_CANCELLED: i32 = 130;

#[tokio::main]
async fn main() {
    // Initialize logging as early as possible; fall back to stderr if the
    // state directory is not writable.
    if let Err(err) = logging::init_logging() {
        logging::init_logging_stderr();
        tracing::warn!("log file unavailable, logging to stderr: {:#}", err);
    }

    if let Err(err) = CliCommand::run_from_args().await {
        eprintln!("postbatch error: {:#}", err);
        std::process::exit(exit_code(&err));
    }
}

/// Store errors raised outside a run (e.g. opening the database) are as
/// fatal as those raised inside one.
fn exit_code(err: &anyhow::Error) -> i32 {
    if let Some(e) = err.downcast_ref::<RunError>() {
        return match e {
            RunError::Cancelled { .. } => EXIT_CANCELLED,
            e if e.is_store_fatal() => EXIT_STORE_FATAL,
            _ => 1,
        };
    }
    if err.downcast_ref::<StoreError>().is_some() || err.downcast_ref::<LedgerError>().is_some() {
        return EXIT_STORE_FATAL;
    }
    1
}
