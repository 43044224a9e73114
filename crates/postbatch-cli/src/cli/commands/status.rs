//! `postbatch status` – record counts and unfinished posts.

use anyhow::Result;
use postbatch_core::config::BatchConfig;
use postbatch_core::metadata_store::MetadataStore;

pub async fn run_status(cfg: &BatchConfig) -> Result<()> {
    let store = MetadataStore::open_default().await?;
    let counts = store.count_by_status().await?;
    if counts.total() == 0 {
        println!("No posts in database.");
        store.close().await;
        return Ok(());
    }
    println!(
        "{} post(s): {} succeeded, {} failed, {} pending",
        counts.total(),
        counts.succeeded,
        counts.failed,
        counts.pending
    );

    let unfinished = store.list_unfinished().await?;
    if !unfinished.is_empty() {
        println!();
        println!("{:<10} {:<8} {:<24} {}", "STATUS", "TRIES", "LAST ERROR", "URL");
        for r in unfinished {
            let err = r.last_error.as_deref().unwrap_or("-");
            let err: String = err.chars().take(24).collect();
            println!(
                "{:<10} {:<8} {:<24} {}",
                r.status.as_str(),
                r.attempts,
                err,
                r.url
            );
        }
    }
    if cfg.ledger_file.exists() {
        println!();
        println!("Retry ledger: {}", cfg.ledger_file.display());
    }
    store.close().await;
    Ok(())
}
