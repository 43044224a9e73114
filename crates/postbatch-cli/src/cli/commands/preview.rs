//! `postbatch preview` – list what a run would process.

use anyhow::Result;
use postbatch_core::config::BatchConfig;
use postbatch_core::url_model::{load_url_file, BaseDomain};
use std::path::PathBuf;

pub fn run_preview(cfg: &BatchConfig, input: Option<PathBuf>, limit: usize) -> Result<()> {
    let input = input.unwrap_or_else(|| cfg.input_file.clone());
    let base = BaseDomain::parse(&cfg.base_domain)?;
    let parsed = load_url_file(&input, &base)?;

    if parsed.is_empty() {
        println!("No URLs in {}.", input.display());
        return Ok(());
    }

    println!("URLs to process ({} total):", parsed.entries.len());
    for (i, entry) in parsed.entries.iter().take(limit).enumerate() {
        println!("{:>4}. {}", i + 1, entry.normalized);
    }
    if parsed.entries.len() > limit {
        println!("      ... and {} more", parsed.entries.len() - limit);
    }
    if parsed.duplicates > 0 {
        println!("Duplicates dropped: {}", parsed.duplicates);
    }
    if !parsed.invalid.is_empty() {
        println!("Invalid lines ({}):", parsed.invalid.len());
        for line in &parsed.invalid {
            println!("  line {}: {} ({})", line.line_no, line.raw, line.error);
        }
    }
    Ok(())
}
