//! Integration test: full batch runs against a local post server.
//!
//! Drives the orchestrator with the real curl fetcher and an on-disk store,
//! then reruns in retry mode and checks the store, ledger and summaries.

mod common;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use common::post_server::{self, PostServerOptions};
use postbatch_core::fetch::{HttpFetcher, HttpFetcherOptions, PostFetcher};
use postbatch_core::metadata_store::{MetadataStore, RecordStatus};
use postbatch_core::orchestrator::{Orchestrator, RunMode, RunOptions};
use postbatch_core::pool::Concurrency;
use postbatch_core::retry::RetryPolicy;
use postbatch_core::retry_ledger::RetryLedger;
use postbatch_core::url_model::{normalize, BaseDomain};
use tempfile::tempdir;

fn fetcher() -> Arc<dyn PostFetcher> {
    Arc::new(HttpFetcher::new(HttpFetcherOptions {
        connect_timeout: Duration::from_secs(2),
        timeout: Duration::from_secs(5),
        retry: RetryPolicy::no_retry(),
        ..HttpFetcherOptions::default()
    }))
}

fn ledger_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .filter(|l| !l.starts_with('#') && !l.trim().is_empty())
        .map(str::to_string)
        .collect()
}

fn five_posts() -> &'static str {
    "# five posts\n\
     /explore/P1?xsec_token=T1\n\
     /explore/P2?xsec_token=T2\n\
     /explore/P3?xsec_token=T3\n\
     /explore/P4?xsec_token=T4\n\
     /explore/P5?xsec_token=T5\n"
}

#[tokio::test]
async fn run_then_retry_failed_only() {
    let server = post_server::start(PostServerOptions::failing(&["P2", "P4"]));
    let dir = tempdir().unwrap();
    let input = dir.path().join("bulk_urls.txt");
    std::fs::write(&input, five_posts()).unwrap();
    let ledger_path = dir.path().join("failed_urls.txt");
    let store = MetadataStore::open_at(dir.path().join("state/posts.db"))
        .await
        .unwrap();

    let mut opts = RunOptions::new(&input, &server.base);
    opts.concurrency = Concurrency::new(2).unwrap();
    let orch = Orchestrator::new(store.clone(), RetryLedger::new(&ledger_path), fetcher());

    let summary = orch.run(&opts).await.expect("first run");
    assert_eq!(
        (summary.total, summary.succeeded, summary.failed, summary.skipped),
        (5, 3, 2, 0)
    );
    assert_eq!(
        ledger_lines(&ledger_path),
        vec![
            format!("{}/explore/P2?xsec_token=T2", server.base),
            format!("{}/explore/P4?xsec_token=T4", server.base),
        ]
    );
    assert_eq!(server.hits().len(), 5);

    // Stored metadata comes from the page's Open Graph tags.
    let base = BaseDomain::parse(&server.base).unwrap();
    let p1 = normalize("/explore/P1", &base).unwrap();
    let rec = store.get(&p1.id).await.unwrap().expect("P1 stored");
    assert_eq!(rec.status, RecordStatus::Succeeded);
    let meta = rec.metadata.expect("metadata");
    assert_eq!(meta.title.as_deref(), Some("Post P1"));
    assert_eq!(meta.description.as_deref(), Some("About P1 & more"));
    assert_eq!(meta.media.len(), 2);

    // P2 recovers, P4 keeps failing.
    server.set_options(PostServerOptions::failing(&["P4"]));
    let mut retry = opts.clone();
    retry.mode = RunMode::RetryFailedOnly;
    let summary = orch.run(&retry).await.expect("retry run");
    assert_eq!(
        (summary.total, summary.succeeded, summary.failed, summary.skipped),
        (2, 1, 1, 0)
    );
    assert_eq!(
        ledger_lines(&ledger_path),
        vec![format!("{}/explore/P4?xsec_token=T4", server.base)]
    );
    assert_eq!(server.hits().len(), 7);

    let counts = store.count_by_status().await.unwrap();
    assert_eq!((counts.succeeded, counts.failed), (4, 1));
    store.close().await;
}

#[tokio::test]
async fn rerun_skips_downloaded_posts_even_with_new_tokens() {
    let server = post_server::start(PostServerOptions::default());
    let dir = tempdir().unwrap();
    let input = dir.path().join("bulk_urls.txt");
    std::fs::write(&input, five_posts()).unwrap();
    let ledger_path = dir.path().join("failed_urls.txt");
    let store = MetadataStore::open_at(dir.path().join("posts.db")).await.unwrap();
    let orch = Orchestrator::new(store.clone(), RetryLedger::new(&ledger_path), fetcher());

    let opts = RunOptions::new(&input, &server.base);
    let first = orch.run(&opts).await.unwrap();
    assert_eq!(first.succeeded, 5);
    assert!(ledger_lines(&ledger_path).is_empty());

    // Same posts, refreshed tokens.
    std::fs::write(&input, five_posts().replace("xsec_token=T", "xsec_token=NEW")).unwrap();
    let second = orch.run(&opts).await.unwrap();
    assert_eq!(second.skipped, 5);
    assert_eq!(second.succeeded, 0);
    assert_eq!(second.success_rate(), 100.0);
    assert_eq!(server.hits().len(), 5);
    store.close().await;
}

#[tokio::test]
async fn page_without_metadata_is_a_failure() {
    let server = post_server::start(PostServerOptions {
        empty: ["E1".to_string()].into_iter().collect(),
        ..PostServerOptions::default()
    });
    let dir = tempdir().unwrap();
    let input = dir.path().join("bulk_urls.txt");
    std::fs::write(&input, "/explore/E1\n/explore/OK\n").unwrap();
    let ledger_path = dir.path().join("failed_urls.txt");
    let store = MetadataStore::open_at(dir.path().join("posts.db")).await.unwrap();

    let summary = Orchestrator::new(store.clone(), RetryLedger::new(&ledger_path), fetcher())
        .run(&RunOptions::new(&input, &server.base))
        .await
        .unwrap();
    assert_eq!((summary.succeeded, summary.failed), (1, 1));
    assert_eq!(summary.failures[0].reason, "no data returned");
    assert_eq!(
        ledger_lines(&ledger_path),
        vec![format!("{}/explore/E1", server.base)]
    );
    store.close().await;
}

#[tokio::test]
async fn absolute_and_relative_lines_mix() {
    let server = post_server::start(PostServerOptions::default());
    let dir = tempdir().unwrap();
    let input = dir.path().join("bulk_urls.txt");
    std::fs::write(
        &input,
        format!(
            "/user/profile/A1/P1?xsec_token=T1\n{}/explore/P2?xsec_token=T2\n# comment\n\nnot-a-url\n",
            server.base
        ),
    )
    .unwrap();
    let ledger_path = dir.path().join("failed_urls.txt");
    let store = MetadataStore::open_at(dir.path().join("posts.db")).await.unwrap();

    let summary = Orchestrator::new(store.clone(), RetryLedger::new(&ledger_path), fetcher())
        .run(&RunOptions::new(&input, &server.base))
        .await
        .unwrap();
    assert_eq!(summary.total, 3);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 1);

    let mut hits = server.hits();
    hits.sort();
    assert_eq!(
        hits,
        vec![
            "/explore/P2?xsec_token=T2".to_string(),
            "/user/profile/A1/P1?xsec_token=T1".to_string(),
        ]
    );

    let all = store.load_all().await.unwrap();
    let p1 = all.iter().find(|r| r.post_id.as_deref() == Some("P1")).unwrap();
    assert_eq!(p1.author_id.as_deref(), Some("A1"));
    store.close().await;
}
