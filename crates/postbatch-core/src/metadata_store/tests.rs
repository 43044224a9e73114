use super::*;
use crate::fetch::PostMetadata;
use crate::url_model::{normalize, BaseDomain, UrlEntry};

fn entry(path: &str) -> UrlEntry {
    let base = BaseDomain::parse("https://host").unwrap();
    normalize(path, &base).unwrap()
}

fn meta(title: &str) -> PostMetadata {
    PostMetadata {
        title: Some(title.to_string()),
        media: vec!["https://cdn.host/a.jpg".to_string()],
        ..PostMetadata::default()
    }
}

#[tokio::test]
async fn ensure_pending_does_not_overwrite() {
    let store = open_memory().await.unwrap();
    let e = entry("/user/profile/A1/P1?xsec_token=T1");

    store.ensure_pending(&e).await.unwrap();
    let rec = store.get(&e.id).await.unwrap().unwrap();
    assert_eq!(rec.status, RecordStatus::Pending);
    assert_eq!(rec.attempts, 0);
    assert_eq!(rec.author_id.as_deref(), Some("A1"));
    assert_eq!(rec.post_id.as_deref(), Some("P1"));

    store
        .upsert(&e, &RecordUpdate::succeeded(meta("first")))
        .await
        .unwrap();
    store.ensure_pending(&e).await.unwrap();
    let rec = store.get(&e.id).await.unwrap().unwrap();
    assert_eq!(rec.status, RecordStatus::Succeeded);
    assert_eq!(rec.attempts, 1);
}

#[tokio::test]
async fn upsert_counts_attempts_and_keeps_metadata_on_failure() {
    let store = open_memory().await.unwrap();
    let e = entry("/explore/P2");

    store
        .upsert(&e, &RecordUpdate::succeeded(meta("kept")))
        .await
        .unwrap();
    store
        .upsert(&e, &RecordUpdate::failed("HTTP 500"))
        .await
        .unwrap();

    let rec = store.get(&e.id).await.unwrap().unwrap();
    assert_eq!(rec.status, RecordStatus::Failed);
    assert_eq!(rec.attempts, 2);
    assert_eq!(rec.last_error.as_deref(), Some("HTTP 500"));
    assert_eq!(rec.metadata, Some(meta("kept")));
    assert!(rec.last_attempt_at >= rec.created_at);
}

#[tokio::test]
async fn success_clears_last_error() {
    let store = open_memory().await.unwrap();
    let e = entry("/explore/P3");
    store.upsert(&e, &RecordUpdate::failed("timeout")).await.unwrap();
    store
        .upsert(&e, &RecordUpdate::succeeded(meta("ok")))
        .await
        .unwrap();
    let rec = store.get(&e.id).await.unwrap().unwrap();
    assert_eq!(rec.status, RecordStatus::Succeeded);
    assert_eq!(rec.last_error, None);
}

#[tokio::test]
async fn is_succeeded_ignores_query_token() {
    let store = open_memory().await.unwrap();
    let old = entry("/user/profile/A1/P1?xsec_token=OLD");
    let refreshed = entry("/user/profile/A1/P1?xsec_token=NEW");

    assert!(!store.is_succeeded(&old.id).await.unwrap());
    store
        .upsert(&old, &RecordUpdate::succeeded(meta("p1")))
        .await
        .unwrap();
    assert!(store.is_succeeded(&refreshed.id).await.unwrap());

    // The refreshed URL replaces the stored one on its next upsert.
    store
        .upsert(&refreshed, &RecordUpdate::succeeded(meta("p1")))
        .await
        .unwrap();
    let rec = store.get(&old.id).await.unwrap().unwrap();
    assert_eq!(rec.url, "https://host/user/profile/A1/P1?xsec_token=NEW");
    assert_eq!(rec.attempts, 2);
}

#[tokio::test]
async fn failed_record_is_not_succeeded() {
    let store = open_memory().await.unwrap();
    let e = entry("/explore/P4");
    store.upsert(&e, &RecordUpdate::failed("HTTP 404")).await.unwrap();
    assert!(!store.is_succeeded(&e.id).await.unwrap());
}

#[tokio::test]
async fn concurrent_upserts_for_one_key_all_count() {
    let dir = tempfile::tempdir().unwrap();
    let store = MetadataStore::open_at(dir.path().join("posts.db")).await.unwrap();
    let e = entry("/explore/P5");

    let mut handles = Vec::new();
    for i in 0..8 {
        let store = store.clone();
        let e = e.clone();
        handles.push(tokio::spawn(async move {
            let update = if i % 2 == 0 {
                RecordUpdate::succeeded(meta("p5"))
            } else {
                RecordUpdate::failed("HTTP 503")
            };
            store.upsert(&e, &update).await
        }));
    }
    for h in handles {
        h.await.unwrap().unwrap();
    }

    let all = store.load_all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].attempts, 8);
    store.close().await;
}

#[tokio::test]
async fn counts_and_unfinished_listing() {
    let store = open_memory().await.unwrap();
    let ok = entry("/explore/OK");
    let bad = entry("/explore/BAD");
    let waiting = entry("/explore/WAIT");

    store.ensure_pending(&waiting).await.unwrap();
    store
        .upsert(&ok, &RecordUpdate::succeeded(meta("ok")))
        .await
        .unwrap();
    store.upsert(&bad, &RecordUpdate::failed("timeout")).await.unwrap();

    let counts = store.count_by_status().await.unwrap();
    assert_eq!(counts.pending, 1);
    assert_eq!(counts.succeeded, 1);
    assert_eq!(counts.failed, 1);
    assert_eq!(counts.total(), 3);

    let unfinished = store.list_unfinished().await.unwrap();
    let keys: Vec<&str> = unfinished.iter().map(|r| r.key.as_str()).collect();
    // Attempted rows sort before never-attempted ones.
    assert_eq!(keys, vec!["host/explore/BAD", "host/explore/WAIT"]);
}

#[tokio::test]
async fn store_file_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state/posts.db");
    let e = entry("/explore/P6");
    {
        let store = MetadataStore::open_at(&path).await.unwrap();
        store
            .upsert(&e, &RecordUpdate::succeeded(meta("p6")))
            .await
            .unwrap();
        store.close().await;
    }
    let store = MetadataStore::open_at(&path).await.unwrap();
    assert!(store.is_succeeded(&e.id).await.unwrap());
}

#[test]
fn unknown_status_reads_as_failed() {
    assert_eq!(RecordStatus::from_str("succeeded"), RecordStatus::Succeeded);
    assert_eq!(RecordStatus::from_str("weird"), RecordStatus::Failed);
}
