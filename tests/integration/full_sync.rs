use super::sample_tree;
use codesync::channel::{ChannelSender, FileDeletePayload, InboundMessage, OutboundMessage};
use codesync::ignore::{default_patterns, IgnoreRules};
use codesync::paths::PathTranslator;
use codesync::session::{full_sync, LiveContext, PendingChange, SyncLedger};
use codesync::transform::TransformPipeline;
use codesync::types::{SyncAction, SyncMode};
use codesync::watch::{WatchAction, WatchKind};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

fn ignore() -> IgnoreRules {
    IgnoreRules::new(default_patterns())
}

#[test]
fn test_home_page_frame_materializes() {
    let frame = r#"{
        "event": "codesync:wcode:syncAllResponse",
        "data": [
            {"type": "dir", "name": "public", "children": [
                {"type": "file", "name": "a1b2c3.js", "pageName": "Home Page.", "content": "console.log(1)"}
            ]}
        ]
    }"#;
    let nodes = match InboundMessage::decode(frame).unwrap() {
        InboundMessage::SyncAllResponse(nodes) => nodes,
        other => panic!("unexpected message: {:?}", other),
    };

    let temp = TempDir::new().unwrap();
    let outcome = full_sync(temp.path(), &nodes, SyncMode::Pull, &ignore()).unwrap();

    let written = outcome.base.join("public").join("Home_Page.js");
    assert_eq!(fs::read_to_string(written).unwrap(), "console.log(1)");
    assert_eq!(outcome.dictionary.get("Home_Page.js"), Some("a1b2c3"));
    assert!(outcome.pending.is_empty());
}

#[test]
fn test_pull_twice_writes_nothing_the_second_time() {
    let temp = TempDir::new().unwrap();
    let first = full_sync(temp.path(), &sample_tree(), SyncMode::Pull, &ignore()).unwrap();
    assert_eq!(first.report.files_written, 2);

    let second = full_sync(temp.path(), &sample_tree(), SyncMode::Pull, &ignore()).unwrap();
    assert_eq!(second.report.files_written, 0);
    assert_eq!(second.report.files_unchanged, 2);
    assert_eq!(second.report.dirs_created, 0);
    // System files are never materialized.
    assert!(!temp.path().join("public/manifest.json").exists());
}

#[tokio::test]
async fn test_push_sends_one_delete_for_a_removed_page() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("public")).unwrap();
    fs::write(temp.path().join("public/home.js"), "home v1").unwrap();
    // public/about.js was deleted locally while the agent was offline.

    let outcome = full_sync(temp.path(), &sample_tree(), SyncMode::Push, &ignore()).unwrap();
    assert_eq!(
        outcome.pending,
        vec![PendingChange::Deleted {
            path: "public/about.js".to_string()
        }]
    );

    let translator = PathTranslator::new(outcome.base.clone(), Arc::new(outcome.dictionary));
    let (outbound, mut rx) = ChannelSender::pair(8);
    let live = LiveContext::new(
        translator,
        TransformPipeline::passthrough(),
        SyncLedger::seed(outcome.in_sync),
        outbound,
    );
    for change in outcome.pending {
        live.dispatch(change).await.unwrap();
    }
    drop(live);

    let mut sent = Vec::new();
    while let Some(message) = rx.recv().await {
        sent.push(message);
    }
    assert_eq!(
        sent,
        vec![OutboundMessage::FileDelete(FileDeletePayload {
            file_relative_path: "public/p2.js".to_string()
        })]
    );
}

#[test]
fn test_push_picks_up_local_only_files() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("public")).unwrap();
    fs::create_dir_all(temp.path().join("node_modules/dep")).unwrap();
    fs::write(temp.path().join("public/home.js"), "home v1").unwrap();
    fs::write(temp.path().join("public/about.js"), "about v1").unwrap();
    fs::write(temp.path().join("public/new.js"), "brand new").unwrap();
    fs::write(temp.path().join("node_modules/dep/index.js"), "ignored").unwrap();

    let outcome = full_sync(temp.path(), &sample_tree(), SyncMode::Push, &ignore()).unwrap();
    assert_eq!(
        outcome.pending,
        vec![PendingChange::Added {
            path: "public/new.js".to_string(),
            content: "brand new".to_string(),
        }]
    );
}

#[tokio::test]
async fn test_mirror_delete_of_divergent_page_is_sent() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("public")).unwrap();
    fs::write(temp.path().join("public/home.js"), "home edited offline").unwrap();

    let outcome = full_sync(temp.path(), &sample_tree(), SyncMode::Mirror, &ignore()).unwrap();
    assert!(outcome.remote_files.contains("public/home.js"));
    assert!(outcome
        .in_sync
        .iter()
        .all(|(path, _)| path != "public/home.js"));

    let translator = PathTranslator::new(outcome.base.clone(), Arc::new(outcome.dictionary));
    let (outbound, mut rx) = ChannelSender::pair(8);
    let live = LiveContext::new(
        translator,
        TransformPipeline::passthrough(),
        SyncLedger::seed(outcome.in_sync),
        outbound,
    )
    .with_remote_files(&outcome.remote_files);

    fs::remove_file(temp.path().join("public/home.js")).unwrap();
    let sent = live
        .handle(WatchAction {
            kind: WatchKind::Deleted,
            path: "public/home.js".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(
        sent,
        Some(SyncAction::Deleted {
            path: "public/p1.js".to_string()
        })
    );
    assert_eq!(
        rx.recv().await,
        Some(OutboundMessage::FileDelete(FileDeletePayload {
            file_relative_path: "public/p1.js".to_string()
        }))
    );
}
