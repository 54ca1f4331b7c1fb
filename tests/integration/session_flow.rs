use super::sample_tree;
use codesync::channel::{ChannelEvent, ChannelSender, InboundMessage, OutboundMessage, SyncSinglePayload};
use codesync::session::{SessionConfig, SyncSession};
use codesync::types::SyncMode;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;

const TIMEOUT: Duration = Duration::from_secs(10);

async fn next_message(rx: &mut mpsc::Receiver<OutboundMessage>) -> OutboundMessage {
    tokio::time::timeout(TIMEOUT, rx.recv())
        .await
        .expect("timed out waiting for outbound message")
        .expect("outbound channel closed")
}

async fn wait_for_file(path: &Path) {
    let deadline = tokio::time::Instant::now() + TIMEOUT;
    while !path.is_file() {
        assert!(tokio::time::Instant::now() < deadline, "{} never appeared", path.display());
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_session_pulls_tree_then_streams_edits() {
    let temp = TempDir::new().unwrap();
    let base = temp.path().canonicalize().unwrap();
    let mut session = SyncSession::new(SessionConfig::new(&base, SyncMode::Pull));
    let (events_tx, events_rx) = mpsc::channel(16);
    let (outbound, mut out_rx) = ChannelSender::pair(16);

    let session_task = tokio::spawn(async move { session.run(events_rx, outbound).await });

    events_tx.send(ChannelEvent::Connected).await.unwrap();
    assert_eq!(next_message(&mut out_rx).await, OutboundMessage::SyncAllRequest);

    events_tx
        .send(ChannelEvent::Message(InboundMessage::SyncAllResponse(sample_tree())))
        .await
        .unwrap();
    let home = base.join("public").join("home.js");
    wait_for_file(&home).await;

    // The watcher starts right after materialization; keep editing until an
    // edit is seen.
    let mut attempt = 0;
    let payload = loop {
        attempt += 1;
        fs::write(&home, format!("home edit {}", attempt)).unwrap();
        match tokio::time::timeout(Duration::from_millis(500), out_rx.recv()).await {
            Ok(Some(OutboundMessage::SyncSingle(payload)))
                if payload.file_content.starts_with("home edit") =>
            {
                break payload
            }
            // A read can land between truncate and write.
            Ok(Some(OutboundMessage::SyncSingle(_))) => assert!(attempt < 20, "no edit was ever sent"),
            Ok(Some(other)) => panic!("unexpected message: {:?}", other),
            Ok(None) => panic!("outbound channel closed"),
            Err(_) => assert!(attempt < 20, "no edit was ever sent"),
        }
    };
    assert_eq!(payload.file_relative_path, "public/p1.js");
    assert!(payload.file_content.starts_with("home edit"));

    events_tx.send(ChannelEvent::Disconnected).await.unwrap();
    session_task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_push_session_uploads_local_changes_first() {
    let temp = TempDir::new().unwrap();
    let base = temp.path().canonicalize().unwrap();
    fs::create_dir_all(base.join("public/pages")).unwrap();
    fs::write(base.join("public/pages/home.js"), "edited offline").unwrap();

    let tree = vec![codesync::types::RemoteNode::Directory {
        name: "public".to_string(),
        children: vec![codesync::types::RemoteNode::Directory {
            name: "pages".to_string(),
            children: vec![codesync::types::RemoteNode::Document {
                name: "page123.js".to_string(),
                page_name: Some("home".to_string()),
                content: "remote copy".to_string(),
            }],
        }],
    }];

    let mut session = SyncSession::new(SessionConfig::new(&base, SyncMode::Push));
    let (outbound, mut out_rx) = ChannelSender::pair(16);
    session
        .handle_event(ChannelEvent::Connected, &outbound)
        .await
        .unwrap();
    assert_eq!(next_message(&mut out_rx).await, OutboundMessage::SyncAllRequest);

    session
        .handle_event(
            ChannelEvent::Message(InboundMessage::SyncAllResponse(tree)),
            &outbound,
        )
        .await
        .unwrap();

    assert_eq!(
        next_message(&mut out_rx).await,
        OutboundMessage::SyncSingle(SyncSinglePayload {
            file_relative_path: "public/pages/page123.js".to_string(),
            file_content: "edited offline".to_string(),
        })
    );
    // Push never overwrites local content.
    assert_eq!(
        fs::read_to_string(base.join("public/pages/home.js")).unwrap(),
        "edited offline"
    );
}
