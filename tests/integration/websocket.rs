use super::sample_tree;
use codesync::channel::protocol::decode_outbound;
use codesync::channel::{InboundMessage, OutboundMessage, ServerConfig, SyncServer};
use codesync::session::SessionConfig;
use codesync::transform::TransformPipeline;
use codesync::types::SyncMode;
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tokio_tungstenite::tungstenite::Message;

const TIMEOUT: Duration = Duration::from_secs(5);

async fn start_server(base: &Path) -> SocketAddr {
    let config = ServerConfig {
        port: 0,
        ..ServerConfig::default()
    };
    let server = SyncServer::bind(
        &config,
        SessionConfig::new(base, SyncMode::Pull),
        TransformPipeline::passthrough(),
    )
    .await
    .unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = server.serve().await;
    });
    addr
}

/// Next text frame, skipping control frames.
async fn recv_text<S>(read: &mut S) -> Option<String>
where
    S: StreamExt<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        match tokio::time::timeout(TIMEOUT, read.next()).await {
            Ok(Some(Ok(Message::Text(text)))) => return Some(text),
            Ok(Some(Ok(Message::Close(_)))) => return None,
            Ok(Some(Ok(_))) => continue,
            Ok(Some(Err(_))) => return None,
            Ok(None) => return None,
            Err(_) => panic!("Timeout waiting for WebSocket message"),
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_handshake_and_full_tree_over_websocket() {
    let temp = TempDir::new().unwrap();
    let addr = start_server(temp.path()).await;

    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{}", addr))
        .await
        .unwrap();
    let (mut write, mut read) = ws.split();

    let frame = recv_text(&mut read).await.expect("expected a request");
    assert_eq!(decode_outbound(&frame).unwrap(), OutboundMessage::SyncAllRequest);

    let response = InboundMessage::SyncAllResponse(sample_tree()).encode().unwrap();
    write.send(Message::Text(response)).await.unwrap();

    let home = temp.path().join("public").join("home.js");
    let deadline = tokio::time::Instant::now() + TIMEOUT;
    while !home.is_file() {
        assert!(tokio::time::Instant::now() < deadline, "tree was never materialized");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(std::fs::read_to_string(&home).unwrap(), "home v1");

    write.send(Message::Close(None)).await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_new_connection_supersedes_old_one() {
    let temp = TempDir::new().unwrap();
    let addr = start_server(temp.path()).await;

    let (first, _) = tokio_tungstenite::connect_async(format!("ws://{}", addr))
        .await
        .unwrap();
    let (_first_write, mut first_read) = first.split();
    assert!(recv_text(&mut first_read).await.is_some());

    let (second, _) = tokio_tungstenite::connect_async(format!("ws://{}", addr))
        .await
        .unwrap();
    let (_second_write, mut second_read) = second.split();
    let frame = recv_text(&mut second_read).await.expect("expected a request");
    assert_eq!(decode_outbound(&frame).unwrap(), OutboundMessage::SyncAllRequest);

    // The first socket is dropped by the server.
    assert!(recv_text(&mut first_read).await.is_none());
}
