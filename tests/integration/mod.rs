//! Integration tests for the codesync agent

mod full_sync;
mod session_flow;
mod watcher_events;
mod websocket;

use codesync::types::RemoteNode;

/// `public/` with two pages and one system file.
pub(crate) fn sample_tree() -> Vec<RemoteNode> {
    vec![RemoteNode::Directory {
        name: "public".to_string(),
        children: vec![
            RemoteNode::Document {
                name: "p1.js".to_string(),
                page_name: Some("home".to_string()),
                content: "home v1".to_string(),
            },
            RemoteNode::Document {
                name: "p2.js".to_string(),
                page_name: Some("about".to_string()),
                content: "about v1".to_string(),
            },
            RemoteNode::Document {
                name: "manifest.json".to_string(),
                page_name: None,
                content: "{}".to_string(),
            },
        ],
    }]
}
