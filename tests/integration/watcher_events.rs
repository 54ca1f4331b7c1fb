use codesync::watch::{LiveWatcher, WatchAction, WatchConfig, WatchKind};
use std::fs;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;

const TIMEOUT: Duration = Duration::from_secs(10);

async fn wait_for<F>(rx: &mut mpsc::UnboundedReceiver<WatchAction>, seen: &mut Vec<WatchAction>, pred: F)
where
    F: Fn(&WatchAction) -> bool,
{
    let deadline = tokio::time::Instant::now() + TIMEOUT;
    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        let action = tokio::time::timeout(remaining, rx.recv())
            .await
            .expect("timed out waiting for watch action")
            .expect("watch channel closed");
        let done = pred(&action);
        seen.push(action);
        if done {
            return;
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_live_watcher_reports_relative_actions() {
    let temp = TempDir::new().unwrap();
    let base = temp.path().canonicalize().unwrap();
    fs::create_dir_all(base.join("public")).unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let watcher = LiveWatcher::start(&base, &WatchConfig::default(), move |action| {
        let _ = tx.send(action);
    })
    .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    fs::write(base.join("public/home.js.swp"), "swap").unwrap();
    fs::write(base.join("public/home.js"), "home").unwrap();

    let mut seen = Vec::new();
    wait_for(&mut rx, &mut seen, |a| {
        a.path == "public/home.js" && matches!(a.kind, WatchKind::Added | WatchKind::Changed)
    })
    .await;

    fs::remove_file(base.join("public/home.js")).unwrap();
    wait_for(&mut rx, &mut seen, |a| {
        a.path == "public/home.js" && a.kind == WatchKind::Deleted
    })
    .await;

    assert!(seen.iter().all(|a| !a.path.ends_with(".swp")));
    assert!(seen.iter().all(|a| a.path != "public"));
    drop(watcher);
}
