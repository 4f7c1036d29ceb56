use super::*;
use crate::config::RuntimeConfig;
use crate::error::TravcamError;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

fn queue() -> TaskQueue {
    TaskQueue::new("test-worker", Duration::from_secs(1))
}

#[tokio::test]
async fn test_jobs_run_in_order() {
    let queue = queue();
    queue.start().await;

    let seen = Arc::new(Mutex::new(Vec::new()));
    for i in 0..5 {
        let seen = Arc::clone(&seen);
        assert!(queue.post(move || seen.lock().push(i)));
    }
    queue.flush().await.unwrap();

    assert_eq!(*seen.lock(), vec![0, 1, 2, 3, 4]);
    assert_eq!(queue.processed(), 6);
}

#[tokio::test]
async fn test_post_rejected_when_stopped() {
    let queue = queue();
    assert!(!queue.post(|| {}));
    assert!(matches!(
        queue.call(|| 1).await,
        Err(TravcamError::ContextStopped { .. })
    ));

    queue.start().await;
    assert_eq!(queue.call(|| 41 + 1).await.unwrap(), 42);

    queue.stop().await;
    assert!(!queue.is_running());
    assert!(!queue.post(|| {}));
}

#[tokio::test]
async fn test_stop_drains_pending_work() {
    let queue = queue();
    queue.start().await;

    let seen = Arc::new(Mutex::new(Vec::new()));
    for i in 0..3 {
        let seen = Arc::clone(&seen);
        queue.post(move || {
            std::thread::sleep(Duration::from_millis(5));
            seen.lock().push(i);
        });
    }
    queue.stop().await;

    assert_eq!(*seen.lock(), vec![0, 1, 2]);
}

#[tokio::test]
async fn test_quit_from_inside_a_job() {
    let queue = queue();
    queue.start().await;

    let inner = queue.clone();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let first = Arc::clone(&seen);
    queue.post(move || {
        inner.quit_safely();
        first.lock().push("quit");
    });
    let second = Arc::clone(&seen);
    queue.post(move || second.lock().push("after"));

    // Already queued work still drains after the quit
    queue.flush().await.unwrap();
    assert!(!queue.is_running());
    assert_eq!(*seen.lock(), vec!["quit", "after"]);

    // Restart joins the retiring consumer before spawning a new one
    queue.start().await;
    assert!(queue.is_running());
    assert_eq!(queue.call(|| 7).await.unwrap(), 7);
}

#[tokio::test]
async fn test_start_is_idempotent() {
    let queue = queue();
    queue.start().await;
    queue.start().await;

    assert_eq!(queue.call(|| "ok").await.unwrap(), "ok");
    queue.stop().await;
    queue.stop().await;
}

#[tokio::test]
async fn test_settle_runs_follow_up_work() {
    let contexts = ExecutionContexts::new(&RuntimeConfig {
        worker_name: "CameraHandler".to_string(),
        stop_timeout_ms: 1000,
    });
    contexts.ui.start().await;
    contexts.worker.start().await;
    assert_eq!(contexts.worker.name(), "CameraHandler");

    let seen = Arc::new(Mutex::new(Vec::new()));
    let ui = contexts.ui.clone();
    let log = Arc::clone(&seen);
    contexts.worker.post(move || {
        log.lock().push("worker");
        let log = Arc::clone(&log);
        ui.post(move || log.lock().push("ui"));
    });

    contexts.settle().await.unwrap();
    assert_eq!(*seen.lock(), vec!["worker", "ui"]);

    contexts.shutdown().await;
    assert!(!contexts.worker.is_running());
    assert!(!contexts.ui.is_running());
}
