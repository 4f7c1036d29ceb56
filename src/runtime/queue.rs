use crate::error::{Result, TravcamError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

type Job = Box<dyn FnOnce() + Send + 'static>;

struct Running {
    sender: mpsc::UnboundedSender<Job>,
    consumer: JoinHandle<()>,
}

struct QueueInner {
    name: String,
    stop_timeout: Duration,
    running: Mutex<Option<Running>>,
    retiring: Mutex<Option<JoinHandle<()>>>,
    processed: AtomicU64,
}

/// Single-consumer execution context.
///
/// Jobs run one at a time, in submission order, on a dedicated tokio task.
/// Stopping lets already queued jobs finish before the consumer exits, and a
/// restart waits for that consumer so two never run side by side.
#[derive(Clone)]
pub struct TaskQueue {
    inner: Arc<QueueInner>,
}

impl TaskQueue {
    pub fn new<S: Into<String>>(name: S, stop_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                name: name.into(),
                stop_timeout,
                running: Mutex::new(None),
                retiring: Mutex::new(None),
                processed: AtomicU64::new(0),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Start the consumer. Idempotent while running.
    pub async fn start(&self) {
        self.join_retiring().await;

        let mut running = self.inner.running.lock();
        if running.is_some() {
            debug!("Context '{}' already running", self.inner.name);
            return;
        }

        let (sender, mut receiver) = mpsc::unbounded_channel::<Job>();
        let inner = Arc::clone(&self.inner);
        let consumer = tokio::spawn(async move {
            while let Some(job) = receiver.recv().await {
                inner.processed.fetch_add(1, Ordering::SeqCst);
                job();
            }
            debug!("Context '{}' drained", inner.name);
        });

        *running = Some(Running { sender, consumer });
        info!("Context '{}' started", self.inner.name);
    }

    /// Queue a job. Returns false when the context is not running.
    pub fn post<F>(&self, job: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        match self.inner.running.lock().as_ref() {
            Some(running) => running.sender.send(Box::new(job)).is_ok(),
            None => false,
        }
    }

    /// Stop accepting jobs and let the consumer finish what is queued.
    ///
    /// Does not wait, so it may be called from a job running on this very
    /// context; the consumer is joined by the next `start` or `stop`.
    pub fn quit_safely(&self) {
        let running = self.inner.running.lock().take();
        if let Some(Running { sender, consumer }) = running {
            drop(sender);
            *self.inner.retiring.lock() = Some(consumer);
            debug!("Context '{}' quitting after pending work", self.inner.name);
        }
    }

    /// Quit after pending work and wait for the consumer to exit
    pub async fn stop(&self) {
        self.quit_safely();
        self.join_retiring().await;
    }

    async fn join_retiring(&self) {
        let retiring = self.inner.retiring.lock().take();
        if let Some(consumer) = retiring {
            match tokio::time::timeout(self.inner.stop_timeout, consumer).await {
                Ok(Ok(())) => info!("Context '{}' stopped", self.inner.name),
                Ok(Err(e)) => warn!("Context '{}' consumer failed: {}", self.inner.name, e),
                Err(_) => warn!(
                    "Context '{}' did not drain within {:?}",
                    self.inner.name, self.inner.stop_timeout
                ),
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.lock().is_some()
    }

    /// Number of jobs the consumer has picked up so far
    pub fn processed(&self) -> u64 {
        self.inner.processed.load(Ordering::SeqCst)
    }

    /// Run `job` on the context and wait for its result
    pub async fn call<F, R>(&self, job: F) -> Result<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let posted = self.post(move || {
            let _ = tx.send(job());
        });

        if !posted {
            return Err(self.stopped());
        }

        rx.await.map_err(|_| self.stopped())
    }

    /// Wait until everything queued before this call has run
    pub async fn flush(&self) -> Result<()> {
        self.call(|| ()).await
    }

    /// Flush repeatedly until a pass finds nothing but its own marker, so
    /// work queued by earlier jobs has run as well. Returns how many other
    /// jobs ran meanwhile.
    pub async fn settle(&self) -> Result<u64> {
        let mut work = 0;
        loop {
            let before = self.processed();
            self.flush().await?;
            let delta = self.processed() - before;
            if delta <= 1 {
                return Ok(work);
            }
            work += delta - 1;
        }
    }

    fn stopped(&self) -> TravcamError {
        TravcamError::ContextStopped {
            name: self.inner.name.clone(),
        }
    }
}
