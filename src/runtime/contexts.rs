use super::queue::TaskQueue;
use crate::config::RuntimeConfig;
use crate::error::Result;

const UI_CONTEXT_NAME: &str = "ui";

/// The UI-affine context and the background worker context.
///
/// The UI context lives as long as the controller; the worker follows the
/// render surface and host pause/resume.
#[derive(Clone)]
pub struct ExecutionContexts {
    pub ui: TaskQueue,
    pub worker: TaskQueue,
}

impl ExecutionContexts {
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            ui: TaskQueue::new(UI_CONTEXT_NAME, config.stop_timeout()),
            worker: TaskQueue::new(config.worker_name.clone(), config.stop_timeout()),
        }
    }

    /// Run both contexts until a full round finds no follow-up work
    pub async fn settle(&self) -> Result<()> {
        loop {
            let mut work = 0;
            // The worker may stop itself mid-round (device teardown)
            work += self.worker.settle().await.unwrap_or(0);
            work += self.ui.settle().await?;
            work += self.worker.settle().await.unwrap_or(0);

            if work == 0 {
                return Ok(());
            }
        }
    }

    pub async fn shutdown(&self) {
        self.worker.stop().await;
        self.ui.stop().await;
    }
}
