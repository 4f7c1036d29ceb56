use super::types::ControllerState;
use crate::config::TravcamConfig;
use crate::error::Result;
use crate::events::EventSink;
use crate::orientation::OrientationTracker;
use crate::permissions::PermissionGate;
use crate::runtime::{ExecutionContexts, TaskQueue};
use crate::session::{dispatch, Collaborators, ExpiryHook, SessionOrchestrator};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Host-facing entry point for one camera.
///
/// Every orchestrator operation runs on the worker context; device events
/// and recording-timer expiry are posted there as well, so the state
/// machine only ever sees one caller at a time.
pub struct CameraController {
    pub(super) config: TravcamConfig,
    pub(super) contexts: ExecutionContexts,
    pub(super) orchestrator: Arc<Mutex<SessionOrchestrator>>,
    pub(super) permissions: Arc<dyn PermissionGate>,
    pub(super) orientation: Arc<OrientationTracker>,
    pub(super) controller_state: Mutex<ControllerState>,
    pub(super) cancellation_token: CancellationToken,
}

impl CameraController {
    /// Build the controller and start its UI context
    pub async fn new(
        config: TravcamConfig,
        collaborators: Collaborators,
        permissions: Arc<dyn PermissionGate>,
    ) -> Result<Self> {
        let contexts = ExecutionContexts::new(&config.runtime);
        let orientation = Arc::new(OrientationTracker::new());

        let orchestrator = Arc::new_cyclic(|weak: &Weak<Mutex<SessionOrchestrator>>| {
            let events = worker_event_sink(weak.clone(), contexts.worker.clone());
            let expiry = worker_expiry_hook(weak.clone(), contexts.worker.clone());
            Mutex::new(SessionOrchestrator::new(
                &config,
                collaborators,
                &contexts,
                events,
                expiry,
                Arc::clone(&orientation),
            ))
        });

        contexts.ui.start().await;
        info!(
            "Camera controller ready (camera {}, worker '{}')",
            config.camera.index,
            contexts.worker.name()
        );

        Ok(Self {
            config,
            contexts,
            orchestrator,
            permissions,
            orientation,
            controller_state: Mutex::new(ControllerState::Idle),
            cancellation_token: CancellationToken::new(),
        })
    }

    pub fn config(&self) -> &TravcamConfig {
        &self.config
    }

    pub fn contexts(&self) -> &ExecutionContexts {
        &self.contexts
    }

    /// Run `job` against the orchestrator on the worker context
    pub(super) async fn on_worker<F, R>(&self, job: F) -> Result<R>
    where
        F: FnOnce(&mut SessionOrchestrator) -> R + Send + 'static,
        R: Send + 'static,
    {
        let orchestrator = Arc::clone(&self.orchestrator);
        self.contexts
            .worker
            .call(move || job(&mut orchestrator.lock()))
            .await
    }

    /// Wait until device callbacks and UI notifications caused by earlier
    /// calls have all been delivered
    pub async fn settle(&self) -> Result<()> {
        self.contexts.settle().await
    }
}

fn worker_event_sink(target: Weak<Mutex<SessionOrchestrator>>, worker: TaskQueue) -> EventSink {
    EventSink::new(move |event| {
        let target = target.clone();
        let kind = event.event_type();
        let posted = worker.post(move || {
            if let Some(orchestrator) = target.upgrade() {
                dispatch(&mut orchestrator.lock(), event);
            }
        });
        if !posted {
            debug!("Worker stopped, dropped {} event", kind);
        }
    })
}

/// Expiry normally runs on the worker. With the worker stopped it runs
/// inline on the UI context so the recording still ends at its ceiling.
fn worker_expiry_hook(target: Weak<Mutex<SessionOrchestrator>>, worker: TaskQueue) -> ExpiryHook {
    Arc::new(move |generation| {
        let queued = target.clone();
        let posted = worker.post(move || {
            if let Some(orchestrator) = queued.upgrade() {
                orchestrator.lock().on_recording_timer_expired(generation);
            }
        });
        if !posted {
            debug!("Worker stopped, expiring timer {} inline", generation);
            if let Some(orchestrator) = target.upgrade() {
                orchestrator.lock().on_recording_timer_expired(generation);
            }
        }
    })
}
