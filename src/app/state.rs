use super::{CameraController, ControllerState};
use crate::session::SessionState;
use crate::storage::MediaFile;
use serde::Serialize;
use tracing::debug;

/// Point-in-time view of the controller, printable as JSON
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControllerStatus {
    pub controller: ControllerState,
    pub session: SessionState,
    pub device_open: bool,
    pub recording: bool,
    pub worker_running: bool,
    pub last_image: Option<MediaFile>,
    pub last_video: Option<MediaFile>,
}

impl CameraController {
    pub(super) fn set_controller_state(&self, state: ControllerState) {
        let mut current = self.controller_state.lock();
        if *current != state {
            debug!("Controller state {:?} -> {:?}", *current, state);
            *current = state;
        }
    }

    pub fn controller_state(&self) -> ControllerState {
        *self.controller_state.lock()
    }

    /// Current session state. Reads the orchestrator directly, so it also
    /// works while the worker is stopped.
    pub fn session_state(&self) -> SessionState {
        self.orchestrator.lock().state()
    }

    pub fn status(&self) -> ControllerStatus {
        let orchestrator = self.orchestrator.lock();
        ControllerStatus {
            controller: self.controller_state(),
            session: orchestrator.state(),
            device_open: orchestrator.is_device_open(),
            recording: orchestrator.is_video_recording_running(),
            worker_running: self.contexts.worker.is_running(),
            last_image: orchestrator.last_image().cloned(),
            last_video: orchestrator.last_video().cloned(),
        }
    }
}
