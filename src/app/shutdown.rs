use super::{CameraController, ControllerState};
use tracing::{error, info, warn};

impl CameraController {
    /// Release the camera and stop both execution contexts.
    ///
    /// Returns the process exit code: 0 when everything stopped cleanly.
    pub async fn shutdown(&self) -> i32 {
        info!("Beginning graceful shutdown");
        self.cancellation_token.cancel();
        self.orientation.disable();

        let mut exit_code = 0;

        if self.contexts.worker.is_running() {
            if let Err(e) = self.on_worker(|orchestrator| orchestrator.close()).await {
                error!("Error closing camera on the worker: {}", e);
                exit_code = 1;
            }
        }
        // Paused or already detached: nothing runs on the worker any more
        self.orchestrator.lock().close();

        if let Err(e) = self.contexts.settle().await {
            warn!("Pending notifications were not delivered: {}", e);
        }
        self.contexts.shutdown().await;

        self.set_controller_state(ControllerState::Stopped);
        info!("Graceful shutdown completed with exit code: {}", exit_code);
        exit_code
    }
}
