use super::{CameraController, ControllerState};
use crate::device::{Size, StreamConfiguration};
use crate::error::Result;
use crate::orientation::Rotation;
use crate::permissions::ensure_permissions;
use tracing::{error, info, warn};

impl CameraController {
    /// The host surface is ready: check permissions, start the worker and
    /// open the camera.
    pub async fn surface_available(&self, width: u32, height: u32) -> Result<StreamConfiguration> {
        if let Err(e) = ensure_permissions(self.permissions.as_ref()).await {
            self.set_controller_state(ControllerState::Detached);
            return Err(e);
        }

        self.contexts.worker.start().await;
        self.orientation.enable();
        self.set_controller_state(ControllerState::Active);

        let size = Size::new(width, height);
        let stream = match self
            .on_worker(move |orchestrator| orchestrator.on_surface_available(size))
            .await?
        {
            Ok(stream) => stream,
            Err(e) if e.is_recoverable() => {
                warn!("Camera open failed, a later surface event may retry: {}", e);
                return Err(e);
            }
            Err(e) => {
                error!("Camera cannot be used: {}", e);
                return Err(e);
            }
        };

        info!(
            "Camera opening with preview {} and video {}",
            stream.preview_size, stream.video_size
        );
        Ok(stream)
    }

    pub async fn surface_size_changed(&self, width: u32, height: u32) -> Result<()> {
        let size = Size::new(width, height);
        self.on_worker(move |orchestrator| orchestrator.on_surface_size_changed(size))
            .await
    }

    /// The host surface is gone: release the camera and stop the worker
    pub async fn surface_destroyed(&self) -> Result<()> {
        self.orientation.disable();
        if let Err(e) = self
            .on_worker(|orchestrator| orchestrator.on_surface_destroyed())
            .await
        {
            warn!("Worker unavailable on surface loss, closing inline: {}", e);
            self.orchestrator.lock().on_surface_destroyed();
        }
        self.contexts.worker.stop().await;
        self.set_controller_state(ControllerState::Detached);
        Ok(())
    }

    /// Host paused: finish any running recording, then stop the worker
    /// after pending work drains. The device handle is kept for `resume`.
    pub async fn pause(&self) {
        info!("Pausing camera controller");
        match self
            .on_worker(|orchestrator| orchestrator.request_video_recording_stop())
            .await
        {
            Ok(true) => info!("Recording finished because the host paused"),
            Ok(false) => {}
            Err(e) => {
                warn!("Worker unavailable on pause, stopping recording inline: {}", e);
                self.orchestrator.lock().request_video_recording_stop();
            }
        }
        self.orientation.disable();
        self.contexts.worker.stop().await;
        self.set_controller_state(ControllerState::Paused);
    }

    /// Host resumed: restart the worker and re-open the device if one was
    /// held while the surface is still available
    pub async fn resume(&self) -> Result<bool> {
        info!("Resuming camera controller");
        self.contexts.worker.start().await;
        self.orientation.enable();
        self.set_controller_state(ControllerState::Active);

        self.on_worker(|orchestrator| orchestrator.reopen()).await?
    }

    /// Feed an orientation sensor reading; never blocks
    pub fn orientation_changed(&self, degrees: i32) {
        self.orientation.on_orientation_changed(degrees);
    }

    pub async fn set_display_rotation(&self, rotation: Rotation) -> Result<()> {
        self.on_worker(move |orchestrator| orchestrator.set_display_rotation(rotation))
            .await
    }
}
