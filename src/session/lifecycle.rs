use super::orchestrator::SessionOrchestrator;
use super::state::SessionState;
use crate::device::{Size, StreamConfiguration};
use crate::error::{DeviceError, Result};
use crate::events::DeviceErrorCode;
use crate::notify::HostNotification;
use crate::orientation::Rotation;
use crate::surface::configure_transform;
use tracing::{debug, error, info, warn};

impl SessionOrchestrator {
    /// The host surface exists and has `size` pixels: open the camera.
    ///
    /// The device answers with `DeviceOpened`; the preview starts from there.
    pub fn on_surface_available(&mut self, size: Size) -> Result<StreamConfiguration> {
        info!("Surface available ({})", size);
        self.surface_size = Some(size);

        let stream = self.open_device()?;
        self.apply_transform();
        Ok(stream)
    }

    pub fn on_surface_size_changed(&mut self, size: Size) {
        debug!("Surface resized to {}", size);
        self.surface_size = Some(size);
        self.apply_transform();
    }

    /// The host surface is gone; nothing can render, so release everything
    pub fn on_surface_destroyed(&mut self) {
        info!("Surface destroyed");
        self.surface_size = None;
        self.close();
    }

    /// Re-open after the host resumed, if a device was held and the
    /// surface is still there. Returns whether an open was issued.
    pub fn reopen(&mut self) -> Result<bool> {
        if !self.binder.has_device() || self.surface_size.is_none() {
            debug!("Nothing to reopen");
            return Ok(false);
        }
        self.open_device()?;
        self.apply_transform();
        Ok(true)
    }

    pub fn set_display_rotation(&mut self, rotation: Rotation) {
        if self.display_rotation != rotation {
            debug!("Display rotation {:?} -> {:?}", self.display_rotation, rotation);
            self.display_rotation = rotation;
            self.apply_transform();
        }
    }

    fn open_device(&mut self) -> Result<StreamConfiguration> {
        let size = self
            .surface_size
            .ok_or_else(|| DeviceError::access_failure("no surface to render into"))?;

        if self.state == SessionState::RecordingVideo {
            warn!("Camera re-opened while recording, finishing the clip");
            self.finish_recording();
        }
        self.close_current_session();
        self.release_image_reader();
        self.recorder.reset();

        match self
            .binder
            .open(size, self.display_info(), self.events.clone())
        {
            Ok(stream) => {
                self.set_state(SessionState::Preview);
                Ok(stream)
            }
            Err(e @ DeviceError::ConfigUnavailable { .. }) => {
                error!("Camera cannot be configured: {}", e);
                self.close();
                self.notify(HostNotification::FatalDeviceError);
                Err(e.into())
            }
            Err(e) => {
                warn!("Failed to open camera: {}", e);
                Err(e.into())
            }
        }
    }

    pub(super) fn apply_transform(&self) {
        if let Some(view) = self.surface_size {
            let preview = self.preview_size().unwrap_or(view);
            self.surface
                .set_transform(configure_transform(view, preview, self.display_rotation));
        }
    }

    pub(super) fn on_device_opened(&mut self, camera_id: &str) {
        if !self.binder.mark_opened(camera_id) {
            return;
        }
        if let Err(e) = self.start_preview() {
            warn!("Preview did not start after open: {}", e);
        }
    }

    pub(super) fn on_device_disconnected(&mut self, camera_id: &str) {
        if self.binder.camera_id() != Some(camera_id) {
            debug!("Ignoring disconnect of camera {}", camera_id);
            return;
        }
        warn!("Camera {} disconnected", camera_id);
        self.close();
    }

    pub(super) fn on_device_error(&mut self, camera_id: &str, code: DeviceErrorCode) {
        if self.binder.camera_id() != Some(camera_id) {
            debug!("Ignoring {:?} from camera {}", code, camera_id);
            return;
        }
        error!("Camera {} failed with {:?}", camera_id, code);
        self.close();
        self.notify(HostNotification::FatalDeviceError);
    }

    /// Release every device resource and stop the worker context.
    ///
    /// Order: timer, recorder, session, device, image reader, worker.
    /// Safe to call repeatedly.
    pub fn close(&mut self) {
        if self.state == SessionState::RecordingVideo {
            self.finish_recording();
        } else if self.timer.cancel() {
            debug!("Recording timer dropped on close");
        }
        self.recorder.reset();
        self.recording_announced = false;

        self.close_current_session();
        self.request = None;
        self.binder.close();
        self.release_image_reader();

        self.worker.quit_safely();
        self.set_state(SessionState::Preview);
    }
}
