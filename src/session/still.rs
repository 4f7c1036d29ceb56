use super::orchestrator::SessionOrchestrator;
use super::state::{SessionPurpose, SessionState};
use crate::device::{
    AeMode, AfTrigger, CaptureRequestBuilder, CapturedImage, ImageFormat, RequestTemplate,
    SurfaceId,
};
use crate::error::{DeviceError, Result};
use crate::notify::HostNotification;
use tracing::{debug, error, info, warn};

impl SessionOrchestrator {
    /// Tear down the preview and capture one JPEG still.
    ///
    /// Returns false, without touching the live session, when the camera,
    /// surface or preview size is not ready or a recording is running.
    pub fn request_image_capture(&mut self) -> bool {
        if !self.is_ready() {
            debug!("Image capture ignored, camera not ready");
            return false;
        }
        if self.state == SessionState::RecordingVideo {
            warn!("Image capture rejected while recording");
            return false;
        }

        match self.begin_still_capture() {
            Ok(()) => true,
            Err(e) => {
                error!("Image capture failed to start: {}", e);
                self.release_image_reader();
                self.restart_preview();
                false
            }
        }
    }

    fn begin_still_capture(&mut self) -> Result<()> {
        let size = self
            .preview_size()
            .ok_or_else(|| DeviceError::access_failure("preview size unknown"))?;

        self.close_current_session();
        self.release_image_reader();

        let reader = self
            .binder
            .backend()
            .create_image_reader(size, ImageFormat::Jpeg, 1)?;
        let target = reader.surface;
        self.image_reader = Some(reader);

        self.set_state(SessionState::CapturingImage);

        let mut builder = CaptureRequestBuilder::new(RequestTemplate::StillCapture);
        builder
            .ae_mode(AeMode::OnAutoFlash)
            .target_rotation(self.display_rotation)
            .add_target(target.id);
        self.request = Some(builder);

        self.replace_session(SessionPurpose::StillCapture, &[target])?;
        info!("Still capture requested at {}", size);
        Ok(())
    }

    /// Still session configured: capture, locking focus first on fixed-focus
    /// hardware.
    pub(super) fn on_still_configured(&mut self) {
        let result = if self.binder.is_auto_focus_supported() {
            self.capture_still()
        } else {
            self.lock_focus_and_capture()
        };

        if let Err(e) = result {
            error!("Still capture was not submitted: {}", e);
            self.restart_preview();
        }
    }

    fn capture_still(&mut self) -> Result<()> {
        if let Some(request) = self.current_request() {
            let id = self.submit_capture(&request)?;
            debug!("Still capture submitted as {}", id);
        }
        Ok(())
    }

    fn lock_focus_and_capture(&mut self) -> Result<()> {
        self.set_state(SessionState::FocusLocked);
        if let Some(builder) = self.request.as_mut() {
            builder.af_trigger(AfTrigger::Start);
        }
        self.capture_still()?;
        self.unlock_focus()
    }

    fn unlock_focus(&mut self) -> Result<()> {
        if let Some(builder) = self.request.as_mut() {
            builder.af_trigger(AfTrigger::Cancel);
        }
        if let Some(request) = self.current_request() {
            self.submit_repeating(&request)?;
        }
        self.set_state(SessionState::FocusUnlocked);
        Ok(())
    }

    /// JPEG delivered by the image reader
    pub(super) fn on_image_available(&mut self, reader: SurfaceId, image: CapturedImage) {
        if self.image_reader.map(|current| current.surface.id) != Some(reader) {
            debug!("Ignoring image from released reader {}", reader);
            return;
        }
        if self.state.is_still_in_flight() {
            self.set_state(SessionState::ImageCaptured);
        }

        let degrees = self.orientation.image_orientation_degrees();
        match self.store.store_image(&image, degrees) {
            Ok(file) => {
                info!("Image stored at {}", file.path.display());
                self.last_image = Some(file.clone());
                self.notify(HostNotification::ImageCaptured { file });
            }
            Err(e) => error!("Failed to store captured image: {}", e),
        }
    }

    /// Still capture done: go back to preview
    pub(super) fn finish_still_capture(&mut self) {
        if let Err(e) = self.stop_repeating() {
            debug!("No repeating request to stop: {}", e);
        }
        self.restart_preview();
    }

    pub(super) fn play_shutter(&self) {
        if let Some(shutter) = &self.shutter {
            shutter.play();
        }
    }

    pub(super) fn release_image_reader(&mut self) {
        if let Some(reader) = self.image_reader.take() {
            self.binder.backend().close_image_reader(&reader);
        }
    }

    /// Delete the last captured image. The reference is cleared only when
    /// the file is actually gone.
    pub fn discard_captured_image(&mut self) -> bool {
        let Some(file) = self.last_image.as_ref() else {
            return false;
        };
        if self.store.delete(file) {
            info!("Discarded image {}", file.path.display());
            self.last_image = None;
            true
        } else {
            warn!("Failed to delete image {}", file.path.display());
            false
        }
    }
}
