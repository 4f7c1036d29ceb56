use super::orchestrator::SessionOrchestrator;
use super::state::{SessionPurpose, SessionState};
use crate::device::{AfMode, CaptureRequestBuilder, ControlMode, RequestTemplate};
use crate::error::{DeviceError, Result};
use tracing::{debug, error, warn};

impl SessionOrchestrator {
    /// Replace the live session with a preview session on the host surface
    pub fn start_preview(&mut self) -> Result<()> {
        if !self.is_ready() {
            return Err(DeviceError::access_failure(
                "preview needs an open camera and an available surface",
            )
            .into());
        }
        let preview = self
            .preview_surface()
            .ok_or_else(|| DeviceError::access_failure("preview size unknown"))?;

        self.surface.set_default_buffer_size(preview.size);

        let mut builder = CaptureRequestBuilder::new(RequestTemplate::Preview);
        builder.add_target(preview.id);
        self.request = Some(builder);

        self.replace_session(SessionPurpose::Preview, &[preview])?;
        self.set_state(SessionState::Preview);
        Ok(())
    }

    /// Preview session configured: stream continuously with auto control
    pub(super) fn on_preview_configured(&mut self) {
        let auto_focus = self.binder.is_auto_focus_supported();
        let Some(builder) = self.request.as_mut() else {
            warn!("Preview configured without a request");
            return;
        };

        builder.control_mode(ControlMode::Auto).af_mode(if auto_focus {
            AfMode::ContinuousPicture
        } else {
            AfMode::Off
        });
        let request = builder.build();

        match self.submit_repeating(&request) {
            Ok(id) => debug!("Preview repeating as {}", id),
            Err(e) => error!("Failed to start preview stream: {}", e),
        }
    }

    /// Start a fresh preview after a capture finished or a session failed
    pub(super) fn restart_preview(&mut self) {
        if let Err(e) = self.start_preview() {
            warn!("Could not return to preview: {}", e);
        }
    }
}
