use super::orchestrator::SessionOrchestrator;
use super::state::{SessionPurpose, SessionState};
use crate::device::{CaptureRequestBuilder, RequestTemplate};
use crate::error::{DeviceError, Result, TravcamError};
use crate::notify::HostNotification;
use crate::orientation::orientation_hint;
use crate::recorder::RecorderProfile;
use crate::storage::{MediaFile, MediaKind};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

impl SessionOrchestrator {
    /// Allocate the output file and prepare the recorder for it.
    ///
    /// On failure the freshly created target is deleted again.
    pub fn prepare_video_recording(&mut self) -> Result<MediaFile> {
        if self.state == SessionState::RecordingVideo {
            return Err(TravcamError::recorder("a recording is already running"));
        }
        let stream = *self
            .binder
            .stream_configuration()
            .ok_or_else(|| DeviceError::access_failure("camera is not open"))?;

        let file = self.store.create_output_target(MediaKind::Video)?;
        let hint = orientation_hint(stream.sensor_orientation, self.display_rotation);
        let profile =
            RecorderProfile::from_config(&self.recording, stream.video_size, hint, file.path.clone());

        self.recorder.reset();
        match self.recorder.prepare(profile) {
            Ok(input) => debug!("Recorder prepared, input {}", input.id),
            Err(e) => {
                error!("Recorder preparation failed: {}", e);
                self.store.delete(&file);
                return Err(e);
            }
        }

        info!(
            "Recording prepared at {} into {}",
            stream.video_size,
            file.path.display()
        );
        self.video_target = Some(file.clone());
        Ok(file)
    }

    /// Prepare, then request the recording session
    pub fn start_video_recording(&mut self) -> Result<bool> {
        self.prepare_video_recording()?;
        Ok(self.request_video_recording_start())
    }

    /// Replace the live session with a recording session feeding both the
    /// recorder and the preview.
    ///
    /// Returns false, with no session created and no state change, unless
    /// the camera is ready, an output target exists and the recorder is
    /// prepared.
    pub fn request_video_recording_start(&mut self) -> bool {
        if !self.is_ready() {
            debug!("Recording start ignored, camera not ready");
            return false;
        }
        if self.state == SessionState::RecordingVideo {
            warn!("Recording already running");
            return false;
        }
        let (Some(_), Some(input)) = (self.video_target.as_ref(), self.recorder.input_surface())
        else {
            warn!("Recording start rejected: no prepared recorder or output target");
            return false;
        };
        let Some(preview) = self.preview_surface() else {
            return false;
        };

        self.set_state(SessionState::RecordingVideo);
        self.recording_announced = false;

        let mut builder = CaptureRequestBuilder::new(RequestTemplate::Record);
        builder.add_target(input.id).add_target(preview.id);
        self.request = Some(builder);

        match self.replace_session(SessionPurpose::Recording, &[input, preview]) {
            Ok(session) => {
                info!("Recording session {} requested", session);
                true
            }
            Err(e) => {
                error!("Recording session could not be created: {}", e);
                self.abort_recording();
                false
            }
        }
    }

    /// Recording session configured: stream, start the recorder, arm the timer
    pub(super) fn on_recording_configured(&mut self) {
        let Some(request) = self.current_request() else {
            warn!("Recording configured without a request");
            return;
        };

        if let Err(e) = self.submit_repeating(&request) {
            error!("Recording stream did not start: {}", e);
            self.abort_recording();
            return;
        }
        if let Err(e) = self.submit_capture(&request) {
            warn!("Initial recording frame failed: {}", e);
        }
        if let Err(e) = self.recorder.start() {
            error!("Recorder did not start: {}", e);
            self.abort_recording();
            return;
        }

        let port = self.notifier.clone();
        let expiry = Arc::clone(&self.expiry);
        let generation = self.timer.start(
            self.notifier.ui(),
            move |max_ms, current_ms| {
                port.deliver_now(HostNotification::VideoRecordingProgress { max_ms, current_ms })
            },
            move |generation| expiry(generation),
        );
        info!("Recording started (timer {})", generation);
    }

    /// First frame of the recording session reached the sensor
    pub(super) fn announce_recording_started(&mut self) {
        if !self.recording_announced {
            self.recording_announced = true;
            self.notify(HostNotification::VideoRecordingStarted);
        }
    }

    /// Finalise the recording and return to preview. A no-op returning
    /// false unless a recording is running.
    pub fn request_video_recording_stop(&mut self) -> bool {
        if self.state != SessionState::RecordingVideo {
            debug!("Stop requested in {}, nothing to do", self.state);
            return false;
        }

        self.finish_recording();

        if let Err(e) = self.stop_repeating() {
            debug!("No repeating request to stop: {}", e);
        }
        self.restart_preview();
        true
    }

    /// Stop the recorder and hand the clip to the host. Leaves the state at
    /// `VIDEO_RECORDED`; callers decide what runs next.
    pub(super) fn finish_recording(&mut self) {
        self.set_state(SessionState::VideoRecorded);
        self.timer.cancel();
        if let Err(e) = self.recorder.stop() {
            error!("Recorder did not stop cleanly: {}", e);
        }
        self.recorder.reset();

        match self.video_target.clone() {
            Some(file) => {
                info!("Recording finished: {}", file.path.display());
                self.notify(HostNotification::VideoRecordingEnded { file });
            }
            None => warn!("Recording finished without an output target"),
        }
    }

    /// The countdown for `generation` ran out
    pub fn on_recording_timer_expired(&mut self, generation: u64) {
        if !self.timer.is_current(generation) {
            debug!("Ignoring expiry of replaced timer {}", generation);
            return;
        }
        if self.state != SessionState::RecordingVideo {
            return;
        }
        info!("Maximum recording length reached");
        self.request_video_recording_stop();
    }

    pub fn is_video_recording_running(&self) -> bool {
        self.state == SessionState::RecordingVideo
    }

    /// Drop a recording that never got going: release the recorder and the
    /// pending output file, then return to preview.
    pub(super) fn abort_recording(&mut self) {
        self.timer.cancel();
        self.recorder.reset();
        self.recording_announced = false;
        if let Some(file) = self.video_target.take() {
            if !self.store.delete(&file) {
                debug!("Pending target {} was not removed", file.path.display());
            }
        }
        self.set_state(SessionState::Preview);
        self.restart_preview();
    }

    /// Delete the last recorded video. Refused while recording; the
    /// reference is cleared only when the file is actually gone.
    pub fn discard_captured_video(&mut self) -> bool {
        if self.state == SessionState::RecordingVideo {
            warn!("Cannot discard the video being recorded");
            return false;
        }
        let Some(file) = self.video_target.as_ref() else {
            return false;
        };
        if self.store.delete(file) {
            info!("Discarded video {}", file.path.display());
            self.video_target = None;
            true
        } else {
            warn!("Failed to delete video {}", file.path.display());
            false
        }
    }
}
