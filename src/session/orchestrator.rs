use super::state::{CaptureSession, SessionPurpose, SessionState};
use super::timer::RecordingTimer;
use crate::config::{RecordingConfig, TravcamConfig};
use crate::device::{
    CameraBackend, CaptureRequest, CaptureRequestBuilder, DeviceBinder, DisplayInfo, ImageReader,
    RequestId, SessionId, Size, SizeLimits, Surface, SurfaceKind,
};
use crate::error::{DeviceError, Result};
use crate::events::EventSink;
use crate::notify::{HostListener, HostNotification, NotificationPort, ShutterSound};
use crate::orientation::{OrientationTracker, Rotation};
use crate::recorder::MediaRecorder;
use crate::runtime::ExecutionContexts;
use crate::runtime::TaskQueue;
use crate::storage::{MediaFile, MediaStore};
use crate::surface::RenderSurface;
use std::sync::Arc;
use tracing::debug;

/// Called with the generation of a recording timer that ran out
pub type ExpiryHook = Arc<dyn Fn(u64) + Send + Sync>;

/// External collaborators the orchestrator drives
pub struct Collaborators {
    pub backend: Arc<dyn CameraBackend>,
    pub surface: Arc<dyn RenderSurface>,
    pub recorder: Box<dyn MediaRecorder>,
    pub store: Arc<dyn MediaStore>,
    pub listener: Arc<dyn HostListener>,
    pub shutter: Option<Arc<dyn ShutterSound>>,
}

/// Owns the device handle, the single live capture session and the
/// recording resources of one camera.
///
/// Every method is expected to run on the worker context; device callbacks
/// reach it through [`super::dispatch`].
pub struct SessionOrchestrator {
    pub(super) binder: DeviceBinder,
    pub(super) surface: Arc<dyn RenderSurface>,
    pub(super) surface_size: Option<Size>,
    pub(super) display_rotation: Rotation,
    pub(super) display_size: Size,
    pub(super) state: SessionState,
    pub(super) session: Option<CaptureSession>,
    pub(super) request: Option<CaptureRequestBuilder>,
    pub(super) image_reader: Option<ImageReader>,
    pub(super) recorder: Box<dyn MediaRecorder>,
    pub(super) recording: RecordingConfig,
    pub(super) video_target: Option<MediaFile>,
    pub(super) recording_announced: bool,
    pub(super) last_image: Option<MediaFile>,
    pub(super) timer: RecordingTimer,
    pub(super) expiry: ExpiryHook,
    pub(super) orientation: Arc<OrientationTracker>,
    pub(super) notifier: NotificationPort,
    pub(super) store: Arc<dyn MediaStore>,
    pub(super) shutter: Option<Arc<dyn ShutterSound>>,
    pub(super) worker: TaskQueue,
    pub(super) events: EventSink,
}

impl SessionOrchestrator {
    pub fn new(
        config: &TravcamConfig,
        collaborators: Collaborators,
        contexts: &ExecutionContexts,
        events: EventSink,
        expiry: ExpiryHook,
        orientation: Arc<OrientationTracker>,
    ) -> Self {
        let limits = SizeLimits {
            max_preview: config.camera.max_preview_size(),
            max_video_width: config.camera.max_video_width,
        };

        Self {
            binder: DeviceBinder::new(collaborators.backend, config.camera.index, limits),
            surface: collaborators.surface,
            surface_size: None,
            display_rotation: config.display.rotation,
            display_size: config.display.size(),
            state: SessionState::Preview,
            session: None,
            request: None,
            image_reader: None,
            recorder: collaborators.recorder,
            recording: config.recording.clone(),
            video_target: None,
            recording_announced: false,
            last_image: None,
            timer: RecordingTimer::new(
                config.recording.max_duration(),
                config.recording.tick_interval(),
            ),
            expiry,
            orientation,
            notifier: NotificationPort::new(collaborators.listener, contexts.ui.clone()),
            store: collaborators.store,
            shutter: collaborators.shutter,
            worker: contexts.worker.clone(),
            events,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn live_session(&self) -> Option<CaptureSession> {
        self.session
    }

    pub fn live_session_id(&self) -> Option<SessionId> {
        self.session.map(|session| session.id)
    }

    pub fn is_device_open(&self) -> bool {
        self.binder.is_open()
    }

    pub fn preview_size(&self) -> Option<Size> {
        self.binder
            .stream_configuration()
            .map(|stream| stream.preview_size)
    }

    pub fn video_size(&self) -> Option<Size> {
        self.binder.stream_configuration().map(|stream| stream.video_size)
    }

    pub fn display_rotation(&self) -> Rotation {
        self.display_rotation
    }

    pub fn last_image(&self) -> Option<&MediaFile> {
        self.last_image.as_ref()
    }

    pub fn last_video(&self) -> Option<&MediaFile> {
        self.video_target.as_ref()
    }

    pub fn is_recording_timer_active(&self) -> bool {
        self.timer.is_active()
    }

    pub(super) fn set_state(&mut self, state: SessionState) {
        if self.state != state {
            debug!("Session state {} -> {}", self.state, state);
            self.state = state;
        }
    }

    pub(super) fn display_info(&self) -> DisplayInfo {
        DisplayInfo {
            rotation: self.display_rotation,
            size: self.display_size,
        }
    }

    /// Device open, surface available and preview size known
    pub(super) fn is_ready(&self) -> bool {
        self.binder.is_open() && self.surface_size.is_some() && self.preview_size().is_some()
    }

    pub(super) fn preview_surface(&self) -> Option<Surface> {
        self.surface_size?;
        Some(Surface {
            id: self.surface.surface_id(),
            kind: SurfaceKind::Preview,
            size: self.preview_size()?,
        })
    }

    pub(super) fn notify(&self, notification: HostNotification) {
        self.notifier.notify(notification);
    }

    /// Close the live session, if any
    pub(super) fn close_current_session(&mut self) {
        if let Some(session) = self.session.take() {
            debug!("Closing {} ({:?})", session.id, session.purpose);
            if let Some(device) = self.binder.device_mut() {
                device.close_session(session.id);
            }
        }
    }

    /// Tear down the live session, then create its replacement
    pub(super) fn replace_session(
        &mut self,
        purpose: SessionPurpose,
        outputs: &[Surface],
    ) -> Result<SessionId> {
        self.close_current_session();

        let device = self
            .binder
            .device_mut()
            .ok_or_else(|| DeviceError::access_failure("camera is not open"))?;
        let id = device.create_capture_session(outputs)?;

        debug!("Created {} for {:?}", id, purpose);
        self.session = Some(CaptureSession {
            id,
            purpose,
            configured: false,
        });
        Ok(id)
    }

    fn live_target(&self) -> Result<SessionId> {
        match self.session {
            Some(session) if session.configured => Ok(session.id),
            Some(session) => Err(DeviceError::StaleSession {
                session: session.id,
            }
            .into()),
            None => Err(DeviceError::access_failure("no live capture session").into()),
        }
    }

    pub(super) fn submit_capture(&mut self, request: &CaptureRequest) -> Result<RequestId> {
        let session = self.live_target()?;
        let device = self
            .binder
            .device_mut()
            .ok_or_else(|| DeviceError::access_failure("camera is not open"))?;
        Ok(device.capture(session, request)?)
    }

    pub(super) fn submit_repeating(&mut self, request: &CaptureRequest) -> Result<RequestId> {
        let session = self.live_target()?;
        let device = self
            .binder
            .device_mut()
            .ok_or_else(|| DeviceError::access_failure("camera is not open"))?;
        Ok(device.set_repeating_request(session, request)?)
    }

    pub(super) fn stop_repeating(&mut self) -> Result<()> {
        let session = self.live_target()?;
        let device = self
            .binder
            .device_mut()
            .ok_or_else(|| DeviceError::access_failure("camera is not open"))?;
        Ok(device.stop_repeating(session)?)
    }

    /// Build the current request, if a transition prepared one
    pub(super) fn current_request(&self) -> Option<CaptureRequest> {
        self.request.as_ref().map(CaptureRequestBuilder::build)
    }
}
