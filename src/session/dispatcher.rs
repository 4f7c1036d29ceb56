use super::orchestrator::SessionOrchestrator;
use super::state::{SessionPurpose, SessionState};
use crate::device::SessionId;
use crate::error::TravcamError;
use crate::events::CameraEvent;
use crate::notify::HostNotification;
use tracing::{debug, error, trace, warn};

/// Route one device callback into the orchestrator.
///
/// Session-scoped events from any session other than the live one are
/// dropped, so callbacks of a torn-down session never act on its
/// replacement.
pub fn dispatch(orchestrator: &mut SessionOrchestrator, event: CameraEvent) {
    trace!("Dispatching {}", event.description());

    if let Some(session) = event.session() {
        if orchestrator.live_session_id() != Some(session) {
            debug!("Ignoring {} from closed {}", event.event_type(), session);
            return;
        }
    }

    match event {
        CameraEvent::DeviceOpened { camera_id } => orchestrator.on_device_opened(&camera_id),
        CameraEvent::DeviceDisconnected { camera_id } => {
            orchestrator.on_device_disconnected(&camera_id)
        }
        CameraEvent::DeviceError { camera_id, code } => {
            orchestrator.on_device_error(&camera_id, code)
        }
        CameraEvent::SessionConfigured { .. } => on_session_configured(orchestrator),
        CameraEvent::SessionConfigFailed { session } => {
            on_session_config_failed(orchestrator, session)
        }
        CameraEvent::CaptureStarted { .. } => match orchestrator.state {
            SessionState::CapturingImage => orchestrator.play_shutter(),
            SessionState::RecordingVideo => orchestrator.announce_recording_started(),
            _ => {}
        },
        CameraEvent::CaptureCompleted { .. } => {
            if orchestrator.state.is_still_in_flight()
                || orchestrator.state == SessionState::ImageCaptured
            {
                orchestrator.finish_still_capture();
            }
        }
        CameraEvent::CaptureFailed {
            session,
            request,
            reason,
        } => {
            let error = TravcamError::CaptureFailed {
                details: format!("{} on {}: {}", request, session, reason),
            };
            warn!("{} (state {})", error, orchestrator.state);
        }
        CameraEvent::ImageAvailable { reader, image } => {
            orchestrator.on_image_available(reader, image)
        }
    }
}

fn on_session_configured(orchestrator: &mut SessionOrchestrator) {
    let Some(session) = orchestrator.session.as_mut() else {
        return;
    };
    session.configured = true;
    let purpose = session.purpose;
    debug!("{} configured for {:?}", session.id, purpose);

    match purpose {
        SessionPurpose::Preview => orchestrator.on_preview_configured(),
        SessionPurpose::StillCapture => orchestrator.on_still_configured(),
        SessionPurpose::Recording => orchestrator.on_recording_configured(),
    }
}

fn on_session_config_failed(orchestrator: &mut SessionOrchestrator, session: SessionId) {
    let Some(purpose) = orchestrator.session.map(|live| live.purpose) else {
        return;
    };
    error!("{}", TravcamError::SessionConfigureFailed { session });
    orchestrator.close_current_session();

    match purpose {
        SessionPurpose::Preview => {
            error!("Preview cannot be configured, closing camera");
            orchestrator.close();
            orchestrator.notify(HostNotification::FatalDeviceError);
        }
        SessionPurpose::StillCapture => {
            orchestrator.release_image_reader();
            orchestrator.restart_preview();
        }
        SessionPurpose::Recording => orchestrator.abort_recording(),
    }
}
