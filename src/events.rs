use crate::device::{CapturedImage, RequestId, SessionId, SurfaceId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Reason codes a device reports alongside a fatal error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceErrorCode {
    CameraInUse,
    MaxCamerasInUse,
    CameraDisabled,
    CameraDevice,
    CameraService,
}

/// Everything the device side can report back to the orchestrator
#[derive(Debug, Clone, PartialEq)]
pub enum CameraEvent {
    /// A pending open completed and the handle is usable
    DeviceOpened { camera_id: String },
    /// The device went away (unplugged, taken by a higher-priority client)
    DeviceDisconnected { camera_id: String },
    /// The device reported an unrecoverable error
    DeviceError {
        camera_id: String,
        code: DeviceErrorCode,
    },
    /// Session negotiation finished and submissions may start
    SessionConfigured { session: SessionId },
    /// Session negotiation was rejected by the device
    SessionConfigFailed { session: SessionId },
    /// Exposure of a frame began
    CaptureStarted {
        session: SessionId,
        request: RequestId,
        frame_number: u64,
    },
    /// A frame and its metadata are fully available
    CaptureCompleted {
        session: SessionId,
        request: RequestId,
        frame_number: u64,
    },
    /// A single submission produced no result
    CaptureFailed {
        session: SessionId,
        request: RequestId,
        reason: String,
    },
    /// An image reader has a buffer ready
    ImageAvailable {
        reader: SurfaceId,
        image: CapturedImage,
    },
}

impl CameraEvent {
    /// Session the event belongs to, if it is session scoped
    pub fn session(&self) -> Option<SessionId> {
        match self {
            CameraEvent::SessionConfigured { session }
            | CameraEvent::SessionConfigFailed { session }
            | CameraEvent::CaptureStarted { session, .. }
            | CameraEvent::CaptureCompleted { session, .. }
            | CameraEvent::CaptureFailed { session, .. } => Some(*session),
            _ => None,
        }
    }

    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            CameraEvent::DeviceOpened { camera_id } => format!("Camera {} opened", camera_id),
            CameraEvent::DeviceDisconnected { camera_id } => {
                format!("Camera {} disconnected", camera_id)
            }
            CameraEvent::DeviceError { camera_id, code } => {
                format!("Camera {} error: {:?}", camera_id, code)
            }
            CameraEvent::SessionConfigured { session } => format!("{} configured", session),
            CameraEvent::SessionConfigFailed { session } => {
                format!("{} configuration failed", session)
            }
            CameraEvent::CaptureStarted {
                session,
                frame_number,
                ..
            } => format!("{} frame {} started", session, frame_number),
            CameraEvent::CaptureCompleted {
                session,
                frame_number,
                ..
            } => format!("{} frame {} completed", session, frame_number),
            CameraEvent::CaptureFailed {
                session,
                request,
                reason,
            } => format!("{} {} failed: {}", session, request, reason),
            CameraEvent::ImageAvailable { reader, image } => {
                format!("{} image ready ({} bytes, {})", reader, image.len(), image.size)
            }
        }
    }

    /// Get the event type as a string for filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            CameraEvent::DeviceOpened { .. } => "device_opened",
            CameraEvent::DeviceDisconnected { .. } => "device_disconnected",
            CameraEvent::DeviceError { .. } => "device_error",
            CameraEvent::SessionConfigured { .. } => "session_configured",
            CameraEvent::SessionConfigFailed { .. } => "session_config_failed",
            CameraEvent::CaptureStarted { .. } => "capture_started",
            CameraEvent::CaptureCompleted { .. } => "capture_completed",
            CameraEvent::CaptureFailed { .. } => "capture_failed",
            CameraEvent::ImageAvailable { .. } => "image_available",
        }
    }
}

/// Where a device delivers its events.
///
/// The sink never runs orchestrator logic inline; the controller's sink
/// posts each event onto the worker context, tests collect them in a channel.
#[derive(Clone)]
pub struct EventSink {
    deliver: Arc<dyn Fn(CameraEvent) + Send + Sync>,
}

impl EventSink {
    pub fn new<F>(deliver: F) -> Self
    where
        F: Fn(CameraEvent) + Send + Sync + 'static,
    {
        Self {
            deliver: Arc::new(deliver),
        }
    }

    /// Sink backed by an unbounded crossbeam channel
    pub fn channel() -> (Self, crossbeam::channel::Receiver<CameraEvent>) {
        let (tx, rx) = crossbeam::channel::unbounded();
        let sink = Self::new(move |event| {
            let _ = tx.send(event);
        });
        (sink, rx)
    }

    /// Sink that drops everything
    pub fn discard() -> Self {
        Self::new(|_| {})
    }

    pub fn emit(&self, event: CameraEvent) {
        trace!("Emitting camera event: {}", event.description());
        (self.deliver)(event);
    }
}

impl fmt::Debug for EventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSink").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_session_scope() {
        let event = CameraEvent::CaptureStarted {
            session: SessionId(4),
            request: RequestId(9),
            frame_number: 1,
        };
        assert_eq!(event.session(), Some(SessionId(4)));
        assert_eq!(event.event_type(), "capture_started");
        assert_eq!(event.description(), "session#4 frame 1 started");

        let event = CameraEvent::DeviceOpened {
            camera_id: "0".to_string(),
        };
        assert_eq!(event.session(), None);
    }

    #[test]
    fn test_channel_sink_preserves_order() {
        let (sink, rx) = EventSink::channel();
        sink.emit(CameraEvent::SessionConfigured {
            session: SessionId(1),
        });
        sink.emit(CameraEvent::SessionConfigFailed {
            session: SessionId(2),
        });

        let received: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            received,
            vec![
                CameraEvent::SessionConfigured {
                    session: SessionId(1)
                },
                CameraEvent::SessionConfigFailed {
                    session: SessionId(2)
                },
            ]
        );
    }
}
