use crate::runtime::TaskQueue;
use crate::storage::MediaFile;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Callbacks the embedding host receives
pub trait HostListener: Send + Sync {
    fn on_image_captured(&self, file: &MediaFile);
    fn on_video_recording_started(&self);
    fn on_video_recording_ended(&self, file: &MediaFile);
    fn on_video_recording_progress(&self, max_ms: u64, current_ms: u64);
    fn on_fatal_device_error(&self);
}

/// Plays the shutter click when a still capture starts
pub trait ShutterSound: Send + Sync {
    fn play(&self);
}

/// One host callback as a value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HostNotification {
    ImageCaptured { file: MediaFile },
    VideoRecordingStarted,
    VideoRecordingEnded { file: MediaFile },
    VideoRecordingProgress { max_ms: u64, current_ms: u64 },
    FatalDeviceError,
}

impl HostNotification {
    pub fn deliver(&self, listener: &dyn HostListener) {
        match self {
            HostNotification::ImageCaptured { file } => listener.on_image_captured(file),
            HostNotification::VideoRecordingStarted => listener.on_video_recording_started(),
            HostNotification::VideoRecordingEnded { file } => {
                listener.on_video_recording_ended(file)
            }
            HostNotification::VideoRecordingProgress { max_ms, current_ms } => {
                listener.on_video_recording_progress(*max_ms, *current_ms)
            }
            HostNotification::FatalDeviceError => listener.on_fatal_device_error(),
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            HostNotification::ImageCaptured { .. } => "image_captured",
            HostNotification::VideoRecordingStarted => "video_recording_started",
            HostNotification::VideoRecordingEnded { .. } => "video_recording_ended",
            HostNotification::VideoRecordingProgress { .. } => "video_recording_progress",
            HostNotification::FatalDeviceError => "fatal_device_error",
        }
    }
}

/// Delivers host notifications on the UI context
#[derive(Clone)]
pub struct NotificationPort {
    listener: Arc<dyn HostListener>,
    ui: TaskQueue,
}

impl NotificationPort {
    pub fn new(listener: Arc<dyn HostListener>, ui: TaskQueue) -> Self {
        Self { listener, ui }
    }

    /// Hand a notification to the UI context
    pub fn notify(&self, notification: HostNotification) {
        debug!("Notifying host: {}", notification.event_type());
        let listener = Arc::clone(&self.listener);
        let kind = notification.event_type();
        if !self.ui.post(move || notification.deliver(listener.as_ref())) {
            warn!("UI context is not running, dropped {} notification", kind);
        }
    }

    /// Deliver immediately; only for callers already on the UI context
    pub fn deliver_now(&self, notification: HostNotification) {
        notification.deliver(self.listener.as_ref());
    }

    pub fn ui(&self) -> &TaskQueue {
        &self.ui
    }
}

/// Forwards every callback into a tokio channel as a [`HostNotification`]
pub struct ChannelListener {
    sender: mpsc::UnboundedSender<HostNotification>,
}

impl ChannelListener {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<HostNotification>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    fn forward(&self, notification: HostNotification) {
        if self.sender.send(notification).is_err() {
            debug!("Notification receiver dropped");
        }
    }
}

impl HostListener for ChannelListener {
    fn on_image_captured(&self, file: &MediaFile) {
        self.forward(HostNotification::ImageCaptured { file: file.clone() });
    }

    fn on_video_recording_started(&self) {
        self.forward(HostNotification::VideoRecordingStarted);
    }

    fn on_video_recording_ended(&self, file: &MediaFile) {
        self.forward(HostNotification::VideoRecordingEnded { file: file.clone() });
    }

    fn on_video_recording_progress(&self, max_ms: u64, current_ms: u64) {
        self.forward(HostNotification::VideoRecordingProgress { max_ms, current_ms });
    }

    fn on_fatal_device_error(&self) {
        self.forward(HostNotification::FatalDeviceError);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MediaKind;
    use chrono::Utc;
    use std::path::PathBuf;
    use std::time::Duration;

    fn media_file() -> MediaFile {
        MediaFile {
            path: PathBuf::from("/tmp/trav_vid_1_abc.mp4"),
            kind: MediaKind::Video,
            created_at: Utc::now(),
            orientation: None,
        }
    }

    #[tokio::test]
    async fn test_notifications_arrive_on_ui_context() {
        let ui = TaskQueue::new("ui", Duration::from_secs(1));
        let (listener, mut rx) = ChannelListener::channel();
        let port = NotificationPort::new(Arc::new(listener), ui.clone());

        port.notify(HostNotification::VideoRecordingStarted);
        assert!(rx.try_recv().is_err());

        ui.start().await;
        port.notify(HostNotification::VideoRecordingStarted);
        port.notify(HostNotification::VideoRecordingEnded { file: media_file() });
        ui.flush().await.unwrap();

        assert_eq!(rx.try_recv().unwrap(), HostNotification::VideoRecordingStarted);
        assert!(matches!(
            rx.try_recv().unwrap(),
            HostNotification::VideoRecordingEnded { .. }
        ));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_notification_json_shape() {
        let progress = HostNotification::VideoRecordingProgress {
            max_ms: 30_000,
            current_ms: 1_000,
        };
        let json = serde_json::to_value(&progress).unwrap();
        assert_eq!(json["event"], "video_recording_progress");
        assert_eq!(json["max_ms"], 30_000);
        assert_eq!(json["current_ms"], 1_000);

        let json = serde_json::to_value(HostNotification::FatalDeviceError).unwrap();
        assert_eq!(json["event"], "fatal_device_error");
    }
}
