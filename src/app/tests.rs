use super::*;
use crate::config::TravcamConfig;
use crate::device::{DeviceCall, SimulatedBackend};
use crate::error::TravcamError;
use crate::events::DeviceErrorCode;
use crate::notify::{ChannelListener, HostNotification};
use crate::permissions::{GrantedPermissions, Permission, PermissionGate, StaticPermissions};
use crate::recorder::{RecordedClip, SimulatedRecorder};
use crate::session::{Collaborators, SessionState};
use crate::storage::FileMediaStore;
use crate::surface::HeadlessSurface;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;

struct Fixture {
    controller: CameraController,
    backend: SimulatedBackend,
    notifications: mpsc::UnboundedReceiver<HostNotification>,
    clips: Arc<Mutex<Vec<RecordedClip>>>,
    _media: TempDir,
}

impl Fixture {
    async fn new(permissions: Arc<dyn PermissionGate>) -> Self {
        let media = TempDir::new().unwrap();
        let backend = SimulatedBackend::default();
        let recorder = SimulatedRecorder::new();
        let clips = recorder.clips();
        let (listener, notifications) = ChannelListener::channel();

        let collaborators = Collaborators {
            backend: Arc::new(backend.clone()),
            surface: Arc::new(HeadlessSurface::new()),
            recorder: Box::new(recorder),
            store: Arc::new(FileMediaStore::new(media.path())),
            listener: Arc::new(listener),
            shutter: None,
        };

        let controller = CameraController::new(TravcamConfig::default(), collaborators, permissions)
            .await
            .unwrap();

        Self {
            controller,
            backend,
            notifications,
            clips,
            _media: media,
        }
    }

    async fn granted() -> Self {
        Self::new(Arc::new(GrantedPermissions)).await
    }

    async fn open(&mut self) {
        self.controller.surface_available(1280, 720).await.unwrap();
        self.controller.settle().await.unwrap();
        assert_eq!(self.controller.session_state(), SessionState::Preview);
        assert!(self.controller.status().device_open);
    }

    async fn drain(&mut self) -> Vec<HostNotification> {
        self.controller.settle().await.unwrap();
        let mut received = Vec::new();
        while let Ok(notification) = self.notifications.try_recv() {
            received.push(notification);
        }
        received
    }
}

#[tokio::test]
async fn test_photo_flow() {
    let mut f = Fixture::granted().await;
    assert_eq!(f.controller.controller_state(), ControllerState::Idle);
    f.open().await;
    assert_eq!(f.controller.controller_state(), ControllerState::Active);

    assert!(f.controller.capture_image().await.unwrap());
    let notifications = f.drain().await;
    assert_eq!(notifications.len(), 1);
    let file = match &notifications[0] {
        HostNotification::ImageCaptured { file } => file.clone(),
        other => panic!("unexpected notification: {:?}", other),
    };
    assert!(file.path.exists());
    assert_eq!(f.controller.status().last_image, Some(file.clone()));
    assert_eq!(f.controller.session_state(), SessionState::Preview);

    assert!(f.controller.discard_captured_image().await.unwrap());
    assert!(!file.path.exists());

    assert_eq!(f.controller.shutdown().await, 0);
    assert_eq!(f.controller.controller_state(), ControllerState::Stopped);
    assert!(!f.backend.is_device_open());
}

#[tokio::test(start_paused = true)]
async fn test_recording_stops_itself_after_thirty_seconds() {
    let mut f = Fixture::granted().await;
    f.open().await;

    assert!(f.controller.start_video_recording().await.unwrap());
    f.controller.settle().await.unwrap();
    assert!(f.controller.is_video_recording_running());

    tokio::time::sleep(Duration::from_secs(31)).await;
    let notifications = f.drain().await;

    assert_eq!(notifications[0], HostNotification::VideoRecordingStarted);
    let progress: Vec<_> = notifications
        .iter()
        .filter_map(|notification| match notification {
            HostNotification::VideoRecordingProgress { max_ms, current_ms } => {
                Some((*max_ms, *current_ms))
            }
            _ => None,
        })
        .collect();
    assert_eq!(progress.len(), 30);
    assert_eq!(progress.last(), Some(&(30_000, 30_000)));

    let ended: Vec<_> = notifications
        .iter()
        .filter(|n| matches!(n, HostNotification::VideoRecordingEnded { .. }))
        .collect();
    assert_eq!(ended.len(), 1);
    assert!(matches!(
        notifications.last(),
        Some(HostNotification::VideoRecordingEnded { .. })
    ));

    assert!(!f.controller.is_video_recording_running());
    assert_eq!(f.controller.session_state(), SessionState::Preview);
    assert_eq!(f.clips.lock().len(), 1);

    // A late stop does nothing
    assert!(!f.controller.stop_video_recording().await.unwrap());
    assert!(f.drain().await.is_empty());
}

#[tokio::test]
async fn test_missing_permissions_keep_camera_closed() {
    let mut f = Fixture::new(Arc::new(StaticPermissions::new([Permission::Camera]))).await;

    match f.controller.surface_available(1280, 720).await {
        Err(TravcamError::PermissionDenied { missing }) => {
            assert_eq!(missing, vec![Permission::Microphone, Permission::Storage]);
        }
        other => panic!("unexpected result: {:?}", other),
    }

    assert!(f.backend.calls().is_empty());
    assert!(!f.controller.contexts().worker.is_running());
    assert_eq!(f.controller.controller_state(), ControllerState::Detached);
    assert!(f.drain().await.is_empty());
}

#[tokio::test]
async fn test_pause_and_resume_reopen_the_camera() {
    let mut f = Fixture::granted().await;
    f.open().await;

    f.controller.pause().await;
    assert_eq!(f.controller.controller_state(), ControllerState::Paused);
    assert!(!f.controller.contexts().worker.is_running());
    assert!(matches!(
        f.controller.capture_image().await,
        Err(TravcamError::ContextStopped { .. })
    ));

    assert!(f.controller.resume().await.unwrap());
    f.controller.settle().await.unwrap();

    let opens = f
        .backend
        .calls()
        .iter()
        .filter(|call| matches!(call, DeviceCall::Open { .. }))
        .count();
    assert_eq!(opens, 2);
    assert!(f.controller.status().device_open);
    assert_eq!(f.controller.session_state(), SessionState::Preview);
    assert!(f.controller.capture_image().await.unwrap());
}

fn count_ended(notifications: &[HostNotification]) -> usize {
    notifications
        .iter()
        .filter(|n| matches!(n, HostNotification::VideoRecordingEnded { .. }))
        .count()
}

#[tokio::test(start_paused = true)]
async fn test_pause_during_recording_finishes_the_clip() {
    let mut f = Fixture::granted().await;
    f.open().await;

    assert!(f.controller.start_video_recording().await.unwrap());
    f.controller.settle().await.unwrap();
    tokio::time::sleep(Duration::from_millis(4_500)).await;

    f.controller.pause().await;
    assert!(!f.controller.is_video_recording_running());
    assert!(!f.controller.orchestrator.lock().is_recording_timer_active());
    let notifications = f.drain().await;
    assert_eq!(count_ended(&notifications), 1);
    assert_eq!(f.clips.lock().len(), 1);

    // Nothing keeps ticking while paused
    tokio::time::sleep(Duration::from_secs(31)).await;
    assert!(f.drain().await.is_empty());

    assert!(f.controller.resume().await.unwrap());
    f.controller.settle().await.unwrap();
    assert_eq!(f.controller.session_state(), SessionState::Preview);
    assert_eq!(count_ended(&f.drain().await), 0);
    assert_eq!(f.clips.lock().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_recording_expires_with_worker_stopped() {
    let mut f = Fixture::granted().await;
    f.open().await;

    assert!(f.controller.start_video_recording().await.unwrap());
    f.controller.settle().await.unwrap();

    f.controller.contexts().worker.stop().await;
    tokio::time::sleep(Duration::from_secs(31)).await;

    let notifications = f.drain().await;
    assert_eq!(count_ended(&notifications), 1);
    assert!(!f.controller.is_video_recording_running());
    assert_eq!(f.clips.lock().len(), 1);
}

#[tokio::test]
async fn test_surface_loss_releases_the_camera() {
    let mut f = Fixture::granted().await;
    f.open().await;

    f.controller.surface_destroyed().await.unwrap();
    assert!(!f.backend.is_device_open());
    assert!(!f.controller.contexts().worker.is_running());
    assert_eq!(f.controller.controller_state(), ControllerState::Detached);

    // A new surface starts a fresh open cycle
    f.open().await;
    assert!(f.backend.is_device_open());
}

#[tokio::test]
async fn test_device_error_reaches_host() {
    let mut f = Fixture::granted().await;
    f.open().await;

    f.backend.raise_error(DeviceErrorCode::CameraService);
    let notifications = f.drain().await;

    assert_eq!(notifications, vec![HostNotification::FatalDeviceError]);
    assert!(!f.controller.status().device_open);
    assert!(!f.backend.is_device_open());
}

#[tokio::test]
async fn test_status_serializes() {
    let mut f = Fixture::granted().await;
    f.open().await;

    let json = serde_json::to_value(f.controller.status()).unwrap();
    assert_eq!(json["controller"], "active");
    assert_eq!(json["session"], "PREVIEW");
    assert_eq!(json["device_open"], true);
    assert_eq!(json["recording"], false);
}

#[tokio::test]
async fn test_run_until_reports_why_it_ended() {
    let f = Fixture::granted().await;

    let reason = f.controller.run_until(async { Ok(()) }).await;
    assert_eq!(reason, ShutdownReason::Completed);

    let reason = f
        .controller
        .run_until(async { Err(TravcamError::system("boom")) })
        .await;
    assert!(matches!(reason, ShutdownReason::Error(message) if message.contains("boom")));

    f.controller.request_shutdown();
    let reason = f
        .controller
        .run_until(std::future::pending::<crate::error::Result<()>>())
        .await;
    assert_eq!(reason, ShutdownReason::Signal("request".to_string()));
}
