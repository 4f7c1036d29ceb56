use super::CameraController;
use crate::error::Result;
use crate::storage::MediaFile;

impl CameraController {
    /// Request one still capture. Returns false when the camera is not ready.
    pub async fn capture_image(&self) -> Result<bool> {
        self.on_worker(|orchestrator| orchestrator.request_image_capture())
            .await
    }

    pub async fn prepare_video_recording(&self) -> Result<MediaFile> {
        self.on_worker(|orchestrator| orchestrator.prepare_video_recording())
            .await?
    }

    /// Prepare the recorder and request the recording session
    pub async fn start_video_recording(&self) -> Result<bool> {
        self.on_worker(|orchestrator| orchestrator.start_video_recording())
            .await?
    }

    /// Request the recording session for an already prepared recorder
    pub async fn request_video_recording_start(&self) -> Result<bool> {
        self.on_worker(|orchestrator| orchestrator.request_video_recording_start())
            .await
    }

    pub async fn stop_video_recording(&self) -> Result<bool> {
        self.on_worker(|orchestrator| orchestrator.request_video_recording_stop())
            .await
    }

    pub async fn discard_captured_image(&self) -> Result<bool> {
        self.on_worker(|orchestrator| orchestrator.discard_captured_image())
            .await
    }

    pub async fn discard_captured_video(&self) -> Result<bool> {
        self.on_worker(|orchestrator| orchestrator.discard_captured_video())
            .await
    }

    pub fn is_video_recording_running(&self) -> bool {
        self.orchestrator.lock().is_video_recording_running()
    }
}
