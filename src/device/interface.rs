use super::request::CaptureRequest;
use super::types::{
    DeviceCharacteristics, ImageFormat, ImageReader, RequestId, SessionId, Size, Surface,
};
use crate::error::DeviceError;
use crate::events::EventSink;

/// Entry point to the platform camera stack
pub trait CameraBackend: Send + Sync {
    /// Ids of all cameras, in platform order
    fn camera_ids(&self) -> Result<Vec<String>, DeviceError>;

    fn characteristics(&self, camera_id: &str) -> Result<DeviceCharacteristics, DeviceError>;

    /// Begin opening a camera. The returned handle must not be used until
    /// `CameraEvent::DeviceOpened` arrives on `events`.
    fn open(&self, camera_id: &str, events: EventSink)
        -> Result<Box<dyn CameraDevice>, DeviceError>;

    fn create_image_reader(
        &self,
        size: Size,
        format: ImageFormat,
        max_images: u32,
    ) -> Result<ImageReader, DeviceError>;

    fn close_image_reader(&self, reader: &ImageReader);
}

/// Exclusive handle to one opened camera.
///
/// Every submission names the session it targets; a device must reject
/// submissions to sessions that were closed or replaced.
pub trait CameraDevice: Send {
    fn id(&self) -> &str;

    /// Start negotiating a session routing frames to `outputs`. The outcome
    /// arrives as `SessionConfigured` or `SessionConfigFailed`.
    fn create_capture_session(&mut self, outputs: &[Surface]) -> Result<SessionId, DeviceError>;

    /// Submit a single capture
    fn capture(
        &mut self,
        session: SessionId,
        request: &CaptureRequest,
    ) -> Result<RequestId, DeviceError>;

    /// Replace the session's repeating request
    fn set_repeating_request(
        &mut self,
        session: SessionId,
        request: &CaptureRequest,
    ) -> Result<RequestId, DeviceError>;

    fn stop_repeating(&mut self, session: SessionId) -> Result<(), DeviceError>;

    fn close_session(&mut self, session: SessionId);

    /// Release the device; every session dies with it
    fn close(&mut self);
}
