use super::interface::{CameraBackend, CameraDevice};
use super::sizes::{select_stream_configuration, SizeLimits};
use super::types::{DeviceCharacteristics, DisplayInfo, Size, StreamConfiguration};
use crate::error::DeviceError;
use crate::events::EventSink;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Owns the device handle and the stream configuration of the current
/// open cycle.
pub struct DeviceBinder {
    backend: Arc<dyn CameraBackend>,
    camera_index: usize,
    limits: SizeLimits,
    device: Option<Box<dyn CameraDevice>>,
    opened: bool,
    characteristics: Option<DeviceCharacteristics>,
    stream: Option<StreamConfiguration>,
}

impl DeviceBinder {
    pub fn new(backend: Arc<dyn CameraBackend>, camera_index: usize, limits: SizeLimits) -> Self {
        Self {
            backend,
            camera_index,
            limits,
            device: None,
            opened: false,
            characteristics: None,
            stream: None,
        }
    }

    pub fn backend(&self) -> &Arc<dyn CameraBackend> {
        &self.backend
    }

    /// Open the configured camera for a view of `surface` pixels.
    ///
    /// Any previously held handle is closed first. The stream configuration
    /// is computed before the device is touched, so a device without a usable
    /// configuration is never opened.
    pub fn open(
        &mut self,
        surface: Size,
        display: DisplayInfo,
        events: EventSink,
    ) -> Result<StreamConfiguration, DeviceError> {
        self.close();

        let ids = self.backend.camera_ids()?;
        let camera_id = ids
            .get(self.camera_index)
            .cloned()
            .ok_or(DeviceError::NoDevice)?;

        let characteristics = self.backend.characteristics(&camera_id)?;
        let stream = select_stream_configuration(&characteristics, surface, display, self.limits)?;

        info!(
            "Opening camera {} for {} view (preview {}, video {})",
            camera_id, surface, stream.preview_size, stream.video_size
        );

        let device = self.backend.open(&camera_id, events)?;

        self.device = Some(device);
        self.characteristics = Some(characteristics);
        self.stream = Some(stream);

        Ok(stream)
    }

    /// Record that the pending open completed. Returns false when the event
    /// belongs to a handle that is no longer held.
    pub fn mark_opened(&mut self, camera_id: &str) -> bool {
        match &self.device {
            Some(device) if device.id() == camera_id => {
                self.opened = true;
                debug!("Camera {} is open", camera_id);
                true
            }
            _ => {
                warn!("Ignoring open notification for camera {}", camera_id);
                false
            }
        }
    }

    /// Whether a handle is held, opened or still pending
    pub fn has_device(&self) -> bool {
        self.device.is_some()
    }

    /// Whether the handle is held and usable
    pub fn is_open(&self) -> bool {
        self.device.is_some() && self.opened
    }

    pub fn camera_id(&self) -> Option<&str> {
        self.device.as_ref().map(|device| device.id())
    }

    /// The usable device, if the open completed
    pub fn device_mut(&mut self) -> Option<&mut (dyn CameraDevice + 'static)> {
        if self.opened {
            self.device.as_deref_mut()
        } else {
            None
        }
    }

    pub fn stream_configuration(&self) -> Option<&StreamConfiguration> {
        self.stream.as_ref()
    }

    pub fn characteristics(&self) -> Option<&DeviceCharacteristics> {
        self.characteristics.as_ref()
    }

    pub fn is_auto_focus_supported(&self) -> bool {
        self.characteristics
            .as_ref()
            .map(DeviceCharacteristics::is_auto_focus_supported)
            .unwrap_or(false)
    }

    /// Release the handle. Safe to call when nothing is held.
    pub fn close(&mut self) {
        if let Some(mut device) = self.device.take() {
            info!("Closing camera {}", device.id());
            device.close();
        }
        self.opened = false;
        self.characteristics = None;
        self.stream = None;
    }
}

impl Drop for DeviceBinder {
    fn drop(&mut self) {
        self.close();
    }
}
