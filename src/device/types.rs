use crate::orientation::Rotation;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

/// Output size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Area widened to u64 so large sensors never overflow
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn swapped(&self) -> Self {
        Self::new(self.height, self.width)
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

id_type!(
    /// Identity of one negotiated capture session
    SessionId,
    "session"
);
id_type!(
    /// Identity of one submitted capture request
    RequestId,
    "request"
);
id_type!(
    /// Identity of an output surface (preview, image reader or recorder input)
    SurfaceId,
    "surface"
);

static NEXT_SURFACE_ID: AtomicU64 = AtomicU64::new(1);

impl SurfaceId {
    /// Process-unique id for a newly created surface
    pub fn allocate() -> Self {
        Self(NEXT_SURFACE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// What an output surface feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SurfaceKind {
    Preview,
    ImageReader,
    Recorder,
}

/// An output surface a session can route frames to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Surface {
    pub id: SurfaceId,
    pub kind: SurfaceKind,
    pub size: Size,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Jpeg,
}

/// Image buffer reader backing a still capture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageReader {
    pub surface: Surface,
    pub format: ImageFormat,
    pub max_images: u32,
}

/// Auto-exposure modes a device can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AeMode {
    Off,
    On,
    OnAutoFlash,
    OnAlwaysFlash,
    OnAutoFlashRedeye,
}

/// Auto-focus modes that can be requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AfMode {
    Off,
    Auto,
    Macro,
    ContinuousVideo,
    ContinuousPicture,
    Edof,
}

/// Supported output sizes per consumer class
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreamConfigurationMap {
    pub jpeg_sizes: Vec<Size>,
    pub preview_sizes: Vec<Size>,
    pub video_sizes: Vec<Size>,
}

/// Read-only capability report for one camera
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceCharacteristics {
    /// Fixed mounting orientation of the sensor in degrees
    pub sensor_orientation: u32,
    pub ae_available_modes: Vec<AeMode>,
    pub stream_configuration: Option<StreamConfigurationMap>,
}

impl DeviceCharacteristics {
    pub fn is_auto_focus_supported(&self) -> bool {
        is_auto_focus_supported(&self.ae_available_modes)
    }
}

/// Fixed-focus sensors report no usable mode, or only "off"; those need an
/// explicit focus lock around a still capture.
pub fn is_auto_focus_supported(modes: &[AeMode]) -> bool {
    !matches!(modes, [] | [AeMode::Off])
}

/// Display facts the binder needs for size selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayInfo {
    pub rotation: Rotation,
    pub size: Size,
}

/// Stream configuration computed for one device-open cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfiguration {
    pub preview_size: Size,
    pub video_size: Size,
    pub sensor_orientation: u32,
    pub swapped_dimensions: bool,
}

/// Still image delivered by an image reader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    pub data: Arc<Vec<u8>>,
    pub size: Size,
    pub format: ImageFormat,
    pub timestamp: SystemTime,
}

impl CapturedImage {
    pub fn new(data: Vec<u8>, size: Size, format: ImageFormat) -> Self {
        Self {
            data: Arc::new(data),
            size,
            format,
            timestamp: SystemTime::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
