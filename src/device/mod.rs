mod binder;
mod interface;
mod request;
mod simulated;
mod sizes;
mod types;

pub use binder::DeviceBinder;
pub use interface::{CameraBackend, CameraDevice};
pub use request::{AfTrigger, CaptureRequest, CaptureRequestBuilder, ControlMode, RequestTemplate};
pub use simulated::{DeviceCall, SimulatedBackend, SimulatedCamera, SimulatedDevice};
pub use sizes::{
    choose_optimal_size, choose_video_size, dimensions_swapped, select_stream_configuration,
    SizeLimits, MAX_PREVIEW_SIZE, MAX_VIDEO_WIDTH,
};
pub use types::{
    is_auto_focus_supported, AeMode, AfMode, CapturedImage, DeviceCharacteristics, DisplayInfo,
    ImageFormat, ImageReader, RequestId, SessionId, Size, StreamConfiguration,
    StreamConfigurationMap, Surface, SurfaceId, SurfaceKind,
};
