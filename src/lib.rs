pub mod app;
pub mod config;
pub mod device;
pub mod error;
pub mod events;
pub mod notify;
pub mod orientation;
pub mod permissions;
pub mod recorder;
pub mod runtime;
pub mod session;
pub mod storage;
pub mod surface;

pub use app::{CameraController, ControllerState, ControllerStatus, ShutdownReason};
pub use config::TravcamConfig;
pub use device::{
    CameraBackend, CameraDevice, DeviceBinder, SimulatedBackend, SimulatedCamera, Size,
    StreamConfiguration,
};
pub use error::{DeviceError, Result, TravcamError};
pub use events::{CameraEvent, DeviceErrorCode, EventSink};
pub use notify::{ChannelListener, HostListener, HostNotification, ShutterSound};
pub use orientation::{OrientationTracker, Rotation};
pub use permissions::{GrantedPermissions, Permission, PermissionGate, StaticPermissions};
pub use recorder::{MediaRecorder, RecorderProfile, SimulatedRecorder};
pub use runtime::{ExecutionContexts, TaskQueue};
pub use session::{dispatch, Collaborators, SessionOrchestrator, SessionState};
pub use storage::{FileMediaStore, MediaFile, MediaKind, MediaStore};
pub use surface::{HeadlessSurface, PreviewTransform, RenderSurface};
