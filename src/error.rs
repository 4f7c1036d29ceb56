use crate::device::SessionId;
use crate::permissions::Permission;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TravcamError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("Device error: {0}")]
    Device(#[from] DeviceError),

    #[error("Missing permissions: {missing:?}")]
    PermissionDenied { missing: Vec<Permission> },

    #[error("Device rejected configuration of session {session}")]
    SessionConfigureFailed { session: SessionId },

    #[error("Capture failed: {details}")]
    CaptureFailed { details: String },

    #[error("Recorder error: {details}")]
    Recorder { details: String },

    #[error("Storage error: {details}")]
    Storage { details: String },

    #[error("Execution context '{name}' is not running")]
    ContextStopped { name: String },

    #[error("System error: {message}")]
    System { message: String },
}

/// Failures reported while binding or commanding the camera device
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("Camera access denied")]
    AccessDenied,

    #[error("No camera device available")]
    NoDevice,

    #[error("No usable stream configuration: {details}")]
    ConfigUnavailable { details: String },

    #[error("Camera {camera_id} disconnected")]
    Disconnected { camera_id: String },

    #[error("Camera operation failed: {details}")]
    AccessFailure { details: String },

    #[error("Session {session} is no longer live")]
    StaleSession { session: SessionId },
}

impl TravcamError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }

    pub fn storage<S: Into<String>>(details: S) -> Self {
        Self::Storage {
            details: details.into(),
        }
    }

    pub fn recorder<S: Into<String>>(details: S) -> Self {
        Self::Recorder {
            details: details.into(),
        }
    }

    /// Whether a later user-initiated retry can be expected to succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            TravcamError::PermissionDenied { .. } => true,
            TravcamError::Device(e) => e.is_recoverable(),
            _ => false,
        }
    }
}

impl DeviceError {
    pub fn access_failure<S: Into<String>>(details: S) -> Self {
        Self::AccessFailure {
            details: details.into(),
        }
    }

    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DeviceError::AccessDenied | DeviceError::AccessFailure { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, TravcamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_kinds() {
        assert!(TravcamError::PermissionDenied {
            missing: vec![Permission::Camera]
        }
        .is_recoverable());
        assert!(TravcamError::from(DeviceError::AccessDenied).is_recoverable());
        assert!(TravcamError::from(DeviceError::access_failure("busy")).is_recoverable());

        assert!(!TravcamError::from(DeviceError::ConfigUnavailable {
            details: "no map".to_string()
        })
        .is_recoverable());
        assert!(!TravcamError::SessionConfigureFailed {
            session: SessionId(3)
        }
        .is_recoverable());
        assert!(!TravcamError::CaptureFailed {
            details: "dropped".to_string()
        }
        .is_recoverable());
    }

    #[test]
    fn test_error_messages() {
        let err = TravcamError::from(DeviceError::Disconnected {
            camera_id: "0".to_string(),
        });
        assert_eq!(err.to_string(), "Device error: Camera 0 disconnected");

        let err = TravcamError::ContextStopped {
            name: "CameraHandler".to_string(),
        };
        assert!(err.to_string().contains("CameraHandler"));
    }
}
