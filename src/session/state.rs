use crate::device::SessionId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Capture-mode state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    #[default]
    Preview,
    FocusLocked,
    FocusUnlocked,
    CapturingImage,
    ImageCaptured,
    RecordingVideo,
    VideoRecorded,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Preview => "PREVIEW",
            SessionState::FocusLocked => "FOCUS_LOCKED",
            SessionState::FocusUnlocked => "FOCUS_UNLOCKED",
            SessionState::CapturingImage => "CAPTURING_IMAGE",
            SessionState::ImageCaptured => "IMAGE_CAPTURED",
            SessionState::RecordingVideo => "RECORDING_VIDEO",
            SessionState::VideoRecorded => "VIDEO_RECORDED",
        }
    }

    /// A still capture was requested and its image has not arrived yet
    pub fn is_still_in_flight(&self) -> bool {
        matches!(
            self,
            SessionState::CapturingImage | SessionState::FocusLocked | SessionState::FocusUnlocked
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a capture session was created for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionPurpose {
    Preview,
    StillCapture,
    Recording,
}

/// The single live session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSession {
    pub id: SessionId,
    pub purpose: SessionPurpose,
    pub configured: bool,
}
