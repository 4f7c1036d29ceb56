use serde::Serialize;

/// Host-facing lifecycle of the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerState {
    /// Created, no surface yet
    Idle,
    /// Surface available, worker running
    Active,
    /// Host paused; device handle kept, worker stopped
    Paused,
    /// Surface destroyed or permissions missing
    Detached,
    Stopped,
}

/// Why a controller run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownReason {
    Signal(String),
    Error(String),
    Completed,
}
