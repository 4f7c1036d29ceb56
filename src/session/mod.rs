mod dispatcher;
mod lifecycle;
mod orchestrator;
mod preview;
mod recording;
mod state;
mod still;
mod timer;

pub use dispatcher::dispatch;
pub use orchestrator::{Collaborators, ExpiryHook, SessionOrchestrator};
pub use state::{CaptureSession, SessionPurpose, SessionState};
pub use timer::RecordingTimer;
