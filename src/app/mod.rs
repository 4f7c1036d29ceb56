mod controller;
mod media;
mod runtime;
mod shutdown;
mod startup;
mod state;
mod types;

#[cfg(test)]
mod tests;

pub use controller::CameraController;
pub use state::ControllerStatus;
pub use types::{ControllerState, ShutdownReason};
