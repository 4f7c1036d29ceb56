use super::{CameraController, ShutdownReason};
use std::future::Future;
use tokio::signal;
use tracing::{info, warn};

impl CameraController {
    /// Drive `work` until it finishes, a termination signal arrives or
    /// [`CameraController::request_shutdown`] is called.
    pub async fn run_until<F>(&self, work: F) -> ShutdownReason
    where
        F: Future<Output = crate::error::Result<()>>,
    {
        let token = self.cancellation_token.clone();

        let reason = tokio::select! {
            result = work => match result {
                Ok(()) => ShutdownReason::Completed,
                Err(e) => ShutdownReason::Error(e.to_string()),
            },
            signal = wait_for_signal() => ShutdownReason::Signal(signal),
            _ = token.cancelled() => ShutdownReason::Signal("request".to_string()),
        };

        info!("Controller run ended: {:?}", reason);
        reason
    }

    /// Make a pending [`CameraController::run_until`] return
    pub fn request_shutdown(&self) {
        self.cancellation_token.cancel();
    }
}

async fn wait_for_signal() -> String {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => return "SIGTERM".to_string(),
                    _ = signal::ctrl_c() => return "SIGINT".to_string(),
                }
            }
            Err(e) => warn!("Failed to register SIGTERM handler: {}", e),
        }
    }

    match signal::ctrl_c().await {
        Ok(()) => "SIGINT".to_string(),
        Err(e) => {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<String>().await
        }
    }
}
