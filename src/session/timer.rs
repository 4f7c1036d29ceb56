use crate::runtime::TaskQueue;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

struct ActiveTimer {
    generation: u64,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Cancellable countdown bounding a recording.
///
/// Ticks and the final expiry are delivered on the UI context. At most one
/// countdown exists; starting a new one cancels the previous first, and a
/// cancelled countdown never delivers anything afterwards, even if its tick
/// was already queued.
pub struct RecordingTimer {
    max: Duration,
    tick: Duration,
    generation: u64,
    active: Option<ActiveTimer>,
}

impl RecordingTimer {
    pub fn new(max: Duration, tick: Duration) -> Self {
        Self {
            max,
            tick,
            generation: 0,
            active: None,
        }
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    /// Start a countdown and return its generation.
    ///
    /// `on_tick(max_ms, elapsed_ms)` fires every tick interval with elapsed
    /// capped at the maximum; `on_expired(generation)` fires once after the
    /// last tick.
    pub fn start<T, E>(&mut self, ui: &TaskQueue, on_tick: T, on_expired: E) -> u64
    where
        T: Fn(u64, u64) + Send + Sync + 'static,
        E: FnOnce(u64) + Send + 'static,
    {
        self.cancel();

        self.generation += 1;
        let generation = self.generation;
        let token = CancellationToken::new();

        let max_ms = self.max.as_millis() as u64;
        let tick_ms = (self.tick.as_millis() as u64).max(1);
        let ticks = max_ms.div_ceil(tick_ms);
        let on_tick = Arc::new(on_tick);

        let task_token = token.clone();
        let ui = ui.clone();
        let handle = tokio::spawn(async move {
            let started = Instant::now();

            for n in 1..=ticks {
                let elapsed = (n * tick_ms).min(max_ms);
                tokio::select! {
                    _ = task_token.cancelled() => {
                        trace!("Recording timer {} cancelled", generation);
                        return;
                    }
                    _ = tokio::time::sleep_until(started + Duration::from_millis(elapsed)) => {}
                }

                let guard = task_token.clone();
                let on_tick = Arc::clone(&on_tick);
                ui.post(move || {
                    if !guard.is_cancelled() {
                        on_tick(max_ms, elapsed);
                    }
                });
            }

            let guard = task_token.clone();
            ui.post(move || {
                if !guard.is_cancelled() {
                    on_expired(generation);
                }
            });
        });

        debug!(
            "Recording timer {} started ({} ms, {} ms ticks)",
            generation, max_ms, tick_ms
        );

        self.active = Some(ActiveTimer {
            generation,
            token,
            handle,
        });

        generation
    }

    /// Cancel the running countdown. Returns whether one was running.
    pub fn cancel(&mut self) -> bool {
        match self.active.take() {
            Some(active) => {
                active.token.cancel();
                active.handle.abort();
                debug!("Recording timer {} cancelled", active.generation);
                true
            }
            None => false,
        }
    }

    /// Whether `generation` is the countdown currently held
    pub fn is_current(&self, generation: u64) -> bool {
        self.active
            .as_ref()
            .map(|active| active.generation == generation && !active.token.is_cancelled())
            .unwrap_or(false)
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }
}

impl Drop for RecordingTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
