use crate::config::RecordingConfig;
use crate::device::{Size, Surface, SurfaceId, SurfaceKind};
use crate::error::{Result, TravcamError};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioSource {
    Mic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoSource {
    Surface,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Mpeg4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoEncoder {
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioEncoder {
    Aac,
}

/// Everything a recorder needs before `prepare`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecorderProfile {
    pub audio_source: AudioSource,
    pub video_source: VideoSource,
    pub output_format: OutputFormat,
    pub video_encoder: VideoEncoder,
    pub audio_encoder: AudioEncoder,
    pub video_bitrate: u32,
    pub frame_rate: u32,
    pub video_size: Size,
    pub audio_bitrate: u32,
    pub audio_sample_rate: u32,
    pub orientation_hint: Option<u32>,
    pub output: PathBuf,
}

impl RecorderProfile {
    pub fn from_config(
        config: &RecordingConfig,
        video_size: Size,
        orientation_hint: Option<u32>,
        output: PathBuf,
    ) -> Self {
        Self {
            audio_source: AudioSource::Mic,
            video_source: VideoSource::Surface,
            output_format: OutputFormat::Mpeg4,
            video_encoder: VideoEncoder::Default,
            audio_encoder: AudioEncoder::Aac,
            video_bitrate: config.video_bitrate,
            frame_rate: config.frame_rate,
            video_size,
            audio_bitrate: config.audio_bitrate,
            audio_sample_rate: config.audio_sample_rate,
            orientation_hint,
            output,
        }
    }
}

/// Video recorder fed through an input surface
pub trait MediaRecorder: Send {
    /// Configure and prepare; returns the surface the camera must render into
    fn prepare(&mut self, profile: RecorderProfile) -> Result<Surface>;

    /// Input surface of a prepared or running recorder
    fn input_surface(&self) -> Option<Surface>;

    fn start(&mut self) -> Result<()>;

    fn stop(&mut self) -> Result<()>;

    /// Back to the unconfigured state, ready for the next `prepare`
    fn reset(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Prepared,
    Recording,
}

/// A finished simulated recording
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedClip {
    pub output: PathBuf,
    pub duration: Duration,
    pub profile: RecorderProfile,
}

/// Recorder that tracks state transitions and the clips it "recorded"
pub struct SimulatedRecorder {
    state: RecorderState,
    profile: Option<RecorderProfile>,
    input: Option<Surface>,
    started_at: Option<Instant>,
    clips: Arc<Mutex<Vec<RecordedClip>>>,
}

impl SimulatedRecorder {
    pub fn new() -> Self {
        Self {
            state: RecorderState::Idle,
            profile: None,
            input: None,
            started_at: None,
            clips: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    /// Shared view of finished clips, usable after the recorder moved
    pub fn clips(&self) -> Arc<Mutex<Vec<RecordedClip>>> {
        Arc::clone(&self.clips)
    }
}

impl Default for SimulatedRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaRecorder for SimulatedRecorder {
    fn prepare(&mut self, profile: RecorderProfile) -> Result<Surface> {
        if self.state == RecorderState::Recording {
            return Err(TravcamError::recorder("cannot prepare while recording"));
        }
        if profile.frame_rate == 0 || profile.video_size.area() == 0 {
            return Err(TravcamError::recorder(format!(
                "invalid profile: {} @ {} fps",
                profile.video_size, profile.frame_rate
            )));
        }

        let surface = Surface {
            id: SurfaceId::allocate(),
            kind: SurfaceKind::Recorder,
            size: profile.video_size,
        };

        debug!(
            "Recorder prepared: {} @ {} fps, {} bps, hint {:?}, output {}",
            profile.video_size,
            profile.frame_rate,
            profile.video_bitrate,
            profile.orientation_hint,
            profile.output.display()
        );

        self.profile = Some(profile);
        self.input = Some(surface);
        self.state = RecorderState::Prepared;
        Ok(surface)
    }

    fn input_surface(&self) -> Option<Surface> {
        self.input
    }

    fn start(&mut self) -> Result<()> {
        if self.state != RecorderState::Prepared {
            return Err(TravcamError::recorder(format!(
                "cannot start from {:?}",
                self.state
            )));
        }
        self.started_at = Some(Instant::now());
        self.state = RecorderState::Recording;
        info!("Recorder started");
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if self.state != RecorderState::Recording {
            return Err(TravcamError::recorder(format!(
                "cannot stop from {:?}",
                self.state
            )));
        }

        let duration = self
            .started_at
            .take()
            .map(|started| started.elapsed())
            .unwrap_or_default();

        if let Some(profile) = self.profile.clone() {
            info!(
                "Recorder stopped after {:?}, output {}",
                duration,
                profile.output.display()
            );
            self.clips.lock().push(RecordedClip {
                output: profile.output.clone(),
                duration,
                profile,
            });
        }

        self.state = RecorderState::Prepared;
        Ok(())
    }

    fn reset(&mut self) {
        self.state = RecorderState::Idle;
        self.profile = None;
        self.input = None;
        self.started_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TravcamConfig;

    fn profile() -> RecorderProfile {
        RecorderProfile::from_config(
            &TravcamConfig::default().recording,
            Size::new(960, 720),
            Some(90),
            PathBuf::from("/tmp/trav_vid_test.mp4"),
        )
    }

    #[test]
    fn test_profile_defaults() {
        let profile = profile();
        assert_eq!(profile.audio_source, AudioSource::Mic);
        assert_eq!(profile.output_format, OutputFormat::Mpeg4);
        assert_eq!(profile.audio_encoder, AudioEncoder::Aac);
        assert_eq!(profile.video_bitrate, 10_000_000);
        assert_eq!(profile.frame_rate, 24);
    }

    #[test]
    fn test_recorder_lifecycle() {
        let mut recorder = SimulatedRecorder::new();
        assert!(recorder.start().is_err());
        assert!(recorder.stop().is_err());

        let surface = recorder.prepare(profile()).unwrap();
        assert_eq!(surface.kind, SurfaceKind::Recorder);
        assert_eq!(recorder.input_surface(), Some(surface));

        recorder.start().unwrap();
        assert!(recorder.prepare(profile()).is_err());
        recorder.stop().unwrap();
        recorder.reset();

        assert_eq!(recorder.state(), RecorderState::Idle);
        assert!(recorder.input_surface().is_none());

        let clips = recorder.clips();
        let clips = clips.lock();
        assert_eq!(clips.len(), 1);
        assert_eq!(clips[0].profile.orientation_hint, Some(90));
    }
}
