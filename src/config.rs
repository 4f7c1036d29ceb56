use crate::device::Size;
use crate::orientation::Rotation;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TravcamConfig {
    pub camera: CameraConfig,
    pub display: DisplayConfig,
    pub recording: RecordingConfig,
    pub storage: StorageConfig,
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CameraConfig {
    /// Position in the backend's camera id list
    #[serde(default = "default_camera_index")]
    pub index: usize,

    /// Largest preview size the binder may select (width, height)
    #[serde(default = "default_max_preview")]
    pub max_preview: (u32, u32),

    /// Widest video size the recorder can handle
    #[serde(default = "default_max_video_width")]
    pub max_video_width: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DisplayConfig {
    /// Initial display rotation
    #[serde(default)]
    pub rotation: Rotation,

    /// Physical display resolution (width, height)
    #[serde(default = "default_display_resolution")]
    pub resolution: (u32, u32),
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RecordingConfig {
    /// Recording ceiling in milliseconds
    #[serde(default = "default_max_duration_ms")]
    pub max_duration_ms: u64,

    /// Progress tick interval in milliseconds
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    #[serde(default = "default_video_bitrate")]
    pub video_bitrate: u32,

    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,

    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: u32,

    #[serde(default = "default_audio_sample_rate")]
    pub audio_sample_rate: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StorageConfig {
    /// Root directory for captured media
    #[serde(default = "default_storage_path")]
    pub path: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RuntimeConfig {
    /// Name of the background worker context
    #[serde(default = "default_worker_name")]
    pub worker_name: String,

    /// How long a context stop may take before it is reported as stuck
    #[serde(default = "default_stop_timeout_ms")]
    pub stop_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct LoggingConfig {
    /// Optional log file written through a non-blocking appender
    pub file: Option<String>,
}

impl TravcamConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("travcam.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("camera.index", default_camera_index() as i64)?
            .set_default(
                "camera.max_preview",
                vec![default_max_preview().0, default_max_preview().1],
            )?
            .set_default("camera.max_video_width", default_max_video_width())?
            .set_default("display.rotation", "Rotation0")?
            .set_default(
                "display.resolution",
                vec![
                    default_display_resolution().0,
                    default_display_resolution().1,
                ],
            )?
            .set_default("recording.max_duration_ms", default_max_duration_ms() as i64)?
            .set_default("recording.tick_interval_ms", default_tick_interval_ms() as i64)?
            .set_default("recording.video_bitrate", default_video_bitrate())?
            .set_default("recording.frame_rate", default_frame_rate())?
            .set_default("recording.audio_bitrate", default_audio_bitrate())?
            .set_default("recording.audio_sample_rate", default_audio_sample_rate())?
            .set_default("storage.path", default_storage_path())?
            .set_default("runtime.worker_name", default_worker_name())?
            .set_default("runtime.stop_timeout_ms", default_stop_timeout_ms() as i64)?
            .add_source(File::with_name(&path_str).required(false))
            // TRAVCAM_RECORDING__MAX_DURATION_MS=10000
            .add_source(Environment::with_prefix("TRAVCAM").separator("__"))
            .build()?;

        let config: TravcamConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Render as a TOML document
    pub fn to_toml(&self) -> crate::error::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.camera.max_preview.0 == 0 || self.camera.max_preview.1 == 0 {
            return Err(ConfigError::Message(
                "Camera max_preview must be greater than 0".to_string(),
            ));
        }

        if self.camera.max_video_width == 0 {
            return Err(ConfigError::Message(
                "Camera max_video_width must be greater than 0".to_string(),
            ));
        }

        if self.display.resolution.0 == 0 || self.display.resolution.1 == 0 {
            return Err(ConfigError::Message(
                "Display resolution must be greater than 0".to_string(),
            ));
        }

        if self.recording.max_duration_ms == 0 || self.recording.tick_interval_ms == 0 {
            return Err(ConfigError::Message(
                "Recording duration and tick interval must be greater than 0".to_string(),
            ));
        }

        if self.recording.tick_interval_ms > self.recording.max_duration_ms {
            return Err(ConfigError::Message(
                "Recording tick interval cannot exceed the maximum duration".to_string(),
            ));
        }

        if self.recording.frame_rate == 0 {
            return Err(ConfigError::Message(
                "Recording frame_rate must be greater than 0".to_string(),
            ));
        }

        if self.runtime.worker_name.trim().is_empty() {
            return Err(ConfigError::Message(
                "Runtime worker_name must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

impl CameraConfig {
    pub fn max_preview_size(&self) -> Size {
        Size::new(self.max_preview.0, self.max_preview.1)
    }
}

impl DisplayConfig {
    pub fn size(&self) -> Size {
        Size::new(self.resolution.0, self.resolution.1)
    }
}

impl RecordingConfig {
    pub fn max_duration(&self) -> Duration {
        Duration::from_millis(self.max_duration_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl RuntimeConfig {
    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }
}

impl Default for TravcamConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig {
                index: default_camera_index(),
                max_preview: default_max_preview(),
                max_video_width: default_max_video_width(),
            },
            display: DisplayConfig {
                rotation: Rotation::default(),
                resolution: default_display_resolution(),
            },
            recording: RecordingConfig {
                max_duration_ms: default_max_duration_ms(),
                tick_interval_ms: default_tick_interval_ms(),
                video_bitrate: default_video_bitrate(),
                frame_rate: default_frame_rate(),
                audio_bitrate: default_audio_bitrate(),
                audio_sample_rate: default_audio_sample_rate(),
            },
            storage: StorageConfig {
                path: default_storage_path(),
            },
            runtime: RuntimeConfig {
                worker_name: default_worker_name(),
                stop_timeout_ms: default_stop_timeout_ms(),
            },
            logging: LoggingConfig::default(),
        }
    }
}

// Default value functions
fn default_camera_index() -> usize {
    0
}
fn default_max_preview() -> (u32, u32) {
    (1920, 1080)
}
fn default_max_video_width() -> u32 {
    1080
}

fn default_display_resolution() -> (u32, u32) {
    (1920, 1080)
}

fn default_max_duration_ms() -> u64 {
    30_000
}
fn default_tick_interval_ms() -> u64 {
    1_000
}
fn default_video_bitrate() -> u32 {
    10_000_000
}
fn default_frame_rate() -> u32 {
    24
}
fn default_audio_bitrate() -> u32 {
    96_000
}
fn default_audio_sample_rate() -> u32 {
    48_000
}

fn default_storage_path() -> String {
    "./media".to_string()
}

fn default_worker_name() -> String {
    "CameraHandler".to_string()
}
fn default_stop_timeout_ms() -> u64 {
    3_000
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = TravcamConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.recording.max_duration(), Duration::from_secs(30));
        assert_eq!(config.recording.tick_interval(), Duration::from_secs(1));
        assert_eq!(config.camera.max_preview_size(), Size::new(1920, 1080));
        assert_eq!(config.runtime.worker_name, "CameraHandler");
    }

    #[test]
    fn test_config_validation() {
        let mut config = TravcamConfig::default();
        config.recording.tick_interval_ms = 60_000;
        assert!(config.validate().is_err());

        config.recording.tick_interval_ms = 1_000;
        config.camera.max_preview = (0, 1080);
        assert!(config.validate().is_err());

        config.camera.max_preview = (1920, 1080);
        config.runtime.worker_name = "  ".to_string();
        assert!(config.validate().is_err());

        config.runtime.worker_name = "worker".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(
            file,
            "[recording]\nmax_duration_ms = 5000\n\n[display]\nrotation = \"Rotation90\"\n\n[storage]\npath = \"/tmp/travcam\""
        )
        .unwrap();

        let config = TravcamConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.recording.max_duration_ms, 5000);
        assert_eq!(config.recording.tick_interval_ms, 1000);
        assert_eq!(config.display.rotation, Rotation::Rotation90);
        assert_eq!(config.storage.path, "/tmp/travcam");
        assert_eq!(config.camera.max_video_width, 1080);
        assert!(config.logging.file.is_none());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = TravcamConfig::load_from_file("/nonexistent/travcam-test.toml").unwrap();
        assert_eq!(config, TravcamConfig::default());
    }

    #[test]
    fn test_default_config_serializes_to_toml() {
        let rendered = TravcamConfig::default().to_toml().unwrap();
        assert!(rendered.contains("[recording]"));
        assert!(rendered.contains("max_duration_ms = 30000"));
    }
}
