use crate::config::StorageConfig;
use crate::device::CapturedImage;
use crate::error::{Result, TravcamError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Kind of captured artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    fn prefix(&self) -> &'static str {
        match self {
            MediaKind::Image => "img",
            MediaKind::Video => "vid",
        }
    }

    fn extension(&self) -> &'static str {
        match self {
            MediaKind::Image => "jpeg",
            MediaKind::Video => "mp4",
        }
    }

    fn directory(&self) -> &'static str {
        match self {
            MediaKind::Image => "images",
            MediaKind::Video => "videos",
        }
    }
}

/// Reference to a captured artifact handed out by a [`MediaStore`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaFile {
    pub path: PathBuf,
    pub kind: MediaKind,
    pub created_at: DateTime<Utc>,
    /// Rotation in degrees viewers must apply, when known
    pub orientation: Option<u32>,
}

/// Sidecar written next to every stored image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
    pub bytes: usize,
    pub orientation: u32,
    pub captured_at: DateTime<Utc>,
}

/// Persistence collaborator for captured media
pub trait MediaStore: Send + Sync {
    /// Reserve an empty output file for a capture of `kind`
    fn create_output_target(&self, kind: MediaKind) -> Result<MediaFile>;

    /// Persist a still image tagged with its display orientation
    fn store_image(&self, image: &CapturedImage, orientation_degrees: u32) -> Result<MediaFile>;

    /// Remove an artifact. Returns whether it is gone.
    fn delete(&self, file: &MediaFile) -> bool;
}

/// Stores media below a root directory, split into `images/` and `videos/`
#[derive(Debug, Clone)]
pub struct FileMediaStore {
    root: PathBuf,
}

impl FileMediaStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(&config.path)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file_name(kind: MediaKind, created_at: &DateTime<Utc>) -> String {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        format!(
            "trav_{}_{}_{}.{}",
            kind.prefix(),
            created_at.timestamp_millis(),
            &suffix[..8],
            kind.extension()
        )
    }

    fn metadata_path(file: &MediaFile) -> PathBuf {
        file.path.with_extension("json")
    }
}

impl MediaStore for FileMediaStore {
    fn create_output_target(&self, kind: MediaKind) -> Result<MediaFile> {
        let directory = self.root.join(kind.directory());
        fs::create_dir_all(&directory).map_err(|e| {
            TravcamError::storage(format!(
                "Failed to create {}: {}",
                directory.display(),
                e
            ))
        })?;

        let created_at = Utc::now();
        let path = directory.join(Self::file_name(kind, &created_at));
        fs::File::create(&path).map_err(|e| {
            TravcamError::storage(format!("Failed to create {}: {}", path.display(), e))
        })?;

        debug!("Created {:?} output target {}", kind, path.display());

        Ok(MediaFile {
            path,
            kind,
            created_at,
            orientation: None,
        })
    }

    fn store_image(&self, image: &CapturedImage, orientation_degrees: u32) -> Result<MediaFile> {
        let mut file = self.create_output_target(MediaKind::Image)?;
        file.orientation = Some(orientation_degrees);

        fs::write(&file.path, image.data.as_slice()).map_err(|e| {
            TravcamError::storage(format!("Failed to write {}: {}", file.path.display(), e))
        })?;

        let metadata = ImageMetadata {
            width: image.size.width,
            height: image.size.height,
            bytes: image.len(),
            orientation: orientation_degrees,
            captured_at: DateTime::<Utc>::from(image.timestamp),
        };
        let json = serde_json::to_string_pretty(&metadata).map_err(|e| {
            TravcamError::storage(format!("Failed to serialize image metadata: {}", e))
        })?;
        fs::write(Self::metadata_path(&file), json)?;

        info!(
            "Stored {} byte image at {} (orientation {} deg)",
            image.len(),
            file.path.display(),
            orientation_degrees
        );

        Ok(file)
    }

    fn delete(&self, file: &MediaFile) -> bool {
        match fs::remove_file(&file.path) {
            Ok(()) => {
                let sidecar = Self::metadata_path(file);
                if sidecar.exists() {
                    if let Err(e) = fs::remove_file(&sidecar) {
                        warn!("Failed to remove {}: {}", sidecar.display(), e);
                    }
                }
                info!("Deleted {}", file.path.display());
                true
            }
            Err(e) => {
                warn!("Failed to delete {}: {}", file.path.display(), e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{ImageFormat, Size};
    use tempfile::TempDir;

    #[test]
    fn test_output_targets_follow_naming_scheme() {
        let dir = TempDir::new().unwrap();
        let store = FileMediaStore::new(dir.path());

        let video = store.create_output_target(MediaKind::Video).unwrap();
        assert!(video.path.exists());
        assert!(video.path.starts_with(dir.path().join("videos")));

        let name = video.path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("trav_vid_"));
        assert!(name.ends_with(".mp4"));

        let other = store.create_output_target(MediaKind::Video).unwrap();
        assert_ne!(video.path, other.path);
    }

    #[test]
    fn test_store_image_writes_data_and_metadata() {
        let dir = TempDir::new().unwrap();
        let store = FileMediaStore::new(dir.path());
        let image = CapturedImage::new(vec![0xFF, 0xD8, 1, 2, 0xFF, 0xD9], Size::new(64, 48), ImageFormat::Jpeg);

        let file = store.store_image(&image, 270).unwrap();
        assert_eq!(file.kind, MediaKind::Image);
        assert_eq!(file.orientation, Some(270));
        assert_eq!(fs::read(&file.path).unwrap(), *image.data);
        assert!(file.path.to_string_lossy().contains("trav_img_"));

        let sidecar = fs::read_to_string(file.path.with_extension("json")).unwrap();
        let metadata: ImageMetadata = serde_json::from_str(&sidecar).unwrap();
        assert_eq!(metadata.orientation, 270);
        assert_eq!(metadata.width, 64);
        assert_eq!(metadata.bytes, 6);
    }

    #[test]
    fn test_delete_reports_outcome() {
        let dir = TempDir::new().unwrap();
        let store = FileMediaStore::new(dir.path());
        let image = CapturedImage::new(vec![1, 2, 3], Size::new(2, 2), ImageFormat::Jpeg);
        let file = store.store_image(&image, 0).unwrap();

        assert!(store.delete(&file));
        assert!(!file.path.exists());
        assert!(!file.path.with_extension("json").exists());
        assert!(!store.delete(&file));
    }
}
