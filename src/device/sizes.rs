use super::types::{DeviceCharacteristics, DisplayInfo, Size, StreamConfiguration};
use crate::error::DeviceError;
use crate::orientation::Rotation;
use tracing::{debug, warn};

/// Largest preview the capture pipeline guarantees
pub const MAX_PREVIEW_SIZE: Size = Size::new(1920, 1080);

/// Recorders cannot handle video wider than this
pub const MAX_VIDEO_WIDTH: u32 = 1080;

/// Upper bounds applied during stream size selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeLimits {
    pub max_preview: Size,
    pub max_video_width: u32,
}

impl Default for SizeLimits {
    fn default() -> Self {
        Self {
            max_preview: MAX_PREVIEW_SIZE,
            max_video_width: MAX_VIDEO_WIDTH,
        }
    }
}

/// First 4:3 size no wider than `max_width`, otherwise the last listed size.
pub fn choose_video_size(choices: &[Size], max_width: u32) -> Option<Size> {
    let found = choices
        .iter()
        .copied()
        .find(|size| size.width == size.height * 4 / 3 && size.width <= max_width);

    if found.is_none() {
        warn!("No 4:3 video size within {} px width, using last listed", max_width);
    }

    found.or_else(|| choices.last().copied())
}

/// Pick a preview size for a view of `view` pixels.
///
/// Candidates must match `aspect` exactly (integer arithmetic) and fit inside
/// `max`. The smallest candidate covering the view wins; otherwise the
/// largest candidate that does not. Ties keep the earliest listed size. With
/// no candidate at all the first listed size is returned.
pub fn choose_optimal_size(choices: &[Size], view: Size, max: Size, aspect: Size) -> Option<Size> {
    if aspect.width == 0 {
        return choices.first().copied();
    }

    let (big_enough, not_big_enough): (Vec<Size>, Vec<Size>) = choices
        .iter()
        .copied()
        .filter(|option| {
            option.width <= max.width
                && option.height <= max.height
                && option.height as u64
                    == option.width as u64 * aspect.height as u64 / aspect.width as u64
        })
        .partition(|option| option.width >= view.width && option.height >= view.height);

    if let Some(smallest) = big_enough
        .into_iter()
        .reduce(|best, option| if option.area() < best.area() { option } else { best })
    {
        return Some(smallest);
    }

    if let Some(largest) = not_big_enough
        .into_iter()
        .reduce(|best, option| if option.area() > best.area() { option } else { best })
    {
        return Some(largest);
    }

    warn!("No preview size matches aspect {}, using first listed", aspect);
    choices.first().copied()
}

/// Whether the view has to be swapped into sensor coordinates
pub fn dimensions_swapped(display: Rotation, sensor_orientation: u32) -> bool {
    match display {
        Rotation::Rotation0 | Rotation::Rotation180 => {
            sensor_orientation == 90 || sensor_orientation == 270
        }
        Rotation::Rotation90 | Rotation::Rotation270 => {
            sensor_orientation == 0 || sensor_orientation == 180
        }
    }
}

/// Compute the stream configuration for one device-open cycle
pub fn select_stream_configuration(
    characteristics: &DeviceCharacteristics,
    surface: Size,
    display: DisplayInfo,
    limits: SizeLimits,
) -> Result<StreamConfiguration, DeviceError> {
    let map = characteristics
        .stream_configuration
        .as_ref()
        .ok_or_else(|| DeviceError::ConfigUnavailable {
            details: "device reports no stream configuration map".to_string(),
        })?;

    // Still captures use the largest JPEG size, which also fixes the aspect ratio
    let largest = map
        .jpeg_sizes
        .iter()
        .copied()
        .reduce(|best, size| if size.area() > best.area() { size } else { best })
        .ok_or_else(|| DeviceError::ConfigUnavailable {
            details: "device reports no JPEG output sizes".to_string(),
        })?;

    let sensor_orientation = characteristics.sensor_orientation;
    let swapped = dimensions_swapped(display.rotation, sensor_orientation);

    let rotated_view = if swapped { surface.swapped() } else { surface };
    let display_bound = if swapped {
        display.size.swapped()
    } else {
        display.size
    };
    let max_preview = Size::new(
        display_bound.width.min(limits.max_preview.width),
        display_bound.height.min(limits.max_preview.height),
    );

    let video_size = choose_video_size(&map.video_sizes, limits.max_video_width).ok_or_else(
        || DeviceError::ConfigUnavailable {
            details: "device reports no video output sizes".to_string(),
        },
    )?;

    let preview_size = choose_optimal_size(&map.preview_sizes, rotated_view, max_preview, largest)
        .ok_or_else(|| DeviceError::ConfigUnavailable {
            details: "device reports no preview output sizes".to_string(),
        })?;

    debug!(
        "Stream configuration: preview {}, video {}, sensor {} deg, swapped {}",
        preview_size, video_size, sensor_orientation, swapped
    );

    Ok(StreamConfiguration {
        preview_size,
        video_size,
        sensor_orientation,
        swapped_dimensions: swapped,
    })
}
