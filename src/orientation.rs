use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use tracing::trace;

/// Sensor mounting orientation that uses the default lookup table
pub const SENSOR_ORIENTATION_DEFAULT_DEGREES: u32 = 90;

/// Sensor mounting orientation that uses the inverse lookup table
pub const SENSOR_ORIENTATION_INVERSE_DEGREES: u32 = 270;

/// Display rotation, also used as the coarse rotation bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    Rotation0,
    Rotation90,
    Rotation180,
    Rotation270,
}

impl Rotation {
    /// Index of the rotation (0..=3) in quarter turns
    pub fn index(&self) -> u8 {
        match self {
            Rotation::Rotation0 => 0,
            Rotation::Rotation90 => 1,
            Rotation::Rotation180 => 2,
            Rotation::Rotation270 => 3,
        }
    }

    pub fn from_index(index: u8) -> Self {
        match index % 4 {
            0 => Rotation::Rotation0,
            1 => Rotation::Rotation90,
            2 => Rotation::Rotation180,
            _ => Rotation::Rotation270,
        }
    }

    /// Get rotation angle in degrees
    pub fn degrees(&self) -> u32 {
        self.index() as u32 * 90
    }

    /// True for the portrait/landscape flipping rotations
    pub fn is_quarter_turn(&self) -> bool {
        matches!(self, Rotation::Rotation90 | Rotation::Rotation270)
    }
}

/// Output degrees for a sensor mounted at 90 degrees
pub fn default_orientation(rotation: Rotation) -> u32 {
    match rotation {
        Rotation::Rotation0 => 90,
        Rotation::Rotation90 => 0,
        Rotation::Rotation180 => 270,
        Rotation::Rotation270 => 180,
    }
}

/// Output degrees for a sensor mounted at 270 degrees
pub fn inverse_orientation(rotation: Rotation) -> u32 {
    match rotation {
        Rotation::Rotation0 => 270,
        Rotation::Rotation90 => 180,
        Rotation::Rotation180 => 90,
        Rotation::Rotation270 => 0,
    }
}

/// Orientation hint for recorded video, selected by the sensor mounting.
///
/// Sensors mounted at anything other than 90 or 270 degrees get no hint.
pub fn orientation_hint(sensor_orientation: u32, display: Rotation) -> Option<u32> {
    match sensor_orientation {
        SENSOR_ORIENTATION_DEFAULT_DEGREES => Some(default_orientation(display)),
        SENSOR_ORIENTATION_INVERSE_DEGREES => Some(inverse_orientation(display)),
        _ => None,
    }
}

/// Map continuous device degrees onto a rotation bucket.
///
/// Breakpoints sit at 45/135/225/315 with wrap-around at 0.
pub fn rotation_bucket(degrees: u32) -> Rotation {
    let degrees = degrees % 360;
    if !(45..315).contains(&degrees) {
        Rotation::Rotation90
    } else if degrees < 135 {
        Rotation::Rotation180
    } else if degrees < 225 {
        Rotation::Rotation270
    } else {
        Rotation::Rotation0
    }
}

/// Tracks the last rotation bucket reported by the orientation sensor.
///
/// Readers never block: the bucket lives in an atomic and is updated from
/// whichever thread delivers sensor readings.
#[derive(Debug)]
pub struct OrientationTracker {
    bucket: AtomicU8,
    enabled: AtomicBool,
}

impl OrientationTracker {
    /// Create a tracker seeded with the bucket of a 0 degree reading
    /// (device held upright), so stills taken before the first sensor
    /// update are tagged with 0 degrees.
    pub fn new() -> Self {
        Self {
            bucket: AtomicU8::new(rotation_bucket(0).index()),
            enabled: AtomicBool::new(true),
        }
    }

    /// Feed a sensor reading in degrees. Negative values mean the
    /// orientation is unknown (device flat) and keep the last bucket.
    pub fn on_orientation_changed(&self, degrees: i32) {
        if !self.enabled.load(Ordering::Relaxed) || degrees < 0 {
            return;
        }

        let bucket = rotation_bucket(degrees as u32);
        let previous = self.bucket.swap(bucket.index(), Ordering::Relaxed);
        if previous != bucket.index() {
            trace!("Orientation bucket changed to {:?} ({} degrees)", bucket, degrees);
        }
    }

    pub fn current_bucket(&self) -> Rotation {
        Rotation::from_index(self.bucket.load(Ordering::Relaxed))
    }

    /// Degrees used to tag captured still images
    pub fn image_orientation_degrees(&self) -> u32 {
        default_orientation(self.current_bucket())
    }

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Relaxed);
    }

    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }
}

impl Default for OrientationTracker {
    fn default() -> Self {
        Self::new()
    }
}
