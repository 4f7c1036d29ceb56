use crate::device::{Size, SurfaceId};
use crate::orientation::Rotation;
use parking_lot::Mutex;
use tracing::debug;

/// 2D affine transform applied to the preview, row-major
/// `[scale_x skew_x trans_x; skew_y scale_y trans_y]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewTransform {
    pub scale_x: f32,
    pub skew_x: f32,
    pub trans_x: f32,
    pub skew_y: f32,
    pub scale_y: f32,
    pub trans_y: f32,
}

/// Axis-aligned rectangle in view coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub fn from_size(width: f32, height: f32) -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            right: width,
            bottom: height,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn center(&self) -> (f32, f32) {
        (
            (self.left + self.right) / 2.0,
            (self.top + self.bottom) / 2.0,
        )
    }

    pub fn offset(&mut self, dx: f32, dy: f32) {
        self.left += dx;
        self.right += dx;
        self.top += dy;
        self.bottom += dy;
    }
}

impl PreviewTransform {
    pub const IDENTITY: Self = Self {
        scale_x: 1.0,
        skew_x: 0.0,
        trans_x: 0.0,
        skew_y: 0.0,
        scale_y: 1.0,
        trans_y: 0.0,
    };

    /// Stretch `src` onto `dst`, filling it on both axes
    pub fn rect_to_rect(src: Rect, dst: Rect) -> Self {
        if src.width() == 0.0 || src.height() == 0.0 {
            return Self::IDENTITY;
        }
        let scale_x = dst.width() / src.width();
        let scale_y = dst.height() / src.height();
        Self {
            scale_x,
            skew_x: 0.0,
            trans_x: dst.left - src.left * scale_x,
            skew_y: 0.0,
            scale_y,
            trans_y: dst.top - src.top * scale_y,
        }
    }

    /// `other` applied after `self`
    fn post_concat(&self, other: &Self) -> Self {
        Self {
            scale_x: other.scale_x * self.scale_x + other.skew_x * self.skew_y,
            skew_x: other.scale_x * self.skew_x + other.skew_x * self.scale_y,
            trans_x: other.scale_x * self.trans_x + other.skew_x * self.trans_y + other.trans_x,
            skew_y: other.skew_y * self.scale_x + other.scale_y * self.skew_y,
            scale_y: other.skew_y * self.skew_x + other.scale_y * self.scale_y,
            trans_y: other.skew_y * self.trans_x + other.scale_y * self.trans_y + other.trans_y,
        }
    }

    pub fn post_scale(&self, scale: f32, pivot_x: f32, pivot_y: f32) -> Self {
        self.post_concat(&Self {
            scale_x: scale,
            skew_x: 0.0,
            trans_x: pivot_x - scale * pivot_x,
            skew_y: 0.0,
            scale_y: scale,
            trans_y: pivot_y - scale * pivot_y,
        })
    }

    pub fn post_rotate(&self, degrees: f32, pivot_x: f32, pivot_y: f32) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        self.post_concat(&Self {
            scale_x: cos,
            skew_x: -sin,
            trans_x: pivot_x - cos * pivot_x + sin * pivot_y,
            skew_y: sin,
            scale_y: cos,
            trans_y: pivot_y - sin * pivot_x - cos * pivot_y,
        })
    }

    pub fn map_point(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.scale_x * x + self.skew_x * y + self.trans_x,
            self.skew_y * x + self.scale_y * y + self.trans_y,
        )
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl Default for PreviewTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Transform that keeps a `preview` sized buffer upright and filling a
/// `view` sized surface. Only quarter-turn display rotations need one.
pub fn configure_transform(view: Size, preview: Size, rotation: Rotation) -> PreviewTransform {
    if !rotation.is_quarter_turn() || preview.area() == 0 {
        return PreviewTransform::IDENTITY;
    }

    let view_rect = Rect::from_size(view.width as f32, view.height as f32);
    let mut buffer_rect = Rect::from_size(preview.height as f32, preview.width as f32);
    let (center_x, center_y) = view_rect.center();
    let (buffer_x, buffer_y) = buffer_rect.center();
    buffer_rect.offset(center_x - buffer_x, center_y - buffer_y);

    let scale = (view.height as f32 / preview.height as f32)
        .max(view.width as f32 / preview.width as f32);
    let degrees = 90.0 * (rotation.index() as f32 - 2.0);

    PreviewTransform::rect_to_rect(view_rect, buffer_rect)
        .post_scale(scale, center_x, center_y)
        .post_rotate(degrees, center_x, center_y)
}

/// Host rendering surface the preview is drawn into
pub trait RenderSurface: Send + Sync {
    fn surface_id(&self) -> SurfaceId;

    /// Size of the buffers the camera will produce
    fn set_default_buffer_size(&self, size: Size);

    fn set_transform(&self, transform: PreviewTransform);
}

/// Surface without a display, remembering what it was told
#[derive(Debug)]
pub struct HeadlessSurface {
    id: SurfaceId,
    buffer_size: Mutex<Option<Size>>,
    transform: Mutex<PreviewTransform>,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self {
            id: SurfaceId::allocate(),
            buffer_size: Mutex::new(None),
            transform: Mutex::new(PreviewTransform::IDENTITY),
        }
    }

    pub fn buffer_size(&self) -> Option<Size> {
        *self.buffer_size.lock()
    }

    pub fn transform(&self) -> PreviewTransform {
        *self.transform.lock()
    }
}

impl Default for HeadlessSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderSurface for HeadlessSurface {
    fn surface_id(&self) -> SurfaceId {
        self.id
    }

    fn set_default_buffer_size(&self, size: Size) {
        debug!("Preview buffer size set to {}", size);
        *self.buffer_size.lock() = Some(size);
    }

    fn set_transform(&self, transform: PreviewTransform) {
        debug!("Preview transform set to {:?}", transform);
        *self.transform.lock() = transform;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_point(actual: (f32, f32), expected: (f32, f32)) {
        assert!(
            (actual.0 - expected.0).abs() < 1e-3 && (actual.1 - expected.1).abs() < 1e-3,
            "expected {:?}, got {:?}",
            expected,
            actual
        );
    }

    #[test]
    fn test_upright_rotations_need_no_transform() {
        let view = Size::new(1280, 720);
        assert!(configure_transform(view, view, Rotation::Rotation0).is_identity());
        assert!(configure_transform(view, view, Rotation::Rotation180).is_identity());
    }

    #[test]
    fn test_quarter_turn_keeps_center_and_rotates_corners() {
        let view = Size::new(1280, 720);
        let transform = configure_transform(view, view, Rotation::Rotation90);

        assert_point(transform.map_point(640.0, 360.0), (640.0, 360.0));
        assert_point(transform.map_point(0.0, 0.0), (0.0, 720.0));

        let transform = configure_transform(view, view, Rotation::Rotation270);
        assert_point(transform.map_point(640.0, 360.0), (640.0, 360.0));
        assert_point(transform.map_point(0.0, 0.0), (1280.0, 0.0));
    }

    #[test]
    fn test_rect_to_rect_fill() {
        let transform = PreviewTransform::rect_to_rect(
            Rect::from_size(100.0, 50.0),
            Rect {
                left: 10.0,
                top: 20.0,
                right: 60.0,
                bottom: 220.0,
            },
        );
        assert_point(transform.map_point(0.0, 0.0), (10.0, 20.0));
        assert_point(transform.map_point(100.0, 50.0), (60.0, 220.0));
    }

    #[test]
    fn test_headless_surface_records_settings() {
        let surface = HeadlessSurface::new();
        assert!(surface.buffer_size().is_none());

        surface.set_default_buffer_size(Size::new(960, 540));
        surface.set_transform(PreviewTransform::IDENTITY.post_scale(2.0, 0.0, 0.0));

        assert_eq!(surface.buffer_size(), Some(Size::new(960, 540)));
        assert_point(surface.transform().map_point(1.0, 1.0), (2.0, 2.0));
    }
}
