use crate::draw::bitmap::RgbaBuffer;
use crate::draw::model::{Color, PointerPoint, StrokeStyle};
use crate::draw::render::draw_segment;

pub const BACKGROUND: Color = Color::TRANSPARENT;

/// Freehand canvas: the bitmap, the current stroke style and the drawing flag.
///
/// Every bitmap mutation bumps [`DrawingSurface::revision`], which lets the
/// scheduler tell an untouched canvas from a redrawn one.
#[derive(Debug, Clone)]
pub struct DrawingSurface {
    bitmap: RgbaBuffer,
    style: StrokeStyle,
    last_point: PointerPoint,
    drawing: bool,
    enabled: bool,
    revision: u64,
}

impl DrawingSurface {
    pub fn new(size: u32, stroke_width: f32) -> Self {
        Self {
            bitmap: RgbaBuffer::new(size, size, BACKGROUND),
            style: StrokeStyle {
                width: stroke_width,
                color: Color::WHITE,
            },
            last_point: PointerPoint::default(),
            drawing: false,
            enabled: false,
            revision: 0,
        }
    }

    pub fn bitmap(&self) -> &RgbaBuffer {
        &self.bitmap
    }

    pub fn size(&self) -> u32 {
        self.bitmap.width
    }

    pub fn stroke_width(&self) -> f32 {
        self.style.width
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn last_point(&self) -> PointerPoint {
        self.last_point
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Strokes are refused until the model is ready.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn on_stroke_start(&mut self, point: PointerPoint) -> bool {
        if !self.enabled {
            return false;
        }
        self.last_point = point;
        self.drawing = true;
        true
    }

    pub fn on_stroke_move(&mut self, point: PointerPoint) {
        if !self.drawing {
            return;
        }
        if draw_segment(&mut self.bitmap, self.last_point, point, self.style) > 0 {
            self.revision += 1;
        }
        self.last_point = point;
    }

    /// Returns whether a stroke was actually active.
    pub fn on_stroke_end(&mut self) -> bool {
        std::mem::replace(&mut self.drawing, false)
    }

    pub fn clear(&mut self) {
        self.bitmap.fill(BACKGROUND);
        self.revision += 1;
    }

    /// Reallocates the bitmap when the size changes; the drawing is lost.
    pub fn resize(&mut self, size: u32, stroke_width: f32) {
        self.style.width = stroke_width;
        if size == self.bitmap.width && size == self.bitmap.height {
            return;
        }
        self.bitmap = RgbaBuffer::new(size, size, BACKGROUND);
        self.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled_surface() -> DrawingSurface {
        let mut surface = DrawingSurface::new(64, 6.0);
        surface.set_enabled(true);
        surface
    }

    #[test]
    fn disabled_surface_ignores_stroke_start() {
        let mut surface = DrawingSurface::new(64, 6.0);
        assert!(!surface.on_stroke_start(PointerPoint::new(5.0, 5.0)));
        assert!(!surface.is_drawing());
        surface.on_stroke_move(PointerPoint::new(30.0, 30.0));
        assert_eq!(surface.bitmap().count_non_background(BACKGROUND), 0);
    }

    #[test]
    fn move_draws_only_while_drawing() {
        let mut surface = enabled_surface();
        surface.on_stroke_move(PointerPoint::new(30.0, 30.0));
        assert_eq!(surface.revision(), 0);

        assert!(surface.on_stroke_start(PointerPoint::new(10.0, 10.0)));
        surface.on_stroke_move(PointerPoint::new(40.0, 40.0));
        assert!(surface.bitmap().count_non_background(BACKGROUND) > 0);
        assert_eq!(surface.last_point(), PointerPoint::new(40.0, 40.0));
        assert_eq!(surface.revision(), 1);
    }

    #[test]
    fn stroke_end_reports_previous_drawing_state() {
        let mut surface = enabled_surface();
        assert!(!surface.on_stroke_end());
        surface.on_stroke_start(PointerPoint::new(1.0, 1.0));
        assert!(surface.on_stroke_end());
        assert!(!surface.is_drawing());
        assert!(!surface.on_stroke_end());
    }

    #[test]
    fn clear_blanks_bitmap_but_keeps_drawing_flag() {
        let mut surface = enabled_surface();
        surface.on_stroke_start(PointerPoint::new(10.0, 10.0));
        surface.on_stroke_move(PointerPoint::new(20.0, 20.0));
        surface.clear();
        assert_eq!(surface.bitmap().count_non_background(BACKGROUND), 0);
        assert!(surface.is_drawing());
    }

    #[test]
    fn resize_to_new_size_discards_drawing() {
        let mut surface = enabled_surface();
        surface.on_stroke_start(PointerPoint::new(10.0, 10.0));
        surface.on_stroke_move(PointerPoint::new(20.0, 20.0));
        let before = surface.revision();

        surface.resize(64, 3.0);
        assert_eq!(surface.revision(), before);
        assert_eq!(surface.stroke_width(), 3.0);

        surface.resize(32, 3.0);
        assert_eq!(surface.size(), 32);
        assert!(surface.revision() > before);
        assert_eq!(surface.bitmap().count_non_background(BACKGROUND), 0);
    }
}
