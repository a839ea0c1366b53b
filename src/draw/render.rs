use crate::draw::bitmap::RgbaBuffer;
use crate::draw::model::{PointerPoint, StrokeStyle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl DirtyRect {
    pub fn from_points(a: PointerPoint, b: PointerPoint, pad: i32) -> Self {
        let min_x = a.x.min(b.x).floor() as i32 - pad;
        let min_y = a.y.min(b.y).floor() as i32 - pad;
        let max_x = a.x.max(b.x).ceil() as i32 + pad;
        let max_y = a.y.max(b.y).ceil() as i32 + pad;
        Self {
            x: min_x,
            y: min_y,
            width: (max_x - min_x + 1).max(0),
            height: (max_y - min_y + 1).max(0),
        }
    }

    pub fn clamp(self, width: u32, height: u32) -> Option<DirtyRect> {
        let x0 = self.x.max(0);
        let y0 = self.y.max(0);
        let x1 = (self.x + self.width).min(width as i32);
        let y1 = (self.y + self.height).min(height as i32);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(DirtyRect {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        })
    }
}

/// Rasterizes a round-capped segment. A pixel is covered when its centre lies
/// within half the stroke width of the segment. Returns the number of writes.
pub fn draw_segment(
    bitmap: &mut RgbaBuffer,
    start: PointerPoint,
    end: PointerPoint,
    style: StrokeStyle,
) -> u64 {
    let radius = (style.width / 2.0).max(0.5);
    let pad = radius.ceil() as i32 + 1;
    let Some(clip) = DirtyRect::from_points(start, end, pad).clamp(bitmap.width, bitmap.height)
    else {
        return 0;
    };

    let radius_sq = radius * radius;
    let mut writes: u64 = 0;
    for y in clip.y..(clip.y + clip.height) {
        for x in clip.x..(clip.x + clip.width) {
            let centre = PointerPoint::new(x as f32 + 0.5, y as f32 + 0.5);
            if point_segment_distance_sq(centre, start, end) <= radius_sq {
                bitmap.set_pixel(x, y, style.color);
                writes = writes.saturating_add(1);
            }
        }
    }
    writes
}

fn point_segment_distance_sq(point: PointerPoint, start: PointerPoint, end: PointerPoint) -> f32 {
    let vx = end.x - start.x;
    let vy = end.y - start.y;
    let wx = point.x - start.x;
    let wy = point.y - start.y;
    let len_sq = vx * vx + vy * vy;
    if len_sq <= f32::EPSILON {
        return wx * wx + wy * wy;
    }
    let t = ((wx * vx + wy * vy) / len_sq).clamp(0.0, 1.0);
    let dx = point.x - (start.x + vx * t);
    let dy = point.y - (start.y + vy * t);
    dx * dx + dy * dy
}
