use serde::{Deserialize, Serialize};

/// Horizontal extents reported by the windowing layer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub inner_width: f32,
    /// Zero when the platform does not report an outer size.
    pub outer_width: f32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeometrySettings {
    #[serde(default = "default_max_canvas_size")]
    pub max_canvas_size: u32,
    #[serde(default = "default_margin")]
    pub margin: u32,
    #[serde(default = "default_base_stroke")]
    pub base_stroke: f32,
    #[serde(default = "default_min_stroke")]
    pub min_stroke: f32,
}

fn default_max_canvas_size() -> u32 {
    400
}

fn default_margin() -> u32 {
    30
}

fn default_base_stroke() -> f32 {
    22.0
}

fn default_min_stroke() -> f32 {
    2.0
}

impl Default for GeometrySettings {
    fn default() -> Self {
        Self {
            max_canvas_size: default_max_canvas_size(),
            margin: default_margin(),
            base_stroke: default_base_stroke(),
            min_stroke: default_min_stroke(),
        }
    }
}

impl GeometrySettings {
    pub fn compute_canvas_size(&self, viewport: Viewport) -> u32 {
        let available = if viewport.outer_width > 0.0 {
            viewport.inner_width.min(viewport.outer_width)
        } else {
            viewport.inner_width
        };
        let available = available.max(0.0).floor() as u32;
        self.max_canvas_size.min(available.saturating_sub(self.margin))
    }

    /// Linear in the canvas size, never thinner than `min_stroke`.
    pub fn compute_stroke_width(&self, canvas_size: u32) -> f32 {
        if self.max_canvas_size == 0 {
            return self.min_stroke;
        }
        let width = canvas_size as f32 * self.base_stroke / self.max_canvas_size as f32;
        width.max(self.min_stroke)
    }
}
