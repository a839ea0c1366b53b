pub mod bitmap;
pub mod model;
pub mod render;
pub mod surface;

pub use bitmap::RgbaBuffer;
pub use model::{Color, PointerPoint, StrokeStyle};
pub use surface::DrawingSurface;
