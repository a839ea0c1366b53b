pub mod draw;
pub mod geometry;
pub mod gui;
pub mod logging;
pub mod predict;
pub mod session;
pub mod settings;
