use digit_canvas::gui::DigitApp;
use digit_canvas::logging;
use digit_canvas::predict::dense::ModelLoader;
use digit_canvas::settings::Settings;

use eframe::egui;
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    let settings = Settings::load("settings.json")?;
    logging::init(settings.debug_logging, settings.log_file.as_ref().map(PathBuf::from));
    tracing::info!(model = %settings.model_path, "starting digit canvas");

    let pending_model = match ModelLoader::spawn(&settings.model_path) {
        Ok(pending) => Some(pending),
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "failed to start model loader");
            None
        }
    };

    let side = (settings.geometry.max_canvas_size + settings.geometry.margin) as f32;
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([side, side + 120.0])
            .with_min_inner_size([160.0, 240.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Digit Canvas",
        native_options,
        Box::new(move |_cc| Box::new(DigitApp::new(&settings, pending_model))),
    )
    .map_err(|err| anyhow::anyhow!("running the window: {err}"))
}
