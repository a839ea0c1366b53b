pub const DEFAULT_MESSAGE: &str = "Draw any digit between 0 and 9";
pub const LOADING_MESSAGE: &str = "Loading the model...";
pub const LOAD_FAILED_MESSAGE: &str = "The model could not be loaded, restart the application.";
pub const ANALYZING_MESSAGE: &str = "Analyzing the drawing...";
pub const BLANK_CANVAS_TIP: &str = "TIP: Click and hold to draw.";
pub const INFERENCE_FAILED_MESSAGE: &str = "The prediction failed, try drawing again.";

/// The controls a prediction cycle drives: the erase button and the output
/// label.
pub trait PredictionView {
    fn set_erase_enabled(&mut self, enabled: bool);
    fn write(&mut self, text: &str);
    fn default_message(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub message: String,
    pub erase_enabled: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            message: LOADING_MESSAGE.to_string(),
            erase_enabled: false,
        }
    }
}

impl PredictionView for ViewState {
    fn set_erase_enabled(&mut self, enabled: bool) {
        self.erase_enabled = enabled;
    }

    fn write(&mut self, text: &str) {
        text.clone_into(&mut self.message);
    }

    fn default_message(&mut self) {
        self.write(DEFAULT_MESSAGE);
    }
}
