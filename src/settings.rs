use crate::geometry::GeometrySettings;
use crate::predict::normalize::NormalizerSettings;
use crate::predict::scheduler::DebounceSettings;
use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Settings {
    /// Path of the JSON model artifact.
    #[serde(default = "default_model_path")]
    pub model_path: String,
    /// When enabled the application initialises the logger at debug level.
    /// Defaults to `false` when the field is missing in the settings file.
    #[serde(default)]
    pub debug_logging: bool,
    /// Optional file that receives a copy of the log output.
    #[serde(default)]
    pub log_file: Option<String>,
    #[serde(default)]
    pub debounce: DebounceSettings,
    #[serde(default)]
    pub normalizer: NormalizerSettings,
    #[serde(default)]
    pub geometry: GeometrySettings,
    /// Append every prediction to the in-memory history.
    #[serde(default)]
    pub keep_history: bool,
    /// Maximum number of entries kept in the history list.
    #[serde(default = "default_history_limit")]
    pub history_limit: Option<usize>,
    /// Attach the normalized drawing to each prediction.
    #[serde(default)]
    pub retain_source_tensor: bool,
}

fn default_model_path() -> String {
    "model/model.json".into()
}

fn default_history_limit() -> Option<usize> {
    Some(100)
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            debug_logging: false,
            log_file: None,
            debounce: DebounceSettings::default(),
            normalizer: NormalizerSettings::default(),
            geometry: GeometrySettings::default(),
            keep_history: false,
            history_limit: default_history_limit(),
            retain_source_tensor: false,
        }
    }
}

impl Settings {
    /// Missing or empty files yield the defaults.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(&content).with_context(|| format!("parsing settings file {path}"))
    }

    pub fn save(&self, path: &str) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).with_context(|| format!("writing settings file {path}"))?;
        Ok(())
    }
}
