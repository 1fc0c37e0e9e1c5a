//! Configuration file format.
//!
//! ```toml
//! [capture]
//! preset = "medium"
//! orientation = "portrait"
//! fps = 30
//!
//! [inference]
//! mode_selector = "on-off"
//! on_units = "automatic"
//! cache_capacity = 1
//!
//! [output]
//! frame_count = 120
//! initial_mode = 1
//! initial_style = 2
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capture::{CaptureConfig, CaptureConfigError};
use crate::control::{ComputeUnits, ModeSelector, StyleId};

/// Configuration errors.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// The `[capture]` section is invalid.
    #[error("invalid capture settings: {0}")]
    Capture(#[from] CaptureConfigError),
    /// `cache_capacity` is zero.
    #[error("cache capacity must be at least 1")]
    InvalidCacheCapacity,
    /// `input_edge` is zero.
    #[error("model input edge must be at least 1 pixel")]
    InvalidInputEdge,
    /// `initial_style` is not a style index.
    #[error("initial style index {0} out of range")]
    InvalidInitialStyle(usize),
    /// The file could not be read.
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    /// The file is not valid TOML for this format.
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Style model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Directory holding `style1.onnx` .. `style7.onnx`; searched for when unset.
    pub models_dir: Option<PathBuf>,
    /// Layout of the mode control.
    pub mode_selector: ModeSelector,
    /// Preference behind the "On" segment of the two-way control.
    pub on_units: ComputeUnits,
    /// Instantiated models kept warm.
    pub cache_capacity: usize,
    /// Square input edge the models expect.
    pub input_edge: u32,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            models_dir: None,
            mode_selector: ModeSelector::OnOff,
            on_units: ComputeUnits::Automatic,
            cache_capacity: 1,
            input_edge: 512,
        }
    }
}

/// Run settings for the demo binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Run until interrupted instead of stopping after `frame_count`.
    pub continuous: bool,
    /// Frames to capture if not continuous.
    pub frame_count: u64,
    /// Mode selector index applied at start.
    pub initial_mode: usize,
    /// Style selector index applied at start.
    pub initial_style: usize,
    /// Advance the style every this many milliseconds (0 to disable).
    pub cycle_styles_ms: u64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            continuous: false,
            frame_count: 120,
            initial_mode: 0,
            initial_style: 0,
            cycle_styles_ms: 0,
        }
    }
}

/// Full configuration file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Camera settings.
    #[serde(default)]
    pub capture: CaptureConfig,
    /// Model settings.
    #[serde(default)]
    pub inference: InferenceConfig,
    /// Run settings.
    #[serde(default)]
    pub output: OutputConfig,
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.capture.validate()?;
        if self.inference.cache_capacity == 0 {
            return Err(ConfigError::InvalidCacheCapacity);
        }
        if self.inference.input_edge == 0 {
            return Err(ConfigError::InvalidInputEdge);
        }
        if StyleId::from_index(self.output.initial_style).is_none() {
            return Err(ConfigError::InvalidInitialStyle(self.output.initial_style));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{CapturePreset, Orientation};

    #[test]
    fn test_default_config_valid() {
        assert!(FileConfig::default().validate().is_ok());
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = FileConfig::from_toml("").unwrap();
        assert_eq!(config.capture.preset, CapturePreset::Medium);
        assert_eq!(config.capture.orientation, Orientation::Portrait);
        assert_eq!(config.inference.mode_selector, ModeSelector::OnOff);
        assert_eq!(config.inference.cache_capacity, 1);
    }

    #[test]
    fn test_parse_sections() {
        let config = FileConfig::from_toml(
            r#"
            [capture]
            preset = "high"
            fps = 15

            [inference]
            mode_selector = "full"
            on_units = "cpu-only"
            cache_capacity = 3
            models_dir = "/srv/models"

            [output]
            continuous = true
            initial_style = 6
            "#,
        )
        .unwrap();

        assert_eq!(config.capture.preset, CapturePreset::High);
        assert_eq!(config.capture.fps, 15);
        assert_eq!(config.inference.mode_selector, ModeSelector::Full);
        assert_eq!(config.inference.on_units, ComputeUnits::CpuOnly);
        assert_eq!(config.inference.models_dir, Some(PathBuf::from("/srv/models")));
        assert!(config.output.continuous);
        assert_eq!(config.output.initial_style, 6);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            FileConfig::from_toml("[inference]\ncache_capacity = 0"),
            Err(ConfigError::InvalidCacheCapacity)
        ));
        assert!(matches!(
            FileConfig::from_toml("[output]\ninitial_style = 7"),
            Err(ConfigError::InvalidInitialStyle(7))
        ));
        assert!(matches!(
            FileConfig::from_toml("[capture]\nfps = 500"),
            Err(ConfigError::Capture(_))
        ));
        assert!(matches!(
            FileConfig::from_toml("[capture]\npreset = \"ultra\""),
            Err(ConfigError::ParseError(_))
        ));
    }
}
