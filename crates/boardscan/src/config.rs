//! JSON configuration for the scanner as a whole.

use boardscan_capture::{CameraConfig, CaptureConfig};
use boardscan_core::DisplaySize;
use boardscan_detect::{BoardDetectorParams, ParamsError};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("invalid detector parameters: {0}")]
    Detector(#[from] ParamsError),
    #[error("detection rate must be positive, got {0}")]
    DetectionRate(f64),
}

fn default_detection_fps() -> f64 {
    30.0
}

/// Every tunable of the scanner. Missing sections fall back to defaults, so
/// `{}` is a valid config file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    pub detector: BoardDetectorParams,
    pub camera: CameraConfig,
    pub capture: CaptureConfig,
    /// Fixed display size for headless hosts; `None` means native size.
    pub display: Option<DisplaySize>,
    /// Target rate of continuous detection passes.
    pub detection_fps: f64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            detector: BoardDetectorParams::default(),
            camera: CameraConfig::default(),
            capture: CaptureConfig::default(),
            display: None,
            detection_fps: default_detection_fps(),
        }
    }
}

impl ScannerConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.detector.validate()?;
        if !(self.detection_fps.is_finite() && self.detection_fps > 0.0) {
            return Err(ConfigError::DetectionRate(self.detection_fps));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boardscan_capture::FacingMode;

    #[test]
    fn empty_object_is_all_defaults() {
        let config: ScannerConfig = serde_json::from_str("{}").expect("parse");
        assert_eq!(config, ScannerConfig::default());
        assert_eq!(config.capture.jpeg_quality, 90);
        assert_eq!(config.detection_fps, 30.0);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config: ScannerConfig = serde_json::from_str(
            r#"{ "detector": { "canny_low": 30.0 }, "camera": { "facing_mode": "user" } }"#,
        )
        .expect("parse");
        assert_eq!(config.detector.canny_low, 30.0);
        assert_eq!(config.detector.canny_high, 150.0);
        assert_eq!(config.camera.facing_mode, FacingMode::User);
        assert_eq!(config.camera.ideal_width, 1280);
    }

    #[test]
    fn write_then_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("scanner.json");
        let config = ScannerConfig {
            display: Some(DisplaySize::new(640.0, 360.0)),
            detection_fps: 12.5,
            ..Default::default()
        };
        config.write_json(&path).expect("write");
        assert_eq!(ScannerConfig::load_json(&path).expect("load"), config);
    }

    #[test]
    fn bad_values_are_rejected_on_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{ "detection_fps": 0 }"#).expect("write");
        assert!(matches!(
            ScannerConfig::load_json(&path),
            Err(ConfigError::DetectionRate(_))
        ));

        fs::write(&path, r#"{ "detector": { "dilate_kernel_size": 2 } }"#).expect("write");
        assert!(matches!(
            ScannerConfig::load_json(&path),
            Err(ConfigError::Detector(ParamsError::DilateKernel(2)))
        ));

        assert!(matches!(
            ScannerConfig::load_json(dir.path().join("missing.json")),
            Err(ConfigError::Io(_))
        ));
    }
}
