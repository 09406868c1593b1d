use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    User,
    Environment,
}

/// Preferred capture settings, used when no explicit device is requested.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub ideal_width: u32,
    pub ideal_height: u32,
    pub facing_mode: FacingMode,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            ideal_width: 1280,
            ideal_height: 720,
            facing_mode: FacingMode::Environment,
        }
    }
}

/// Video-only stream request handed to the media backend.
///
/// `device_id` is an exact requirement; the size and facing mode are hints.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConstraints {
    pub device_id: Option<String>,
    pub ideal_width: Option<u32>,
    pub ideal_height: Option<u32>,
    pub facing_mode: Option<FacingMode>,
}

impl StreamConstraints {
    /// First attempt: ideal resolution, facing mode only when no device is
    /// pinned.
    pub fn preferred(config: &CameraConfig, device_id: Option<&str>) -> Self {
        Self {
            device_id: device_id.map(str::to_owned),
            ideal_width: Some(config.ideal_width),
            ideal_height: Some(config.ideal_height),
            facing_mode: match device_id {
                Some(_) => None,
                None => Some(config.facing_mode),
            },
        }
    }

    /// Fallback: just the device, or any camera.
    pub fn minimal(device_id: Option<&str>) -> Self {
        Self {
            device_id: device_id.map(str::to_owned),
            ..Self::default()
        }
    }

    pub fn is_minimal(&self) -> bool {
        self.ideal_width.is_none() && self.ideal_height.is_none() && self.facing_mode.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rear_camera_only_without_device() {
        let cfg = CameraConfig::default();
        let any = StreamConstraints::preferred(&cfg, None);
        assert_eq!(any.facing_mode, Some(FacingMode::Environment));
        assert_eq!((any.ideal_width, any.ideal_height), (Some(1280), Some(720)));

        let pinned = StreamConstraints::preferred(&cfg, Some("cam-2"));
        assert_eq!(pinned.facing_mode, None);
        assert_eq!(pinned.device_id.as_deref(), Some("cam-2"));
    }

    #[test]
    fn minimal_keeps_only_the_device() {
        let m = StreamConstraints::minimal(Some("cam-2"));
        assert!(m.is_minimal());
        assert_eq!(m.device_id.as_deref(), Some("cam-2"));
        assert!(StreamConstraints::minimal(None).is_minimal());
    }

    #[test]
    fn config_json_defaults() {
        let cfg: CameraConfig = serde_json::from_str(r#"{"facing_mode":"user"}"#).expect("parse");
        assert_eq!(cfg.facing_mode, FacingMode::User);
        assert_eq!(cfg.ideal_width, 1280);
    }
}
