use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    VideoInput,
    AudioInput,
    AudioOutput,
}

/// Raw entry as enumerated by the platform. Labels are empty until the
/// user has granted camera permission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaDeviceInfo {
    pub device_id: String,
    pub kind: DeviceKind,
    pub label: String,
}

impl MediaDeviceInfo {
    pub fn video(device_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            kind: DeviceKind::VideoInput,
            label: label.into(),
        }
    }
}

/// A selectable camera.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraDevice {
    pub id: String,
    pub label: String,
    pub kind: DeviceKind,
}

/// Keep video inputs only; blank labels become `Camera N` (1-based among
/// the video inputs).
pub fn video_inputs(devices: &[MediaDeviceInfo]) -> Vec<CameraDevice> {
    devices
        .iter()
        .filter(|d| d.kind == DeviceKind::VideoInput)
        .enumerate()
        .map(|(i, d)| CameraDevice {
            id: d.device_id.clone(),
            label: if d.label.is_empty() {
                format!("Camera {}", i + 1)
            } else {
                d.label.clone()
            },
            kind: DeviceKind::VideoInput,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_audio_and_names_unlabeled_cameras() {
        let raw = vec![
            MediaDeviceInfo {
                device_id: "mic".into(),
                kind: DeviceKind::AudioInput,
                label: "Built-in Microphone".into(),
            },
            MediaDeviceInfo::video("a", ""),
            MediaDeviceInfo::video("b", "USB Microscope"),
            MediaDeviceInfo::video("c", ""),
        ];
        let cams = video_inputs(&raw);
        let labels: Vec<_> = cams.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, ["Camera 1", "USB Microscope", "Camera 3"]);
        assert!(cams.iter().all(|c| c.kind == DeviceKind::VideoInput));
    }
}
