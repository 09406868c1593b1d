//! Camera acquisition failures and their fixed user-facing taxonomy.

use serde::{Deserialize, Serialize};

/// Failure reported by the media platform while acquiring or playing a
/// stream.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// Failure carrying a platform exception name such as `NotAllowedError`.
    #[error("{name}: {message}")]
    Named { name: String, message: String },

    /// Failure without a usable name.
    #[error("{0}")]
    Other(String),
}

impl PlatformError {
    pub fn named(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Named {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Named { name, .. } => Some(name),
            Self::Other(_) => None,
        }
    }
}

/// The closed set of camera failure classes shown to the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CameraErrorKind {
    PermissionDenied,
    DeviceNotFound,
    DeviceInUse,
    ConstraintsNotSatisfiable,
    InsecureContext,
    Aborted,
    Unknown,
}

/// Static (title, message, suggestion) text for one [`CameraErrorKind`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ErrorDetails {
    pub title: &'static str,
    pub message: &'static str,
    pub suggestion: &'static str,
}

impl CameraErrorKind {
    pub const ALL: [CameraErrorKind; 7] = [
        Self::PermissionDenied,
        Self::DeviceNotFound,
        Self::DeviceInUse,
        Self::ConstraintsNotSatisfiable,
        Self::InsecureContext,
        Self::Aborted,
        Self::Unknown,
    ];

    /// Map a platform exception name; unrecognized names are `Unknown`.
    pub fn from_platform_name(name: &str) -> Self {
        match name {
            "NotAllowedError" | "PermissionDeniedError" => Self::PermissionDenied,
            "NotFoundError" | "DevicesNotFoundError" => Self::DeviceNotFound,
            "NotReadableError" | "TrackStartError" => Self::DeviceInUse,
            "OverconstrainedError" | "ConstraintNotSatisfiedError" => {
                Self::ConstraintsNotSatisfiable
            }
            "SecurityError" => Self::InsecureContext,
            "AbortError" => Self::Aborted,
            _ => Self::Unknown,
        }
    }

    pub fn classify(err: &PlatformError) -> Self {
        err.name().map_or(Self::Unknown, Self::from_platform_name)
    }

    pub fn details(self) -> &'static ErrorDetails {
        match self {
            Self::PermissionDenied => &ErrorDetails {
                title: "Camera Access Denied",
                message: "You have blocked camera access for this site.",
                suggestion: "Please allow camera access in your browser settings, then refresh the page.",
            },
            Self::DeviceNotFound => &ErrorDetails {
                title: "No Camera Found",
                message: "No camera device was detected on your device.",
                suggestion: "Please connect a camera and try again.",
            },
            Self::DeviceInUse => &ErrorDetails {
                title: "Camera In Use",
                message: "The camera is already being used by another application.",
                suggestion: "Close other apps using the camera and try again.",
            },
            Self::ConstraintsNotSatisfiable => &ErrorDetails {
                title: "Camera Not Supported",
                message: "Your camera does not support the required settings.",
                suggestion: "Try selecting a different camera if available.",
            },
            Self::InsecureContext => &ErrorDetails {
                title: "Security Error",
                message: "Camera access requires a secure connection (HTTPS).",
                suggestion: "Access this site via HTTPS or localhost.",
            },
            Self::Aborted => &ErrorDetails {
                title: "Camera Aborted",
                message: "Camera access was interrupted.",
                suggestion: "Please try again.",
            },
            Self::Unknown => &ErrorDetails {
                title: "Camera Error",
                message: "An unexpected error occurred while accessing the camera.",
                suggestion: "Please refresh the page and try again.",
            },
        }
    }
}

/// A classified acquisition failure.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{}: {}", .kind.details().title, .kind.details().message)]
pub struct CameraError {
    pub kind: CameraErrorKind,
    #[source]
    pub source: Option<PlatformError>,
}

impl CameraError {
    pub fn from_platform(err: PlatformError) -> Self {
        Self {
            kind: CameraErrorKind::classify(&err),
            source: Some(err),
        }
    }

    pub fn insecure_context() -> Self {
        Self {
            kind: CameraErrorKind::InsecureContext,
            source: None,
        }
    }

    pub fn details(&self) -> &'static ErrorDetails {
        self.kind.details()
    }
}
