use std::path::PathBuf;

/// Transport-level failure talking to a remote service.
#[derive(thiserror::Error, Debug)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("service answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed service payload: {0}")]
    Decode(#[from] serde_json::Error),
}

/// The single user-visible "analysis failed" error.
#[derive(thiserror::Error, Debug)]
pub enum AnalysisError {
    #[error("no image data provided")]
    NoImage,

    #[error("analysis failed: {0}")]
    Service(#[source] ServiceError),

    #[error("analysis failed: recognition service error {code}: {message}")]
    Remote { code: i32, message: String },
}

#[derive(thiserror::Error, Debug)]
pub enum ChatError {
    #[error("Rate limit exceeded. Please try again in a moment.")]
    RateLimited,

    #[error("AI usage limit reached. Please add credits to continue.")]
    CreditsExhausted,

    #[error("AI service unavailable (status {status})")]
    Unavailable { status: u16 },

    #[error("chat stream failed: {0}")]
    Stream(String),
}

impl ChatError {
    /// Map a non-success gateway status.
    pub fn from_status(status: u16) -> Self {
        match status {
            429 => Self::RateLimited,
            402 => Self::CreditsExhausted,
            status => Self::Unavailable { status },
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("catalog backend failed: {0}")]
    Backend(String),
}
