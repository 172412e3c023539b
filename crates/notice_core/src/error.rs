use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unable to access watermark file `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("watermark file `{path}` is malformed: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
#[error("notification surface failed: {0}")]
pub struct SurfaceError(pub String);

#[derive(Debug, Error)]
pub enum IconLookupError {
    #[error("unable to decode icon for `{project}`: {source}")]
    Decode {
        project: String,
        #[source]
        source: image::ImageError,
    },
    #[error("project icon lookup for `{project}` failed: {reason}")]
    Unavailable { project: String, reason: String },
}

impl IconLookupError {
    pub fn project(&self) -> &str {
        match self {
            Self::Decode { project, .. } | Self::Unavailable { project, .. } => project,
        }
    }
}

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    #[error("cannot render a summary without any notified notices")]
    EmptyNoticeSet,
}
