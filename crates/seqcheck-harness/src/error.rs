#![forbid(unsafe_code)]

use std::path::PathBuf;

use seqcheck_core::SequenceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error(transparent)]
    Sequence(#[from] SequenceError),

    /// Digest sequences diverged in a way no known decoder artifact explains.
    #[error("unknown mismatch: source={source_label} order={order} positions={positions:?}")]
    UnknownMismatch {
        source_label: String,
        order: String,
        positions: Vec<usize>,
    },

    /// The reader served a frame it should have rejected.
    #[error("bad index not caught: {source_label} returned a frame for index {index}")]
    BadIndexAccepted { source_label: String, index: i64 },

    #[error("{program} exited unsuccessfully (code: {code:?})")]
    ExternalToolFailure { program: String, code: Option<i32> },

    #[error("required command not found: {command}")]
    MissingCommand { command: String },

    #[error("no sources to compare")]
    NoSources,

    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("failed to decode dumped frame {path}: {source}")]
    DumpDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HarnessError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Process exit code for the command-line front end.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoSources | Self::InvalidConfig { .. } => 2,
            Self::UnknownMismatch { .. } => 3,
            Self::BadIndexAccepted { .. } => 4,
            Self::ExternalToolFailure { .. } => 5,
            Self::MissingCommand { .. } => 6,
            Self::Sequence(_)
            | Self::DumpDecode { .. }
            | Self::Image(_)
            | Self::Io(_)
            | Self::Json(_) => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, HarnessError>;
