#![forbid(unsafe_code)]

//! Errors raised by frames, readers, and writers.

use std::path::PathBuf;

use thiserror::Error;

use crate::frame::Shape;

#[derive(Debug, Error)]
pub enum SequenceError {
    /// A read outside the reader's inclusive `[first, last]` range.
    #[error("frame index {index} out of range [{first}, {last}]")]
    IndexOutOfRange { index: i64, first: i64, last: i64 },

    #[error("shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: Shape, actual: Shape },

    #[error("frame buffer holds {actual} bytes, shape {shape} needs {expected}")]
    BufferLength {
        shape: Shape,
        expected: usize,
        actual: usize,
    },

    #[error("invalid frame pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("no frames found for {locator}")]
    EmptySequence { locator: String },

    #[error("no reader or writer handles {locator}")]
    UnsupportedLocator { locator: String },

    #[error("invalid source {input:?}: {reason}")]
    InvalidSource { input: String, reason: String },

    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SequenceError {
    /// True for the reader-contract range error.
    #[must_use]
    pub fn is_index_out_of_range(&self) -> bool {
        matches!(self, Self::IndexOutOfRange { .. })
    }
}

pub type Result<T> = std::result::Result<T, SequenceError>;
