#![forbid(unsafe_code)]

//! Locator resolution: which reader or writer handles a given source.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{Result, SequenceError};
use crate::frame::Shape;
use crate::memory::MemorySequence;
use crate::offset::{OffsetReader, inner_range, split_offset};
use crate::pattern::{FramePattern, PatternReader, PatternWriter};
use crate::sequence::{ColorMode, SequenceReader, SequenceWriter, Source};

/// Opens a fresh reader for a [`Source`].
///
/// Every call must return an independent reader so repeated opens exercise
/// the decoding path again.
pub trait SourceOpener {
    fn open(&self, source: &Source) -> Result<Box<dyn SequenceReader>>;
}

/// Resolve `locator` to a reader. An `INNER::N` offset suffix is handled
/// first, then image-file patterns.
pub fn open_reader(
    locator: &str,
    first: i64,
    last: i64,
    color: ColorMode,
) -> Result<Box<dyn SequenceReader>> {
    if let Some((inner, offset)) = split_offset(locator) {
        let (inner_first, inner_last) = inner_range(first, last, offset)?;
        let reader = open_reader(inner, inner_first, inner_last, color)?;
        debug!(locator, offset, "wrapping reader with index offset");
        return Ok(Box::new(OffsetReader::new(reader, offset)));
    }
    if FramePattern::looks_like_pattern(locator) {
        return Ok(Box::new(PatternReader::open(locator, first, last, color)?));
    }
    Err(SequenceError::UnsupportedLocator {
        locator: locator.to_string(),
    })
}

/// Resolve `locator` to a writer for frames of `shape`.
pub fn create_writer(
    locator: &str,
    fps: f64,
    shape: Shape,
    is_color: bool,
) -> Result<Box<dyn SequenceWriter>> {
    if FramePattern::looks_like_pattern(locator) {
        return Ok(Box::new(PatternWriter::create(locator, fps, shape, is_color)?));
    }
    Err(SequenceError::UnsupportedLocator {
        locator: locator.to_string(),
    })
}

/// Opens sources from the filesystem through [`open_reader`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FileOpener;

impl SourceOpener for FileOpener {
    fn open(&self, source: &Source) -> Result<Box<dyn SequenceReader>> {
        open_reader(&source.locator, source.first, source.last, source.color)
    }
}

/// Serves clones of registered in-memory sequences, keyed by locator.
#[derive(Debug, Clone, Default)]
pub struct MemoryOpener {
    sequences: HashMap<String, MemorySequence>,
}

impl MemoryOpener {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, locator: impl Into<String>, sequence: MemorySequence) -> Self {
        self.sequences.insert(locator.into(), sequence);
        self
    }

    pub fn insert(&mut self, locator: impl Into<String>, sequence: MemorySequence) {
        self.sequences.insert(locator.into(), sequence);
    }
}

impl SourceOpener for MemoryOpener {
    fn open(&self, source: &Source) -> Result<Box<dyn SequenceReader>> {
        let (inner, offset) = split_offset(&source.locator).unwrap_or((source.locator.as_str(), 0));
        let sequence = self
            .sequences
            .get(inner)
            .cloned()
            .ok_or_else(|| SequenceError::UnsupportedLocator {
                locator: source.locator.clone(),
            })?;
        if offset == 0 {
            Ok(Box::new(sequence))
        } else {
            Ok(Box::new(OffsetReader::new(sequence, offset)))
        }
    }
}
