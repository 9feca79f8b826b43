#![forbid(unsafe_code)]

//! Frame model and sequence I/O for seqcheck.
//!
//! - [`Frame`] / [`Shape`]: decoded 8-bit image buffers
//! - [`digest`]: subsampled SHA-256 [`FrameDigest`]
//! - [`SequenceReader`] / [`SequenceWriter`]: the random-access contracts the
//!   verifier tests against
//! - [`MemorySequence`], [`PatternReader`], [`PatternWriter`], [`OffsetReader`]:
//!   concrete sequences
//! - [`open_reader`], [`create_writer`], [`SourceOpener`]: locator resolution

pub mod digest;
pub mod error;
pub mod frame;
pub mod memory;
pub mod offset;
pub mod open;
pub mod pattern;
pub mod sequence;

pub use digest::{DEFAULT_STRIDE, DIGEST_LEN, FrameDigest, digest};
pub use error::{Result, SequenceError};
pub use frame::{Frame, Shape};
pub use memory::{MemorySequence, MemoryWriter};
pub use offset::OffsetReader;
pub use open::{FileOpener, MemoryOpener, SourceOpener, create_writer, open_reader};
pub use pattern::{FramePattern, PatternReader, PatternWriter};
pub use sequence::{
    AUTO_INDEX, ColorMode, SequenceReader, SequenceWriter, Source, convert, copy_frames,
};
